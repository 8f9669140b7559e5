use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::types::{
    ConstructorDef, FieldDef, MemberSlot, MethodDef, NativeFn, RawType, TypeDef, TypeId, TypeKind,
    TypeRef, Visibility,
};
use crate::value::{Instance, ObjRef, Thrown, Value};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DefineError {
    #[error("a type named `{0}` is already defined")]
    DuplicateType(String),
    #[error("`{0}` cannot extend `{1}`: it is not a class")]
    NotAClass(String, String),
    #[error("`{0}` cannot implement `{1}`: it is not an interface")]
    NotAnInterface(String, String),
    #[error("the interface `{0}` cannot declare a constructor")]
    InterfaceConstructor(String),
}

/// Ids of the built-in types every universe starts with.
///
/// `int`/`Integer` and `boolean`/`Boolean` are the primitive/boxed pairs;
/// `BigDecimal` is the money type of the graded domain.
#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    pub object: TypeId,
    pub string: TypeId,
    pub big_decimal: TypeId,
    /// The `List` interface.
    pub list: TypeId,
    /// The `ArrayList` class, implementing `List`.
    pub array_list: TypeId,
    pub void_ty: TypeId,
    pub int_ty: TypeId,
    pub integer: TypeId,
    pub bool_ty: TypeId,
    pub boolean: TypeId,
    pub throwable: TypeId,
    pub exception: TypeId,
    pub runtime_exception: TypeId,
    pub error: TypeId,
    pub arithmetic_exception: TypeId,
    pub illegal_argument_exception: TypeId,
    pub illegal_state_exception: TypeId,
}

impl WellKnown {
    /// The boxed counterpart of a primitive type, if it has one.
    pub fn boxed_of(&self, primitive: TypeId) -> Option<TypeId> {
        if primitive == self.int_ty {
            Some(self.integer)
        } else if primitive == self.bool_ty {
            Some(self.boolean)
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct Inner {
    types: Vec<TypeDef>,
    by_name: HashMap<String, TypeId>,
}

/// The process-resident type metadata the harness inspects: a registry of
/// class, interface and primitive definitions with closure-backed bodies.
///
/// Single-threaded by design. Registration (including stand-in synthesis)
/// mutates the registry through interior mutability; verification only reads
/// it. Method bodies are cloned out before invocation, so re-entrant dispatch
/// never overlaps a registry borrow.
#[derive(Debug)]
pub struct TypeUniverse {
    inner: RefCell<Inner>,
    well_known: WellKnown,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    pub fn new() -> Self {
        let universe = TypeUniverse {
            inner: RefCell::new(Inner {
                types: Vec::new(),
                by_name: HashMap::new(),
            }),
            // Placeholder ids, fixed up below once the builtins exist.
            well_known: WellKnown {
                object: TypeId(0),
                string: TypeId(0),
                big_decimal: TypeId(0),
                list: TypeId(0),
                array_list: TypeId(0),
                void_ty: TypeId(0),
                int_ty: TypeId(0),
                integer: TypeId(0),
                bool_ty: TypeId(0),
                boolean: TypeId(0),
                throwable: TypeId(0),
                exception: TypeId(0),
                runtime_exception: TypeId(0),
                error: TypeId(0),
                arithmetic_exception: TypeId(0),
                illegal_argument_exception: TypeId(0),
                illegal_state_exception: TypeId(0),
            },
        };
        universe.with_builtins()
    }

    fn with_builtins(mut self) -> Self {
        fn install(u: &TypeUniverse, def: TypeDef) -> TypeId {
            u.install(def).expect("builtin type registration")
        }
        fn bare(name: &str, kind: TypeKind, superclass: Option<TypeId>) -> TypeDef {
            TypeDef {
                name: name.to_string(),
                kind,
                is_abstract: false,
                superclass,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
            }
        }

        let object = install(&self, bare("Object", TypeKind::Class, None));
        let string = install(&self, bare("String", TypeKind::Class, Some(object)));
        let big_decimal = install(&self, bare("BigDecimal", TypeKind::Class, Some(object)));
        let list = install(&self, bare("List", TypeKind::Interface, None));
        let array_list = {
            let mut def = bare("ArrayList", TypeKind::Class, Some(object));
            def.interfaces.push(list);
            install(&self, def)
        };
        let void_ty = install(&self, bare("void", TypeKind::Primitive, None));
        let int_ty = install(&self, bare("int", TypeKind::Primitive, None));
        let integer = install(&self, bare("Integer", TypeKind::Class, Some(object)));
        let bool_ty = install(&self, bare("boolean", TypeKind::Primitive, None));
        let boolean = install(&self, bare("Boolean", TypeKind::Class, Some(object)));

        let throwable = install(&self, bare("Throwable", TypeKind::Class, Some(object)));
        let exception = install(&self, bare("Exception", TypeKind::Class, Some(throwable)));
        let runtime_exception = install(
            &self,
            bare("RuntimeException", TypeKind::Class, Some(exception)),
        );
        let error = install(&self, bare("Error", TypeKind::Class, Some(throwable)));
        let arithmetic_exception = install(
            &self,
            bare("ArithmeticException", TypeKind::Class, Some(runtime_exception)),
        );
        let illegal_argument_exception = install(
            &self,
            bare(
                "IllegalArgumentException",
                TypeKind::Class,
                Some(runtime_exception),
            ),
        );
        let illegal_state_exception = install(
            &self,
            bare(
                "IllegalStateException",
                TypeKind::Class,
                Some(runtime_exception),
            ),
        );

        self.well_known = WellKnown {
            object,
            string,
            big_decimal,
            list,
            array_list,
            void_ty,
            int_ty,
            integer,
            bool_ty,
            boolean,
            throwable,
            exception,
            runtime_exception,
            error,
            arithmetic_exception,
            illegal_argument_exception,
            illegal_state_exception,
        };
        self
    }

    pub fn well_known(&self) -> &WellKnown {
        &self.well_known
    }

    // ---- registration ------------------------------------------------------

    /// Start defining a class. Call [`ClassBuilder::install`] to register it.
    pub fn define_class(&self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name.into(), TypeKind::Class)
    }

    /// Start defining an interface.
    pub fn define_interface(&self, name: impl Into<String>) -> ClassBuilder<'_> {
        ClassBuilder::new(self, name.into(), TypeKind::Interface)
    }

    pub(crate) fn install(&self, def: TypeDef) -> Result<TypeId, DefineError> {
        let mut inner = self.inner.borrow_mut();
        if inner.by_name.contains_key(&def.name) {
            return Err(DefineError::DuplicateType(def.name));
        }
        if let Some(superclass) = def.superclass {
            let sup = &inner.types[superclass.index()];
            if sup.kind != TypeKind::Class {
                return Err(DefineError::NotAClass(def.name.clone(), sup.name.clone()));
            }
        }
        for &iface in &def.interfaces {
            let idef = &inner.types[iface.index()];
            if idef.kind != TypeKind::Interface {
                return Err(DefineError::NotAnInterface(
                    def.name.clone(),
                    idef.name.clone(),
                ));
            }
        }
        if def.kind == TypeKind::Interface && !def.constructors.is_empty() {
            return Err(DefineError::InterfaceConstructor(def.name));
        }

        let id = TypeId(inner.types.len() as u32);
        tracing::debug!(
            target = "rubric.model",
            name = %def.name,
            kind = ?def.kind,
            "type registered"
        );
        inner.by_name.insert(def.name.clone(), id);
        inner.types.push(def);
        Ok(id)
    }

    // ---- queries -----------------------------------------------------------

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.inner.borrow().by_name.get(name).copied()
    }

    pub fn name_of(&self, id: TypeId) -> String {
        self.inner.borrow().types[id.index()].name.clone()
    }

    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.inner.borrow().types[id.index()].kind
    }

    pub fn is_abstract(&self, id: TypeId) -> bool {
        self.inner.borrow().types[id.index()].is_abstract
    }

    pub fn superclass(&self, id: TypeId) -> Option<TypeId> {
        self.inner.borrow().types[id.index()].superclass
    }

    /// The interfaces this type directly implements (or, for an interface,
    /// directly extends).
    pub fn interfaces(&self, id: TypeId) -> Vec<TypeId> {
        self.inner.borrow().types[id.index()].interfaces.clone()
    }

    /// Declared methods of `id`, in declaration order. Inherited members are
    /// not included; callers walk the supertype chain themselves.
    pub fn declared_methods(&self, id: TypeId) -> Vec<MethodDef> {
        self.inner.borrow().types[id.index()].methods.clone()
    }

    pub fn declared_constructors(&self, id: TypeId) -> Vec<ConstructorDef> {
        self.inner.borrow().types[id.index()].constructors.clone()
    }

    pub fn declared_fields(&self, id: TypeId) -> Vec<FieldDef> {
        self.inner.borrow().types[id.index()].fields.clone()
    }

    pub fn method_at(&self, owner: TypeId, index: usize) -> MethodDef {
        self.inner.borrow().types[owner.index()].methods[index].clone()
    }

    /// Nominal subtyping over classes and interfaces; a primitive is a
    /// subtype only of itself.
    pub fn is_subtype(&self, lower: TypeId, upper: TypeId) -> bool {
        if lower == upper {
            return true;
        }
        let inner = self.inner.borrow();
        if inner.types[lower.index()].kind == TypeKind::Primitive {
            return false;
        }
        // Interfaces have no superclass link; every reference type still
        // answers to Object.
        if upper == self.well_known.object {
            return true;
        }
        let mut queue = vec![lower];
        let mut seen = vec![false; inner.types.len()];
        while let Some(current) = queue.pop() {
            if current == upper {
                return true;
            }
            if std::mem::replace(&mut seen[current.index()], true) {
                continue;
            }
            let def = &inner.types[current.index()];
            if let Some(superclass) = def.superclass {
                queue.push(superclass);
            }
            queue.extend(def.interfaces.iter().copied());
        }
        false
    }

    /// Erased assignability: `lower` may be used where `upper` is declared.
    /// Arrays are covariant; `Object` accepts every reference, including
    /// arrays.
    pub fn is_assignable(&self, lower: RawType, upper: RawType) -> bool {
        if lower == upper {
            return true;
        }
        if upper.dims == 0 && upper.id == self.well_known.object {
            return lower.dims > 0 || self.kind(lower.id) != TypeKind::Primitive;
        }
        if lower.dims > 0 && upper.dims > 0 {
            return self.is_assignable(lower.element(), upper.element());
        }
        if lower.dims != upper.dims {
            return false;
        }
        self.is_subtype(lower.id, upper.id)
    }

    /// The runtime type of a value, or `None` for `Unit`.
    pub fn runtime_type(&self, value: &Value) -> Option<RawType> {
        let wk = &self.well_known;
        let raw = match value {
            Value::Unit => return None,
            Value::Bool(_) => RawType::of(wk.boolean),
            Value::Int(_) => RawType::of(wk.integer),
            Value::Decimal(_) => RawType::of(wk.big_decimal),
            Value::Text(_) => RawType::of(wk.string),
            Value::List(_) => RawType::of(wk.array_list),
            Value::Array(a) => RawType {
                id: a.elem.id,
                dims: a.elem.dims + 1,
            },
            Value::Object(obj) => RawType::of(obj.class),
        };
        Some(raw)
    }

    // ---- display -----------------------------------------------------------

    /// Simplified textual form of a type reference: `List<Item>`, `String[]`.
    pub fn display(&self, r: &TypeRef) -> String {
        let mut out = self.name_of(r.id);
        if !r.args.is_empty() {
            let args: Vec<String> = r.args.iter().map(|a| self.display(a)).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        for _ in 0..r.dims {
            out.push_str("[]");
        }
        out
    }

    pub fn display_raw(&self, raw: RawType) -> String {
        let mut out = self.name_of(raw.id);
        for _ in 0..raw.dims {
            out.push_str("[]");
        }
        out
    }

    /// Human-readable form of a value, used in failure messages.
    pub fn display_value(&self, value: &Value) -> String {
        match value {
            Value::Unit => "void".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Decimal(d) => format!("{d}"),
            Value::Text(s) => s.clone(),
            Value::List(items) => {
                let rendered: Vec<String> =
                    items.borrow().iter().map(|v| self.display_value(v)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Value::Array(a) => {
                let rendered: Vec<String> =
                    a.items.borrow().iter().map(|v| self.display_value(v)).collect();
                format!("{}{{{}}}", self.display_raw(a.elem), rendered.join(", "))
            }
            Value::Object(obj) => {
                format!("{}@{:x}", self.name_of(obj.class), Rc::as_ptr(obj) as usize)
            }
        }
    }

    pub fn describe_thrown(&self, thrown: &Thrown) -> String {
        if thrown.message.is_empty() {
            self.name_of(thrown.class)
        } else {
            format!("{}: {}", self.name_of(thrown.class), thrown.message)
        }
    }

    /// Build a [`Thrown`] of the given exception class.
    pub fn throw(&self, class: TypeId, message: impl Into<String>) -> Thrown {
        Thrown::new(class, message)
    }

    // ---- dispatch ----------------------------------------------------------

    /// Find the most-derived declaration of `name` with the given erased
    /// parameter list, starting at `class` and walking the superclass chain.
    pub fn find_override(
        &self,
        class: TypeId,
        name: &str,
        params: &[TypeRef],
    ) -> Option<MemberSlot> {
        let inner = self.inner.borrow();
        let mut current = Some(class);
        while let Some(c) = current {
            let def = &inner.types[c.index()];
            for (index, m) in def.methods.iter().enumerate() {
                if m.name == name
                    && !m.is_static
                    && m.params.len() == params.len()
                    && m.params
                        .iter()
                        .zip(params)
                        .all(|(a, b)| a.raw() == b.raw())
                {
                    return Some(MemberSlot::Method { owner: c, index });
                }
            }
            current = def.superclass;
        }
        None
    }

    /// Virtual dispatch by name and arity, for use inside method bodies.
    /// The most-derived match wins; a missing method raises a
    /// `RuntimeException`-classed [`Thrown`].
    pub fn call_virtual(
        &self,
        receiver: &ObjRef,
        name: &str,
        args: &[Value],
    ) -> Result<Value, Thrown> {
        let slot = {
            let inner = self.inner.borrow();
            let mut found = None;
            let mut current = Some(receiver.class);
            'walk: while let Some(c) = current {
                let def = &inner.types[c.index()];
                for (index, m) in def.methods.iter().enumerate() {
                    if m.name == name && !m.is_static && m.params.len() == args.len() {
                        found = Some(MemberSlot::Method { owner: c, index });
                        break 'walk;
                    }
                }
                current = def.superclass;
            }
            found
        };
        let Some(slot) = slot else {
            return Err(self.throw(
                self.well_known.runtime_exception,
                format!(
                    "could not call `{name}` on `{}`",
                    self.name_of(receiver.class)
                ),
            ));
        };
        self.invoke_slot(slot, Some(receiver), args)
    }

    /// Invoke the member at `slot` directly, with no virtual re-resolution.
    ///
    /// The body is cloned out of the registry before the call so the
    /// invocation can re-enter the universe.
    pub fn invoke_slot(
        &self,
        slot: MemberSlot,
        receiver: Option<&ObjRef>,
        args: &[Value],
    ) -> Result<Value, Thrown> {
        let body: Option<NativeFn> = {
            let inner = self.inner.borrow();
            match slot {
                MemberSlot::Method { owner, index } => {
                    inner.types[owner.index()].methods[index].body.clone()
                }
                MemberSlot::Constructor { owner, index } => {
                    Some(inner.types[owner.index()].constructors[index].body.clone())
                }
            }
        };
        let Some(body) = body else {
            let (owner, name) = match slot {
                MemberSlot::Method { owner, index } => {
                    (owner, self.method_at(owner, index).name)
                }
                MemberSlot::Constructor { owner, .. } => (owner, "<init>".to_string()),
            };
            return Err(self.throw(
                self.well_known.runtime_exception,
                format!(
                    "abstract method `{}.{name}` has no implementation",
                    self.name_of(owner)
                ),
            ));
        };
        if let MemberSlot::Method { owner, index } = slot {
            let m = self.method_at(owner, index);
            if !m.is_static && receiver.is_none() {
                return Err(self.throw(
                    self.well_known.runtime_exception,
                    format!(
                        "instance method `{}.{}` invoked without a receiver",
                        self.name_of(owner),
                        m.name
                    ),
                ));
            }
        }
        tracing::trace!(
            target = "rubric.model",
            slot = ?slot,
            argc = args.len(),
            "invoking member"
        );
        body(self, receiver, args)
    }

    /// Allocate an instance of `class` without running any constructor.
    pub fn new_instance_raw(&self, class: TypeId) -> ObjRef {
        Instance::new(class)
    }

    /// Run a declared constructor against an already-allocated receiver.
    pub fn run_constructor(
        &self,
        slot: MemberSlot,
        receiver: &ObjRef,
        args: &[Value],
    ) -> Result<(), Thrown> {
        self.invoke_slot(slot, Some(receiver), args).map(|_| ())
    }
}

/// Fluent definition of a class or interface, installed into the universe at
/// the end.
pub struct ClassBuilder<'u> {
    universe: &'u TypeUniverse,
    def: TypeDef,
}

impl<'u> ClassBuilder<'u> {
    fn new(universe: &'u TypeUniverse, name: String, kind: TypeKind) -> Self {
        let superclass = match kind {
            TypeKind::Class => Some(universe.well_known.object),
            _ => None,
        };
        Self {
            universe,
            def: TypeDef {
                name,
                kind,
                is_abstract: kind == TypeKind::Interface,
                superclass,
                interfaces: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
            },
        }
    }

    pub fn abstract_(mut self) -> Self {
        self.def.is_abstract = true;
        self
    }

    pub fn extends(mut self, superclass: TypeId) -> Self {
        self.def.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeId) -> Self {
        self.def.interfaces.push(interface);
        self
    }

    pub fn field(mut self, name: impl Into<String>, visibility: Visibility, ty: TypeRef) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            visibility,
            is_static: false,
            ty,
        });
        self
    }

    pub fn method(mut self, def: MethodDef) -> Self {
        self.def.methods.push(def);
        self
    }

    pub fn constructor(mut self, def: ConstructorDef) -> Self {
        self.def.constructors.push(def);
        self
    }

    pub fn install(self) -> Result<TypeId, DefineError> {
        self.universe.install(self.def)
    }
}
