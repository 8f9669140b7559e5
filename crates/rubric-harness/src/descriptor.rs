use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rubric_model::{
    FieldDef, MemberSlot, ObjRef, Thrown, TypeId, TypeKind, TypeRef, TypeUniverse, Value,
    Visibility,
};

use crate::callable::ResolvedCallable;
use crate::constraint::{self, MethodSpec};
use crate::error::{Failure, Verify};
use crate::invoke::{self, InstanceHandle};
use crate::standin::{self, BehaviorTable, StandIn};

/// The approved-callable registry a descriptor accumulates: method name →
/// overloads in registration order, plus registered constructors.
///
/// Owned by the [`ClassHandle`] that built it and shared (single-threaded
/// `Rc`) with the instance handles it creates, so constraints registered
/// after instantiation stay visible through live instances.
#[derive(Default, Debug)]
pub(crate) struct Registry {
    pub methods: HashMap<String, Vec<ResolvedCallable>>,
    pub constructors: Vec<ResolvedCallable>,
}

/// A kind-checked descriptor of one resolved type, carrying the registry of
/// approved methods and constructors. The entry point of every check.
#[derive(Debug)]
pub struct ClassHandle<'u> {
    universe: &'u TypeUniverse,
    id: TypeId,
    kind: TypeKind,
    registry: Rc<RefCell<Registry>>,
}

impl<'u> ClassHandle<'u> {
    /// Resolve `name` and require it to be a class.
    pub fn resolve_class(universe: &'u TypeUniverse, name: &str) -> Verify<Self> {
        let handle = Self::resolve(universe, name)?;
        if handle.kind != TypeKind::Class {
            return Err(Failure::KindMismatch {
                name: handle.name(),
                expected: "a class",
                actual: handle.kind.describe(),
            });
        }
        Ok(handle)
    }

    /// Resolve `name` and require it to be an interface.
    pub fn resolve_interface(universe: &'u TypeUniverse, name: &str) -> Verify<Self> {
        let handle = Self::resolve(universe, name)?;
        if handle.kind != TypeKind::Interface {
            return Err(Failure::KindMismatch {
                name: handle.name(),
                expected: "an interface",
                actual: handle.kind.describe(),
            });
        }
        Ok(handle)
    }

    fn resolve(universe: &'u TypeUniverse, name: &str) -> Verify<Self> {
        let id = universe
            .lookup(name)
            .ok_or_else(|| Failure::TypeNotFound(name.to_string()))?;
        Ok(Self::of(universe, id))
    }

    /// Wrap an already-known type without a kind check.
    pub fn of(universe: &'u TypeUniverse, id: TypeId) -> Self {
        Self {
            universe,
            id,
            kind: universe.kind(id),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn universe(&self) -> &'u TypeUniverse {
        self.universe
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> String {
        self.universe.name_of(self.id)
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_abstract(&self) -> bool {
        self.universe.is_abstract(self.id)
    }

    /// A reference to this type, for use in parameter and return positions.
    pub fn type_ref(&self) -> TypeRef {
        TypeRef::new(self.id)
    }

    /// Descriptor of the proper superclass; fails on the root type.
    pub fn superclass(&self) -> Verify<ClassHandle<'u>> {
        match self.universe.superclass(self.id) {
            Some(superclass) => Ok(Self::of(self.universe, superclass)),
            None => Err(Failure::NoSuperclass(self.name())),
        }
    }

    pub fn declared_fields(&self) -> Vec<FieldDef> {
        self.universe.declared_fields(self.id)
    }

    /// The registered overloads for `name`, in registration order.
    pub fn approved_methods(&self, name: &str) -> Vec<ResolvedCallable> {
        self.registry
            .borrow()
            .methods
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn approved_constructors(&self) -> Vec<ResolvedCallable> {
        self.registry.borrow().constructors.clone()
    }

    // ---- contract registration --------------------------------------------

    /// Verify a method constraint and append the resolved callable to the
    /// registry. Overloads of the same name accumulate; later registrations
    /// never replace earlier ones.
    pub fn require_method(
        &mut self,
        f: impl FnOnce(MethodSpec) -> MethodSpec,
    ) -> Verify<&mut Self> {
        let spec = f(MethodSpec::new());
        let callable = constraint::build(
            self.universe,
            self.id,
            match self.kind {
                TypeKind::Interface => "interface",
                _ => "class",
            },
            spec,
        )?;
        self.registry
            .borrow_mut()
            .methods
            .entry(callable.name.clone())
            .or_default()
            .push(callable);
        Ok(self)
    }

    /// Require a public constructor with exactly these parameter types and
    /// register it for [`ClassHandle::new_instance`].
    pub fn require_constructor(&mut self, params: Vec<TypeRef>) -> Verify<&mut Self> {
        let owner = self.name();
        let constructors = self.universe.declared_constructors(self.id);
        let found = constructors.iter().enumerate().find(|(_, c)| {
            c.visibility == Visibility::Public
                && c.params.len() == params.len()
                && c.params.iter().zip(&params).all(|(a, b)| a.raw() == b.raw())
        });
        let Some((index, ctor)) = found else {
            let rendered: Vec<String> = params.iter().map(|p| self.universe.display(p)).collect();
            return Err(Failure::MethodNotFound {
                kind: "class",
                owner: owner.clone(),
                signature: format!("{owner}({})", rendered.join(", ")),
            });
        };
        self.registry.borrow_mut().constructors.push(ResolvedCallable {
            slot: MemberSlot::Constructor {
                owner: self.id,
                index,
            },
            name: owner,
            declaring: self.id,
            params: ctor.params.clone(),
            return_type: TypeRef::new(self.id),
            is_static: false,
            visibility: ctor.visibility,
            throws: ctor.throws.clone(),
        });
        Ok(self)
    }

    /// Require the conventional public getter for `property`:
    /// `get` + capitalized property name, returning `ty`.
    pub fn require_getter(&mut self, property: &str, ty: TypeRef) -> Verify<&mut Self> {
        let mut chars = property.chars();
        let getter = match chars.next() {
            Some(first) => format!("get{}{}", first.to_uppercase(), chars.as_str()),
            None => return Err(Failure::InvalidSpec("empty getter property name".to_string())),
        };
        self.require_method(move |m| m.public().named(&getter).returns(ty))
    }

    /// Require `public static void main(String[])`.
    pub fn require_main_entry_point(&mut self) -> Verify<&mut Self> {
        let wk = self.universe.well_known();
        let string_array = TypeRef::new(wk.string).array_of();
        let void_ty = TypeRef::new(wk.void_ty);
        self.require_method(move |m| {
            m.public()
                .static_()
                .named("main")
                .returns(void_ty)
                .with_parameters(vec![string_array])
        })
    }

    /// Nominal subtyping check against `parent`. On success the parent's
    /// approved methods are adopted into this registry, so contracts verified
    /// against the declared type can be exercised through the implementor.
    pub fn require_implements(&mut self, parent: &ClassHandle<'_>) -> Verify<&mut Self> {
        if !self.universe.is_subtype(self.id, parent.id) {
            return Err(Failure::NotASubtype {
                child: self.name(),
                parent: parent.name(),
            });
        }
        {
            let adopted = parent.registry.borrow();
            let mut registry = self.registry.borrow_mut();
            for (name, overloads) in &adopted.methods {
                registry.methods.insert(name.clone(), overloads.clone());
            }
        }
        Ok(self)
    }

    // ---- structural pillars -----------------------------------------------

    /// Every declared field must be non-public (the encapsulation pillar).
    pub fn require_encapsulated_fields(&self) -> Verify<&Self> {
        for field in self.declared_fields() {
            if field.visibility == Visibility::Public {
                return Err(Failure::UnencapsulatedField {
                    owner: self.name(),
                    field: field.name,
                    actual: field.visibility,
                });
            }
        }
        Ok(self)
    }

    /// The type must be a checked exception: an `Exception` descendant that
    /// inherits from neither `RuntimeException` nor `Error`.
    pub fn require_checked_exception(&self) -> Verify<&Self> {
        let wk = self.universe.well_known();
        let reason = if self.universe.is_subtype(self.id, wk.runtime_exception) {
            Some("it inherits from `RuntimeException`")
        } else if self.universe.is_subtype(self.id, wk.error) {
            Some("it inherits from `Error`")
        } else if !self.universe.is_subtype(self.id, wk.exception) {
            Some("it does not inherit from `Exception`")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(Failure::NotACheckedException {
                name: self.name(),
                reason: reason.to_string(),
            }),
            None => Ok(self),
        }
    }

    // ---- construction ------------------------------------------------------

    /// Construct an instance. With no arguments the declared zero-parameter
    /// constructor is used directly; otherwise the best-matching *registered*
    /// constructor is resolved against the arguments.
    pub fn new_instance(&self, args: &[Value]) -> Verify<InstanceHandle<'u>> {
        let owner = self.name();
        let rendered = || {
            let parts: Vec<String> =
                args.iter().map(|a| self.universe.display_value(a)).collect();
            parts.join(", ")
        };
        let detail = if args.is_empty() {
            "no args".to_string()
        } else {
            format!("args `{}`", rendered())
        };

        if self.kind != TypeKind::Class || self.is_abstract() {
            return Err(Failure::ConstructionFailed { owner, detail });
        }

        let obj = if args.is_empty() {
            let constructors = self.universe.declared_constructors(self.id);
            let index = constructors
                .iter()
                .position(|c| c.params.is_empty())
                .ok_or_else(|| Failure::ConstructionFailed {
                    owner: owner.clone(),
                    detail: detail.clone(),
                })?;
            let obj = self.universe.new_instance_raw(self.id);
            self.universe
                .run_constructor(
                    MemberSlot::Constructor {
                        owner: self.id,
                        index,
                    },
                    &obj,
                    &[],
                )
                .map_err(|_| Failure::ConstructionFailed {
                    owner: owner.clone(),
                    detail: detail.clone(),
                })?;
            obj
        } else {
            let candidates = self.registry.borrow().constructors.clone();
            let matched = crate::overload::best_match(self.universe, &candidates, args)?;
            let Some(ctor) = matched else {
                return Err(Failure::NoMatchingConstructor {
                    owner,
                    args: rendered(),
                });
            };
            let obj = self.universe.new_instance_raw(self.id);
            self.universe
                .run_constructor(ctor.slot, &obj, args)
                .map_err(|_| Failure::ConstructionFailed {
                    owner: owner.clone(),
                    detail: detail.clone(),
                })?;
            obj
        };

        tracing::debug!(
            target = "rubric.harness",
            class = %self.universe.name_of(self.id),
            "instance constructed"
        );
        Ok(InstanceHandle::new(
            self.universe,
            obj,
            Rc::clone(&self.registry),
        ))
    }

    /// Wrap an existing object in an instance handle sharing this registry.
    pub fn wrap(&self, obj: ObjRef) -> InstanceHandle<'u> {
        InstanceHandle::new(self.universe, obj, Rc::clone(&self.registry))
    }

    // ---- static-side invocation bridge ------------------------------------

    /// Invoke a registered static method, converting any subject-raised
    /// exception into a terminal failure.
    pub fn call(&self, name: &str, args: &[Value]) -> Verify<Value> {
        invoke::call(self.universe, &self.registry, &self.name(), None, name, args)
    }

    /// Invoke a registered static method, letting a subject-raised exception
    /// propagate verbatim.
    pub fn call_expecting_failure(
        &self,
        name: &str,
        args: &[Value],
    ) -> Verify<Result<Value, Thrown>> {
        invoke::invoke_registered(self.universe, &self.registry, &self.name(), None, name, args)
    }

    /// Invoke a registered static method and require it to raise an instance
    /// of `expected`.
    pub fn assert_fails_with(
        &self,
        expected: TypeId,
        name: &str,
        args: &[Value],
    ) -> Verify<Thrown> {
        invoke::assert_fails_with(
            self.universe,
            &self.registry,
            &self.name(),
            None,
            expected,
            name,
            args,
        )
    }

    // ---- stand-ins ---------------------------------------------------------

    /// Build a live subclass instance of this class whose intercepted methods
    /// return scripted results; non-intercepted calls run the real inherited
    /// implementation.
    pub fn subclass_stand_in(&self, table: BehaviorTable) -> Verify<StandIn> {
        standin::subclass(self.universe, self.id, self.kind, table)
    }

    /// Build a pure structural proxy of this interface; calls outside the
    /// behavior table fail loudly.
    pub fn interface_stand_in(&self, table: BehaviorTable) -> Verify<StandIn> {
        standin::structural(self.universe, self.id, self.kind, table)
    }
}
