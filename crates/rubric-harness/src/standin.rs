use std::fmt;
use std::rc::Rc;

use rubric_model::{
    MethodDef, NativeFn, ObjRef, Thrown, TypeId, TypeKind, TypeUniverse, Value,
};

use crate::error::{Failure, Verify};

/// One scripted behavior: either a fixed value, or a function of the call's
/// argument list for stand-ins whose result must depend on input.
#[derive(Clone)]
pub enum Behavior {
    Constant(Value),
    Computed(Rc<dyn Fn(&[Value]) -> Result<Value, Thrown>>),
}

impl Behavior {
    pub fn constant(value: Value) -> Self {
        Behavior::Constant(value)
    }

    pub fn computed(f: impl Fn(&[Value]) -> Result<Value, Thrown> + 'static) -> Self {
        Behavior::Computed(Rc::new(f))
    }

    fn to_native(&self) -> NativeFn {
        match self {
            Behavior::Constant(value) => {
                let value = value.clone();
                Rc::new(move |_, _, _| Ok(value.clone()))
            }
            Behavior::Computed(f) => {
                let f = Rc::clone(f);
                Rc::new(move |_, _, args| f(args))
            }
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Behavior::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Method name → scripted behavior for a stand-in under construction.
#[derive(Debug, Default, Clone)]
pub struct BehaviorTable {
    entries: Vec<(String, Behavior)>,
}

impl BehaviorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script `name` to always return `value`.
    pub fn returning(mut self, name: impl Into<String>, value: Value) -> Self {
        self.entries.push((name.into(), Behavior::constant(value)));
        self
    }

    /// Script `name` to compute its result from the call arguments.
    pub fn computing(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, Thrown> + 'static,
    ) -> Self {
        self.entries.push((name.into(), Behavior::computed(f)));
        self
    }

    fn get(&self, name: &str) -> Option<&Behavior> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, behavior)| behavior)
    }
}

/// A live, scripted instance of a declared type.
#[derive(Debug)]
pub struct StandIn {
    obj: ObjRef,
}

impl StandIn {
    /// The stand-in as a value to pass into invocations.
    pub fn value(&self) -> Value {
        Value::Object(self.obj.clone())
    }

    pub fn object(&self) -> &ObjRef {
        &self.obj
    }

    pub fn class(&self) -> TypeId {
        self.obj.class
    }
}

fn fresh_name(universe: &TypeUniverse, base: &str) -> String {
    let mut n = 1;
    loop {
        let name = format!("{base}$StandIn{n}");
        if universe.lookup(&name).is_none() {
            return name;
        }
        n += 1;
    }
}

/// Inherited instance methods of `base`, most-derived declaration first, one
/// entry per distinct (name, erased parameter list).
fn inherited_surface(universe: &TypeUniverse, base: TypeId) -> Vec<MethodDef> {
    let mut surface: Vec<MethodDef> = Vec::new();
    let mut current = Some(base);
    while let Some(class) = current {
        for method in universe.declared_methods(class) {
            if method.is_static {
                continue;
            }
            let already = surface.iter().any(|m| {
                m.name == method.name
                    && m.params.len() == method.params.len()
                    && m.params
                        .iter()
                        .zip(&method.params)
                        .all(|(a, b)| a.raw() == b.raw())
            });
            if !already {
                surface.push(method);
            }
        }
        current = universe.superclass(class);
    }
    surface
}

/// Synthesize a subclass of `base` whose table-listed methods are scripted;
/// everything else falls through to the real inherited implementation via
/// ordinary virtual dispatch.
pub(crate) fn subclass(
    universe: &TypeUniverse,
    base: TypeId,
    kind: TypeKind,
    table: BehaviorTable,
) -> Verify<StandIn> {
    if kind != TypeKind::Class {
        return Err(Failure::KindMismatch {
            name: universe.name_of(base),
            expected: "a class",
            actual: kind.describe(),
        });
    }

    let name = fresh_name(universe, &universe.name_of(base));
    let mut builder = universe.define_class(name.clone()).extends(base);
    for method in inherited_surface(universe, base) {
        let Some(behavior) = table.get(&method.name) else {
            continue;
        };
        let mut scripted = MethodDef::new(
            method.name.clone(),
            method.params.clone(),
            method.return_type.clone(),
        )
        .visibility(method.visibility)
        .throws(method.throws.clone());
        scripted.body = Some(behavior.to_native());
        builder = builder.method(scripted);
    }
    let class = builder
        .install()
        .map_err(|e| Failure::InvalidSpec(e.to_string()))?;

    tracing::debug!(
        target = "rubric.harness",
        base = %universe.name_of(base),
        standin = %name,
        "subclass stand-in synthesized"
    );

    let obj = universe.new_instance_raw(class);
    run_zero_arg_chain(universe, base, &obj)?;
    Ok(StandIn { obj })
}

/// Initialize inherited state by running the nearest zero-argument
/// constructor up the chain, when one exists.
fn run_zero_arg_chain(universe: &TypeUniverse, base: TypeId, obj: &ObjRef) -> Verify<()> {
    let mut current = Some(base);
    while let Some(class) = current {
        let constructors = universe.declared_constructors(class);
        if let Some(index) = constructors.iter().position(|c| c.params.is_empty()) {
            let slot = rubric_model::MemberSlot::Constructor {
                owner: class,
                index,
            };
            return universe.run_constructor(slot, obj, &[]).map_err(|_| {
                Failure::ConstructionFailed {
                    owner: universe.name_of(base),
                    detail: "no args".to_string(),
                }
            });
        }
        current = universe.superclass(class);
    }
    Ok(())
}

/// Synthesize a pure structural proxy of the interface `base`: table-listed
/// methods are scripted, and every other interface method fails loudly when
/// called, since there is no real implementation to fall back to.
pub(crate) fn structural(
    universe: &TypeUniverse,
    base: TypeId,
    kind: TypeKind,
    table: BehaviorTable,
) -> Verify<StandIn> {
    if kind != TypeKind::Interface {
        return Err(Failure::KindMismatch {
            name: universe.name_of(base),
            expected: "an interface",
            actual: kind.describe(),
        });
    }

    let name = fresh_name(universe, &universe.name_of(base));
    let mut builder = universe.define_class(name.clone()).implements(base);
    for method in interface_surface(universe, base) {
        let body: NativeFn = match table.get(&method.name) {
            Some(behavior) => behavior.to_native(),
            None => {
                let method_name = method.name.clone();
                let standin_name = name.clone();
                Rc::new(move |u: &TypeUniverse, _: Option<&ObjRef>, _: &[Value]| {
                    Err(u.throw(
                        u.well_known().runtime_exception,
                        format!("could not call `{method_name}` on `{standin_name}`"),
                    ))
                })
            }
        };
        let mut scripted = MethodDef::new(
            method.name.clone(),
            method.params.clone(),
            method.return_type.clone(),
        );
        scripted.body = Some(body);
        builder = builder.method(scripted);
    }
    let class = builder
        .install()
        .map_err(|e| Failure::InvalidSpec(e.to_string()))?;

    tracing::debug!(
        target = "rubric.harness",
        interface = %universe.name_of(base),
        standin = %name,
        "structural stand-in synthesized"
    );

    Ok(StandIn {
        obj: universe.new_instance_raw(class),
    })
}

/// All methods of an interface and the interfaces it extends.
fn interface_surface(universe: &TypeUniverse, base: TypeId) -> Vec<MethodDef> {
    let mut surface: Vec<MethodDef> = Vec::new();
    let mut queue = vec![base];
    let mut seen = Vec::new();
    while let Some(interface) = queue.pop() {
        if seen.contains(&interface) {
            continue;
        }
        seen.push(interface);
        for method in universe.declared_methods(interface) {
            let already = surface.iter().any(|m| {
                m.name == method.name
                    && m.params.len() == method.params.len()
                    && m.params
                        .iter()
                        .zip(&method.params)
                        .all(|(a, b)| a.raw() == b.raw())
            });
            if !already {
                surface.push(method);
            }
        }
        queue.extend(universe.interfaces(interface));
    }
    surface
}
