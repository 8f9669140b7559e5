use std::cell::RefCell;
use std::rc::Rc;

use rubric_model::{ObjRef, Thrown, TypeId, TypeUniverse, Value};

use crate::descriptor::Registry;
use crate::error::{Failure, Verify};
use crate::overload::best_match;

/// A live instance bound to the registry of the descriptor that created it.
/// All invocation goes through the registered contracts; nothing is looked up
/// against the live type that was not verified first.
#[derive(Debug)]
pub struct InstanceHandle<'u> {
    universe: &'u TypeUniverse,
    obj: ObjRef,
    registry: Rc<RefCell<Registry>>,
}

impl<'u> InstanceHandle<'u> {
    pub(crate) fn new(
        universe: &'u TypeUniverse,
        obj: ObjRef,
        registry: Rc<RefCell<Registry>>,
    ) -> Self {
        Self {
            universe,
            obj,
            registry,
        }
    }

    /// The underlying object, as a value to pass into other invocations.
    pub fn value(&self) -> Value {
        Value::Object(self.obj.clone())
    }

    pub fn object(&self) -> &ObjRef {
        &self.obj
    }

    pub fn class_name(&self) -> String {
        self.universe.name_of(self.obj.class)
    }

    /// Invoke a registered method, converting any subject-raised exception
    /// into a terminal failure (the caller expects success).
    pub fn call(&self, name: &str, args: &[Value]) -> Verify<Value> {
        call(
            self.universe,
            &self.registry,
            &self.class_name(),
            Some(&self.obj),
            name,
            args,
        )
    }

    /// Invoke a registered method, letting a subject-raised exception
    /// propagate verbatim (the caller is probing failure behavior).
    pub fn call_expecting_failure(
        &self,
        name: &str,
        args: &[Value],
    ) -> Verify<Result<Value, Thrown>> {
        invoke_registered(
            self.universe,
            &self.registry,
            &self.class_name(),
            Some(&self.obj),
            name,
            args,
        )
    }

    /// Invoke a registered method and require it to raise an instance of
    /// `expected`; returns the propagated exception on success.
    pub fn assert_fails_with(
        &self,
        expected: TypeId,
        name: &str,
        args: &[Value],
    ) -> Verify<Thrown> {
        assert_fails_with(
            self.universe,
            &self.registry,
            &self.class_name(),
            Some(&self.obj),
            expected,
            name,
            args,
        )
    }
}

/// Core of the invocation bridge: gate on the registry, resolve the overload
/// against the concrete arguments, re-resolve virtually against the
/// receiver's class, and invoke. The inner `Result` carries the subject's
/// own exception; the outer one carries harness failures.
pub(crate) fn invoke_registered(
    universe: &TypeUniverse,
    registry: &Rc<RefCell<Registry>>,
    owner: &str,
    receiver: Option<&ObjRef>,
    name: &str,
    args: &[Value],
) -> Verify<Result<Value, Thrown>> {
    let overloads = registry
        .borrow()
        .methods
        .get(name)
        .cloned()
        .filter(|entries| !entries.is_empty())
        .ok_or_else(|| Failure::UnregisteredMethod {
            owner: owner.to_string(),
            name: name.to_string(),
        })?;

    let matched = best_match(universe, &overloads, args)?;
    let Some(callable) = matched else {
        let rendered: Vec<String> = args.iter().map(|a| universe.display_value(a)).collect();
        return Err(Failure::NoMatchingOverload {
            owner: owner.to_string(),
            name: name.to_string(),
            args: rendered.join(", "),
        });
    };

    // The registered callable names the declared signature; the receiver's
    // concrete class decides which implementation actually runs.
    let slot = match (callable.is_static, receiver) {
        (false, Some(receiver)) => universe
            .find_override(receiver.class, &callable.name, &callable.params)
            .unwrap_or(callable.slot),
        _ => callable.slot,
    };

    tracing::debug!(
        target = "rubric.harness",
        owner = %owner,
        method = %callable.name,
        "invoking registered method"
    );
    Ok(universe.invoke_slot(slot, receiver, args))
}

pub(crate) fn call(
    universe: &TypeUniverse,
    registry: &Rc<RefCell<Registry>>,
    owner: &str,
    receiver: Option<&ObjRef>,
    name: &str,
    args: &[Value],
) -> Verify<Value> {
    match invoke_registered(universe, registry, owner, receiver, name, args)? {
        Ok(value) => Ok(value),
        Err(thrown) => Err(Failure::UnexpectedTargetException {
            owner: owner.to_string(),
            name: name.to_string(),
            thrown: universe.describe_thrown(&thrown),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn assert_fails_with(
    universe: &TypeUniverse,
    registry: &Rc<RefCell<Registry>>,
    owner: &str,
    receiver: Option<&ObjRef>,
    expected: TypeId,
    name: &str,
    args: &[Value],
) -> Verify<Thrown> {
    match invoke_registered(universe, registry, owner, receiver, name, args)? {
        Ok(_) => Err(Failure::ExpectedExceptionMissing {
            owner: owner.to_string(),
            name: name.to_string(),
            expected: universe.name_of(expected),
        }),
        Err(thrown) if universe.is_subtype(thrown.class, expected) => Ok(thrown),
        Err(thrown) => Err(Failure::ExpectedExceptionMismatch {
            owner: owner.to_string(),
            name: name.to_string(),
            expected: universe.name_of(expected),
            actual: universe.name_of(thrown.class),
        }),
    }
}
