use pretty_assertions::assert_eq;
use rubric_fixtures::rental_store;
use rubric_harness::{ClassHandle, Failure, InstanceHandle};
use rubric_model::{TypeRef, TypeUniverse, Value};

fn lease_handle<'u>(u: &'u TypeUniverse) -> ClassHandle<'u> {
    let wk = *u.well_known();
    let mut lease = ClassHandle::resolve_class(u, "Lease").unwrap();
    lease
        .require_constructor(vec![
            TypeRef::new(wk.string),
            TypeRef::new(wk.big_decimal),
            TypeRef::new(wk.int_ty),
        ])
        .unwrap()
        .require_method(|m| {
            m.public()
                .named("totalPrice")
                .returns(TypeRef::new(wk.big_decimal))
        })
        .unwrap();
    lease
}

fn new_lease<'u>(u: &'u TypeUniverse, months: i64) -> InstanceHandle<'u> {
    lease_handle(u)
        .new_instance(&[Value::text("ABC-123"), Value::Decimal(250.0), Value::Int(months)])
        .unwrap()
}

#[test]
fn unregistered_names_never_reach_the_live_type() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let lease = new_lease(&u, 12);
    // getLicensePlate exists on the type, but was never required.
    let failure = lease.call("getLicensePlate", &[]).unwrap_err();
    assert_eq!(
        failure,
        Failure::UnregisteredMethod {
            owner: "Lease".to_string(),
            name: "getLicensePlate".to_string(),
        }
    );
}

#[test]
fn call_returns_the_subject_result() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let lease = new_lease(&u, 12);
    assert_eq!(
        lease.call("totalPrice", &[]).unwrap(),
        Value::Decimal(3000.0)
    );
}

#[test]
fn call_converts_subject_exceptions_to_terminal_failures() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let lease = new_lease(&u, 0);
    let failure = lease.call("totalPrice", &[]).unwrap_err();
    assert_eq!(
        failure,
        Failure::UnexpectedTargetException {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
            thrown: "ArithmeticException: non-positive lease term".to_string(),
        }
    );
}

#[test]
fn call_expecting_failure_propagates_the_original_exception() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let lease = new_lease(&u, 0);
    let thrown = lease
        .call_expecting_failure("totalPrice", &[])
        .unwrap()
        .unwrap_err();
    assert_eq!(thrown.class, wk.arithmetic_exception);
    assert_eq!(thrown.message, "non-positive lease term");

    let value = new_lease(&u, 2)
        .call_expecting_failure("totalPrice", &[])
        .unwrap()
        .unwrap();
    assert_eq!(value, Value::Decimal(500.0));
}

#[test]
fn assert_fails_with_accepts_the_expected_exception() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let lease = new_lease(&u, 0);
    let thrown = lease
        .assert_fails_with(wk.arithmetic_exception, "totalPrice", &[])
        .unwrap();
    assert_eq!(thrown.class, wk.arithmetic_exception);

    // A supertype of the raised exception is also satisfied.
    lease
        .assert_fails_with(wk.runtime_exception, "totalPrice", &[])
        .unwrap();
}

#[test]
fn assert_fails_with_rejects_a_normal_return() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let lease = new_lease(&u, 12);
    let failure = lease
        .assert_fails_with(wk.arithmetic_exception, "totalPrice", &[])
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::ExpectedExceptionMissing {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
            expected: "ArithmeticException".to_string(),
        }
    );
}

#[test]
fn assert_fails_with_names_both_types_on_a_mismatch() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let lease = new_lease(&u, 0);
    let failure = lease
        .assert_fails_with(wk.illegal_state_exception, "totalPrice", &[])
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::ExpectedExceptionMismatch {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
            expected: "IllegalStateException".to_string(),
            actual: "ArithmeticException".to_string(),
        }
    );
}

#[test]
fn zero_argument_construction_uses_the_declared_constructor() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    order
        .require_method(|m| {
            m.public()
                .named("getTotal")
                .returns(TypeRef::new(wk.big_decimal))
        })
        .unwrap();
    let order = order.new_instance(&[]).unwrap();
    assert_eq!(order.call("getTotal", &[]).unwrap(), Value::Decimal(0.0));
}

#[test]
fn construction_without_a_matching_registration_fails() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let handle = lease_handle(&u);
    let failure = handle.new_instance(&[Value::Bool(true)]).unwrap_err();
    assert!(
        matches!(failure, Failure::NoMatchingConstructor { ref owner, .. } if owner == "Lease"),
        "unexpected failure: {failure}"
    );
}

#[test]
fn abstract_classes_refuse_instantiation() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let item = ClassHandle::resolve_class(&u, "Item").unwrap();
    let failure = item.new_instance(&[]).unwrap_err();
    assert_eq!(
        failure,
        Failure::ConstructionFailed {
            owner: "Item".to_string(),
            detail: "no args".to_string(),
        }
    );
}

#[test]
fn static_methods_are_called_through_the_class_handle() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut book = ClassHandle::resolve_class(&u, "PriceBook").unwrap();
    book.require_method(|m| {
        m.public()
            .static_()
            .named("version")
            .returns(TypeRef::new(wk.string))
    })
    .unwrap();
    assert_eq!(book.call("version", &[]).unwrap(), Value::text("1.0"));
}

#[test]
fn base_class_contracts_run_the_override() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    // totalPrice is required against the abstract base, then invoked on a
    // concrete Lease instance: the override must run.
    let mut item = ClassHandle::resolve_class(&u, "Item").unwrap();
    item.require_method(|m| {
        m.public()
            .named("totalPrice")
            .returns(TypeRef::new(wk.big_decimal))
    })
    .unwrap();

    let lease = new_lease(&u, 3);
    let bound = item.wrap(lease.object().clone());
    assert_eq!(bound.call("totalPrice", &[]).unwrap(), Value::Decimal(750.0));
}
