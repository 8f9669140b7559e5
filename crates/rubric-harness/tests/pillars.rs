//! End-to-end structural checks over the rental-store fixtures: the
//! encapsulation, inheritance and interface pillars, plus kind-checked
//! resolution.

use pretty_assertions::assert_eq;
use rubric_fixtures::rental_store;
use rubric_harness::{ClassHandle, Failure};
use rubric_model::{MethodDef, TypeRef, TypeUniverse, Value, Visibility};

#[test]
fn resolution_is_kind_checked() {
    let u = TypeUniverse::new();
    rental_store(&u);

    assert_eq!(
        ClassHandle::resolve_class(&u, "Camper").unwrap_err(),
        Failure::TypeNotFound("Camper".to_string())
    );
    assert_eq!(
        ClassHandle::resolve_class(&u, "Priceable").unwrap_err(),
        Failure::KindMismatch {
            name: "Priceable".to_string(),
            expected: "a class",
            actual: "an interface",
        }
    );
    assert_eq!(
        ClassHandle::resolve_interface(&u, "Lease").unwrap_err(),
        Failure::KindMismatch {
            name: "Lease".to_string(),
            expected: "an interface",
            actual: "a class",
        }
    );
    assert_eq!(
        ClassHandle::resolve_class(&u, "int").unwrap_err(),
        Failure::KindMismatch {
            name: "int".to_string(),
            expected: "a class",
            actual: "a primitive",
        }
    );
}

#[test]
fn fields_must_be_encapsulated() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    lease.require_encapsulated_fields().unwrap();

    let exposed = ClassHandle::resolve_class(&u, "ExposedLease").unwrap();
    assert_eq!(
        exposed.require_encapsulated_fields().unwrap_err(),
        Failure::UnencapsulatedField {
            owner: "ExposedLease".to_string(),
            field: "licensePlate".to_string(),
            actual: Visibility::Public,
        }
    );
}

#[test]
fn item_subclasses_inherit_from_an_abstract_base() {
    let u = TypeUniverse::new();
    rental_store(&u);

    for name in ["Lease", "Purchase", "Rental"] {
        let handle = ClassHandle::resolve_class(&u, name).unwrap();
        let superclass = handle.superclass().unwrap();
        assert_eq!(superclass.name(), "Item");
        assert!(superclass.is_abstract(), "{name}'s base should be abstract");
    }
}

#[test]
fn the_root_type_has_no_superclass() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let object = ClassHandle::resolve_class(&u, "Object").unwrap();
    assert_eq!(
        object.superclass().unwrap_err(),
        Failure::NoSuperclass("Object".to_string())
    );
}

#[test]
fn require_implements_checks_the_subtype_relation() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let priceable = ClassHandle::resolve_interface(&u, "Priceable").unwrap();
    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    lease.require_implements(&priceable).unwrap();

    let mut exposed = ClassHandle::resolve_class(&u, "ExposedLease").unwrap();
    assert_eq!(
        exposed.require_implements(&priceable).unwrap_err(),
        Failure::NotASubtype {
            child: "ExposedLease".to_string(),
            parent: "Priceable".to_string(),
        }
    );
}

#[test]
fn require_implements_adopts_the_parent_contracts() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut priceable = ClassHandle::resolve_interface(&u, "Priceable").unwrap();
    priceable
        .require_method(|m| m.named("totalPrice"))
        .unwrap();

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    lease
        .require_constructor(vec![
            TypeRef::new(wk.string),
            TypeRef::new(wk.big_decimal),
            TypeRef::new(wk.int_ty),
        ])
        .unwrap()
        .require_implements(&priceable)
        .unwrap();

    // totalPrice was verified against the interface only; the adopted
    // contract drives the implementor's override.
    let lease = lease
        .new_instance(&[Value::text("XYZ-987"), Value::Decimal(100.0), Value::Int(4)])
        .unwrap();
    assert_eq!(lease.call("totalPrice", &[]).unwrap(), Value::Decimal(400.0));
}

#[test]
fn checked_exceptions_are_distinguished_from_unchecked() {
    let u = TypeUniverse::new();
    rental_store(&u);

    ClassHandle::resolve_class(&u, "InvalidItemException")
        .unwrap()
        .require_checked_exception()
        .unwrap();

    let broken = ClassHandle::resolve_class(&u, "BrokenItemException").unwrap();
    assert_eq!(
        broken.require_checked_exception().unwrap_err(),
        Failure::NotACheckedException {
            name: "BrokenItemException".to_string(),
            reason: "it inherits from `RuntimeException`".to_string(),
        }
    );

    let lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    assert_eq!(
        lease.require_checked_exception().unwrap_err(),
        Failure::NotACheckedException {
            name: "Lease".to_string(),
            reason: "it does not inherit from `Exception`".to_string(),
        }
    );
}

#[test]
fn getters_follow_the_naming_convention() {
    let u = TypeUniverse::new();
    let store = rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    order
        .require_getter("total", TypeRef::new(wk.big_decimal))
        .unwrap()
        .require_getter(
            "items",
            TypeRef::generic(wk.list, vec![TypeRef::new(store.item)]),
        )
        .unwrap();
    assert_eq!(order.approved_methods("getTotal").len(), 1);

    let failure = order
        .require_getter("plate", TypeRef::new(wk.string))
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::MethodNotFound {
            kind: "class",
            owner: "Order".to_string(),
            signature: "public String getPlate()".to_string(),
        }
    );
}

#[test]
fn main_entry_points_must_be_public_static_void() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    order.require_main_entry_point().unwrap();

    let mut book = ClassHandle::resolve_class(&u, "PriceBook").unwrap();
    assert!(matches!(
        book.require_main_entry_point().unwrap_err(),
        Failure::MethodNotFound { .. }
    ));

    // An instance-level main(String[]) is found but flunks the static check.
    u.define_class("Tool")
        .method(
            MethodDef::new(
                "main",
                vec![TypeRef::new(wk.string).array_of()],
                TypeRef::new(wk.void_ty),
            )
            .body(|_, _, _| Ok(Value::Unit)),
        )
        .install()
        .unwrap();
    let mut tool = ClassHandle::resolve_class(&u, "Tool").unwrap();
    assert_eq!(
        tool.require_main_entry_point().unwrap_err(),
        Failure::StaticityMismatch {
            owner: "Tool".to_string(),
            name: "main".to_string(),
        }
    );
}

#[test]
fn report_require_panics_with_the_formatted_message() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let outcome = ClassHandle::resolve_class(&u, "Missing");
    let panicked = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        rubric_harness::report::require(outcome)
    }));
    let message = panicked
        .expect_err("require should abort on a failure")
        .downcast::<String>()
        .expect("panic payload should be the formatted message");
    assert_eq!(
        *message,
        "expected to find a type named `Missing` but did not"
    );
}
