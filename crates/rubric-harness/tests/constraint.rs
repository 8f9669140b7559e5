use pretty_assertions::assert_eq;
use rubric_fixtures::rental_store;
use rubric_harness::{ClassHandle, Failure};
use rubric_model::{TypeRef, TypeUniverse, Visibility};

#[test]
fn missing_method_names_the_type_and_attempted_signature() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    // ExposedLease never declares totalPrice.
    let mut handle = ClassHandle::resolve_class(&u, "ExposedLease").unwrap();
    let failure = handle
        .require_method(|m| {
            m.public()
                .named("totalPrice")
                .returns(TypeRef::new(wk.big_decimal))
        })
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::MethodNotFound {
            kind: "class",
            owner: "ExposedLease".to_string(),
            signature: "public BigDecimal totalPrice()".to_string(),
        }
    );
}

#[test]
fn visibility_is_verified_after_resolution() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    let failure = lease
        .require_method(|m| m.private().named("totalPrice"))
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::VisibilityMismatch {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
            required: Visibility::Private,
        }
    );
}

#[test]
fn staticness_is_only_checked_when_required() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    let failure = lease
        .require_method(|m| m.static_().named("totalPrice"))
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::StaticityMismatch {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
        }
    );

    // A static member passes an unconstrained spec untouched.
    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    order.require_method(|m| m.named("main")).unwrap();
}

#[test]
fn generic_return_types_compare_by_display_form() {
    let u = TypeUniverse::new();
    let store = rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    let list_of_lease = TypeRef::generic(wk.list, vec![TypeRef::new(store.lease)]);
    let failure = order
        .require_method(move |m| m.named("getItems").returns(list_of_lease))
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::ReturnTypeMismatch {
            owner: "Order".to_string(),
            name: "getItems".to_string(),
            expected: "List<Lease>".to_string(),
            actual: "List<Item>".to_string(),
        }
    );

    // The right parameterization passes.
    let list_of_item = TypeRef::generic(wk.list, vec![TypeRef::new(store.item)]);
    order
        .require_method(move |m| m.named("getItems").returns(list_of_item))
        .unwrap();
}

#[test]
fn declared_exception_sets_match_in_any_order() {
    let u = TypeUniverse::new();
    let store = rental_store(&u);

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    // Declaration order is (InvalidItemException, BrokenItemException);
    // the requirement lists them reversed.
    lease
        .require_method(move |m| {
            m.named("renew")
                .throws_exactly(vec![store.broken_item_exception, store.invalid_item_exception])
        })
        .unwrap();
}

#[test]
fn exception_set_mismatches_name_both_sides() {
    let u = TypeUniverse::new();
    let store = rental_store(&u);

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    let failure = lease
        .require_method(move |m| {
            m.named("totalPrice")
                .throws_exactly(vec![store.invalid_item_exception])
        })
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::ExceptionSetMismatch {
            owner: "Lease".to_string(),
            name: "totalPrice".to_string(),
            expected: "InvalidItemException".to_string(),
            qualifier: "",
            actual: "doesn't throw anything".to_string(),
        }
    );

    let failure = lease
        .require_method(move |m| {
            m.named("renew")
                .throws_exactly(vec![store.invalid_item_exception])
        })
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::ExceptionSetMismatch {
            owner: "Lease".to_string(),
            name: "renew".to_string(),
            expected: "InvalidItemException".to_string(),
            qualifier: "",
            actual: "throws `InvalidItemException, BrokenItemException`".to_string(),
        }
    );
}

#[test]
fn wildcard_name_resolves_the_first_shape_match() {
    let u = TypeUniverse::new();
    rental_store(&u);

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    // Order's first one-parameter declared method is addItem.
    order.require_method(|m| m.with_parameter_count(1)).unwrap();
    assert_eq!(order.approved_methods("addItem").len(), 1);
}

#[test]
fn parameter_shapes_match_upward_only() {
    let u = TypeUniverse::new();
    let store = rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    // The declared parameter is Item; Object is an acceptable widening...
    order
        .require_method(move |m| {
            m.named("addItem")
                .with_parameters(vec![TypeRef::new(wk.object)])
        })
        .unwrap();
    // ...but a narrowing to Purchase is not the declared shape.
    let failure = order
        .require_method(move |m| {
            m.named("addItem")
                .with_parameters(vec![TypeRef::new(store.purchase)])
        })
        .unwrap_err();
    assert!(matches!(failure, Failure::MethodNotFound { .. }));
}

#[test]
fn overloads_accumulate_in_registration_order() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();
    let decimal = TypeRef::new(wk.big_decimal);

    let mut book = ClassHandle::resolve_class(&u, "PriceBook").unwrap();
    let d = decimal.clone();
    book.require_method(move |m| m.named("total").with_parameters(vec![]).returns(d))
        .unwrap();
    let d = decimal.clone();
    book.require_method(move |m| {
        m.named("total")
            .with_parameters(vec![TypeRef::new(wk.int_ty)])
            .returns(d)
    })
    .unwrap();

    let overloads = book.approved_methods("total");
    assert_eq!(overloads.len(), 2);
    assert_eq!(overloads[0].params.len(), 0);
    assert_eq!(overloads[1].params.len(), 1);
}

#[test]
fn contradictory_parameter_shapes_are_invalid_specs() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut order = ClassHandle::resolve_class(&u, "Order").unwrap();
    let failure = order
        .require_method(move |m| {
            m.named("addItem")
                .with_parameters(vec![TypeRef::new(wk.object)])
                .with_parameter_count(2)
        })
        .unwrap_err();
    assert!(matches!(failure, Failure::InvalidSpec(_)));
}

#[test]
fn missing_constructor_reports_the_attempted_signature() {
    let u = TypeUniverse::new();
    rental_store(&u);
    let wk = *u.well_known();

    let mut lease = ClassHandle::resolve_class(&u, "Lease").unwrap();
    let failure = lease
        .require_constructor(vec![TypeRef::new(wk.string)])
        .unwrap_err();
    assert_eq!(
        failure,
        Failure::MethodNotFound {
            kind: "class",
            owner: "Lease".to_string(),
            signature: "Lease(String)".to_string(),
        }
    );
}
