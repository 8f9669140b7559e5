use pretty_assertions::assert_eq;
use rubric_harness::min_distance;
use rubric_model::{RawType, TypeId, TypeUniverse};

/// `Grandparent` → `Parent` → `Child`, with an interface `Traceable`
/// implemented by `Parent`.
fn lineage(u: &TypeUniverse) -> (TypeId, TypeId, TypeId, TypeId) {
    let traceable = u.define_interface("Traceable").install().unwrap();
    let grandparent = u.define_class("Grandparent").install().unwrap();
    let parent = u
        .define_class("Parent")
        .extends(grandparent)
        .implements(traceable)
        .install()
        .unwrap();
    let child = u.define_class("Child").extends(parent).install().unwrap();
    (grandparent, parent, child, traceable)
}

#[test]
fn distance_to_self_is_zero() {
    let u = TypeUniverse::new();
    let (grandparent, parent, child, traceable) = lineage(&u);
    for id in [grandparent, parent, child, traceable, u.well_known().object] {
        assert_eq!(min_distance(&u, RawType::of(id), RawType::of(id)), 0);
    }
}

#[test]
fn class_distance_counts_superclass_steps() {
    let u = TypeUniverse::new();
    let (grandparent, parent, child, _) = lineage(&u);

    assert_eq!(min_distance(&u, RawType::of(child), RawType::of(parent)), 1);
    assert_eq!(
        min_distance(&u, RawType::of(child), RawType::of(grandparent)),
        2
    );
    assert_eq!(
        min_distance(&u, RawType::of(child), RawType::of(u.well_known().object)),
        3
    );
}

#[test]
fn interface_distance_takes_the_shortest_path() {
    let u = TypeUniverse::new();
    let (_, parent, child, traceable) = lineage(&u);

    assert_eq!(min_distance(&u, RawType::of(parent), RawType::of(traceable)), 1);
    assert_eq!(min_distance(&u, RawType::of(child), RawType::of(traceable)), 2);
}

#[test]
fn diamond_paths_resolve_to_the_minimum() {
    let u = TypeUniverse::new();
    let deep = u.define_interface("Deep").install().unwrap();
    let shallow = u
        .define_interface("Shallow")
        .implements(deep)
        .install()
        .unwrap();
    // Both a direct edge to `Deep` and a longer route through `Shallow`.
    let c = u
        .define_class("Both")
        .implements(shallow)
        .implements(deep)
        .install()
        .unwrap();

    assert_eq!(min_distance(&u, RawType::of(c), RawType::of(deep)), 1);
    assert_eq!(min_distance(&u, RawType::of(c), RawType::of(shallow)), 1);
}

#[test]
fn array_distance_measures_element_types() {
    let u = TypeUniverse::new();
    let wk = *u.well_known();
    let string_array = RawType {
        id: wk.string,
        dims: 1,
    };
    let object_array = RawType {
        id: wk.object,
        dims: 1,
    };

    assert_eq!(min_distance(&u, string_array, object_array), 1);
    assert_eq!(min_distance(&u, string_array, RawType::of(wk.object)), 1);
}

#[test]
#[should_panic(expected = "is not a supertype")]
fn distance_is_undefined_for_non_ancestors() {
    let u = TypeUniverse::new();
    let (_, parent, _, _) = lineage(&u);
    let unrelated = u.define_class("Unrelated").install().unwrap();
    min_distance(&u, RawType::of(parent), RawType::of(unrelated));
}
