use rubric_model::{RawType, TypeKind, TypeUniverse};

/// Minimum number of inheritance/interface-implementation hops between a
/// concrete type and a compatible ancestor. `distance(t, t)` is 0.
///
/// For a class ancestor this is the length of the superclass chain up to
/// `upper`. For an interface ancestor it is the recursive minimum over the
/// superclass edge and every directly-implemented interface edge, because an
/// interface may be reachable through several paths of different lengths and
/// the shortest must win.
///
/// Array references measure the distance between their element types; the
/// universal base type is an ancestor of every array at one hop.
///
/// # Panics
///
/// Panics if `upper` is not a compatible ancestor of `lower`. Overload
/// scoring only asks for distances between types it already proved
/// assignable, so reaching the panic means a harness bug.
pub fn min_distance(universe: &TypeUniverse, lower: RawType, upper: RawType) -> u32 {
    if lower == upper {
        return 0;
    }
    assert!(
        universe.is_assignable(lower, upper),
        "`{}` is not a supertype of `{}`",
        universe.display_raw(upper),
        universe.display_raw(lower),
    );

    if lower.dims > 0 && upper.dims > 0 {
        return min_distance(universe, lower.element(), upper.element());
    }

    let object = RawType::of(universe.well_known().object);
    if upper == object && lower.dims > 0 {
        return 1;
    }

    if upper.dims == 0 && universe.kind(upper.id) == TypeKind::Interface {
        let mut min = u32::MAX;
        if let Some(superclass) = universe.superclass(lower.id) {
            let superclass = RawType::of(superclass);
            if universe.is_assignable(superclass, upper) {
                min = min.min(min_distance(universe, superclass, upper) + 1);
            }
        }
        for interface in universe.interfaces(lower.id) {
            let interface = RawType::of(interface);
            if !universe.is_assignable(interface, upper) {
                continue;
            }
            min = min.min(min_distance(universe, interface, upper) + 1);
        }
        min
    } else {
        // Superclass chain walk; `upper` was proven an ancestor above.
        let mut steps = 0;
        let mut current = Some(lower.id);
        while let Some(c) = current {
            if c == upper.id {
                break;
            }
            steps += 1;
            current = universe.superclass(c);
        }
        steps
    }
}
