//! Modeled rental-store assignment used by the harness integration tests.
//!
//! [`rental_store`] installs a well-formed solution (abstract `Item` with
//! `Purchase`/`Rental`/`Lease` subclasses, a polymorphic `Order`) plus a set
//! of deliberately flawed variants the negative tests grade against.

#![forbid(unsafe_code)]

use rubric_model::{
    ConstructorDef, MethodDef, ObjRef, Thrown, TypeId, TypeRef, TypeUniverse, Value, Visibility,
};

/// Ids of every fixture type, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct RentalStore {
    pub priceable: TypeId,
    pub taxable: TypeId,
    pub discountable: TypeId,
    pub item: TypeId,
    pub purchase: TypeId,
    pub rental: TypeId,
    pub lease: TypeId,
    pub order: TypeId,
    pub invalid_item_exception: TypeId,
    pub broken_item_exception: TypeId,
    pub exposed_lease: TypeId,
    pub sloppy_order: TypeId,
    pub price_book: TypeId,
}

fn receiver<'a>(u: &TypeUniverse, recv: Option<&'a ObjRef>) -> Result<&'a ObjRef, Thrown> {
    recv.ok_or_else(|| {
        u.throw(
            u.well_known().illegal_state_exception,
            "instance method called without a receiver",
        )
    })
}

fn decimal_arg(u: &TypeUniverse, args: &[Value], index: usize) -> Result<f64, Thrown> {
    args.get(index).and_then(Value::as_decimal).ok_or_else(|| {
        u.throw(
            u.well_known().illegal_argument_exception,
            format!("expected a BigDecimal at argument {index}"),
        )
    })
}

fn int_arg(u: &TypeUniverse, args: &[Value], index: usize) -> Result<i64, Thrown> {
    args.get(index).and_then(Value::as_int).ok_or_else(|| {
        u.throw(
            u.well_known().illegal_argument_exception,
            format!("expected an int at argument {index}"),
        )
    })
}

fn object_arg<'a>(u: &TypeUniverse, args: &'a [Value], index: usize) -> Result<&'a ObjRef, Thrown> {
    args.get(index).and_then(Value::as_object).ok_or_else(|| {
        u.throw(
            u.well_known().illegal_argument_exception,
            format!("expected an object at argument {index}"),
        )
    })
}

fn field_decimal(obj: &ObjRef, field: &str) -> f64 {
    obj.get(field).and_then(|v| v.as_decimal()).unwrap_or(0.0)
}

fn field_int(obj: &ObjRef, field: &str) -> i64 {
    obj.get(field).and_then(|v| v.as_int()).unwrap_or(0)
}

/// Install the full fixture domain into `universe`.
///
/// # Panics
///
/// Panics if any fixture type is already registered; install into a fresh
/// universe.
pub fn rental_store(universe: &TypeUniverse) -> RentalStore {
    let wk = *universe.well_known();
    let decimal = TypeRef::new(wk.big_decimal);
    let int = TypeRef::new(wk.int_ty);
    let void = TypeRef::new(wk.void_ty);
    let string = TypeRef::new(wk.string);

    let priceable = universe
        .define_interface("Priceable")
        .method(MethodDef::new("totalPrice", vec![], decimal.clone()).abstract_())
        .install()
        .expect("fixture registration");

    // Marker interfaces for the ambiguous-overload scenarios.
    let taxable = universe
        .define_interface("Taxable")
        .install()
        .expect("fixture registration");
    let discountable = universe
        .define_interface("Discountable")
        .install()
        .expect("fixture registration");

    let item = universe
        .define_class("Item")
        .abstract_()
        .implements(priceable)
        .field("price", Visibility::Private, decimal.clone())
        .constructor(
            ConstructorDef::new(vec![], |u, this, _| {
                let this = receiver(u, this)?;
                this.set("price", Value::Decimal(0.0));
                Ok(Value::Unit)
            })
            .visibility(Visibility::Protected),
        )
        .method(
            MethodDef::new("getPrice", vec![], decimal.clone()).body(|u, this, _| {
                Ok(Value::Decimal(field_decimal(receiver(u, this)?, "price")))
            }),
        )
        .method(
            MethodDef::new("setPrice", vec![decimal.clone()], void.clone()).body(
                |u, this, args| {
                    receiver(u, this)?.set("price", Value::Decimal(decimal_arg(u, args, 0)?));
                    Ok(Value::Unit)
                },
            ),
        )
        .method(MethodDef::new("totalPrice", vec![], decimal.clone()).abstract_())
        .install()
        .expect("fixture registration");

    let purchase = universe
        .define_class("Purchase")
        .extends(item)
        .implements(taxable)
        .implements(discountable)
        .field("productName", Visibility::Private, string.clone())
        .constructor(ConstructorDef::new(
            vec![string.clone(), decimal.clone()],
            |u, this, args| {
                let this = receiver(u, this)?;
                this.set("productName", args[0].clone());
                this.set("price", Value::Decimal(decimal_arg(u, args, 1)?));
                Ok(Value::Unit)
            },
        ))
        .method(
            MethodDef::new("getProductName", vec![], string.clone()).body(|u, this, _| {
                Ok(receiver(u, this)?
                    .get("productName")
                    .unwrap_or(Value::text("")))
            }),
        )
        .method(
            MethodDef::new("totalPrice", vec![], decimal.clone()).body(|u, this, _| {
                Ok(Value::Decimal(field_decimal(receiver(u, this)?, "price")))
            }),
        )
        .install()
        .expect("fixture registration");

    let rental = universe
        .define_class("Rental")
        .extends(item)
        .field("days", Visibility::Private, int.clone())
        .constructor(ConstructorDef::new(
            vec![decimal.clone(), int.clone()],
            |u, this, args| {
                let this = receiver(u, this)?;
                this.set("price", Value::Decimal(decimal_arg(u, args, 0)?));
                this.set("days", Value::Int(int_arg(u, args, 1)?));
                Ok(Value::Unit)
            },
        ))
        .method(
            MethodDef::new("getDays", vec![], int.clone()).body(|u, this, _| {
                Ok(Value::Int(field_int(receiver(u, this)?, "days")))
            }),
        )
        .method(
            MethodDef::new("totalPrice", vec![], decimal.clone()).body(|u, this, _| {
                let this = receiver(u, this)?;
                let days = field_int(this, "days");
                if days < 0 {
                    return Err(u.throw(
                        u.well_known().illegal_argument_exception,
                        "negative rental period",
                    ));
                }
                Ok(Value::Decimal(field_decimal(this, "price") * days as f64))
            }),
        )
        .install()
        .expect("fixture registration");

    let invalid_item_exception = universe
        .define_class("InvalidItemException")
        .extends(wk.exception)
        .install()
        .expect("fixture registration");
    let broken_item_exception = universe
        .define_class("BrokenItemException")
        .extends(wk.runtime_exception)
        .install()
        .expect("fixture registration");

    let lease = universe
        .define_class("Lease")
        .extends(item)
        .field("licensePlate", Visibility::Private, string.clone())
        .field("months", Visibility::Private, int.clone())
        .constructor(ConstructorDef::new(
            vec![string.clone(), decimal.clone(), int.clone()],
            |u, this, args| {
                let this = receiver(u, this)?;
                this.set("licensePlate", args[0].clone());
                this.set("price", Value::Decimal(decimal_arg(u, args, 1)?));
                this.set("months", Value::Int(int_arg(u, args, 2)?));
                Ok(Value::Unit)
            },
        ))
        .method(
            MethodDef::new("getLicensePlate", vec![], string.clone()).body(|u, this, _| {
                Ok(receiver(u, this)?
                    .get("licensePlate")
                    .unwrap_or(Value::text("")))
            }),
        )
        .method(
            MethodDef::new("getPricePerMonth", vec![], decimal.clone()).body(|u, this, _| {
                Ok(Value::Decimal(field_decimal(receiver(u, this)?, "price")))
            }),
        )
        .method(
            MethodDef::new("getNumberOfMonths", vec![], int.clone()).body(|u, this, _| {
                Ok(Value::Int(field_int(receiver(u, this)?, "months")))
            }),
        )
        .method(
            MethodDef::new("totalPrice", vec![], decimal.clone()).body(|u, this, _| {
                let this = receiver(u, this)?;
                let months = field_int(this, "months");
                if months <= 0 {
                    return Err(u.throw(
                        u.well_known().arithmetic_exception,
                        "non-positive lease term",
                    ));
                }
                Ok(Value::Decimal(field_decimal(this, "price") * months as f64))
            }),
        )
        .method(
            MethodDef::new("renew", vec![int.clone()], void.clone())
                .throws(vec![invalid_item_exception, broken_item_exception])
                .body(move |u, this, args| {
                    let this = receiver(u, this)?;
                    let extension = int_arg(u, args, 0)?;
                    if extension <= 0 {
                        return Err(u.throw(invalid_item_exception, "lease extension must be positive"));
                    }
                    this.set("months", Value::Int(field_int(this, "months") + extension));
                    Ok(Value::Unit)
                }),
        )
        .install()
        .expect("fixture registration");

    let list_of_item = TypeRef::generic(wk.list, vec![TypeRef::new(item)]);
    let item_ref = TypeRef::new(item);

    let order = universe
        .define_class("Order")
        .field("items", Visibility::Private, list_of_item.clone())
        .field("total", Visibility::Private, decimal.clone())
        .constructor(ConstructorDef::new(vec![], |u, this, _| {
            let this = receiver(u, this)?;
            this.set("items", Value::empty_list());
            this.set("total", Value::Decimal(0.0));
            Ok(Value::Unit)
        }))
        .method(
            MethodDef::new("addItem", vec![item_ref.clone()], void.clone()).body(
                |u, this, args| {
                    let this = receiver(u, this)?;
                    let item = object_arg(u, args, 0)?;
                    // The polymorphism under test: whatever subclass arrived,
                    // its own totalPrice decides the contribution.
                    let contribution = u.call_virtual(item, "totalPrice", &[])?;
                    if let Some(Value::List(items)) = this.get("items") {
                        items.borrow_mut().push(args[0].clone());
                    }
                    let total = field_decimal(this, "total");
                    this.set(
                        "total",
                        Value::Decimal(total + contribution.as_decimal().unwrap_or(0.0)),
                    );
                    Ok(Value::Unit)
                },
            ),
        )
        .method(
            MethodDef::new("getTotal", vec![], decimal.clone()).body(|u, this, _| {
                Ok(Value::Decimal(field_decimal(receiver(u, this)?, "total")))
            }),
        )
        .method(
            MethodDef::new("getItems", vec![], list_of_item.clone()).body(|u, this, _| {
                Ok(receiver(u, this)?
                    .get("items")
                    .unwrap_or_else(Value::empty_list))
            }),
        )
        .method(
            MethodDef::new("setTotal", vec![decimal.clone()], void.clone()).body(
                |u, this, args| {
                    receiver(u, this)?.set("total", Value::Decimal(decimal_arg(u, args, 0)?));
                    Ok(Value::Unit)
                },
            ),
        )
        .method(
            MethodDef::new("main", vec![string.clone().array_of()], void.clone())
                .static_()
                .body(|_, _, _| Ok(Value::Unit)),
        )
        .install()
        .expect("fixture registration");

    // A lease with its plate hanging out: fails the encapsulation pillar.
    let exposed_lease = universe
        .define_class("ExposedLease")
        .field("licensePlate", Visibility::Public, string.clone())
        .field("months", Visibility::Private, int.clone())
        .constructor(ConstructorDef::new(vec![], |u, this, _| {
            let this = receiver(u, this)?;
            this.set("licensePlate", Value::text(""));
            this.set("months", Value::Int(0));
            Ok(Value::Unit)
        }))
        .install()
        .expect("fixture registration");

    // Accepts the base type but secretly prices only concrete purchases:
    // fails the polymorphism probe.
    let sloppy_order = universe
        .define_class("SloppyOrder")
        .field("items", Visibility::Private, list_of_item.clone())
        .field("total", Visibility::Private, decimal.clone())
        .constructor(ConstructorDef::new(vec![], |u, this, _| {
            let this = receiver(u, this)?;
            this.set("items", Value::empty_list());
            this.set("total", Value::Decimal(0.0));
            Ok(Value::Unit)
        }))
        .method(
            MethodDef::new("addItem", vec![item_ref.clone()], void.clone()).body(
                move |u, this, args| {
                    let this = receiver(u, this)?;
                    let item = object_arg(u, args, 0)?;
                    if let Some(Value::List(items)) = this.get("items") {
                        items.borrow_mut().push(args[0].clone());
                    }
                    if item.class == purchase {
                        let total = field_decimal(this, "total");
                        this.set("total", Value::Decimal(total + field_decimal(item, "price")));
                    }
                    Ok(Value::Unit)
                },
            ),
        )
        .method(
            MethodDef::new("getTotal", vec![], decimal.clone()).body(|u, this, _| {
                Ok(Value::Decimal(field_decimal(receiver(u, this)?, "total")))
            }),
        )
        .method(
            MethodDef::new("getItems", vec![], list_of_item.clone()).body(|u, this, _| {
                Ok(receiver(u, this)?
                    .get("items")
                    .unwrap_or_else(Value::empty_list))
            }),
        )
        .install()
        .expect("fixture registration");

    // Overload playground for the resolver tests.
    let price_book = universe
        .define_class("PriceBook")
        .constructor(ConstructorDef::new(vec![], |_, _, _| Ok(Value::Unit)))
        .method(
            MethodDef::new("appraise", vec![TypeRef::new(wk.object)], decimal.clone())
                .body(|_, _, _| Ok(Value::Decimal(1.0))),
        )
        .method(
            MethodDef::new("appraise", vec![item_ref.clone()], decimal.clone())
                .body(|_, _, _| Ok(Value::Decimal(2.0))),
        )
        .method(
            MethodDef::new("appraise", vec![TypeRef::new(purchase)], decimal.clone())
                .body(|_, _, _| Ok(Value::Decimal(3.0))),
        )
        .method(
            MethodDef::new("total", vec![], decimal.clone()).body(|_, _, _| {
                Ok(Value::Decimal(0.0))
            }),
        )
        .method(
            MethodDef::new("total", vec![int.clone()], decimal.clone()).body(|u, _, args| {
                Ok(Value::Decimal(int_arg(u, args, 0)? as f64))
            }),
        )
        .method(
            MethodDef::new("rate", vec![TypeRef::new(taxable)], decimal.clone())
                .body(|_, _, _| Ok(Value::Decimal(1.0))),
        )
        .method(
            MethodDef::new("rate", vec![TypeRef::new(discountable)], decimal.clone())
                .body(|_, _, _| Ok(Value::Decimal(2.0))),
        )
        .method(
            MethodDef::new("scale", vec![int.clone()], decimal.clone()).body(|u, _, args| {
                Ok(Value::Decimal(int_arg(u, args, 0)? as f64))
            }),
        )
        .method(
            MethodDef::new("version", vec![], string.clone())
                .static_()
                .body(|_, _, _| Ok(Value::text("1.0"))),
        )
        .install()
        .expect("fixture registration");

    RentalStore {
        priceable,
        taxable,
        discountable,
        item,
        purchase,
        rental,
        lease,
        order,
        invalid_item_exception,
        broken_item_exception,
        exposed_lease,
        sloppy_order,
        price_book,
    }
}
