//! Structural verification harness over a [`rubric_model`] type universe.
//!
//! A grading script resolves a [`ClassHandle`] for the subject under test,
//! registers method and constructor contracts against it, then either drives
//! a real instance through the invocation bridge or passes scripted
//! [`StandIn`]s into it and observes the effects. Every contract violation is
//! reported as a [`Failure`] through the [`Verify`] channel; exceptions raised
//! by the subject itself travel separately as [`rubric_model::Thrown`].
//!
//! ```
//! use rubric_harness::{ClassHandle, Verify};
//! use rubric_model::{TypeRef, TypeUniverse, Value};
//!
//! fn check(universe: &TypeUniverse) -> Verify<()> {
//!     let wk = *universe.well_known();
//!     let mut order = ClassHandle::resolve_class(universe, "Order")?;
//!     order
//!         .require_constructor(vec![])?
//!         .require_getter("total", TypeRef::new(wk.big_decimal))?;
//!     let order = order.new_instance(&[])?;
//!     order.call("getTotal", &[])?;
//!     Ok(())
//! }
//! # let universe = TypeUniverse::new();
//! # let _ = check(&universe);
//! ```

#![forbid(unsafe_code)]

mod callable;
mod constraint;
mod descriptor;
mod distance;
mod error;
mod invoke;
mod overload;
mod standin;

pub use crate::callable::ResolvedCallable;
pub use crate::constraint::MethodSpec;
pub use crate::descriptor::ClassHandle;
pub use crate::distance::min_distance;
pub use crate::error::{report, Failure, Verify};
pub use crate::invoke::InstanceHandle;
pub use crate::overload::best_match;
pub use crate::standin::{Behavior, BehaviorTable, StandIn};
