//! Runtime type universe backing the Rubric verification harness.
//!
//! Rust has no runtime reflection, so the "live host environment" the harness
//! inspects is modeled explicitly: classes, interfaces and primitives are
//! registered here with their methods, constructors, fields, visibility and
//! declared exceptions, and method bodies are native closures over type-erased
//! [`Value`]s. The harness crate depends only on this crate's query surface.

#![forbid(unsafe_code)]

mod types;
mod universe;
mod value;

pub use crate::types::{
    ConstructorDef, FieldDef, MemberSlot, MethodDef, NativeFn, RawType, TypeDef, TypeId, TypeKind,
    TypeRef, Visibility,
};
pub use crate::universe::{ClassBuilder, DefineError, TypeUniverse, WellKnown};
pub use crate::value::{ArrayValue, Instance, ObjRef, Thrown, Value};
