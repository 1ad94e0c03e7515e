//! Runtime type model
//!
//! Rust has no runtime reflection, so interfaces are described with
//! `TypeInfo` values built by the embedder (or by a binding generator).
//!
//! Architecture:
//! - `interface.rs` - Type and member metadata (TypeInfo, MemberInfo, builder)
//! - `value.rs` - Values crossing the boundary and their declared types

mod interface;
mod value;

pub use interface::{
    EventInfo, InterfaceBuilder, MemberInfo, MethodInfo, Param, PropertyInfo, TypeInfo, TypeKind,
};
pub use value::{Value, ValueType};
