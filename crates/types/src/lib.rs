//! Schema data model for blind GraphQL schema reconstruction.
//!
//! These types describe a GraphQL schema as far as it could be recovered from a
//! black-box endpoint. They mirror the shape of an introspection result but
//! every piece is optional in spirit: a reconstructed field may only be known
//! by name, with its return type left as [`TypeRef::unknown`].
//!
//! # Type Categories
//!
//! - **Schema**: [`Schema`]
//! - **Named types**: [`Type`], [`TypeKind`]
//! - **Members**: [`Field`], [`Argument`], [`EnumValue`], [`Directive`]
//! - **References**: [`TypeRef`]

mod kind;
mod schema;
mod type_ref;

pub use kind::TypeKind;
pub use schema::{Argument, Directive, EnumValue, Field, Schema, Type, BUILTIN_SCALARS};
pub use type_ref::{TypeRef, UNKNOWN_TYPE};
