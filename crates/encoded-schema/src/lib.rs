//! The compact, JSON-serializable representation of (a subset of) a GraphQL
//! type system, used in place of a full introspectable schema at runtime.
//!
//! The in-memory model ([`TypeDefinition`] and friends) uses named fields and
//! exhaustive enums; the positional-array wire format lives in [`wire`] and is
//! a pure serialization concern.

mod merge;
mod model;
mod reference;

pub mod wire;

pub use merge::{merge, MergeError};
pub use model::{
    DirectiveApplication, DirectiveDefinition, EncodedSchema, EnumTypeDefinition, FieldDefinition,
    InputObjectTypeDefinition, InputValueDefinition, InterfaceTypeDefinition, ObjectTypeDefinition,
    ScalarTypeDefinition, TypeDefinition, TypeKind, UnionTypeDefinition,
};
pub use reference::{is_spec_scalar, TypeReference, SPEC_SCALARS};
