//! A reusable, stack-based tracker of "what type is in scope here" while a
//! request document is walked depth-first. It mirrors the language's own
//! static type-inference: the walk calls the `enter_*`/`leave_*` pairs in
//! document order and reads the current output type, parent type, field
//! definition, input type and default value off the stacks.
//!
//! The tracker is generic over [`SchemaIndex`], so the same walk runs against
//! the build-time registry and against an encoded schema fragment.

use async_graphql_value::ConstValue;
use encoded_schema::TypeReference;
use indexmap::IndexMap;

mod index;
mod tracker;

pub use index::SchemaIndex;
pub use tracker::{TrackError, TrackedDirective, TypeTracker};

/// A field definition as the tracker sees it, detached from the backing
/// schema model.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub ty: TypeReference,
    pub arguments: IndexMap<String, ArgumentEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentEntry {
    pub ty: TypeReference,
    pub default_value: Option<ConstValue>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveEntry {
    pub arguments: IndexMap<String, ArgumentEntry>,
}

pub const SPECIFIED_DIRECTIVE_NAMES: [&str; 4] = ["skip", "include", "deprecated", "specifiedBy"];

/// The built-in executable directives. Used as the fallback when a schema
/// (typically a partial, encoded one) does not declare them itself.
pub fn specified_directives() -> IndexMap<String, DirectiveEntry> {
    fn argument(name: &str, ty: &str, default: Option<ConstValue>) -> (String, ArgumentEntry) {
        (
            name.to_string(),
            ArgumentEntry {
                ty: TypeReference::encode(ty),
                default_value: default,
            },
        )
    }

    IndexMap::from([
        (
            "skip".to_string(),
            DirectiveEntry {
                arguments: IndexMap::from([argument("if", "Boolean!", None)]),
            },
        ),
        (
            "include".to_string(),
            DirectiveEntry {
                arguments: IndexMap::from([argument("if", "Boolean!", None)]),
            },
        ),
        (
            "deprecated".to_string(),
            DirectiveEntry {
                arguments: IndexMap::from([argument(
                    "reason",
                    "String",
                    Some(ConstValue::String("No longer supported".to_string())),
                )]),
            },
        ),
        (
            "specifiedBy".to_string(),
            DirectiveEntry {
                arguments: IndexMap::from([argument("url", "String!", None)]),
            },
        ),
    ])
}
