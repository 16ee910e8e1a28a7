//! The typed request tree. Structurally a request document, with the type
//! information an executor needs attached to each field and argument.

use async_graphql_parser::types::{OperationType, Type};
use async_graphql_value::{ConstValue, Value};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct TypedDocument {
    pub operations: Vec<TypedOperation>,
    /// Keyed by fragment name, in name order.
    pub fragments: IndexMap<String, TypedFragment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedOperation {
    pub name: Option<String>,
    pub ty: OperationType,
    pub variable_definitions: Vec<TypedVariableDefinition>,
    pub directives: Vec<TypedDirective>,
    pub selection_set: Vec<TypedSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedVariableDefinition {
    pub name: String,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFragment {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<TypedDirective>,
    pub selection_set: Vec<TypedSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedSelection {
    Field(TypedField),
    FragmentSpread(TypedFragmentSpread),
    InlineFragment(TypedInlineFragment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedField {
    pub alias: Option<String>,
    pub name: String,
    /// The resolved field type, as a type syntax node.
    pub ty: Type,
    pub arguments: Vec<TypedArgument>,
    pub directives: Vec<TypedDirective>,
    pub selection_set: Vec<TypedSelection>,
}

impl TypedField {
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedArgument {
    pub name: String,
    pub value: Value,
    pub ty: Type,
    /// The schema-declared default, carried only when the supplied value is
    /// a variable reference (the one case where the executor may need it).
    pub default_value: Option<ConstValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFragmentSpread {
    pub fragment_name: String,
    pub directives: Vec<TypedDirective>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedInlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<TypedDirective>,
    pub selection_set: Vec<TypedSelection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedDirective {
    pub name: String,
    pub arguments: Vec<TypedArgument>,
}
