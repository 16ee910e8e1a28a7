//! The build-time schema model: every type and directive of a schema, keyed
//! by name, with enough structure to drive document annotation, minimal
//! schema extraction and the encoder that produces the compact runtime
//! representation.

use std::collections::BTreeMap;

use async_graphql_parser::types::{DirectiveLocation, OperationType};
use async_graphql_value::ConstValue;
use indexmap::IndexMap;

mod encode;
mod ingest;
mod sdl;

pub use ingest::IngestError;
pub use sdl::{directive_location_sdl, write_directive, write_type};

#[derive(Clone, Debug)]
pub struct Registry {
    pub types: BTreeMap<String, MetaType>,
    pub directives: IndexMap<String, MetaDirective>,
    pub query_type: String,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            types: BTreeMap::new(),
            directives: IndexMap::new(),
            query_type: "Query".to_string(),
            mutation_type: None,
            subscription_type: None,
        }
    }
}

impl Registry {
    /// Builds a registry from SDL text.
    pub fn from_sdl(sdl: &str) -> Result<Registry, IngestError> {
        ingest::ingest(sdl)
    }

    pub fn lookup_type(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn lookup_directive(&self, name: &str) -> Option<&MetaDirective> {
        self.directives.get(name)
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => Some(&self.query_type),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    pub fn is_composite_type(&self, name: &str) -> bool {
        matches!(
            self.types.get(name),
            Some(MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_))
        )
    }

    /// All object types implementing the given interface, directly or through
    /// another interface. Iteration order follows the type map (name order).
    pub fn implementors<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a ObjectType> + 'a {
        self.types.values().filter_map(move |ty| {
            let object = ty.as_object()?;
            self.implements_transitively(&object.implements, interface)
                .then_some(object)
        })
    }

    fn implements_transitively(&self, implements: &[String], interface: &str) -> bool {
        implements.iter().any(|name| {
            name == interface
                || matches!(
                    self.types.get(name),
                    Some(MetaType::Interface(parent)) if self.implements_transitively(&parent.implements, interface)
                )
        })
    }
}

#[derive(Clone, Debug)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &str {
        match self {
            MetaType::Scalar(inner) => &inner.name,
            MetaType::Object(inner) => &inner.name,
            MetaType::Interface(inner) => &inner.name,
            MetaType::Union(inner) => &inner.name,
            MetaType::Enum(inner) => &inner.name,
            MetaType::InputObject(inner) => &inner.name,
        }
    }

    /// Output fields, for object and interface types.
    pub fn fields(&self) -> Option<&IndexMap<String, MetaField>> {
        match self {
            MetaType::Object(object) => Some(&object.fields),
            MetaType::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&MetaField> {
        self.fields()?.get(name)
    }

    pub fn implements(&self) -> &[String] {
        match self {
            MetaType::Object(object) => &object.implements,
            MetaType::Interface(interface) => &interface.implements,
            _ => &[],
        }
    }

    pub fn as_object(&self) -> Option<&ObjectType> {
        match self {
            MetaType::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            MetaType::Interface(interface) => Some(interface),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            MetaType::InputObject(input_object) => Some(input_object),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScalarType {
    pub name: String,
    pub specified_by_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ObjectType {
    pub name: String,
    pub fields: IndexMap<String, MetaField>,
    pub implements: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct InterfaceType {
    pub name: String,
    pub fields: IndexMap<String, MetaField>,
    pub implements: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct UnionType {
    pub name: String,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct InputObjectType {
    pub name: String,
    pub fields: IndexMap<String, MetaInputValue>,
}

/// An output field. The type is kept in printed syntax (`[Film!]!`) exactly
/// as it appeared in the SDL.
#[derive(Clone, Debug, Default)]
pub struct MetaField {
    pub name: String,
    pub ty: String,
    pub args: IndexMap<String, MetaInputValue>,
}

impl MetaField {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> MetaField {
        MetaField {
            name: name.into(),
            ty: ty.into(),
            args: IndexMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetaInputValue {
    pub name: String,
    pub ty: String,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> MetaInputValue {
        MetaInputValue {
            name: name.into(),
            ty: ty.into(),
            default_value: None,
        }
    }
}

/// Repeatability is not modeled: the parser sets its `is_repeatable` flag
/// unconditionally, so the bit cannot be recovered from the AST.
#[derive(Clone, Debug)]
pub struct MetaDirective {
    pub name: String,
    pub locations: Vec<DirectiveLocation>,
    pub args: IndexMap<String, MetaInputValue>,
}
