//! SDL ingestion, going through `async_graphql_parser`'s type-system AST.

use async_graphql_parser::{
    types::{self as ast, TypeSystemDefinition},
    Positioned,
};
use indexmap::IndexMap;

use crate::{
    EnumType, InputObjectType, InterfaceType, MetaDirective, MetaField, MetaInputValue, MetaType, ObjectType, Registry,
    ScalarType, UnionType,
};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("invalid schema: {0}")]
    Parse(#[from] async_graphql_parser::Error),
    #[error("type `{0}` is defined twice")]
    DuplicateType(String),
}

pub(crate) fn ingest(sdl: &str) -> Result<Registry, IngestError> {
    let parsed = async_graphql_parser::parse_schema(sdl)?;
    let mut registry = Registry::default();
    let mut explicit_roots = false;

    for definition in &parsed.definitions {
        match definition {
            TypeSystemDefinition::Schema(Positioned { node: schema, .. }) => {
                explicit_roots = true;
                if let Some(Positioned { node: name, .. }) = &schema.query {
                    registry.query_type = name.to_string();
                }
                registry.mutation_type = schema.mutation.as_ref().map(|name| name.node.to_string());
                registry.subscription_type = schema.subscription.as_ref().map(|name| name.node.to_string());
            }
            TypeSystemDefinition::Type(typedef) => {
                let name = typedef.node.name.node.to_string();
                let ty = ingest_type(&name, &typedef.node);
                if registry.types.insert(name.clone(), ty).is_some() {
                    return Err(IngestError::DuplicateType(name));
                }
            }
            TypeSystemDefinition::Directive(directive) => {
                let directive = ingest_directive(&directive.node);
                registry.directives.insert(directive.name.clone(), directive);
            }
        }
    }

    // Without a schema definition, the conventional root names apply.
    if !explicit_roots {
        if registry.types.contains_key("Mutation") {
            registry.mutation_type = Some("Mutation".to_string());
        }
        if registry.types.contains_key("Subscription") {
            registry.subscription_type = Some("Subscription".to_string());
        }
    }

    Ok(registry)
}

fn ingest_type(name: &str, typedef: &ast::TypeDefinition) -> MetaType {
    match &typedef.kind {
        ast::TypeKind::Scalar => MetaType::Scalar(ScalarType {
            name: name.to_string(),
            specified_by_url: specified_by_url(&typedef.directives),
        }),
        ast::TypeKind::Object(object) => MetaType::Object(ObjectType {
            name: name.to_string(),
            fields: ingest_fields(&object.fields),
            implements: ingest_names(&object.implements),
        }),
        ast::TypeKind::Interface(interface) => MetaType::Interface(InterfaceType {
            name: name.to_string(),
            fields: ingest_fields(&interface.fields),
            implements: ingest_names(&interface.implements),
        }),
        ast::TypeKind::Union(union) => MetaType::Union(UnionType {
            name: name.to_string(),
            members: ingest_names(&union.members),
        }),
        ast::TypeKind::Enum(r#enum) => MetaType::Enum(EnumType {
            name: name.to_string(),
            values: r#enum
                .values
                .iter()
                .map(|value| value.node.value.node.to_string())
                .collect(),
        }),
        ast::TypeKind::InputObject(input_object) => MetaType::InputObject(InputObjectType {
            name: name.to_string(),
            fields: ingest_input_values(&input_object.fields),
        }),
    }
}

fn ingest_fields(fields: &[Positioned<ast::FieldDefinition>]) -> IndexMap<String, MetaField> {
    fields
        .iter()
        .map(|field| {
            let name = field.node.name.node.to_string();
            let meta = MetaField {
                name: name.clone(),
                ty: field.node.ty.node.to_string(),
                args: ingest_input_values(&field.node.arguments),
            };
            (name, meta)
        })
        .collect()
}

fn ingest_input_values(values: &[Positioned<ast::InputValueDefinition>]) -> IndexMap<String, MetaInputValue> {
    values
        .iter()
        .map(|value| {
            let name = value.node.name.node.to_string();
            let meta = MetaInputValue {
                name: name.clone(),
                ty: value.node.ty.node.to_string(),
                default_value: value.node.default_value.as_ref().map(|default| default.node.clone()),
            };
            (name, meta)
        })
        .collect()
}

fn ingest_directive(directive: &ast::DirectiveDefinition) -> MetaDirective {
    MetaDirective {
        name: directive.name.node.to_string(),
        locations: directive.locations.iter().map(|location| location.node).collect(),
        args: ingest_input_values(&directive.arguments),
    }
}

fn ingest_names(names: &[Positioned<async_graphql_value::Name>]) -> Vec<String> {
    names.iter().map(|name| name.node.to_string()).collect()
}

fn specified_by_url(directives: &[Positioned<ast::ConstDirective>]) -> Option<String> {
    let specified_by = directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == "specifiedBy")?;
    specified_by.node.arguments.iter().find_map(|(name, value)| {
        if name.node.as_str() != "url" {
            return None;
        }
        match &value.node {
            async_graphql_value::ConstValue::String(url) => Some(url.clone()),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDL: &str = r#"
        interface Node {
            id: ID!
        }

        type Film implements Node {
            id: ID!
            title(foo: String = "Bar"): String!
            actors: [String!]
        }

        type Query {
            film(id: ID!): Film
        }

        type Mutation {
            rate(id: ID!, rating: Int!): Film
        }

        enum TestColor {
            RED
            GREEN
            BLUE
        }

        scalar Date @specifiedBy(url: "https://example.com/date")

        directive @cached(maxAge: Int = 60) on FIELD
    "#;

    #[test]
    fn ingests_types_and_roots() {
        let registry = Registry::from_sdl(SDL).unwrap();

        assert_eq!(registry.query_type, "Query");
        assert_eq!(registry.mutation_type.as_deref(), Some("Mutation"));
        assert_eq!(registry.subscription_type, None);

        let film = registry.lookup_type("Film").unwrap();
        assert_eq!(film.implements(), ["Node"]);
        let title = film.field("title").unwrap();
        assert_eq!(title.ty, "String!");
        assert_eq!(
            title.args["foo"].default_value,
            Some(async_graphql_value::ConstValue::String("Bar".into()))
        );

        let cached = registry.lookup_directive("cached").unwrap();
        assert_eq!(cached.args["maxAge"].ty, "Int");

        let MetaType::Scalar(date) = registry.lookup_type("Date").unwrap() else {
            unreachable!("expected a scalar");
        };
        assert_eq!(date.specified_by_url.as_deref(), Some("https://example.com/date"));
    }

    #[test]
    fn implementors_walk_interface_inheritance() {
        let registry = Registry::from_sdl(
            r#"
            interface Entity {
                id: ID!
            }
            interface Media implements Entity {
                id: ID!
            }
            type Film implements Media {
                id: ID!
            }
            type Query {
                entity: Entity
            }
            "#,
        )
        .unwrap();

        let direct: Vec<_> = registry.implementors("Media").map(|object| object.name.as_str()).collect();
        assert_eq!(direct, ["Film"]);
        let transitive: Vec<_> = registry.implementors("Entity").map(|object| object.name.as_str()).collect();
        assert_eq!(transitive, ["Film"]);
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let error = Registry::from_sdl("scalar Date scalar Date type Query { a: Int }").unwrap_err();
        assert_eq!(error.to_string(), "type `Date` is defined twice");
    }
}
