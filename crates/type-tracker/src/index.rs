//! The schema lookups the tracker needs, implemented by both the build-time
//! registry and the runtime schema fragment.

use async_graphql_parser::types::OperationType;
use encoded_schema::TypeReference;
use indexmap::IndexMap;
use schema_fragment::SchemaFragment;
use schema_registry::{MetaType, Registry};

use crate::{ArgumentEntry, DirectiveEntry, FieldEntry};

pub trait SchemaIndex {
    fn root_operation_type(&self, operation: OperationType) -> Option<String>;
    fn is_composite_type(&self, name: &str) -> bool;
    fn field(&self, type_name: &str, field_name: &str) -> Option<FieldEntry>;
    fn directive(&self, name: &str) -> Option<DirectiveEntry>;
    fn input_field(&self, type_name: &str, field_name: &str) -> Option<ArgumentEntry>;
    /// `None` when the type is not an enum, `Some(false)` when it is one but
    /// lacks the value.
    fn has_enum_value(&self, type_name: &str, value: &str) -> Option<bool>;
}

impl SchemaIndex for Registry {
    fn root_operation_type(&self, operation: OperationType) -> Option<String> {
        self.root_type(operation).map(str::to_string)
    }

    fn is_composite_type(&self, name: &str) -> bool {
        Registry::is_composite_type(self, name)
    }

    fn field(&self, type_name: &str, field_name: &str) -> Option<FieldEntry> {
        let field = self.lookup_type(type_name)?.field(field_name)?;
        Some(FieldEntry {
            ty: TypeReference::encode(&field.ty),
            arguments: field
                .args
                .iter()
                .map(|(name, arg)| {
                    (
                        name.clone(),
                        ArgumentEntry {
                            ty: TypeReference::encode(&arg.ty),
                            default_value: arg.default_value.clone(),
                        },
                    )
                })
                .collect(),
        })
    }

    fn directive(&self, name: &str) -> Option<DirectiveEntry> {
        let directive = self.lookup_directive(name)?;
        Some(DirectiveEntry {
            arguments: directive
                .args
                .iter()
                .map(|(name, arg)| {
                    (
                        name.clone(),
                        ArgumentEntry {
                            ty: TypeReference::encode(&arg.ty),
                            default_value: arg.default_value.clone(),
                        },
                    )
                })
                .collect(),
        })
    }

    fn input_field(&self, type_name: &str, field_name: &str) -> Option<ArgumentEntry> {
        let field = self.lookup_type(type_name)?.as_input_object()?.fields.get(field_name)?;
        Some(ArgumentEntry {
            ty: TypeReference::encode(&field.ty),
            default_value: field.default_value.clone(),
        })
    }

    fn has_enum_value(&self, type_name: &str, value: &str) -> Option<bool> {
        match self.lookup_type(type_name)? {
            MetaType::Enum(r#enum) => Some(r#enum.values.iter().any(|declared| declared == value)),
            _ => None,
        }
    }
}

impl SchemaIndex for SchemaFragment {
    fn root_operation_type(&self, operation: OperationType) -> Option<String> {
        // Encoded fragments carry no schema definition; the conventional root
        // names apply.
        let name = match operation {
            OperationType::Query => "Query",
            OperationType::Mutation => "Mutation",
            OperationType::Subscription => "Subscription",
        };
        self.is_object_type(name).then(|| name.to_string())
    }

    fn is_composite_type(&self, name: &str) -> bool {
        SchemaFragment::is_composite_type(self, name)
    }

    fn field(&self, type_name: &str, field_name: &str) -> Option<FieldEntry> {
        let field = self.get_field(type_name, field_name)?;
        Some(FieldEntry {
            ty: field.ty.clone(),
            arguments: convert_arguments(&field.arguments),
        })
    }

    fn directive(&self, name: &str) -> Option<DirectiveEntry> {
        let directive = self.schema().get_directive(name)?;
        Some(DirectiveEntry {
            arguments: convert_arguments(&directive.arguments),
        })
    }

    fn input_field(&self, type_name: &str, field_name: &str) -> Option<ArgumentEntry> {
        let input_object = match self.get_type(type_name)? {
            encoded_schema::TypeDefinition::InputObject(input_object) => input_object,
            _ => return None,
        };
        let field = input_object.fields.get(field_name)?;
        Some(ArgumentEntry {
            ty: field.ty.clone(),
            default_value: field.default_value.clone(),
        })
    }

    fn has_enum_value(&self, type_name: &str, value: &str) -> Option<bool> {
        match self.get_type(type_name)? {
            encoded_schema::TypeDefinition::Enum(r#enum) => {
                Some(r#enum.values.iter().any(|declared| declared == value))
            }
            _ => None,
        }
    }
}

fn convert_arguments(
    arguments: &IndexMap<String, encoded_schema::InputValueDefinition>,
) -> IndexMap<String, ArgumentEntry> {
    arguments
        .iter()
        .map(|(name, value)| {
            (
                name.clone(),
                ArgumentEntry {
                    ty: value.ty.clone(),
                    default_value: value.default_value.clone(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::types::OperationType;
    use schema_fragment::{Resolvers, SchemaFragment};

    use super::*;
    use crate::TypeTracker;

    #[test]
    fn the_same_walk_runs_against_an_encoded_fragment() {
        let schema = serde_json::from_value(serde_json::json!({
            "types": {
                "Query": [2, { "film": ["Film", { "id": 25 }] }],
                "Film": [2, { "id": 25, "title": 1 }]
            }
        }))
        .unwrap();
        let fragment = SchemaFragment::new(schema, Resolvers::default());

        let mut tracker = TypeTracker::new(&fragment);
        let pos = async_graphql_parser::Pos::default();
        tracker.enter_operation(OperationType::Query, pos).unwrap();
        tracker.enter_selection_set();
        tracker.enter_field("film", pos).unwrap();
        tracker.enter_selection_set();
        tracker.enter_field("__typename", pos).unwrap();
        assert_eq!(tracker.current_type().unwrap().decode(), "String!");
        tracker.leave_field();
        tracker.enter_field("title", pos).unwrap();
        assert_eq!(tracker.current_type().unwrap().decode(), "String!");
        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_operation();
        assert!(tracker.is_at_rest());

        assert_eq!(fragment.root_operation_type(OperationType::Mutation), None);
    }
}
