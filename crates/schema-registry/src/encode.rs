//! The encoder turning a full registry into the compact runtime
//! representation.
//!
//! Interface inheritance is flattened here: every encoded type lists all the
//! interfaces it transitively implements, so the runtime subtype check never
//! has to chase the hierarchy.

use encoded_schema::{
    DirectiveDefinition, EncodedSchema, EnumTypeDefinition, FieldDefinition, InputObjectTypeDefinition,
    InputValueDefinition, InterfaceTypeDefinition, ObjectTypeDefinition, ScalarTypeDefinition, TypeDefinition,
    TypeReference, UnionTypeDefinition,
};
use indexmap::IndexMap;

use crate::{MetaInputValue, MetaType, Registry};

impl Registry {
    /// Encodes the whole registry into a schema fragment.
    pub fn encode(&self) -> EncodedSchema {
        let mut encoded = EncodedSchema::default();

        for (name, ty) in &self.types {
            if encoded_schema::is_spec_scalar(name) {
                continue;
            }
            encoded.types.insert(name.clone(), self.encode_type(ty));
        }

        encoded.directives = self
            .directives
            .values()
            .map(|directive| DirectiveDefinition {
                name: directive.name.clone(),
                arguments: encode_input_values(&directive.args),
            })
            .collect();

        encoded
    }

    fn encode_type(&self, ty: &MetaType) -> TypeDefinition {
        match ty {
            MetaType::Scalar(_) => TypeDefinition::Scalar(ScalarTypeDefinition::default()),
            MetaType::Object(object) => TypeDefinition::Object(ObjectTypeDefinition {
                fields: encode_fields(&object.fields),
                interfaces: self.transitive_interfaces(&object.implements),
            }),
            MetaType::Interface(interface) => TypeDefinition::Interface(InterfaceTypeDefinition {
                fields: encode_fields(&interface.fields),
                interfaces: self.transitive_interfaces(&interface.implements),
            }),
            MetaType::Union(union) => TypeDefinition::Union(UnionTypeDefinition {
                members: union.members.clone(),
            }),
            MetaType::Enum(r#enum) => TypeDefinition::Enum(EnumTypeDefinition {
                values: r#enum.values.clone(),
            }),
            MetaType::InputObject(input_object) => TypeDefinition::InputObject(InputObjectTypeDefinition {
                fields: encode_input_values(&input_object.fields),
            }),
        }
    }

    /// The interfaces a type implements, directly or through another
    /// interface, in declaration order.
    pub fn transitive_interfaces(&self, implements: &[String]) -> Vec<String> {
        let mut flattened = Vec::new();
        self.collect_interfaces(implements, &mut flattened);
        flattened
    }

    fn collect_interfaces(&self, implements: &[String], into: &mut Vec<String>) {
        for name in implements {
            if into.contains(name) {
                continue;
            }
            into.push(name.clone());
            if let Some(MetaType::Interface(parent)) = self.types.get(name) {
                self.collect_interfaces(&parent.implements, into);
            }
        }
    }
}

fn encode_fields(fields: &IndexMap<String, crate::MetaField>) -> IndexMap<String, FieldDefinition> {
    fields
        .iter()
        .map(|(name, field)| {
            let mut encoded = FieldDefinition::new(TypeReference::encode(&field.ty));
            encoded.arguments = encode_input_values(&field.args);
            (name.clone(), encoded)
        })
        .collect()
}

fn encode_input_values(values: &IndexMap<String, MetaInputValue>) -> IndexMap<String, InputValueDefinition> {
    values
        .iter()
        .map(|(name, value)| {
            let mut encoded = InputValueDefinition::new(TypeReference::encode(&value.ty));
            encoded.default_value = value.default_value.clone();
            (name.clone(), encoded)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use expect_test::expect;

    use crate::Registry;

    #[test]
    fn encoding_flattens_transitive_interfaces() {
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
                title(foo: String = "Bar"): String!
            }
            type Query {
                film(id: ID!): Film
            }
            "#,
        )
        .unwrap();

        let encoded = registry.encode();
        let json = serde_json::to_string_pretty(&encoded).unwrap();

        expect![[r#"
            {
              "types": {
                "Entity": [
                  3,
                  {
                    "id": 25
                  }
                ],
                "Film": [
                  2,
                  {
                    "id": 25,
                    "title": [
                      1,
                      {
                        "foo": [
                          0,
                          "Bar"
                        ]
                      }
                    ]
                  },
                  [
                    "Media",
                    "Entity"
                  ]
                ],
                "Media": [
                  3,
                  {
                    "id": 25
                  },
                  [
                    "Entity"
                  ]
                ],
                "Query": [
                  2,
                  {
                    "film": [
                      "Film",
                      {
                        "id": 25
                      }
                    ]
                  }
                ]
              }
            }"#]]
        .assert_eq(&json);
    }
}
