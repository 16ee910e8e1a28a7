//! The positional wire format.
//!
//! Every definition serializes as a fixed-position array whose first slot
//! identifies it, trailing empty slots omitted:
//!
//! ```text
//! type definition   [kind, ...]            kind: 1=scalar 2=object 3=interface
//!                                                4=union  5=enum   6=input
//! object/interface  [kind, fields, interfaces?]
//! union             [4, members]
//! enum              [5, values]
//! input object      [6, fields]
//! field             type | [type, arguments?, directives?]
//! input value       type | [type, default?, directives?]
//! directive def     [name, arguments?]
//! applied directive [name, arguments?]
//! type reference    integer (spec-type table index) | string (printed syntax)
//! ```
//!
//! A field with no arguments and no directives collapses to its bare type
//! reference. An input value's absent default is written as `null` when a
//! later slot forces the array form; an explicit `null` default is therefore
//! indistinguishable from "no default" on the wire, matching the source
//! encoding this format is compatible with.
//!
//! An integer type reference outside the spec-type table is a corrupted
//! encoding and fails deserialization outright; it is never surfaced as a
//! recoverable coercion problem.

use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde::{
    de::{self, SeqAccess, Visitor},
    ser::SerializeSeq,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{
    model::{
        DirectiveApplication, DirectiveDefinition, EnumTypeDefinition, FieldDefinition, InputObjectTypeDefinition,
        InputValueDefinition, InterfaceTypeDefinition, ObjectTypeDefinition, ScalarTypeDefinition, TypeDefinition,
        TypeKind, UnionTypeDefinition,
    },
    reference::{SpecTypeIndex, TypeReference},
};

impl Serialize for TypeReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeReference::Spec(index) => serializer.serialize_u8(index.to_u8()),
            TypeReference::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for TypeReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReferenceVisitor;

        impl Visitor<'_> for ReferenceVisitor {
            type Value = TypeReference;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a spec-type table index or a type string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                SpecTypeIndex::new(value).map(TypeReference::Spec).ok_or_else(|| {
                    E::custom(format!(
                        "encoded type reference {value} is outside the spec-type table (corrupted schema encoding)"
                    ))
                })
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .map_err(|_| {
                        E::custom(format!(
                            "encoded type reference {value} is negative (corrupted schema encoding)"
                        ))
                    })
                    .and_then(|value| self.visit_u64(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(TypeReference::encode(value))
            }
        }

        deserializer.deserialize_any(ReferenceVisitor)
    }
}

impl Serialize for TypeDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeDefinition::Scalar(scalar) => {
                let extra = usize::from(!scalar.directives.is_empty());
                let mut seq = serializer.serialize_seq(Some(1 + extra))?;
                seq.serialize_element(&(TypeKind::Scalar as u8))?;
                if !scalar.directives.is_empty() {
                    seq.serialize_element(&scalar.directives)?;
                }
                seq.end()
            }
            TypeDefinition::Object(object) => {
                serialize_composite(serializer, TypeKind::Object, &object.fields, &object.interfaces)
            }
            TypeDefinition::Interface(interface) => {
                serialize_composite(serializer, TypeKind::Interface, &interface.fields, &interface.interfaces)
            }
            TypeDefinition::Union(union) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&(TypeKind::Union as u8))?;
                seq.serialize_element(&union.members)?;
                seq.end()
            }
            TypeDefinition::Enum(r#enum) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&(TypeKind::Enum as u8))?;
                seq.serialize_element(&r#enum.values)?;
                seq.end()
            }
            TypeDefinition::InputObject(input_object) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&(TypeKind::InputObject as u8))?;
                seq.serialize_element(&input_object.fields)?;
                seq.end()
            }
        }
    }
}

fn serialize_composite<S: Serializer>(
    serializer: S,
    kind: TypeKind,
    fields: &IndexMap<String, FieldDefinition>,
    interfaces: &[String],
) -> Result<S::Ok, S::Error> {
    let extra = usize::from(!interfaces.is_empty());
    let mut seq = serializer.serialize_seq(Some(2 + extra))?;
    seq.serialize_element(&(kind as u8))?;
    seq.serialize_element(fields)?;
    if !interfaces.is_empty() {
        seq.serialize_element(interfaces)?;
    }
    seq.end()
}

impl<'de> Deserialize<'de> for TypeDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DefinitionVisitor;

        impl<'de> Visitor<'de> for DefinitionVisitor {
            type Value = TypeDefinition;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a positional type definition array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let tag: u64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("type definition array is empty"))?;
                let kind = TypeKind::from_tag(tag).ok_or_else(|| {
                    de::Error::custom(format!("unknown type kind tag {tag} (corrupted schema encoding)"))
                })?;

                Ok(match kind {
                    TypeKind::Scalar => TypeDefinition::Scalar(ScalarTypeDefinition {
                        directives: seq.next_element()?.unwrap_or_default(),
                    }),
                    TypeKind::Object => {
                        let fields = seq.next_element()?.unwrap_or_default();
                        let interfaces = seq.next_element()?.unwrap_or_default();
                        TypeDefinition::Object(ObjectTypeDefinition { fields, interfaces })
                    }
                    TypeKind::Interface => {
                        let fields = seq.next_element()?.unwrap_or_default();
                        let interfaces = seq.next_element()?.unwrap_or_default();
                        TypeDefinition::Interface(InterfaceTypeDefinition { fields, interfaces })
                    }
                    TypeKind::Union => TypeDefinition::Union(UnionTypeDefinition {
                        members: seq.next_element()?.unwrap_or_default(),
                    }),
                    TypeKind::Enum => TypeDefinition::Enum(EnumTypeDefinition {
                        values: seq.next_element()?.unwrap_or_default(),
                    }),
                    TypeKind::InputObject => TypeDefinition::InputObject(InputObjectTypeDefinition {
                        fields: seq.next_element()?.unwrap_or_default(),
                    }),
                })
            }
        }

        deserializer.deserialize_seq(DefinitionVisitor)
    }
}

impl Serialize for FieldDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.arguments.is_empty() && self.directives.is_empty() {
            return self.ty.serialize(serializer);
        }
        let extra = usize::from(!self.directives.is_empty());
        let mut seq = serializer.serialize_seq(Some(2 + extra))?;
        seq.serialize_element(&self.ty)?;
        seq.serialize_element(&self.arguments)?;
        if !self.directives.is_empty() {
            seq.serialize_element(&self.directives)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for FieldDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldVisitor;

        impl<'de> Visitor<'de> for FieldVisitor {
            type Value = FieldDefinition;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a bare type reference or a positional field definition array")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                SpecTypeIndex::new(value)
                    .map(|index| FieldDefinition::new(TypeReference::Spec(index)))
                    .ok_or_else(|| {
                        E::custom(format!(
                            "encoded type reference {value} is outside the spec-type table (corrupted schema encoding)"
                        ))
                    })
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(FieldDefinition::new(TypeReference::encode(value)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let ty: TypeReference = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("field definition array is empty"))?;
                let arguments = seq.next_element()?.unwrap_or_default();
                let directives = seq.next_element()?.unwrap_or_default();
                Ok(FieldDefinition {
                    ty,
                    arguments,
                    directives,
                })
            }
        }

        deserializer.deserialize_any(FieldVisitor)
    }
}

impl Serialize for InputValueDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.default_value.is_none() && self.directives.is_empty() {
            return self.ty.serialize(serializer);
        }
        let extra = usize::from(!self.directives.is_empty());
        let mut seq = serializer.serialize_seq(Some(2 + extra))?;
        seq.serialize_element(&self.ty)?;
        seq.serialize_element(&self.default_value)?;
        if !self.directives.is_empty() {
            seq.serialize_element(&self.directives)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for InputValueDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InputValueVisitor;

        impl<'de> Visitor<'de> for InputValueVisitor {
            type Value = InputValueDefinition;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a bare type reference or a positional input value array")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                SpecTypeIndex::new(value)
                    .map(|index| InputValueDefinition::new(TypeReference::Spec(index)))
                    .ok_or_else(|| {
                        E::custom(format!(
                            "encoded type reference {value} is outside the spec-type table (corrupted schema encoding)"
                        ))
                    })
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(InputValueDefinition::new(TypeReference::encode(value)))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let ty: TypeReference = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("input value definition array is empty"))?;
                let default_value: Option<ConstValue> = seq.next_element::<Option<ConstValue>>()?.flatten();
                // An absent default is written as `null`; fold it back.
                let default_value = default_value.filter(|value| !matches!(value, ConstValue::Null));
                let directives = seq.next_element()?.unwrap_or_default();
                Ok(InputValueDefinition {
                    ty,
                    default_value,
                    directives,
                })
            }
        }

        deserializer.deserialize_any(InputValueVisitor)
    }
}

impl Serialize for DirectiveDefinition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.arguments.is_empty());
        let mut seq = serializer.serialize_seq(Some(1 + extra))?;
        seq.serialize_element(&self.name)?;
        if !self.arguments.is_empty() {
            seq.serialize_element(&self.arguments)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for DirectiveDefinition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DirectiveVisitor;

        impl<'de> Visitor<'de> for DirectiveVisitor {
            type Value = DirectiveDefinition;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a positional directive definition array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("directive definition array is empty"))?;
                let arguments = seq.next_element()?.unwrap_or_default();
                Ok(DirectiveDefinition { name, arguments })
            }
        }

        deserializer.deserialize_seq(DirectiveVisitor)
    }
}

impl Serialize for DirectiveApplication {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.arguments.is_empty());
        let mut seq = serializer.serialize_seq(Some(1 + extra))?;
        seq.serialize_element(&self.name)?;
        if !self.arguments.is_empty() {
            seq.serialize_element(&self.arguments)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for DirectiveApplication {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ApplicationVisitor;

        impl<'de> Visitor<'de> for ApplicationVisitor {
            type Value = DirectiveApplication;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a positional applied-directive array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::custom("applied-directive array is empty"))?;
                let arguments = seq.next_element()?.unwrap_or_default();
                Ok(DirectiveApplication { name, arguments })
            }
        }

        deserializer.deserialize_seq(ApplicationVisitor)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{EncodedSchema, FieldDefinition, TypeDefinition, TypeReference};

    fn sample_schema_json() -> serde_json::Value {
        json!({
            "types": {
                "Query": [2, { "film": ["Film", { "id": 25 }] }],
                "Film": [2, { "id": 25, "title": [1, { "foo": [0, "Bar"] }], "actors": 4 }, ["Node"]],
                "Node": [3, { "id": 25 }],
                "FilmKind": [5, ["FEATURE", "SHORT"]],
                "FilmInput": [6, { "title": 1, "kind": ["FilmKind", "FEATURE"] }],
                "SearchResult": [4, ["Film"]],
                "Date": [1]
            }
        })
    }

    #[test]
    fn wire_round_trip() {
        let schema: EncodedSchema = serde_json::from_value(sample_schema_json()).unwrap();

        let film = schema.get_type("Film").unwrap();
        let fields = film.fields().unwrap();
        assert_eq!(fields["id"].ty.decode(), "ID!");
        assert_eq!(fields["actors"].ty.decode(), "[String!]");
        assert_eq!(film.interfaces(), ["Node"]);

        let title = &fields["title"];
        assert_eq!(title.ty.decode(), "String!");
        assert_eq!(title.argument("foo").unwrap().ty.decode(), "String");

        let reencoded = serde_json::to_value(&schema).unwrap();
        assert_eq!(reencoded, sample_schema_json());
    }

    #[test]
    fn bare_field_shorthand() {
        let field: FieldDefinition = serde_json::from_value(json!("[MyType!]!")).unwrap();
        assert_eq!(field.ty, TypeReference::encode("[MyType!]!"));
        assert!(field.arguments.is_empty());
        assert_eq!(serde_json::to_value(&field).unwrap(), json!("[MyType!]!"));
    }

    #[test]
    fn out_of_bounds_reference_is_fatal() {
        let result: Result<TypeDefinition, _> = serde_json::from_value(json!([2, { "broken": 211 }]));
        let error = result.unwrap_err().to_string();
        assert!(error.contains("corrupted schema encoding"), "{error}");
    }

    #[test]
    fn unknown_kind_tag_is_fatal() {
        let result: Result<TypeDefinition, _> = serde_json::from_value(json!([9, {}]));
        let error = result.unwrap_err().to_string();
        assert!(error.contains("unknown type kind tag 9"), "{error}");
    }
}
