use crate::{EncodedSchema, TypeDefinition, TypeKind};

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("type `{name}` is defined as {first} in one fragment and as {second} in another")]
    KindMismatch {
        name: String,
        first: TypeKind,
        second: TypeKind,
    },
}

/// Merges several encoded schemas into one. Field sets of objects,
/// interfaces and input objects are unioned, as are union members and enum
/// values; the same name encoded with two different kinds is a hard error,
/// since it means the fragments were produced against incompatible schemas.
pub fn merge(fragments: impl IntoIterator<Item = EncodedSchema>) -> Result<EncodedSchema, MergeError> {
    let mut merged = EncodedSchema::default();

    for fragment in fragments {
        for (name, definition) in fragment.types {
            match merged.types.entry(name) {
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(definition);
                }
                indexmap::map::Entry::Occupied(mut entry) => {
                    let name = entry.key().clone();
                    merge_definition(&name, entry.get_mut(), definition)?;
                }
            }
        }
        for directive in fragment.directives {
            if merged.get_directive(&directive.name).is_none() {
                merged.directives.push(directive);
            }
        }
    }

    Ok(merged)
}

fn merge_definition(name: &str, existing: &mut TypeDefinition, incoming: TypeDefinition) -> Result<(), MergeError> {
    match (existing, incoming) {
        (TypeDefinition::Scalar(_), TypeDefinition::Scalar(_)) => Ok(()),
        (TypeDefinition::Object(existing), TypeDefinition::Object(incoming)) => {
            for (field_name, field) in incoming.fields {
                existing.fields.entry(field_name).or_insert(field);
            }
            merge_names(&mut existing.interfaces, incoming.interfaces);
            Ok(())
        }
        (TypeDefinition::Interface(existing), TypeDefinition::Interface(incoming)) => {
            for (field_name, field) in incoming.fields {
                existing.fields.entry(field_name).or_insert(field);
            }
            merge_names(&mut existing.interfaces, incoming.interfaces);
            Ok(())
        }
        (TypeDefinition::Union(existing), TypeDefinition::Union(incoming)) => {
            merge_names(&mut existing.members, incoming.members);
            Ok(())
        }
        (TypeDefinition::Enum(existing), TypeDefinition::Enum(incoming)) => {
            merge_names(&mut existing.values, incoming.values);
            Ok(())
        }
        (TypeDefinition::InputObject(existing), TypeDefinition::InputObject(incoming)) => {
            for (field_name, field) in incoming.fields {
                existing.fields.entry(field_name).or_insert(field);
            }
            Ok(())
        }
        (existing, incoming) => Err(MergeError::KindMismatch {
            name: name.to_string(),
            first: existing.kind(),
            second: incoming.kind(),
        }),
    }
}

fn merge_names(existing: &mut Vec<String>, incoming: Vec<String>) {
    for name in incoming {
        if !existing.contains(&name) {
            existing.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fragment(value: serde_json::Value) -> EncodedSchema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn merging_unions_field_sets() {
        let merged = merge([
            fragment(json!({ "types": { "Query": [2, { "film": "Film" }] } })),
            fragment(json!({ "types": { "Query": [2, { "allFilms": "[Film!]" }] } })),
        ])
        .unwrap();

        let fields = merged.get_type("Query").unwrap().fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains_key("film"));
        assert!(fields.contains_key("allFilms"));
    }

    #[test]
    fn kind_mismatch_is_a_hard_error() {
        let error = merge([
            fragment(json!({ "types": { "Film": [2, {}] } })),
            fragment(json!({ "types": { "Film": [5, ["FEATURE"]] } })),
        ])
        .unwrap_err();

        assert_eq!(
            error.to_string(),
            "type `Film` is defined as object in one fragment and as enum in another"
        );
    }
}
