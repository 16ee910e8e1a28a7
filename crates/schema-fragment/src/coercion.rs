//! Input coercion: literal/variable AST nodes into native values, checked
//! against the encoded schema.
//!
//! Failure is a value, not an error: `None` means "this literal cannot be
//! coerced to this type" and callers decide what that becomes. Structural
//! problems (unknown types, corrupted references) never surface here; they
//! are caught when the encoded schema is deserialized.

use async_graphql_value::{ConstValue, Name, Value};
use encoded_schema::{TypeDefinition, TypeReference};
use indexmap::IndexMap;

use crate::{LeafTypeResolver, SchemaFragment, SpecScalar, Variables};

/// Coerces a literal or variable value node to the given type.
///
/// Rule order follows the input-coercion semantics of the language spec:
/// variables first (trusted as pre-coerced, no recursion), then non-null
/// unwrapping, explicit null, lists (with singleton promotion), input
/// objects (schema defaults for unset fields, required fields failing,
/// nullable unset fields omitted), and finally leaf parsing.
pub fn value_from_ast(
    fragment: &SchemaFragment,
    value: &Value,
    ty: &TypeReference,
    variables: Option<&Variables>,
) -> Option<ConstValue> {
    if let Value::Variable(name) = value {
        let resolved = variables?.get(name)?;
        if matches!(resolved, ConstValue::Null) && ty.is_non_null() {
            return None;
        }
        return Some(resolved.clone());
    }

    if ty.is_non_null() {
        if matches!(value, Value::Null) {
            return None;
        }
        return value_from_ast(fragment, value, &ty.unwrap(), variables);
    }

    if matches!(value, Value::Null) {
        return Some(ConstValue::Null);
    }

    if ty.is_list() {
        return coerce_list(fragment, value, &ty.unwrap(), variables);
    }

    if let Some(TypeDefinition::InputObject(input_object)) = fragment.get_type(ty.name()) {
        let Value::Object(object) = value else {
            return None;
        };
        return coerce_input_object(fragment, object, &input_object.fields, variables);
    }

    coerce_leaf(fragment, value, ty, variables)
}

fn coerce_list(
    fragment: &SchemaFragment,
    value: &Value,
    item_ty: &TypeReference,
    variables: Option<&Variables>,
) -> Option<ConstValue> {
    let Value::List(items) = value else {
        // Singleton promotion: a non-list literal coerces as one item.
        let item = value_from_ast(fragment, value, item_ty, variables)?;
        return Some(ConstValue::List(vec![item]));
    };

    let mut coerced = Vec::with_capacity(items.len());
    for item in items {
        if let Value::Variable(name) = item {
            if variables.map(|variables| !variables.contains_key(name)).unwrap_or(true) {
                // A missing variable element reads as null, which a non-null
                // item type cannot absorb.
                if item_ty.is_non_null() {
                    return None;
                }
                coerced.push(ConstValue::Null);
                continue;
            }
        }
        coerced.push(value_from_ast(fragment, item, item_ty, variables)?);
    }
    Some(ConstValue::List(coerced))
}

fn coerce_input_object(
    fragment: &SchemaFragment,
    object: &IndexMap<Name, Value>,
    fields: &IndexMap<String, encoded_schema::InputValueDefinition>,
    variables: Option<&Variables>,
) -> Option<ConstValue> {
    let mut coerced = IndexMap::new();

    for (name, definition) in fields {
        let provided = object.get(name.as_str()).filter(|value| {
            // A field set to an unresolvable variable counts as unset.
            match value {
                Value::Variable(variable) => variables
                    .map(|variables| variables.contains_key(variable))
                    .unwrap_or(false),
                _ => true,
            }
        });

        match provided {
            Some(value) => {
                let value = value_from_ast(fragment, value, &definition.ty, variables)?;
                coerced.insert(Name::new(name), value);
            }
            None => {
                if let Some(default) = &definition.default_value {
                    coerced.insert(Name::new(name), default.clone());
                } else if definition.ty.is_non_null() {
                    return None;
                }
                // Nullable and defaultless: left out entirely, not null.
            }
        }
    }

    Some(ConstValue::Object(coerced))
}

fn coerce_leaf(
    fragment: &SchemaFragment,
    value: &Value,
    ty: &TypeReference,
    variables: Option<&Variables>,
) -> Option<ConstValue> {
    match fragment.get_leaf_type_resolver(ty)? {
        LeafTypeResolver::SpecScalar(scalar) => coerce_spec_scalar(value, scalar),
        LeafTypeResolver::Scalar { parse_literal } => match parse_literal {
            Some(parse_literal) => parse_literal(value, variables),
            // No user parser: the literal is taken as-is, with embedded
            // variable references resolved.
            None => value
                .clone()
                .into_const_with(|name| {
                    variables
                        .and_then(|variables| variables.get(&name).cloned())
                        .ok_or(())
                })
                .ok(),
        },
        LeafTypeResolver::Enum(leaf) => {
            // Only enum value nodes coerce; a string literal is a type error.
            let Value::Enum(name) = value else {
                return None;
            };
            leaf.values.get(name.as_str()).cloned()
        }
    }
}

fn coerce_spec_scalar(value: &Value, scalar: SpecScalar) -> Option<ConstValue> {
    match (scalar, value) {
        (SpecScalar::String, Value::String(string)) => Some(ConstValue::String(string.clone())),
        (SpecScalar::Boolean, Value::Boolean(boolean)) => Some(ConstValue::Boolean(*boolean)),
        (SpecScalar::Int, Value::Number(number)) => {
            let int = number.as_i64().and_then(|int| i32::try_from(int).ok())?;
            Some(ConstValue::from(int))
        }
        (SpecScalar::Float, Value::Number(number)) => {
            number.as_f64()?;
            Some(ConstValue::Number(number.clone()))
        }
        (SpecScalar::Id, Value::String(string)) => Some(ConstValue::String(string.clone())),
        (SpecScalar::Id, Value::Number(number)) => {
            let int = number.as_i64()?;
            Some(ConstValue::String(int.to_string()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use async_graphql_value::Name;
    use encoded_schema::EncodedSchema;
    use serde_json::json;

    use super::*;
    use crate::{EnumResolver, Resolvers, TypeResolver};

    fn test_fragment() -> SchemaFragment {
        let schema: EncodedSchema = serde_json::from_value(json!({
            "types": {
                "TestColor": [5, ["RED", "GREEN", "BLUE"]],
                "FilmInput": [6, {
                    "title": 1,
                    "int": ["Int", 42],
                    "color": "TestColor"
                }]
            }
        }))
        .unwrap();

        let mut resolvers = Resolvers::default();
        resolvers.insert(
            "TestColor",
            TypeResolver::Enum(EnumResolver {
                values: [
                    ("RED".to_string(), ConstValue::from(1)),
                    ("BLUE".to_string(), ConstValue::from(3)),
                ]
                .into_iter()
                .collect(),
            }),
        );
        SchemaFragment::new(schema, resolvers)
    }

    fn coerce(value: Value, ty: &str) -> Option<ConstValue> {
        value_from_ast(&test_fragment(), &value, &TypeReference::encode(ty), None)
    }

    fn coerce_with(value: Value, ty: &str, variables: &Variables) -> Option<ConstValue> {
        value_from_ast(&test_fragment(), &value, &TypeReference::encode(ty), Some(variables))
    }

    fn int(n: i32) -> Value {
        ConstValue::from(n).into_value()
    }

    #[test]
    fn null_against_non_null_fails() {
        assert_eq!(coerce(Value::Null, "Int!"), None);
    }

    #[test]
    fn null_against_nullable_coerces_to_null() {
        assert_eq!(coerce(Value::Null, "Int"), Some(ConstValue::Null));
        assert_eq!(coerce(Value::Null, "[Int!]"), Some(ConstValue::Null));
    }

    #[test]
    fn singleton_promotion() {
        let single = coerce(int(7), "Int").unwrap();
        assert_eq!(coerce(int(7), "[Int]"), Some(ConstValue::List(vec![single])));
    }

    #[test]
    fn list_elementwise_coercion() {
        let value = Value::List(vec![int(1), int(2)]);
        assert_eq!(
            coerce(value, "[Int]"),
            Some(ConstValue::List(vec![ConstValue::from(1), ConstValue::from(2)]))
        );

        let bad = Value::List(vec![int(1), Value::String("x".into())]);
        assert_eq!(coerce(bad, "[Int]"), None);
    }

    #[test]
    fn missing_variable_list_element() {
        let value = Value::List(vec![int(1), Value::Variable(Name::new("missing"))]);
        assert_eq!(
            coerce(value.clone(), "[Int]"),
            Some(ConstValue::List(vec![ConstValue::from(1), ConstValue::Null]))
        );
        assert_eq!(coerce(value, "[Int!]"), None);
    }

    #[test]
    fn variables_are_trusted_not_recoerced() {
        let variables: Variables = [(Name::new("v"), ConstValue::from(5))].into_iter().collect();
        assert_eq!(
            coerce_with(Value::Variable(Name::new("v")), "Int!", &variables),
            Some(ConstValue::from(5))
        );
        assert_eq!(coerce_with(Value::Variable(Name::new("absent")), "Int", &variables), None);

        let null_var: Variables = [(Name::new("v"), ConstValue::Null)].into_iter().collect();
        assert_eq!(coerce_with(Value::Variable(Name::new("v")), "Int!", &null_var), None);
        assert_eq!(
            coerce_with(Value::Variable(Name::new("v")), "Int", &null_var),
            Some(ConstValue::Null)
        );
    }

    #[test]
    fn input_object_defaulting_and_omission() {
        // `int` omitted entirely: the default 42 lands in the result.
        let value = Value::Object([(Name::new("title"), Value::String("Alien".into()))].into_iter().collect());
        let coerced = coerce(value, "FilmInput").unwrap();
        let ConstValue::Object(object) = coerced else {
            unreachable!("expected an object");
        };
        assert_eq!(object[&Name::new("int")], ConstValue::from(42));
        assert_eq!(object[&Name::new("title")], ConstValue::String("Alien".into()));
        // `color` has no default and is nullable: omitted, not null.
        assert!(!object.contains_key(&Name::new("color")));
    }

    #[test]
    fn input_object_unresolvable_variable_field_takes_default() {
        let value = Value::Object(
            [
                (Name::new("title"), Value::String("Alien".into())),
                (Name::new("int"), Value::Variable(Name::new("missingVar"))),
            ]
            .into_iter()
            .collect(),
        );
        let coerced = coerce(value, "FilmInput").unwrap();
        let ConstValue::Object(object) = coerced else {
            unreachable!("expected an object");
        };
        assert_eq!(object[&Name::new("int")], ConstValue::from(42));
    }

    #[test]
    fn required_input_field_missing_fails() {
        let value = Value::Object([(Name::new("int"), int(1))].into_iter().collect());
        // `title: String!` has no default.
        assert_eq!(coerce(value, "FilmInput"), None);
    }

    #[test]
    fn enum_custom_values() {
        assert_eq!(coerce(Value::Enum(Name::new("RED")), "TestColor"), Some(ConstValue::from(1)));
        assert_eq!(
            coerce(Value::Enum(Name::new("GREEN")), "TestColor"),
            Some(ConstValue::String("GREEN".into()))
        );
        assert_eq!(coerce(Value::Enum(Name::new("PURPLE")), "TestColor"), None);
        // A string literal never reads as an enum value, even a declared one.
        assert_eq!(coerce(Value::String("RED".into()), "TestColor"), None);
    }

    #[test]
    fn spec_scalar_parsing() {
        assert_eq!(coerce(int(42), "Int"), Some(ConstValue::from(42)));
        assert_eq!(coerce(Value::String("42".into()), "Int"), None);
        assert_eq!(coerce(int(42), "ID"), Some(ConstValue::String("42".into())));
        assert_eq!(
            coerce(Value::String("abc".into()), "ID"),
            Some(ConstValue::String("abc".into()))
        );
        assert_eq!(coerce(Value::Boolean(true), "Boolean"), Some(ConstValue::Boolean(true)));
    }
}
