//! SDL printing, with optional field filtering for minimal schema output.

use std::fmt::Write;

use async_graphql_parser::types::DirectiveLocation;
use indexmap::IndexSet;
use itertools::Itertools;

use crate::{MetaDirective, MetaField, MetaInputValue, MetaType};

/// Prints one type declaration. With a filter, objects and interfaces only
/// keep the listed fields; every other kind prints whole. The five spec
/// scalars are never printed.
pub fn write_type(sdl: &mut String, ty: &MetaType, field_filter: Option<&IndexSet<String>>) {
    match ty {
        MetaType::Scalar(scalar) => {
            if !encoded_schema::is_spec_scalar(&scalar.name) {
                if let Some(url) = &scalar.specified_by_url {
                    writeln!(sdl, "scalar {} @specifiedBy(url: \"{url}\")", scalar.name).ok();
                } else {
                    writeln!(sdl, "scalar {}", scalar.name).ok();
                }
            }
        }
        MetaType::Object(object) => {
            write!(sdl, "type {}", object.name).ok();
            write_implements(sdl, &object.implements);
            writeln!(sdl, " {{").ok();
            write_fields(sdl, object.fields.values(), field_filter);
            writeln!(sdl, "}}").ok();
        }
        MetaType::Interface(interface) => {
            write!(sdl, "interface {}", interface.name).ok();
            write_implements(sdl, &interface.implements);
            writeln!(sdl, " {{").ok();
            write_fields(sdl, interface.fields.values(), field_filter);
            writeln!(sdl, "}}").ok();
        }
        MetaType::Union(union) => {
            writeln!(sdl, "union {} = {}", union.name, union.members.join(" | ")).ok();
        }
        MetaType::Enum(r#enum) => {
            writeln!(sdl, "enum {} {{", r#enum.name).ok();
            for value in &r#enum.values {
                writeln!(sdl, "\t{value}").ok();
            }
            writeln!(sdl, "}}").ok();
        }
        MetaType::InputObject(input_object) => {
            writeln!(sdl, "input {} {{", input_object.name).ok();
            for field in input_object.fields.values() {
                writeln!(sdl, "\t{}", input_value_sdl(field)).ok();
            }
            writeln!(sdl, "}}").ok();
        }
    }
}

pub fn write_directive(sdl: &mut String, directive: &MetaDirective) {
    write!(sdl, "directive @{}", directive.name).ok();
    if !directive.args.is_empty() {
        write!(sdl, "({})", directive.args.values().map(input_value_sdl).join(", ")).ok();
    }
    let locations = directive
        .locations
        .iter()
        .map(|location| directive_location_sdl(*location))
        .join(" | ");
    writeln!(sdl, " on {locations}").ok();
}

/// `FieldDefinition` -> `FIELD_DEFINITION`.
pub fn directive_location_sdl(location: DirectiveLocation) -> String {
    let camel = format!("{location:?}");
    let mut screaming = String::with_capacity(camel.len() + 4);
    for (i, c) in camel.chars().enumerate() {
        if c.is_ascii_uppercase() && i != 0 {
            screaming.push('_');
        }
        screaming.push(c.to_ascii_uppercase());
    }
    screaming
}

fn write_implements(sdl: &mut String, implements: &[String]) {
    if !implements.is_empty() {
        write!(sdl, " implements {}", implements.join(" & ")).ok();
    }
}

fn write_fields<'a>(sdl: &mut String, fields: impl Iterator<Item = &'a MetaField>, filter: Option<&IndexSet<String>>) {
    for field in fields {
        if filter.map(|filter| !filter.contains(&field.name)).unwrap_or(false) {
            continue;
        }
        if field.args.is_empty() {
            writeln!(sdl, "\t{}: {}", field.name, field.ty).ok();
        } else {
            let args = field.args.values().map(input_value_sdl).join(", ");
            writeln!(sdl, "\t{}({args}): {}", field.name, field.ty).ok();
        }
    }
}

fn input_value_sdl(value: &MetaInputValue) -> String {
    match &value.default_value {
        Some(default) => format!("{}: {} = {default}", value.name, value.ty),
        None => format!("{}: {}", value.name, value.ty),
    }
}

#[cfg(test)]
mod tests {
    use expect_test::expect;
    use indexmap::IndexSet;

    use super::*;
    use crate::Registry;

    #[test]
    fn field_filtered_object() {
        let registry = Registry::from_sdl(
            r#"
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
            "#,
        )
        .unwrap();

        let mut sdl = String::new();
        let filter: IndexSet<String> = ["title".to_string()].into_iter().collect();
        write_type(&mut sdl, registry.lookup_type("Film").unwrap(), Some(&filter));

        expect![[r#"
            type Film implements Node {
            	title(foo: String = "Bar"): String!
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn directive_declaration() {
        let registry = Registry::from_sdl(
            r#"
            directive @cached(maxAge: Int = 60) on FIELD | FRAGMENT_SPREAD
            type Query {
                a: Int
            }
            "#,
        )
        .unwrap();

        let mut sdl = String::new();
        write_directive(&mut sdl, registry.lookup_directive("cached").unwrap());
        assert_eq!(
            sdl,
            "directive @cached(maxAge: Int = 60) on FIELD | FRAGMENT_SPREAD\n"
        );
    }

    #[test]
    fn directive_declaration_never_prints_repeatable() {
        // The `repeatable` keyword is dropped either way, since the parser
        // reports every directive definition as repeatable.
        let registry = Registry::from_sdl(
            r#"
            directive @tag(name: String!) repeatable on OBJECT
            directive @key(fields: String!) on OBJECT
            type Query {
                a: Int
            }
            "#,
        )
        .unwrap();

        let mut sdl = String::new();
        write_directive(&mut sdl, registry.lookup_directive("tag").unwrap());
        write_directive(&mut sdl, registry.lookup_directive("key").unwrap());
        assert_eq!(
            sdl,
            "directive @tag(name: String!) on OBJECT\ndirective @key(fields: String!) on OBJECT\n"
        );
    }

    #[test]
    fn location_names() {
        assert_eq!(directive_location_sdl(DirectiveLocation::Field), "FIELD");
        assert_eq!(
            directive_location_sdl(DirectiveLocation::FieldDefinition),
            "FIELD_DEFINITION"
        );
        assert_eq!(directive_location_sdl(DirectiveLocation::EnumValue), "ENUM_VALUE");
    }
}
