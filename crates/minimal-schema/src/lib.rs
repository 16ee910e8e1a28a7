//! Minimal viable schema extraction: a closure analysis over the full schema
//! driven by one request document, printed back as SDL. The output contains
//! exactly the types, fields, arguments and directives the document can
//! touch at execution time, and nothing else.

use async_graphql_parser::{
    types::{Directive, ExecutableDocument, Field, OperationDefinition, Selection, SelectionSet},
    Pos, Positioned,
};
use async_graphql_value::Name;
use indexmap::{IndexMap, IndexSet};
use schema_registry::{MetaType, Registry};
use type_tracker::{TrackError, TypeTracker, SPECIFIED_DIRECTIVE_NAMES};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Schema(#[from] TrackError),
    #[error("unknown fragment `{0}`")]
    UnknownFragment(String),
}

/// What one extraction has collected about a type so far. Objects and
/// interfaces reprint with only the fields the document touches; every other
/// kind reprints whole, since unions, enums, scalars and input objects are
/// never field-filtered.
enum Extracted {
    Filtered { used_fields: IndexSet<String> },
    Whole,
}

/// Computes the minimal schema subset for one document.
///
/// Types print in the order they were first touched by the walk, which is
/// deterministic for a given document but not alphabetical.
pub fn extract_minimal_schema(registry: &Registry, document: &ExecutableDocument) -> Result<String, ExtractError> {
    tracing::debug!(
        operations = document.operations.iter().count(),
        fragments = document.fragments.len(),
        "extracting minimal viable schema"
    );

    let mut extractor = Extractor {
        registry,
        tracker: TypeTracker::new(registry),
        document,
        types: IndexMap::new(),
        directives: IndexSet::new(),
    };

    for (_, operation) in document.operations.iter() {
        extractor.walk_operation(operation)?;
    }

    // Fragment definitions come out of the parser unordered.
    let mut fragment_names: Vec<&Name> = document.fragments.keys().collect();
    fragment_names.sort();
    for name in fragment_names {
        extractor.walk_fragment_definition(&document.fragments[name])?;
    }

    Ok(extractor.print())
}

struct Extractor<'a> {
    registry: &'a Registry,
    tracker: TypeTracker<'a, Registry>,
    document: &'a ExecutableDocument,
    types: IndexMap<String, Extracted>,
    directives: IndexSet<String>,
}

impl Extractor<'_> {
    fn walk_operation(&mut self, operation: &Positioned<OperationDefinition>) -> Result<(), ExtractError> {
        self.tracker.enter_operation(operation.node.ty, operation.pos)?;

        for definition in &operation.node.variable_definitions {
            self.tracker.enter_variable_definition(&definition.node.var_type.node);
            let declared = definition.node.var_type.node.to_string();
            self.capture_input(encoded_schema::TypeReference::encode(&declared).unwrap_all().name());
            self.tracker.leave_variable_definition();
        }

        self.walk_directives(&operation.node.directives)?;
        self.walk_selection_set(&operation.node.selection_set)?;

        self.tracker.leave_operation();
        Ok(())
    }

    fn walk_fragment_definition(
        &mut self,
        fragment: &Positioned<async_graphql_parser::types::FragmentDefinition>,
    ) -> Result<(), ExtractError> {
        let type_condition = fragment.node.type_condition.node.on.node.to_string();
        self.tracker.enter_fragment(Some(&type_condition));
        let result = self
            .walk_directives(&fragment.node.directives)
            .and_then(|()| self.walk_selection_set(&fragment.node.selection_set));
        self.tracker.leave_fragment();
        result
    }

    fn walk_selection_set(&mut self, selection_set: &Positioned<SelectionSet>) -> Result<(), ExtractError> {
        self.tracker.enter_selection_set();
        let result = self.walk_selections(&selection_set.node.items);
        self.tracker.leave_selection_set();
        result
    }

    fn walk_selections(&mut self, items: &[Positioned<Selection>]) -> Result<(), ExtractError> {
        for item in items {
            self.walk_selection(item)?;
        }
        Ok(())
    }

    fn walk_selection(&mut self, selection: &Positioned<Selection>) -> Result<(), ExtractError> {
        match &selection.node {
            Selection::Field(field) => self.walk_field(field),
            Selection::FragmentSpread(spread) => {
                let fragment_name = &spread.node.fragment_name.node;
                let Some(fragment) = self.document.fragments.get(fragment_name) else {
                    return Err(ExtractError::UnknownFragment(fragment_name.to_string()));
                };
                let type_condition = fragment.node.type_condition.node.on.node.to_string();
                self.record_narrowing(&type_condition);
                self.walk_directives(&spread.node.directives)
            }
            Selection::InlineFragment(inline) => {
                let type_condition = inline
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.to_string());
                if let Some(condition) = &type_condition {
                    self.record_narrowing(condition);
                }
                self.tracker.enter_fragment(type_condition.as_deref());
                let result = self
                    .walk_directives(&inline.node.directives)
                    .and_then(|()| self.walk_selection_set(&inline.node.selection_set));
                self.tracker.leave_fragment();
                result
            }
        }
    }

    fn walk_field(&mut self, field: &Positioned<Field>) -> Result<(), ExtractError> {
        let name = field.node.name.node.as_str();
        self.tracker.enter_field(name, field.pos)?;
        let result = self.walk_entered_field(field);
        self.tracker.leave_field();
        result
    }

    fn walk_entered_field(&mut self, field: &Positioned<Field>) -> Result<(), ExtractError> {
        self.walk_directives(&field.node.directives)?;
        if !field.node.selection_set.node.items.is_empty() {
            self.walk_selection_set(&field.node.selection_set)?;
        }
        // Recording happens after the subtree so that leaf types land in the
        // accumulator before the types that lead to them.
        self.record_field(field.node.name.node.as_str(), field.pos)
    }

    fn walk_directives(&mut self, directives: &[Positioned<Directive>]) -> Result<(), ExtractError> {
        for directive in directives {
            let name = directive.node.name.node.as_str();
            self.tracker.enter_directive(name, directive.pos)?;
            self.record_directive(name);
            self.tracker.leave_directive();
        }
        Ok(())
    }

    fn record_field(&mut self, field_name: &str, pos: Pos) -> Result<(), ExtractError> {
        if field_name == "__typename" {
            return Ok(());
        }

        let Some(parent) = self.tracker.parent_type().map(str::to_string) else {
            return Ok(());
        };
        let Some(entry) = self.tracker.field_def().cloned() else {
            return Err(TrackError::UnknownField {
                parent,
                field: field_name.to_string(),
                pos,
            }
            .into());
        };

        match self.registry.lookup_type(&parent) {
            Some(MetaType::Object(object)) => {
                let implements = object.implements.clone();
                self.used_fields(&parent).insert(field_name.to_string());
                // A field reached through a concrete spread still counts
                // against any already-touched interface that declares it.
                for interface_name in self.registry.transitive_interfaces(&implements) {
                    let declares_field = self
                        .registry
                        .lookup_type(&interface_name)
                        .and_then(|ty| ty.field(field_name))
                        .is_some();
                    if declares_field && self.types.contains_key(&interface_name) {
                        self.used_fields(&interface_name).insert(field_name.to_string());
                    }
                }
            }
            Some(MetaType::Interface(_)) => {
                // A field selected directly on an interface may be served by
                // any implementor at runtime, so the whole implementor set is
                // pulled in, not just the types spread so far.
                let implementors: Vec<String> = self
                    .registry
                    .implementors(&parent)
                    .map(|object| object.name.clone())
                    .collect();
                self.used_fields(&parent).insert(field_name.to_string());
                for implementor in implementors {
                    self.used_fields(&implementor).insert(field_name.to_string());
                }
            }
            _ => {}
        }

        for argument in entry.arguments.values() {
            self.capture_input(argument.ty.unwrap_all().name());
        }
        self.capture_output(entry.ty.unwrap_all().name());
        Ok(())
    }

    /// A fragment spread or inline fragment narrowing an abstract parent.
    /// Only the concretely-spread implementor joins the output; implementors
    /// the document never names stay excluded.
    fn record_narrowing(&mut self, type_condition: &str) {
        let Some(parent) = self.tracker.parent_type().map(str::to_string) else {
            return;
        };
        match self.registry.lookup_type(&parent) {
            Some(MetaType::Interface(_)) => {
                self.used_fields(&parent);
            }
            Some(MetaType::Union(_)) => {
                self.types.insert(parent, Extracted::Whole);
            }
            _ => return,
        }
        if matches!(self.registry.lookup_type(type_condition), Some(MetaType::Object(_))) {
            self.used_fields(type_condition);
        }
    }

    fn record_directive(&mut self, name: &str) {
        if SPECIFIED_DIRECTIVE_NAMES.contains(&name) {
            return;
        }
        let Some(directive) = self.registry.lookup_directive(name) else {
            // Resolved from the tracker's fallback set, not the schema.
            return;
        };
        let argument_types: Vec<String> = directive
            .args
            .values()
            .map(|arg| {
                encoded_schema::TypeReference::encode(&arg.ty)
                    .unwrap_all()
                    .name()
                    .to_string()
            })
            .collect();
        self.directives.insert(name.to_string());
        for ty in argument_types {
            self.capture_input(&ty);
        }
    }

    /// A type referenced in output position: composite kinds get a (possibly
    /// still empty) filtered entry, leaf kinds are captured whole.
    fn capture_output(&mut self, name: &str) {
        if encoded_schema::is_spec_scalar(name) {
            return;
        }
        match self.registry.lookup_type(name) {
            Some(MetaType::Object(_) | MetaType::Interface(_)) => {
                self.used_fields(name);
            }
            Some(MetaType::Union(_) | MetaType::Enum(_) | MetaType::Scalar(_)) => {
                self.types.entry(name.to_string()).or_insert(Extracted::Whole);
            }
            Some(MetaType::InputObject(_)) | None => {}
        }
    }

    /// A type referenced in input position. Input objects are captured whole
    /// together with everything their fields reach; they are never
    /// field-filtered, so the closure can stop at already-captured names.
    fn capture_input(&mut self, name: &str) {
        if encoded_schema::is_spec_scalar(name) || self.types.contains_key(name) {
            return;
        }
        match self.registry.lookup_type(name) {
            Some(MetaType::Enum(_) | MetaType::Scalar(_)) => {
                self.types.insert(name.to_string(), Extracted::Whole);
            }
            Some(MetaType::InputObject(input_object)) => {
                self.types.insert(name.to_string(), Extracted::Whole);
                let nested: Vec<String> = input_object
                    .fields
                    .values()
                    .map(|field| {
                        encoded_schema::TypeReference::encode(&field.ty)
                            .unwrap_all()
                            .name()
                            .to_string()
                    })
                    .collect();
                for nested_name in nested {
                    self.capture_input(&nested_name);
                }
            }
            _ => {}
        }
    }

    fn used_fields(&mut self, name: &str) -> &mut IndexSet<String> {
        let entry = self.types.entry(name.to_string()).or_insert_with(|| Extracted::Filtered {
            used_fields: IndexSet::new(),
        });
        match entry {
            Extracted::Filtered { used_fields } => used_fields,
            // A name is only ever recorded under the kind the registry gives
            // it, and objects and interfaces are always filtered.
            Extracted::Whole => unreachable!("`{name}` captured whole"),
        }
    }

    fn print(&self) -> String {
        let mut sdl = String::new();
        for (name, extracted) in &self.types {
            let Some(ty) = self.registry.lookup_type(name) else {
                continue;
            };
            match extracted {
                Extracted::Filtered { used_fields } => schema_registry::write_type(&mut sdl, ty, Some(used_fields)),
                Extracted::Whole => schema_registry::write_type(&mut sdl, ty, None),
            }
        }
        for name in &self.directives {
            if let Some(directive) = self.registry.lookup_directive(name) {
                schema_registry::write_directive(&mut sdl, directive);
            }
        }
        sdl
    }
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::parse_query;
    use expect_test::expect;

    use super::*;

    fn extract(sdl: &str, query: &str) -> String {
        let registry = Registry::from_sdl(sdl).unwrap();
        let document = parse_query(query).unwrap();
        extract_minimal_schema(&registry, &document).unwrap()
    }

    const FILM_SCHEMA: &str = r#"
        interface Node {
            id: ID!
        }
        type Film implements Node {
            id: ID!
            title(foo: String = "Bar"): String!
        }
        type Series implements Node {
            id: ID!
            seasons: Int
        }
        type Query {
            film(id: ID!): Film
            node(id: ID!): Node
        }
    "#;

    #[test]
    fn keeps_only_touched_fields() {
        let sdl = extract(FILM_SCHEMA, r#"{ film(id: "1") { title } }"#);

        expect![[r#"
            type Film implements Node {
            	title(foo: String = "Bar"): String!
            }
            type Query {
            	film(id: ID!): Film
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn interface_field_pulls_in_every_implementor() {
        let sdl = extract(FILM_SCHEMA, r#"{ node(id: "1") { id } }"#);

        expect![[r#"
            interface Node {
            	id: ID!
            }
            type Film implements Node {
            	id: ID!
            }
            type Series implements Node {
            	id: ID!
            }
            type Query {
            	node(id: ID!): Node
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn concrete_spread_excludes_unspread_implementors() {
        let sdl = extract(FILM_SCHEMA, r#"{ node(id: "1") { ... on Film { id } } }"#);

        assert!(!sdl.contains("Series"));
        expect![[r#"
            interface Node {
            	id: ID!
            }
            type Film implements Node {
            	id: ID!
            }
            type Query {
            	node(id: ID!): Node
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn named_fragments_record_against_their_condition() {
        let sdl = extract(
            FILM_SCHEMA,
            r#"
            query { node(id: "1") { ...filmFields } }
            fragment filmFields on Film { title }
            "#,
        );

        // `title` is not declared on Node, so the interface prints empty.
        expect![[r#"
            interface Node {
            }
            type Film implements Node {
            	title(foo: String = "Bar"): String!
            }
            type Query {
            	node(id: ID!): Node
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn extraction_is_a_fixed_point() {
        let query = r#"{ film(id: "1") { title } }"#;
        let first = extract(FILM_SCHEMA, query);
        let second = extract(&first, query);
        assert_eq!(first, second);
    }

    #[test]
    fn input_objects_close_over_their_field_types() {
        let sdl = extract(
            r#"
            enum Genre {
                DRAMA
                SCIFI
            }
            input NestedFilter {
                limit: Int
            }
            input FilmFilter {
                genre: Genre
                nested: NestedFilter
            }
            type Film {
                title: String
            }
            type Query {
                films(filter: FilmFilter): [Film]
            }
            "#,
            "{ films(filter: { genre: DRAMA }) { title } }",
        );

        expect![[r#"
            type Film {
            	title: String
            }
            type Query {
            	films(filter: FilmFilter): [Film]
            }
            input FilmFilter {
            	genre: Genre
            	nested: NestedFilter
            }
            enum Genre {
            	DRAMA
            	SCIFI
            }
            input NestedFilter {
            	limit: Int
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn union_spreads_print_the_union_whole() {
        let sdl = extract(
            r#"
            type Film {
                title: String
            }
            type Series {
                seasons: Int
            }
            union SearchResult = Film | Series
            type Query {
                search: [SearchResult]
            }
            "#,
            "{ search { ... on Film { title } } }",
        );

        expect![[r#"
            union SearchResult = Film | Series
            type Film {
            	title: String
            }
            type Query {
            	search: [SearchResult]
            }
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn schema_directives_are_declared_and_specified_ones_are_not() {
        let sdl = extract(
            r#"
            directive @cached(maxAge: Int = 60) on FIELD
            type Query {
                film: String
            }
            "#,
            "{ film @cached(maxAge: 10) @include(if: true) }",
        );

        expect![[r#"
            type Query {
            	film: String
            }
            directive @cached(maxAge: Int = 60) on FIELD
        "#]]
        .assert_eq(&sdl);
    }

    #[test]
    fn unknown_fragment_is_an_error() {
        let registry = Registry::from_sdl("type Query { film: String }").unwrap();
        let document = parse_query("{ ...missing }").unwrap();
        let error = extract_minimal_schema(&registry, &document).unwrap_err();
        assert_eq!(error.to_string(), "unknown fragment `missing`");
    }
}
