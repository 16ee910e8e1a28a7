use std::collections::HashSet;

use async_graphql_parser::{
    types::{OperationType, Type},
    Pos,
};
use async_graphql_value::ConstValue;
use encoded_schema::TypeReference;
use indexmap::IndexMap;

use crate::{ArgumentEntry, DirectiveEntry, FieldEntry, SchemaIndex};

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("schema has no root type for {operation:?} operations (line {}, column {})", pos.line, pos.column)]
    UnknownRootType { operation: OperationType, pos: Pos },
    #[error("unknown field `{field}` on type `{parent}` (line {}, column {})", pos.line, pos.column)]
    UnknownField { parent: String, field: String, pos: Pos },
    #[error("unknown argument `{argument}` (line {}, column {})", pos.line, pos.column)]
    UnknownArgument { argument: String, pos: Pos },
    #[error("unknown directive `@{directive}` (line {}, column {})", pos.line, pos.column)]
    UnknownDirective { directive: String, pos: Pos },
    #[error("unknown field `{field}` on input type `{input_object}` (line {}, column {})", pos.line, pos.column)]
    UnknownInputField {
        input_object: String,
        field: String,
        pos: Pos,
    },
    #[error("`{value}` is not a value of enum `{enum_name}` (line {}, column {})", pos.line, pos.column)]
    UnknownEnumValue {
        enum_name: String,
        value: String,
        pos: Pos,
    },
}

/// The directive currently being entered, if any.
#[derive(Debug, Clone)]
pub struct TrackedDirective {
    pub name: String,
    pub entry: DirectiveEntry,
}

/// Five parallel stacks plus three scalar slots. Every `enter_*` push is
/// matched by exactly one `leave_*` pop, so one tracker can be reused across
/// sibling subtrees and across whole documents.
///
/// Resolution failures are errors, except while inside a directive whose name
/// the caller listed as ignorable: there the schema is allowed to be silent
/// and the stacks take `None` placeholders instead.
pub struct TypeTracker<'a, S> {
    schema: &'a S,
    default_directives: IndexMap<String, DirectiveEntry>,
    ignored_directives: HashSet<String>,

    type_stack: Vec<Option<TypeReference>>,
    parent_type_stack: Vec<Option<String>>,
    input_type_stack: Vec<Option<TypeReference>>,
    field_stack: Vec<Option<FieldEntry>>,
    default_value_stack: Vec<Option<ConstValue>>,

    directive: Option<TrackedDirective>,
    argument: Option<(String, ArgumentEntry)>,
    enum_value: Option<String>,
    in_ignored_directive: bool,
}

impl<'a, S: SchemaIndex> TypeTracker<'a, S> {
    pub fn new(schema: &'a S) -> Self {
        TypeTracker {
            schema,
            default_directives: crate::specified_directives(),
            ignored_directives: HashSet::new(),
            type_stack: Vec::new(),
            parent_type_stack: Vec::new(),
            input_type_stack: Vec::new(),
            field_stack: Vec::new(),
            default_value_stack: Vec::new(),
            directive: None,
            argument: None,
            enum_value: None,
            in_ignored_directive: false,
        }
    }

    /// Replaces the fallback directive set consulted when the schema itself
    /// does not declare a directive.
    pub fn with_default_directives(mut self, directives: IndexMap<String, DirectiveEntry>) -> Self {
        self.default_directives = directives;
        self
    }

    /// Directives whose arguments may be unresolvable without failing the
    /// walk.
    pub fn with_ignored_directives(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.ignored_directives = names.into_iter().collect();
        self
    }

    pub fn enter_operation(&mut self, operation: OperationType, pos: Pos) -> Result<(), TrackError> {
        let root = self
            .schema
            .root_operation_type(operation)
            .ok_or(TrackError::UnknownRootType { operation, pos })?;
        self.type_stack.push(Some(TypeReference::encode(&root)));
        Ok(())
    }

    pub fn leave_operation(&mut self) {
        self.type_stack.pop();
    }

    /// Pushes the named type of the current output type as the new parent,
    /// or `None` when it is not composite. Not an error: it merely means no
    /// field lookups are possible inside this selection set.
    pub fn enter_selection_set(&mut self) {
        let parent = self
            .current_type()
            .map(|ty| ty.unwrap_all().name().to_string())
            .filter(|name| self.schema.is_composite_type(name));
        self.parent_type_stack.push(parent);
    }

    pub fn leave_selection_set(&mut self) {
        self.parent_type_stack.pop();
    }

    pub fn enter_field(&mut self, name: &str, pos: Pos) -> Result<(), TrackError> {
        if name == "__typename" {
            let entry = FieldEntry {
                ty: TypeReference::encode("String!"),
                arguments: IndexMap::new(),
            };
            self.type_stack.push(Some(entry.ty.clone()));
            self.field_stack.push(Some(entry));
            return Ok(());
        }

        let parent = self.parent_type_stack.last().cloned().flatten();
        let entry = parent.as_deref().and_then(|parent| self.schema.field(parent, name));

        match entry {
            Some(entry) => {
                self.type_stack.push(Some(entry.ty.clone()));
                self.field_stack.push(Some(entry));
                Ok(())
            }
            None if self.in_ignored_directive => {
                self.type_stack.push(None);
                self.field_stack.push(None);
                Ok(())
            }
            None => Err(TrackError::UnknownField {
                parent: parent.unwrap_or_else(|| "<unknown>".to_string()),
                field: name.to_string(),
                pos,
            }),
        }
    }

    pub fn leave_field(&mut self) {
        self.type_stack.pop();
        self.field_stack.pop();
    }

    pub fn enter_directive(&mut self, name: &str, pos: Pos) -> Result<(), TrackError> {
        let entry = self
            .schema
            .directive(name)
            .or_else(|| self.default_directives.get(name).cloned());

        match entry {
            Some(entry) => {
                self.directive = Some(TrackedDirective {
                    name: name.to_string(),
                    entry,
                });
                Ok(())
            }
            None if self.ignored_directives.contains(name) => {
                self.in_ignored_directive = true;
                Ok(())
            }
            None => Err(TrackError::UnknownDirective {
                directive: name.to_string(),
                pos,
            }),
        }
    }

    pub fn leave_directive(&mut self) {
        self.directive = None;
        self.in_ignored_directive = false;
    }

    /// A fragment pushes its type condition; an inline fragment without one
    /// keeps the current type.
    pub fn enter_fragment(&mut self, type_condition: Option<&str>) {
        let ty = match type_condition {
            Some(name) => Some(TypeReference::encode(name)),
            None => self.current_type().map(|ty| ty.unwrap_all()),
        };
        self.type_stack.push(ty);
    }

    pub fn leave_fragment(&mut self) {
        self.type_stack.pop();
    }

    pub fn enter_variable_definition(&mut self, ty: &Type) {
        self.input_type_stack.push(Some(TypeReference::encode(&ty.to_string())));
    }

    pub fn leave_variable_definition(&mut self) {
        self.input_type_stack.pop();
    }

    pub fn enter_argument(&mut self, name: &str, pos: Pos) -> Result<(), TrackError> {
        let entry = match &self.directive {
            Some(directive) => directive.entry.arguments.get(name),
            None => self
                .field_stack
                .last()
                .and_then(|field| field.as_ref())
                .and_then(|field| field.arguments.get(name)),
        }
        .cloned();

        match entry {
            Some(entry) => {
                self.input_type_stack.push(Some(entry.ty.clone()));
                self.default_value_stack.push(entry.default_value.clone());
                self.argument = Some((name.to_string(), entry));
                Ok(())
            }
            None if self.in_ignored_directive => {
                self.input_type_stack.push(None);
                self.default_value_stack.push(None);
                Ok(())
            }
            None => Err(TrackError::UnknownArgument {
                argument: name.to_string(),
                pos,
            }),
        }
    }

    pub fn leave_argument(&mut self) {
        self.input_type_stack.pop();
        self.default_value_stack.pop();
        self.argument = None;
    }

    /// List elements never inherit their container's default value.
    pub fn enter_list_value(&mut self) {
        let item = self.input_type().map(|ty| {
            let nullable = if ty.is_non_null() { ty.unwrap() } else { ty.clone() };
            if nullable.is_list() {
                nullable.unwrap()
            } else {
                nullable
            }
        });
        self.input_type_stack.push(item);
        self.default_value_stack.push(None);
    }

    pub fn leave_list_value(&mut self) {
        self.input_type_stack.pop();
        self.default_value_stack.pop();
    }

    pub fn enter_object_field(&mut self, name: &str, pos: Pos) -> Result<(), TrackError> {
        let input_object = self.input_type().map(|ty| ty.unwrap_all().name().to_string());
        let entry = input_object
            .as_deref()
            .and_then(|input_object| self.schema.input_field(input_object, name));

        match entry {
            Some(entry) => {
                self.input_type_stack.push(Some(entry.ty.clone()));
                self.default_value_stack.push(entry.default_value);
                Ok(())
            }
            None if self.in_ignored_directive => {
                self.input_type_stack.push(None);
                self.default_value_stack.push(None);
                Ok(())
            }
            None => Err(TrackError::UnknownInputField {
                input_object: input_object.unwrap_or_else(|| "<unknown>".to_string()),
                field: name.to_string(),
                pos,
            }),
        }
    }

    pub fn leave_object_field(&mut self) {
        self.input_type_stack.pop();
        self.default_value_stack.pop();
    }

    /// Records the enum value a literal resolves to. Literals against
    /// non-enum input types are tolerated (custom scalars may accept them).
    pub fn enter_enum_value(&mut self, value: &str, pos: Pos) -> Result<(), TrackError> {
        self.enum_value = None;
        let enum_name = self.input_type().map(|ty| ty.unwrap_all().name().to_string());
        match enum_name
            .as_deref()
            .and_then(|enum_name| self.schema.has_enum_value(enum_name, value))
        {
            Some(true) => {
                self.enum_value = Some(value.to_string());
                Ok(())
            }
            Some(false) if !self.in_ignored_directive => Err(TrackError::UnknownEnumValue {
                enum_name: enum_name.unwrap_or_else(|| "<unknown>".to_string()),
                value: value.to_string(),
                pos,
            }),
            _ => Ok(()),
        }
    }

    pub fn leave_enum_value(&mut self) {
        self.enum_value = None;
    }

    pub fn current_type(&self) -> Option<&TypeReference> {
        self.type_stack.last().and_then(|ty| ty.as_ref())
    }

    pub fn parent_type(&self) -> Option<&str> {
        self.parent_type_stack.last().and_then(|parent| parent.as_deref())
    }

    pub fn input_type(&self) -> Option<&TypeReference> {
        self.input_type_stack.last().and_then(|ty| ty.as_ref())
    }

    pub fn field_def(&self) -> Option<&FieldEntry> {
        self.field_stack.last().and_then(|field| field.as_ref())
    }

    pub fn default_value(&self) -> Option<&ConstValue> {
        self.default_value_stack.last().and_then(|value| value.as_ref())
    }

    pub fn directive(&self) -> Option<&TrackedDirective> {
        self.directive.as_ref()
    }

    pub fn argument(&self) -> Option<(&str, &ArgumentEntry)> {
        self.argument.as_ref().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn enum_value(&self) -> Option<&str> {
        self.enum_value.as_deref()
    }

    pub fn in_ignored_directive(&self) -> bool {
        self.in_ignored_directive
    }

    /// True between walks: every push has been popped.
    pub fn is_at_rest(&self) -> bool {
        self.type_stack.is_empty()
            && self.parent_type_stack.is_empty()
            && self.input_type_stack.is_empty()
            && self.field_stack.is_empty()
            && self.default_value_stack.is_empty()
            && self.directive.is_none()
            && self.argument.is_none()
            && self.enum_value.is_none()
            && !self.in_ignored_directive
    }
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::Pos;
    use schema_registry::Registry;

    use super::*;

    fn registry() -> Registry {
        Registry::from_sdl(
            r#"
            type Film {
                id: ID!
                title(foo: String = "Bar"): String!
            }
            type Query {
                film(id: ID!): Film
                color(input: ColorInput): TestColor
            }
            input ColorInput {
                color: TestColor
                weights: [Float!]
            }
            enum TestColor {
                RED
                GREEN
                BLUE
            }
            "#,
        )
        .unwrap()
    }

    fn pos() -> Pos {
        Pos::default()
    }

    #[test]
    fn tracks_a_nested_field_walk() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry);

        tracker.enter_operation(OperationType::Query, pos()).unwrap();
        tracker.enter_selection_set();
        tracker.enter_field("film", pos()).unwrap();
        assert_eq!(tracker.current_type().unwrap().decode(), "Film");
        assert_eq!(tracker.parent_type(), Some("Query"));

        tracker.enter_argument("id", pos()).unwrap();
        assert_eq!(tracker.input_type().unwrap().decode(), "ID!");
        assert_eq!(tracker.default_value(), None);
        tracker.leave_argument();

        tracker.enter_selection_set();
        tracker.enter_field("title", pos()).unwrap();
        assert_eq!(tracker.current_type().unwrap().decode(), "String!");
        assert_eq!(tracker.parent_type(), Some("Film"));
        let foo = &tracker.field_def().unwrap().arguments["foo"];
        assert_eq!(foo.default_value, Some(ConstValue::String("Bar".into())));
        tracker.leave_field();
        tracker.leave_selection_set();

        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_operation();
        assert!(tracker.is_at_rest());
    }

    #[test]
    fn tracks_input_values() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry);

        tracker.enter_operation(OperationType::Query, pos()).unwrap();
        tracker.enter_selection_set();
        tracker.enter_field("color", pos()).unwrap();
        tracker.enter_argument("input", pos()).unwrap();
        tracker.enter_object_field("color", pos()).unwrap();
        assert_eq!(tracker.input_type().unwrap().decode(), "TestColor");
        tracker.enter_enum_value("RED", pos()).unwrap();
        assert_eq!(tracker.enum_value(), Some("RED"));
        tracker.leave_enum_value();
        assert!(tracker.enter_enum_value("PURPLE", pos()).is_err());
        tracker.leave_object_field();

        tracker.enter_object_field("weights", pos()).unwrap();
        tracker.enter_list_value();
        // List elements never inherit the container default.
        assert_eq!(tracker.input_type().unwrap().decode(), "Float!");
        assert_eq!(tracker.default_value(), None);
        tracker.leave_list_value();
        tracker.leave_object_field();

        tracker.leave_argument();
        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_operation();
        assert!(tracker.is_at_rest());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry);

        tracker.enter_operation(OperationType::Query, pos()).unwrap();
        tracker.enter_selection_set();
        let error = tracker.enter_field("missing", pos()).unwrap_err();
        assert!(error.to_string().contains("unknown field `missing` on type `Query`"));
    }

    #[test]
    fn specified_directives_resolve_without_schema_entries() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry);

        tracker.enter_directive("include", pos()).unwrap();
        tracker.enter_argument("if", pos()).unwrap();
        assert_eq!(tracker.input_type().unwrap().decode(), "Boolean!");
        tracker.leave_argument();
        tracker.leave_directive();
        assert!(tracker.is_at_rest());
    }

    #[test]
    fn ignored_directives_tolerate_unknown_arguments() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry).with_ignored_directives(["connection".to_string()]);

        assert!(matches!(
            tracker.enter_directive("rateLimit", pos()),
            Err(TrackError::UnknownDirective { .. })
        ));

        tracker.enter_directive("connection", pos()).unwrap();
        assert!(tracker.in_ignored_directive());
        tracker.enter_argument("key", pos()).unwrap();
        assert_eq!(tracker.input_type(), None);
        tracker.leave_argument();
        tracker.leave_directive();
        assert!(tracker.is_at_rest());
    }

    #[test]
    fn fragments_narrow_the_current_type() {
        let registry = registry();
        let mut tracker = TypeTracker::new(&registry);

        tracker.enter_operation(OperationType::Query, pos()).unwrap();
        tracker.enter_selection_set();
        tracker.enter_field("film", pos()).unwrap();
        tracker.enter_selection_set();
        tracker.enter_fragment(Some("Film"));
        assert_eq!(tracker.current_type().unwrap().decode(), "Film");
        tracker.enter_selection_set();
        tracker.enter_field("id", pos()).unwrap();
        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_fragment();
        tracker.leave_selection_set();
        tracker.leave_field();
        tracker.leave_selection_set();
        tracker.leave_operation();
        assert!(tracker.is_at_rest());
    }
}
