//! Rewrites a "typeless" request document into a typed one: every field and
//! argument carries the exact type it resolves to, and schema-declared
//! defaults are materialized where the executor would otherwise need a
//! schema lookup. The output lets an executor run against application data
//! with no schema in memory at all.
//!
//! The document is assumed to be already validated; anything the schema
//! cannot resolve is a precondition violation and fails with the dotted path
//! of the offending node.

use async_graphql_parser::{
    types::{
        Directive, ExecutableDocument, Field, FragmentDefinition, OperationDefinition, OperationType, Selection,
        SelectionSet, Type,
    },
    Positioned,
};
use async_graphql_value::{ConstValue, Name, Value};
use indexmap::IndexMap;
use schema_registry::Registry;
use type_tracker::{TrackError, TypeTracker};

mod document;

pub use document::{
    TypedArgument, TypedDirective, TypedDocument, TypedField, TypedFragment, TypedFragmentSpread, TypedInlineFragment,
    TypedOperation, TypedSelection, TypedVariableDefinition,
};

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("{path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: TrackError,
    },
    #[error("{path}: unknown fragment `{name}`")]
    UnknownFragment { path: String, name: String },
    #[error("{path}: `{ty}` is not valid type syntax")]
    MalformedType { path: String, ty: String },
}

/// Annotates a request document against the full schema.
pub fn add_types_to_document(
    registry: &Registry,
    document: &ExecutableDocument,
) -> Result<TypedDocument, AnnotateError> {
    tracing::debug!(
        operations = document.operations.iter().count(),
        fragments = document.fragments.len(),
        "annotating request document"
    );

    let mut annotator = Annotator {
        tracker: TypeTracker::new(registry),
        document,
        path: Vec::new(),
    };

    let mut operations = Vec::new();
    for (name, operation) in document.operations.iter() {
        operations.push(annotator.annotate_operation(name, operation)?);
    }

    let mut fragments = IndexMap::new();
    let mut fragment_names: Vec<&Name> = document.fragments.keys().collect();
    fragment_names.sort();
    for name in fragment_names {
        let fragment = &document.fragments[name];
        fragments.insert(name.to_string(), annotator.annotate_fragment(name, fragment)?);
    }

    Ok(TypedDocument { operations, fragments })
}

struct Annotator<'a> {
    tracker: TypeTracker<'a, Registry>,
    document: &'a ExecutableDocument,
    path: Vec<String>,
}

impl Annotator<'_> {
    fn annotate_operation(
        &mut self,
        name: Option<&Name>,
        operation: &Positioned<OperationDefinition>,
    ) -> Result<TypedOperation, AnnotateError> {
        let label = name
            .map(|name| name.to_string())
            .unwrap_or_else(|| operation_keyword(operation.node.ty).to_string());
        self.path.push(label);

        self.tracker
            .enter_operation(operation.node.ty, operation.pos)
            .map_err(|source| self.located(source))?;

        let mut variable_definitions = Vec::new();
        for definition in &operation.node.variable_definitions {
            self.tracker.enter_variable_definition(&definition.node.var_type.node);
            variable_definitions.push(TypedVariableDefinition {
                name: definition.node.name.node.to_string(),
                ty: definition.node.var_type.node.clone(),
                default_value: definition.node.default_value.as_ref().map(|default| default.node.clone()),
            });
            self.tracker.leave_variable_definition();
        }

        let directives = self.annotate_directives(&operation.node.directives)?;
        let selection_set = self.annotate_selection_set(&operation.node.selection_set)?;

        self.tracker.leave_operation();
        self.path.pop();

        Ok(TypedOperation {
            name: name.map(|name| name.to_string()),
            ty: operation.node.ty,
            variable_definitions,
            directives,
            selection_set,
        })
    }

    fn annotate_fragment(
        &mut self,
        name: &Name,
        fragment: &Positioned<FragmentDefinition>,
    ) -> Result<TypedFragment, AnnotateError> {
        let type_condition = fragment.node.type_condition.node.on.node.to_string();
        self.path.push(name.to_string());

        self.tracker.enter_fragment(Some(&type_condition));
        let directives = self.annotate_directives(&fragment.node.directives)?;
        let selection_set = self.annotate_selection_set(&fragment.node.selection_set)?;
        self.tracker.leave_fragment();
        self.path.pop();

        Ok(TypedFragment {
            name: name.to_string(),
            type_condition,
            directives,
            selection_set,
        })
    }

    fn annotate_selection_set(
        &mut self,
        selection_set: &Positioned<SelectionSet>,
    ) -> Result<Vec<TypedSelection>, AnnotateError> {
        self.tracker.enter_selection_set();
        let result = self.annotate_selections(&selection_set.node.items);
        self.tracker.leave_selection_set();
        result
    }

    fn annotate_selections(&mut self, items: &[Positioned<Selection>]) -> Result<Vec<TypedSelection>, AnnotateError> {
        let mut typed = Vec::with_capacity(items.len());
        for item in items {
            typed.push(self.annotate_selection(item)?);
        }
        Ok(typed)
    }

    fn annotate_selection(&mut self, selection: &Positioned<Selection>) -> Result<TypedSelection, AnnotateError> {
        match &selection.node {
            Selection::Field(field) => Ok(TypedSelection::Field(self.annotate_field(field)?)),
            Selection::FragmentSpread(spread) => {
                let fragment_name = spread.node.fragment_name.node.to_string();
                if !self.document.fragments.contains_key(&spread.node.fragment_name.node) {
                    return Err(AnnotateError::UnknownFragment {
                        path: self.path.join("."),
                        name: fragment_name,
                    });
                }
                let directives = self.annotate_directives(&spread.node.directives)?;
                Ok(TypedSelection::FragmentSpread(TypedFragmentSpread {
                    fragment_name,
                    directives,
                }))
            }
            Selection::InlineFragment(inline) => {
                let type_condition = inline
                    .node
                    .type_condition
                    .as_ref()
                    .map(|condition| condition.node.on.node.to_string());
                self.tracker.enter_fragment(type_condition.as_deref());
                let directives = self.annotate_directives(&inline.node.directives)?;
                let selection_set = self.annotate_selection_set(&inline.node.selection_set)?;
                self.tracker.leave_fragment();
                Ok(TypedSelection::InlineFragment(TypedInlineFragment {
                    type_condition,
                    directives,
                    selection_set,
                }))
            }
        }
    }

    fn annotate_field(&mut self, field: &Positioned<Field>) -> Result<TypedField, AnnotateError> {
        let name = field.node.name.node.to_string();
        let response_name = field
            .node
            .alias
            .as_ref()
            .map(|alias| alias.node.to_string())
            .unwrap_or_else(|| name.clone());
        self.path.push(response_name);

        self.tracker
            .enter_field(&name, field.pos)
            .map_err(|source| self.located(source))?;

        let result = self.annotate_field_inner(field, &name);
        self.tracker.leave_field();
        self.path.pop();
        result
    }

    fn annotate_field_inner(&mut self, field: &Positioned<Field>, name: &str) -> Result<TypedField, AnnotateError> {
        let ty = match self.tracker.field_def() {
            Some(entry) => self.type_node(&entry.ty.decode())?,
            None => {
                return Err(self.located(TrackError::UnknownField {
                    parent: self.tracker.parent_type().unwrap_or("<unknown>").to_string(),
                    field: name.to_string(),
                    pos: field.pos,
                }))
            }
        };

        let mut arguments = Vec::with_capacity(field.node.arguments.len());
        for (argument_name, value) in &field.node.arguments {
            arguments.push(self.annotate_argument(&argument_name.node, value)?);
        }

        let directives = self.annotate_directives(&field.node.directives)?;
        let selection_set = if field.node.selection_set.node.items.is_empty() {
            Vec::new()
        } else {
            self.annotate_selection_set(&field.node.selection_set)?
        };

        Ok(TypedField {
            alias: field.node.alias.as_ref().map(|alias| alias.node.to_string()),
            name: name.to_string(),
            ty,
            arguments,
            directives,
            selection_set,
        })
    }

    fn annotate_argument(&mut self, name: &Name, value: &Positioned<Value>) -> Result<TypedArgument, AnnotateError> {
        self.path.push(name.to_string());
        let result = self.annotate_argument_inner(name, value);
        self.path.pop();
        result
    }

    fn annotate_argument_inner(
        &mut self,
        name: &Name,
        value: &Positioned<Value>,
    ) -> Result<TypedArgument, AnnotateError> {
        self.tracker
            .enter_argument(name, value.pos)
            .map_err(|source| self.located(source))?;

        let entry = match self.tracker.argument() {
            Some((_, entry)) => entry.clone(),
            None => {
                self.tracker.leave_argument();
                return Err(self.located(TrackError::UnknownArgument {
                    argument: name.to_string(),
                    pos: value.pos,
                }));
            }
        };
        self.tracker.leave_argument();

        let ty = self.type_node(&entry.ty.decode())?;
        // A schema default is only materialized where the executor needs it:
        // when the supplied value is a variable that may be absent.
        let default_value = match &value.node {
            Value::Variable(_) => entry.default_value,
            _ => None,
        };

        Ok(TypedArgument {
            name: name.to_string(),
            value: value.node.clone(),
            ty,
            default_value,
        })
    }

    fn annotate_directives(
        &mut self,
        directives: &[Positioned<Directive>],
    ) -> Result<Vec<TypedDirective>, AnnotateError> {
        directives
            .iter()
            .map(|directive| self.annotate_directive(directive))
            .collect()
    }

    fn annotate_directive(&mut self, directive: &Positioned<Directive>) -> Result<TypedDirective, AnnotateError> {
        let name = directive.node.name.node.to_string();
        self.path.push(format!("@{name}"));
        let result = self.annotate_directive_inner(&name, directive);
        self.path.pop();
        result
    }

    fn annotate_directive_inner(
        &mut self,
        name: &str,
        directive: &Positioned<Directive>,
    ) -> Result<TypedDirective, AnnotateError> {
        self.tracker
            .enter_directive(name, directive.pos)
            .map_err(|source| self.located(source))?;

        let mut arguments = Vec::with_capacity(directive.node.arguments.len());
        for (argument_name, value) in &directive.node.arguments {
            arguments.push(self.annotate_argument(&argument_name.node, value)?);
        }

        // Omitted arguments with a schema default become explicit.
        if let Some(tracked) = self.tracker.directive() {
            let declared: Vec<_> = tracked
                .entry
                .arguments
                .iter()
                .filter(|(declared_name, entry)| {
                    entry.default_value.is_some()
                        && !directive
                            .node
                            .arguments
                            .iter()
                            .any(|(provided, _)| provided.node.as_str() == declared_name.as_str())
                })
                .map(|(declared_name, entry)| (declared_name.clone(), entry.clone()))
                .collect();
            for (declared_name, entry) in declared {
                let ty = self.type_node(&entry.ty.decode())?;
                let default = entry.default_value.clone();
                arguments.push(TypedArgument {
                    name: declared_name,
                    value: entry.default_value.map(ConstValue::into_value).unwrap_or(Value::Null),
                    ty,
                    default_value: default,
                });
            }
        }

        self.tracker.leave_directive();
        Ok(TypedDirective {
            name: name.to_string(),
            arguments,
        })
    }

    fn located(&self, source: TrackError) -> AnnotateError {
        AnnotateError::Schema {
            path: self.path.join("."),
            source,
        }
    }

    fn type_node(&self, printed: &str) -> Result<Type, AnnotateError> {
        Type::new(printed).ok_or_else(|| AnnotateError::MalformedType {
            path: self.path.join("."),
            ty: printed.to_string(),
        })
    }
}

fn operation_keyword(ty: OperationType) -> &'static str {
    match ty {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}
