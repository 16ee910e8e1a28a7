use std::{collections::HashMap, sync::Arc};

use async_graphql_value::{ConstValue, Name, Value};
use indexmap::IndexMap;

use crate::Variables;

/// Resolves a field against application data: parent value plus coerced
/// arguments. Invoked by the executor, never by this crate.
pub type ResolveFn = Arc<dyn Fn(&ConstValue, &IndexMap<Name, ConstValue>) -> ConstValue + Send + Sync>;

/// Picks the concrete object type a value of an abstract type belongs to.
pub type ResolveTypeFn = Arc<dyn Fn(&ConstValue) -> Option<String> + Send + Sync>;

/// Parses a custom-scalar literal. `None` (like a thrown error in the source
/// semantics) means the literal cannot be coerced.
pub type ParseLiteralFn = Arc<dyn Fn(&Value, Option<&Variables>) -> Option<ConstValue> + Send + Sync>;

/// User-supplied resolvers, keyed by type name. A missing entry is not an
/// error; it tells the executor to fall back to default behavior.
#[derive(Default, Clone)]
pub struct Resolvers {
    types: HashMap<String, TypeResolver>,
}

impl Resolvers {
    pub fn insert(&mut self, type_name: impl Into<String>, resolver: TypeResolver) -> &mut Self {
        self.types.insert(type_name.into(), resolver);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeResolver> {
        self.types.get(type_name)
    }
}

#[derive(Clone)]
pub enum TypeResolver {
    Object(ObjectResolvers),
    Abstract(AbstractResolver),
    Scalar(ScalarResolver),
    Enum(EnumResolver),
}

#[derive(Default, Clone)]
pub struct ObjectResolvers {
    pub fields: HashMap<String, FieldResolver>,
}

#[derive(Default, Clone)]
pub struct FieldResolver {
    pub resolve: Option<ResolveFn>,
    /// Only meaningful on the subscription root type.
    pub subscribe: Option<ResolveFn>,
}

#[derive(Clone)]
pub struct AbstractResolver {
    pub resolve_type: ResolveTypeFn,
}

#[derive(Default, Clone)]
pub struct ScalarResolver {
    pub parse_literal: Option<ParseLiteralFn>,
}

/// Custom runtime values for enum members, e.g. `RED => 1`. Members without
/// an entry resolve to their own name.
#[derive(Default, Clone)]
pub struct EnumResolver {
    pub values: HashMap<String, ConstValue>,
}

impl std::fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolvers")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}
