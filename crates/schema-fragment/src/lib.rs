//! Runtime accessor over one or more encoded schema fragments plus
//! user-supplied resolvers. Answers the type-membership, field-lookup and
//! leaf-resolution questions an executor needs, without a full introspectable
//! schema anywhere in sight.

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, RwLock},
};

use async_graphql_value::{ConstValue, Name};
use encoded_schema::{
    EncodedSchema, EnumTypeDefinition, FieldDefinition, InputObjectTypeDefinition, InterfaceTypeDefinition,
    MergeError, ObjectTypeDefinition, ScalarTypeDefinition, TypeDefinition, TypeReference, UnionTypeDefinition,
};

mod coercion;
mod resolvers;

pub use coercion::value_from_ast;
pub use resolvers::{
    AbstractResolver, EnumResolver, FieldResolver, ObjectResolvers, ParseLiteralFn, ResolveFn, ResolveTypeFn,
    Resolvers, ScalarResolver, TypeResolver,
};

/// Variables of a request, already coerced by the transport layer.
pub type Variables = std::collections::BTreeMap<Name, ConstValue>;

/// A merged set of encoded schema fragments, wrapped together with the user's
/// resolvers. All lookups are read-only; the only mutable state is the enum
/// leaf memoization cache, which is owned by this instance so fragments over
/// different schemas can never collide on a shared type name.
pub struct SchemaFragment {
    schema: EncodedSchema,
    resolvers: Resolvers,
    enum_leafs: RwLock<HashMap<String, Arc<EnumLeaf>>>,
}

impl SchemaFragment {
    pub fn new(schema: EncodedSchema, resolvers: Resolvers) -> Self {
        SchemaFragment {
            schema,
            resolvers,
            enum_leafs: RwLock::new(HashMap::new()),
        }
    }

    /// Merges several fragments first; kind conflicts abort.
    pub fn from_fragments(
        fragments: impl IntoIterator<Item = EncodedSchema>,
        resolvers: Resolvers,
    ) -> Result<Self, MergeError> {
        Ok(Self::new(encoded_schema::merge(fragments)?, resolvers))
    }

    pub fn schema(&self) -> &EncodedSchema {
        &self.schema
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.schema.get_type(name)
    }

    pub fn get_object_type(&self, name: &str) -> Option<&ObjectTypeDefinition> {
        self.schema.get_type(name)?.as_object()
    }

    pub fn get_interface_type(&self, reference: &TypeReference) -> Option<&InterfaceTypeDefinition> {
        self.schema.get_type(reference.name())?.as_interface()
    }

    pub fn get_union_type(&self, reference: &TypeReference) -> Option<&UnionTypeDefinition> {
        self.schema.get_type(reference.name())?.as_union()
    }

    pub fn get_input_object_type(&self, reference: &TypeReference) -> Option<&InputObjectTypeDefinition> {
        self.schema.get_type(reference.name())?.as_input_object()
    }

    /// Resolves a reference to a leaf (scalar or enum) type. The spec scalars
    /// always resolve, with or without a table entry. The returned name
    /// borrows from the reference itself.
    pub fn get_leaf_type<'a>(&'a self, reference: &'a TypeReference) -> Option<LeafType<'a>> {
        let name = reference.name();
        if encoded_schema::is_spec_scalar(name) {
            return Some(LeafType::SpecScalar(SpecScalar::from_name(name)?));
        }
        match self.schema.get_type(name)? {
            TypeDefinition::Scalar(scalar) => Some(LeafType::Scalar { name, scalar }),
            TypeDefinition::Enum(r#enum) => Some(LeafType::Enum { name, r#enum }),
            _ => None,
        }
    }

    /// Looks up a field on an object or interface type. `__typename` always
    /// resolves, whatever the type declares.
    pub fn get_field(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        if field_name == "__typename" {
            return Some(typename_field());
        }
        self.schema.get_type(type_name)?.fields()?.get(field_name)
    }

    pub fn is_input_type(&self, reference: &TypeReference) -> bool {
        let name = reference.name();
        if encoded_schema::is_spec_scalar(name) {
            return true;
        }
        matches!(
            self.schema.get_type(name),
            Some(TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) | TypeDefinition::InputObject(_))
        )
    }

    pub fn is_object_type(&self, name: &str) -> bool {
        matches!(self.schema.get_type(name), Some(TypeDefinition::Object(_)))
    }

    pub fn is_abstract_type(&self, name: &str) -> bool {
        matches!(
            self.schema.get_type(name),
            Some(TypeDefinition::Interface(_) | TypeDefinition::Union(_))
        )
    }

    pub fn is_composite_type(&self, name: &str) -> bool {
        self.is_object_type(name) || self.is_abstract_type(name)
    }

    /// Whether `candidate` is a member of the union `abstract_name`, or lists
    /// `abstract_name` among its implemented interfaces. One level is enough:
    /// the encoder flattens transitive interface inheritance into each type's
    /// own interface list.
    pub fn is_sub_type(&self, abstract_name: &str, candidate: &str) -> bool {
        if let Some(TypeDefinition::Union(union)) = self.schema.get_type(abstract_name) {
            return union.members.iter().any(|member| member == candidate);
        }
        self.schema
            .get_type(candidate)
            .map(|definition| definition.interfaces().iter().any(|name| name == abstract_name))
            .unwrap_or(false)
    }

    pub fn get_field_resolver(&self, type_name: &str, field_name: &str) -> Option<&ResolveFn> {
        match self.resolvers.get(type_name)? {
            TypeResolver::Object(object) => object.fields.get(field_name)?.resolve.as_ref(),
            _ => None,
        }
    }

    pub fn get_subscription_field_resolver(&self, type_name: &str, field_name: &str) -> Option<&ResolveFn> {
        match self.resolvers.get(type_name)? {
            TypeResolver::Object(object) => object.fields.get(field_name)?.subscribe.as_ref(),
            _ => None,
        }
    }

    pub fn get_abstract_type_resolver(&self, type_name: &str) -> Option<&ResolveTypeFn> {
        match self.resolvers.get(type_name)? {
            TypeResolver::Abstract(resolver) => Some(&resolver.resolve_type),
            _ => None,
        }
    }

    /// Resolves a leaf type to something that can parse literals. Enum leafs
    /// fold the user's custom values over the declared member names, once per
    /// enum name per fragment instance.
    pub fn get_leaf_type_resolver(&self, reference: &TypeReference) -> Option<LeafTypeResolver> {
        match self.get_leaf_type(reference)? {
            LeafType::SpecScalar(scalar) => Some(LeafTypeResolver::SpecScalar(scalar)),
            LeafType::Scalar { name, .. } => {
                let parse_literal = match self.resolvers.get(name) {
                    Some(TypeResolver::Scalar(scalar)) => scalar.parse_literal.clone(),
                    _ => None,
                };
                Some(LeafTypeResolver::Scalar { parse_literal })
            }
            LeafType::Enum { name, r#enum } => Some(LeafTypeResolver::Enum(self.enum_leaf(name, r#enum))),
        }
    }

    fn enum_leaf(&self, name: &str, definition: &EnumTypeDefinition) -> Arc<EnumLeaf> {
        if let Some(leaf) = self
            .enum_leafs
            .read()
            .ok()
            .and_then(|leafs| leafs.get(name).cloned())
        {
            return leaf;
        }

        let custom = match self.resolvers.get(name) {
            Some(TypeResolver::Enum(resolver)) => Some(&resolver.values),
            _ => None,
        };
        let values = definition
            .values
            .iter()
            .map(|value| {
                let resolved = custom
                    .and_then(|custom| custom.get(value).cloned())
                    .unwrap_or_else(|| ConstValue::String(value.clone()));
                (value.clone(), resolved)
            })
            .collect();
        let leaf = Arc::new(EnumLeaf { values });

        if let Ok(mut leafs) = self.enum_leafs.write() {
            leafs.insert(name.to_string(), leaf.clone());
        }
        leaf
    }
}

fn typename_field() -> &'static FieldDefinition {
    static TYPENAME: OnceLock<FieldDefinition> = OnceLock::new();
    TYPENAME.get_or_init(|| FieldDefinition::new(TypeReference::encode("String!")))
}

/// A resolved leaf type.
pub enum LeafType<'a> {
    SpecScalar(SpecScalar),
    Scalar {
        name: &'a str,
        scalar: &'a ScalarTypeDefinition,
    },
    Enum {
        name: &'a str,
        r#enum: &'a EnumTypeDefinition,
    },
}

/// One of the five specified scalars, which parse without any table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecScalar {
    String,
    Int,
    Float,
    Boolean,
    Id,
}

impl SpecScalar {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "String" => SpecScalar::String,
            "Int" => SpecScalar::Int,
            "Float" => SpecScalar::Float,
            "Boolean" => SpecScalar::Boolean,
            "ID" => SpecScalar::Id,
            _ => return None,
        })
    }
}

/// What [`value_from_ast`] uses to parse a leaf literal.
pub enum LeafTypeResolver {
    SpecScalar(SpecScalar),
    Scalar { parse_literal: Option<ParseLiteralFn> },
    Enum(Arc<EnumLeaf>),
}

/// Declared enum member names mapped to their runtime values.
pub struct EnumLeaf {
    pub values: HashMap<String, ConstValue>,
}
