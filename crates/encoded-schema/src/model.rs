use async_graphql_value::ConstValue;
use indexmap::IndexMap;

use crate::TypeReference;

/// An encoded schema: the types and directive definitions one compiled
/// operation (or a whole schema) needs at runtime. Several of these may be
/// merged before being served, see [`crate::merge`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EncodedSchema {
    pub types: IndexMap<String, TypeDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directives: Vec<DirectiveDefinition>,
}

impl EncodedSchema {
    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn get_directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.iter().find(|directive| directive.name == name)
    }
}

/// The kind discriminant stored in the first slot of every encoded type
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeKind {
    Scalar = 1,
    Object = 2,
    Interface = 3,
    Union = 4,
    Enum = 5,
    InputObject = 6,
}

impl TypeKind {
    pub fn from_tag(tag: u64) -> Option<Self> {
        Some(match tag {
            1 => TypeKind::Scalar,
            2 => TypeKind::Object,
            3 => TypeKind::Interface,
            4 => TypeKind::Union,
            5 => TypeKind::Enum,
            6 => TypeKind::InputObject,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input object",
        }
    }
}

impl std::fmt::Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One type definition. The wire format is a positional array whose first
/// slot is the [`TypeKind`] tag; in memory each kind carries named fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefinition {
    Scalar(ScalarTypeDefinition),
    Object(ObjectTypeDefinition),
    Interface(InterfaceTypeDefinition),
    Union(UnionTypeDefinition),
    Enum(EnumTypeDefinition),
    InputObject(InputObjectTypeDefinition),
}

impl TypeDefinition {
    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDefinition::Scalar(_) => TypeKind::Scalar,
            TypeDefinition::Object(_) => TypeKind::Object,
            TypeDefinition::Interface(_) => TypeKind::Interface,
            TypeDefinition::Union(_) => TypeKind::Union,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectTypeDefinition> {
        match self {
            TypeDefinition::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceTypeDefinition> {
        match self {
            TypeDefinition::Interface(interface) => Some(interface),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionTypeDefinition> {
        match self {
            TypeDefinition::Union(union) => Some(union),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumTypeDefinition> {
        match self {
            TypeDefinition::Enum(r#enum) => Some(r#enum),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectTypeDefinition> {
        match self {
            TypeDefinition::InputObject(input_object) => Some(input_object),
            _ => None,
        }
    }

    /// Fields, for the two kinds that have selectable fields.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            TypeDefinition::Object(object) => Some(&object.fields),
            TypeDefinition::Interface(interface) => Some(&interface.fields),
            _ => None,
        }
    }

    /// Interfaces this type declares it implements. The encoder flattens
    /// transitive interface inheritance into this list, so one-level checks
    /// against it are complete.
    pub fn interfaces(&self) -> &[String] {
        match self {
            TypeDefinition::Object(object) => &object.interfaces,
            TypeDefinition::Interface(interface) => &interface.interfaces,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarTypeDefinition {
    pub directives: Vec<DirectiveApplication>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectTypeDefinition {
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceTypeDefinition {
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnionTypeDefinition {
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumTypeDefinition {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputObjectTypeDefinition {
    pub fields: IndexMap<String, InputValueDefinition>,
}

/// An output field. On the wire, a field with no arguments and no directives
/// is written as its bare type reference.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub ty: TypeReference,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub directives: Vec<DirectiveApplication>,
}

impl FieldDefinition {
    pub fn new(ty: TypeReference) -> Self {
        FieldDefinition {
            ty,
            arguments: IndexMap::new(),
            directives: Vec::new(),
        }
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.get(name)
    }
}

/// An argument or input-object field: type, optional default, directives.
#[derive(Debug, Clone, PartialEq)]
pub struct InputValueDefinition {
    pub ty: TypeReference,
    pub default_value: Option<ConstValue>,
    pub directives: Vec<DirectiveApplication>,
}

impl InputValueDefinition {
    pub fn new(ty: TypeReference) -> Self {
        InputValueDefinition {
            ty,
            default_value: None,
            directives: Vec::new(),
        }
    }

    pub fn with_default(ty: TypeReference, default_value: ConstValue) -> Self {
        InputValueDefinition {
            ty,
            default_value: Some(default_value),
            directives: Vec::new(),
        }
    }
}

/// A directive definition: its name and argument definitions. Locations are
/// not encoded; the document is assumed valid, so they are never checked at
/// runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub name: String,
    pub arguments: IndexMap<String, InputValueDefinition>,
}

/// An applied directive, e.g. `@lowercase` on a field definition.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveApplication {
    pub name: String,
    pub arguments: IndexMap<String, ConstValue>,
}
