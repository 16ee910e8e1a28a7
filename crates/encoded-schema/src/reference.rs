/// The five specified scalar type names.
pub const SPEC_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Number of wrapper shapes tabulated per spec scalar: `T`, `T!`, `[T]`,
/// `[T]!`, `[T!]` and `[T!]!`.
const SHAPES_PER_SCALAR: usize = 6;

/// Every wrapper shape of every spec scalar, in table order. References to
/// these types are encoded as an index into this table instead of a string.
static SPEC_TYPE_TABLE: [&str; 30] = [
    "String",
    "String!",
    "[String]",
    "[String]!",
    "[String!]",
    "[String!]!",
    "Int",
    "Int!",
    "[Int]",
    "[Int]!",
    "[Int!]",
    "[Int!]!",
    "Float",
    "Float!",
    "[Float]",
    "[Float]!",
    "[Float!]",
    "[Float!]!",
    "Boolean",
    "Boolean!",
    "[Boolean]",
    "[Boolean]!",
    "[Boolean!]",
    "[Boolean!]!",
    "ID",
    "ID!",
    "[ID]",
    "[ID]!",
    "[ID!]",
    "[ID!]!",
];

pub fn is_spec_scalar(name: &str) -> bool {
    SPEC_SCALARS.contains(&name)
}

/// A reference to a type, as stored inside an encoded schema.
///
/// Spec-scalar shapes are stored as an index into [`SPEC_TYPE_TABLE`], every
/// other type as its printed syntax (e.g. `"MyInput"`, `"[MyInput!]!"`). The
/// integer fast path only avoids string allocation; it never changes what the
/// reference means, and `decode(encode(s)) == s` for every type string.
///
/// All wrapper introspection is syntactic: a trailing `!` means non-null, a
/// `[`..`]` pair means list. No schema lookup is ever involved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeReference {
    /// Index into the spec-type table. Only constructed through [`encode`] or
    /// the wire deserializer, both of which validate bounds, so lookups are
    /// infallible.
    Spec(SpecTypeIndex),
    /// The printed type syntax, verbatim.
    Name(String),
}

/// A bounds-checked index into the spec-type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecTypeIndex(u8);

impl SpecTypeIndex {
    /// Returns `None` for integers outside the table, which on the wire
    /// signals a corrupted schema encoding.
    pub(crate) fn new(index: u64) -> Option<Self> {
        if (index as usize) < SPEC_TYPE_TABLE.len() {
            Some(SpecTypeIndex(index as u8))
        } else {
            None
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        self.0
    }

    fn shape(self) -> usize {
        self.0 as usize % SHAPES_PER_SCALAR
    }

    fn with_shape(self, shape: usize) -> Self {
        SpecTypeIndex((self.0 as usize / SHAPES_PER_SCALAR * SHAPES_PER_SCALAR + shape) as u8)
    }
}

impl TypeReference {
    /// Encodes a printed type string, taking the integer fast path when the
    /// string is one of the tabulated spec-scalar shapes.
    pub fn encode(name: &str) -> Self {
        match SPEC_TYPE_TABLE.iter().position(|candidate| *candidate == name) {
            Some(index) => TypeReference::Spec(SpecTypeIndex(index as u8)),
            None => TypeReference::Name(name.to_string()),
        }
    }

    /// The printed type syntax this reference stands for.
    pub fn decode(&self) -> &str {
        match self {
            TypeReference::Spec(index) => SPEC_TYPE_TABLE[index.0 as usize],
            TypeReference::Name(name) => name,
        }
    }

    /// Whether the outermost wrapper is non-null.
    pub fn is_non_null(&self) -> bool {
        match self {
            TypeReference::Spec(index) => matches!(index.shape(), 1 | 3 | 5),
            TypeReference::Name(name) => name.ends_with('!'),
        }
    }

    /// Whether the outermost wrapper is a list.
    pub fn is_list(&self) -> bool {
        match self {
            TypeReference::Spec(index) => matches!(index.shape(), 2 | 4),
            TypeReference::Name(name) => name.ends_with(']'),
        }
    }

    pub fn is_wrapper(&self) -> bool {
        self.is_non_null() || self.is_list()
    }

    /// Removes the outermost wrapper, if any. Spec-table references stay in
    /// the table, so the common case allocates nothing.
    pub fn unwrap(&self) -> TypeReference {
        match self {
            TypeReference::Spec(index) => {
                let shape = match index.shape() {
                    1 | 2 => 0,
                    3 => 2,
                    4 => 1,
                    5 => 4,
                    _ => return self.clone(),
                };
                TypeReference::Spec(index.with_shape(shape))
            }
            TypeReference::Name(name) => {
                if let Some(inner) = name.strip_suffix('!') {
                    TypeReference::encode(inner)
                } else if let Some(inner) = name.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                    TypeReference::encode(inner)
                } else {
                    self.clone()
                }
            }
        }
    }

    /// Removes every wrapper, leaving the bare named type.
    pub fn unwrap_all(&self) -> TypeReference {
        match self {
            TypeReference::Spec(index) => TypeReference::Spec(index.with_shape(0)),
            TypeReference::Name(_) => {
                let mut current = self.clone();
                while current.is_wrapper() {
                    current = current.unwrap();
                }
                current
            }
        }
    }

    /// The bare type name, with every wrapper stripped.
    pub fn name(&self) -> &str {
        let mut name = self.decode();
        loop {
            if let Some(inner) = name.strip_suffix('!') {
                name = inner;
            } else if let Some(inner) = name.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                name = inner;
            } else {
                return name;
            }
        }
    }

    pub fn is_spec_scalar(&self) -> bool {
        is_spec_scalar(self.name())
    }
}

impl From<&str> for TypeReference {
    fn from(name: &str) -> Self {
        TypeReference::encode(name)
    }
}

impl std::fmt::Display for TypeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.decode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_spec_table() {
        for name in SPEC_TYPE_TABLE {
            let reference = TypeReference::encode(name);
            assert!(matches!(reference, TypeReference::Spec(_)), "{name} should hit the table");
            assert_eq!(reference.decode(), name);
        }
    }

    #[test]
    fn custom_names_pass_through() {
        for name in ["MyInput", "[MyInput!]!", "Date", "[Date]"] {
            let reference = TypeReference::encode(name);
            assert_eq!(reference, TypeReference::Name(name.to_string()));
            assert_eq!(reference.decode(), name);
        }
    }

    #[test]
    fn wrapper_introspection() {
        let cases: &[(&str, bool, bool)] = &[
            ("String", false, false),
            ("String!", true, false),
            ("[String]", false, true),
            ("[String]!", true, false),
            ("[String!]", false, true),
            ("[String!]!", true, false),
            ("MyType!", true, false),
            ("[MyType]", false, true),
        ];
        for (name, non_null, list) in cases {
            let reference = TypeReference::encode(name);
            assert_eq!(reference.is_non_null(), *non_null, "{name}");
            assert_eq!(reference.is_list(), *list, "{name}");
        }
    }

    #[test]
    fn unwrap_peels_one_wrapper() {
        let unwrap = |name: &str| TypeReference::encode(name).unwrap().decode().to_string();
        assert_eq!(unwrap("[String!]!"), "[String!]");
        assert_eq!(unwrap("[String!]"), "String!");
        assert_eq!(unwrap("String!"), "String");
        assert_eq!(unwrap("String"), "String");
        assert_eq!(unwrap("[MyType]!"), "[MyType]");
        assert_eq!(unwrap("[MyType]"), "MyType");
    }

    #[test]
    fn unwrap_all_reaches_the_named_type() {
        assert_eq!(TypeReference::encode("[[String!]]!").name(), "String");
        assert_eq!(TypeReference::encode("[ID!]!").unwrap_all().decode(), "ID");
        assert_eq!(TypeReference::encode("[MyInput!]!").unwrap_all().decode(), "MyInput");
    }

    #[test]
    fn spec_unwrap_stays_in_table() {
        for name in SPEC_TYPE_TABLE {
            let mut reference = TypeReference::encode(name);
            while reference.is_wrapper() {
                reference = reference.unwrap();
                assert!(matches!(reference, TypeReference::Spec(_)), "unwrapping {name}");
            }
        }
    }
}
