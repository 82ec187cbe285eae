//! Type descriptors and the run-wide type registry
//!
//! The registry is created once per run, seeded with the predefined scalar
//! types the runtime library can construct, and then populated
//! monotonically by the discovery pass. Entries are never removed; lookup
//! goes through a name DFA keyed by canonical spelling, and one entry may
//! be reachable under several spellings (a definition and its typedef
//! aliases).

use smol_str::SmolStr;
use text_size::TextRange;

use crate::dfa::{InsertError, NameDfa};
use crate::errors::Error;
use crate::frontend::ast::{EnumId, RecordId};

/// Classified kind of a registered type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A plain record loaded from a YAML mapping
    Record,
    /// An enumeration loaded from a YAML scalar
    Enum,
    /// A record with `data`/`count`/`capacity`, loaded from a sequence
    List,
    /// A record with an enum discriminant and an anonymous union payload
    Tagged,
    /// Constructor and destructor are user-supplied; not inspected further
    Custom,
    /// A predefined scalar with a runtime-provided constructor
    Primitive,
}

/// Pointer flavor of a type usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PtrKind {
    /// A value type; no pointer of any kind
    #[default]
    None,
    /// Pointer to a null-terminated octet sequence, never null
    String,
    /// May be null or point to a value
    OptionalValue,
    /// May be null or point to a string
    OptionalString,
    /// Points to a value and may never be null
    ObjectPointer,
}

impl PtrKind {
    pub fn is_optional(self) -> bool {
        matches!(self, PtrKind::OptionalValue | PtrKind::OptionalString)
    }

    pub fn is_pointer(self) -> bool {
        !matches!(self, PtrKind::None)
    }
}

/// Default-value flavor of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultKind {
    #[default]
    None,
    Int,
    Float,
    Bool,
    Enum,
    List,
}

/// Usage flags of a type or field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFlags {
    pub kind: TypeKind,
    pub pointer: PtrKind,
    pub default: DefaultKind,
}

impl TypeFlags {
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            pointer: PtrKind::None,
            default: DefaultKind::None,
        }
    }
}

/// The AST declaration a registry entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    Record(RecordId),
    Enum(EnumId),
    /// Predefined scalars and aliases of primitives have no declaration
    None,
}

/// One registered type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Spelling used in emitted C types, including the namespace token
    /// (`struct foo`) when the declaration has one
    pub spelling: SmolStr,
    pub decl: DeclRef,
    pub flags: TypeFlags,
    /// `yaml_construct_*` symbol; assigned after discovery, except for
    /// predefined entries which are born with theirs
    pub constructor: Option<SmolStr>,
    /// `yaml_delete_*` symbol; enums and predefined scalars have none
    pub destructor: Option<SmolStr>,
    /// `convert_to_*` symbol; only enums have one
    pub converter: Option<SmolStr>,
    /// Location of the declaration, for diagnostics
    pub range: Option<TextRange>,
}

impl TypeDescriptor {
    pub fn is_predefined(&self) -> bool {
        self.flags.kind == TypeKind::Primitive
    }
}

/// Catalog of every known type, keyed by spelling
#[derive(Debug)]
pub struct TypeRegistry {
    names: NameDfa<usize>,
    entries: Vec<TypeDescriptor>,
}

/// The predefined scalar types and their runtime constructors
const PREDEFINED: &[(&str, &str)] = &[
    ("short", "yaml_construct_short"),
    ("int", "yaml_construct_int"),
    ("long", "yaml_construct_long"),
    ("long long", "yaml_construct_long_long"),
    ("unsigned char", "yaml_construct_unsigned_char"),
    ("unsigned short", "yaml_construct_unsigned_short"),
    ("unsigned int", "yaml_construct_unsigned"),
    ("unsigned long", "yaml_construct_unsigned_long"),
    ("unsigned long long", "yaml_construct_unsigned_long_long"),
    ("float", "yaml_construct_float"),
    ("double", "yaml_construct_double"),
    ("long double", "yaml_construct_long_double"),
    ("char", "yaml_construct_char"),
    ("_Bool", "yaml_construct_bool"),
];

impl TypeRegistry {
    /// A registry seeded with the predefined scalar entries.
    pub fn new() -> Self {
        let mut registry = Self {
            names: NameDfa::new(),
            entries: Vec::with_capacity(64),
        };
        for &(name, constructor) in PREDEFINED {
            let index = registry.entries.len();
            registry.entries.push(TypeDescriptor {
                spelling: SmolStr::new(name),
                decl: DeclRef::None,
                flags: TypeFlags::new(TypeKind::Primitive),
                constructor: Some(SmolStr::new(constructor)),
                destructor: None,
                converter: None,
                range: None,
            });
            registry
                .names
                .insert(name, index)
                .expect("predefined names are distinct");
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> &TypeDescriptor {
        &self.entries[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut TypeDescriptor {
        &mut self.entries[index]
    }

    /// Index of the type with the given spelling, if known.
    pub fn lookup(&self, spelling: &str) -> Option<usize> {
        self.names.find(spelling).copied()
    }

    /// Append a descriptor without naming it yet.
    pub fn add(&mut self, descriptor: TypeDescriptor) -> usize {
        let index = self.entries.len();
        self.entries.push(descriptor);
        index
    }

    /// Bind a spelling to an entry. A spelling can only be bound once
    /// across the whole run.
    pub fn add_name(&mut self, name: &str, index: usize, range: TextRange) -> Result<(), Error> {
        match self.names.insert(name, index) {
            Ok(()) => Ok(()),
            Err(InsertError::Duplicate) => Err(Error::DuplicateType {
                name: name.to_string(),
                range,
            }),
            Err(InsertError::CapacityExhausted) => Err(Error::DfaCapacity { range }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &TypeDescriptor)> {
        self.entries.iter().enumerate()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_seeded_with_predefined_scalars() {
        let registry = TypeRegistry::new();
        let index = registry.lookup("unsigned long").expect("seeded");
        let entry = registry.get(index);
        assert!(entry.is_predefined());
        assert_eq!(entry.constructor.as_deref(), Some("yaml_construct_unsigned_long"));
        assert_eq!(entry.destructor, None);
        assert!(registry.lookup("_Bool").is_some());
        assert!(registry.lookup("bool").is_none());
        assert!(registry.lookup("signed char").is_none());
    }

    #[test]
    fn duplicate_spelling_is_an_error() {
        let mut registry = TypeRegistry::new();
        let index = registry.add(TypeDescriptor {
            spelling: SmolStr::new("struct a"),
            decl: DeclRef::None,
            flags: TypeFlags::new(TypeKind::Record),
            constructor: None,
            destructor: None,
            converter: None,
            range: None,
        });
        let range = TextRange::empty(0.into());
        registry.add_name("struct a", index, range).unwrap();
        assert!(matches!(
            registry.add_name("struct a", index, range),
            Err(Error::DuplicateType { .. })
        ));
    }

    #[test]
    fn one_entry_can_have_many_names() {
        let mut registry = TypeRegistry::new();
        let index = registry.add(TypeDescriptor {
            spelling: SmolStr::new("struct list_s"),
            decl: DeclRef::None,
            flags: TypeFlags::new(TypeKind::List),
            constructor: None,
            destructor: None,
            converter: None,
            range: None,
        });
        let range = TextRange::empty(0.into());
        registry.add_name("struct list_s", index, range).unwrap();
        registry.add_name("list", index, range).unwrap();
        assert_eq!(registry.lookup("struct list_s"), Some(index));
        assert_eq!(registry.lookup("list"), Some(index));
    }
}
