//! AST for the supported C header subset
//!
//! The parser flattens everything into two arenas (records and enums) plus
//! an ordered list of top-level declarations. Inline definitions in field
//! position stay reachable through [`TypeExpr::InlineRecord`] /
//! [`TypeExpr::InlineEnum`] so later passes can validate them.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextRange;

/// Index into [`Header::records`]
pub type RecordId = usize;

/// Index into [`Header::enums`]
pub type EnumId = usize;

/// A parsed header file
#[derive(Debug, Default)]
pub struct Header {
    /// Top-level declarations in source order
    pub decls: Vec<Decl>,
    /// Arena of all struct/union definitions, including inline ones
    pub records: Vec<RecordDecl>,
    /// Arena of all enum definitions
    pub enums: Vec<EnumDecl>,
    /// Tag namespace: `struct X` / `union X` / `enum X` definitions by name
    pub tags: FxHashMap<SmolStr, TagId>,
    /// Typedef aliases by name (syntactic underlying type)
    pub typedefs: FxHashMap<SmolStr, TypeExpr>,
}

/// What a tag name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagId {
    Record(RecordId),
    Enum(EnumId),
}

/// One top-level declaration
#[derive(Debug, Clone)]
pub enum Decl {
    /// A struct or union definition (named or anonymous)
    Record(RecordId),
    /// An enum definition
    Enum(EnumId),
    /// A typedef alias
    Typedef(TypedefDecl),
    /// A function prototype
    Function(FunctionDecl),
    /// Anything parseable but outside the supported surface
    /// (currently: top-level variable declarations)
    Unsupported { what: &'static str, range: TextRange },
}

/// `struct` or `union`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKeyword {
    Struct,
    Union,
}

impl RecordKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKeyword::Struct => "struct",
            RecordKeyword::Union => "union",
        }
    }
}

/// A struct or union definition
#[derive(Debug, Clone)]
pub struct RecordDecl {
    pub keyword: RecordKeyword,
    pub name: Option<SmolStr>,
    pub fields: Vec<FieldDecl>,
    pub doc: Option<DocComment>,
    pub range: TextRange,
}

/// One field of a record
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// `None` for an anonymous member (`union { ... };`)
    pub name: Option<SmolStr>,
    pub ty: TypeExpr,
    pub doc: Option<DocComment>,
    pub range: TextRange,
}

/// An enum definition
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Option<SmolStr>,
    pub constants: Vec<EnumConstant>,
    pub doc: Option<DocComment>,
    pub range: TextRange,
}

/// One enum constant; initializer expressions are validated but not kept
#[derive(Debug, Clone)]
pub struct EnumConstant {
    pub name: SmolStr,
    pub doc: Option<DocComment>,
    pub range: TextRange,
}

/// A typedef alias declaration
#[derive(Debug, Clone)]
pub struct TypedefDecl {
    pub name: SmolStr,
    pub underlying: TypeExpr,
    pub doc: Option<DocComment>,
    pub range: TextRange,
}

/// A function prototype; only the name matters to discovery
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: SmolStr,
    pub range: TextRange,
}

/// A raw comment attached to the declaration that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    /// Full comment text, including the `//` or `/*` opener
    pub text: SmolStr,
    pub range: TextRange,
}

/// A syntactic type reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A builtin arithmetic type
    Prim(PrimKind),
    /// A typedef-name reference
    Named(SmolStr),
    /// `struct X`, `union X`, or `enum X` by tag
    Tag(TagKeyword, SmolStr),
    /// An inline struct/union definition in field or typedef position
    InlineRecord(RecordId),
    /// An inline enum definition in typedef position
    InlineEnum(EnumId),
    /// A single level of pointer
    Pointer(Box<TypeExpr>),
}

/// Namespace keyword of a tag reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKeyword {
    Struct,
    Union,
    Enum,
}

impl TagKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            TagKeyword::Struct => "struct",
            TagKeyword::Union => "union",
            TagKeyword::Enum => "enum",
        }
    }
}

/// Builtin arithmetic types (plus `void` for completeness)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimKind {
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    LongDouble,
    Bool,
    Void,
}

impl PrimKind {
    /// Canonical C spelling, matching what the registry is seeded with
    pub fn spelling(self) -> &'static str {
        match self {
            PrimKind::Char => "char",
            PrimKind::SChar => "signed char",
            PrimKind::UChar => "unsigned char",
            PrimKind::Short => "short",
            PrimKind::UShort => "unsigned short",
            PrimKind::Int => "int",
            PrimKind::UInt => "unsigned int",
            PrimKind::Long => "long",
            PrimKind::ULong => "unsigned long",
            PrimKind::LongLong => "long long",
            PrimKind::ULongLong => "unsigned long long",
            PrimKind::Float => "float",
            PrimKind::Double => "double",
            PrimKind::LongDouble => "long double",
            PrimKind::Bool => "_Bool",
            PrimKind::Void => "void",
        }
    }

    /// Unsigned integer kinds accepted for list `count`/`capacity` fields
    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            PrimKind::UChar
                | PrimKind::UShort
                | PrimKind::UInt
                | PrimKind::ULong
                | PrimKind::ULongLong
        )
    }

    /// Integer kinds that admit a zero default
    pub fn has_integer_default(self) -> bool {
        matches!(
            self,
            PrimKind::UChar
                | PrimKind::UShort
                | PrimKind::UInt
                | PrimKind::ULong
                | PrimKind::ULongLong
                | PrimKind::SChar
                | PrimKind::Short
                | PrimKind::Int
                | PrimKind::Long
                | PrimKind::LongLong
        )
    }

    /// Floating kinds that admit a zero default (`long double` does not)
    pub fn has_float_default(self) -> bool {
        matches!(self, PrimKind::Float | PrimKind::Double)
    }
}

impl Header {
    pub fn record(&self, id: RecordId) -> &RecordDecl {
        &self.records[id]
    }

    pub fn enum_(&self, id: EnumId) -> &EnumDecl {
        &self.enums[id]
    }
}
