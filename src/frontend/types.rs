//! Canonical types
//!
//! Mirrors what a C compiler's canonicalization would produce for the
//! supported subset: typedef chains and the builtin `stddef`/`stdint`
//! aliases resolve down to primitive kinds or tag definitions. The rest of
//! the generator only ever compares and spells canonical types.

use smol_str::SmolStr;

use super::ast::{EnumId, Header, PrimKind, RecordId, RecordKeyword, TagId, TagKeyword, TypeExpr};

/// A fully resolved type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonType {
    Prim(PrimKind),
    /// A struct or union definition
    Record(RecordId),
    Enum(EnumId),
    Pointer(Box<CanonType>),
    /// A name that resolves to nothing the header declares. Kept so the
    /// field analyzer can report it as an unknown type by spelling.
    Unresolved(SmolStr),
}

impl CanonType {
    pub fn is_pointer(&self) -> bool {
        matches!(self, CanonType::Pointer(_))
    }

    pub fn pointee(&self) -> Option<&CanonType> {
        match self {
            CanonType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Short kind name used in a few diagnostics ("found on a 'Pointer'")
    pub fn kind_spelling(&self) -> &'static str {
        match self {
            CanonType::Prim(p) => p.spelling(),
            CanonType::Record(_) => "Record",
            CanonType::Enum(_) => "Enum",
            CanonType::Pointer(_) => "Pointer",
            CanonType::Unresolved(_) => "Unexposed",
        }
    }
}

/// Resolves syntactic type references against one header
pub struct Resolver<'h> {
    header: &'h Header,
}

impl<'h> Resolver<'h> {
    pub fn new(header: &'h Header) -> Self {
        Self { header }
    }

    /// Resolve a syntactic type down to its canonical form.
    pub fn canonicalize(&self, ty: &TypeExpr) -> CanonType {
        self.canonicalize_inner(ty, 0)
    }

    fn canonicalize_inner(&self, ty: &TypeExpr, depth: usize) -> CanonType {
        // Typedef cycles cannot be written in valid C, but the parser does
        // not reject them, so bound the chase.
        if depth > 64 {
            return CanonType::Unresolved(SmolStr::new("<cyclic typedef>"));
        }
        match ty {
            TypeExpr::Prim(p) => CanonType::Prim(*p),
            TypeExpr::Pointer(inner) => {
                CanonType::Pointer(Box::new(self.canonicalize_inner(inner, depth)))
            }
            TypeExpr::InlineRecord(id) => CanonType::Record(*id),
            TypeExpr::InlineEnum(id) => CanonType::Enum(*id),
            TypeExpr::Tag(keyword, name) => match self.header.tags.get(name) {
                Some(TagId::Record(id)) => CanonType::Record(*id),
                Some(TagId::Enum(id)) => CanonType::Enum(*id),
                None => CanonType::Unresolved(SmolStr::new(format!(
                    "{} {}",
                    keyword.as_str(),
                    name
                ))),
            },
            TypeExpr::Named(name) => {
                if let Some(prim) = builtin_alias(name) {
                    return CanonType::Prim(prim);
                }
                match self.header.typedefs.get(name) {
                    Some(underlying) => self.canonicalize_inner(underlying, depth + 1),
                    None => CanonType::Unresolved(name.clone()),
                }
            }
        }
    }

    /// Canonical spelling including the namespace token (`struct foo`).
    ///
    /// Anonymous definitions spell as `struct (unnamed)` which can never
    /// collide with a registry key.
    pub fn spelling(&self, ty: &CanonType) -> SmolStr {
        match ty {
            CanonType::Prim(p) => SmolStr::new(p.spelling()),
            CanonType::Record(id) => {
                let record = self.header.record(*id);
                match &record.name {
                    Some(name) => SmolStr::new(format!("{} {}", record.keyword.as_str(), name)),
                    None => SmolStr::new(format!("{} (unnamed)", record.keyword.as_str())),
                }
            }
            CanonType::Enum(id) => match &self.header.enum_(*id).name {
                Some(name) => SmolStr::new(format!("enum {}", name)),
                None => SmolStr::new("enum (unnamed)"),
            },
            CanonType::Pointer(inner) => SmolStr::new(format!("{} *", self.spelling(inner))),
            CanonType::Unresolved(name) => name.clone(),
        }
    }

    /// True when the canonical type is an anonymous struct definition.
    pub fn is_anonymous_struct(&self, ty: &CanonType) -> bool {
        match ty {
            CanonType::Record(id) => {
                let record = self.header.record(*id);
                record.keyword == RecordKeyword::Struct && record.name.is_none()
            }
            _ => false,
        }
    }
}

/// Builtin typedefs a real compiler would pull in from stddef.h / stdint.h.
///
/// Spellings resolve the way clang does on an LP64 target.
fn builtin_alias(name: &str) -> Option<PrimKind> {
    Some(match name {
        "size_t" | "uintptr_t" | "uint64_t" => PrimKind::ULong,
        "ptrdiff_t" | "ssize_t" | "intptr_t" | "int64_t" => PrimKind::Long,
        "uint8_t" => PrimKind::UChar,
        "uint16_t" => PrimKind::UShort,
        "uint32_t" => PrimKind::UInt,
        "int8_t" => PrimKind::SChar,
        "int16_t" => PrimKind::Short,
        "int32_t" => PrimKind::Int,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use text_size::TextRange;

    fn empty_range() -> TextRange {
        TextRange::empty(0.into())
    }

    fn header_with_typedef(name: &str, underlying: TypeExpr) -> Header {
        let mut header = Header::default();
        header.typedefs.insert(SmolStr::new(name), underlying);
        header
    }

    #[test]
    fn builtin_aliases_resolve_to_primitives() {
        let header = Header::default();
        let resolver = Resolver::new(&header);
        let canon = resolver.canonicalize(&TypeExpr::Named("size_t".into()));
        assert_eq!(canon, CanonType::Prim(PrimKind::ULong));
        assert_eq!(resolver.spelling(&canon), "unsigned long");
    }

    #[test]
    fn typedef_chains_resolve_through() {
        let mut header = header_with_typedef("inner_t", TypeExpr::Prim(PrimKind::Int));
        header
            .typedefs
            .insert(SmolStr::new("outer_t"), TypeExpr::Named("inner_t".into()));
        let resolver = Resolver::new(&header);
        assert_eq!(
            resolver.canonicalize(&TypeExpr::Named("outer_t".into())),
            CanonType::Prim(PrimKind::Int)
        );
    }

    #[test]
    fn unknown_names_stay_unresolved() {
        let header = Header::default();
        let resolver = Resolver::new(&header);
        let canon = resolver.canonicalize(&TypeExpr::Named("mystery_t".into()));
        assert_eq!(canon, CanonType::Unresolved("mystery_t".into()));
        assert_eq!(resolver.spelling(&canon), "mystery_t");
    }

    #[test]
    fn tag_references_resolve_to_definitions() {
        use crate::frontend::ast::RecordDecl;
        let mut header = Header::default();
        header.records.push(RecordDecl {
            keyword: RecordKeyword::Struct,
            name: Some("person".into()),
            fields: vec![],
            doc: None,
            range: empty_range(),
        });
        header.tags.insert("person".into(), TagId::Record(0));
        let resolver = Resolver::new(&header);
        let canon = resolver.canonicalize(&TypeExpr::Tag(TagKeyword::Struct, "person".into()));
        assert_eq!(canon, CanonType::Record(0));
        assert_eq!(resolver.spelling(&canon), "struct person");
    }

    #[test]
    fn pointers_wrap_canonical_pointees() {
        let header = Header::default();
        let resolver = Resolver::new(&header);
        let canon = resolver.canonicalize(&TypeExpr::Pointer(Box::new(TypeExpr::Prim(
            PrimKind::Char,
        ))));
        assert!(canon.is_pointer());
        assert_eq!(canon.pointee(), Some(&CanonType::Prim(PrimKind::Char)));
    }
}
