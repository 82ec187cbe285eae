//! Field analyzer
//!
//! Classifies one record field (or tagged-union variant slot) into a field
//! descriptor: the resolved underlying type plus reconciled pointer and
//! default flags. The classification is ordered — the field's annotation
//! is applied first, then the AST shape fills in what the annotation left
//! open.

use smol_str::SmolStr;

use crate::annotation::{self, AnnotationKind};
use crate::errors::Error;
use crate::frontend::ast::{FieldDecl, PrimKind};
use crate::frontend::types::{CanonType, Resolver};
use crate::registry::{DefaultKind, PtrKind, TypeDescriptor, TypeKind, TypeRegistry};

/// Outcome of classifying one field
pub enum FieldOutcome {
    /// A descriptor for the field's underlying type, with pointer and
    /// default flags reflecting this particular usage
    Added(TypeDescriptor),
    /// The field carries `!ignored` and takes no part in loading
    Ignored,
}

/// Classify a field against the registry.
pub fn describe_field(
    field: &FieldDecl,
    resolver: &Resolver<'_>,
    registry: &TypeRegistry,
) -> Result<FieldOutcome, Error> {
    let canon = resolver.canonicalize(&field.ty);
    let annotation = annotation::parse(field.doc.as_ref())?;

    let mut pointer_kind = PtrKind::ObjectPointer;
    let mut wants_default = false;

    match annotation.kind {
        AnnotationKind::Ignored => return Ok(FieldOutcome::Ignored),
        AnnotationKind::OptionalString | AnnotationKind::String => {
            let str_kind = if annotation.kind == AnnotationKind::OptionalString {
                PtrKind::OptionalString
            } else {
                PtrKind::String
            };
            let Some(pointee) = canon.pointee() else {
                return Err(Error::Structure {
                    message: format!(
                        "'!{}' must be applied on a pointer type (found on a '{}')!",
                        annotation.kind.name(),
                        canon.kind_spelling()
                    ),
                    range: field.range,
                });
            };
            if *pointee != CanonType::Prim(PrimKind::Char) {
                return Err(Error::Structure {
                    message: format!(
                        "'!{}' must be applied on a char pointer (found on a '{}')!",
                        annotation.kind.name(),
                        pointee.kind_spelling()
                    ),
                    range: field.range,
                });
            }
            return Ok(FieldOutcome::Added(string_descriptor(str_kind)));
        }
        AnnotationKind::Default => {
            if canon.is_pointer() {
                return Err(Error::Structure {
                    message: "'!default' may not be applied on a pointer type \
                              (use !optional instead)."
                        .to_string(),
                    range: field.range,
                });
            }
            wants_default = true;
        }
        AnnotationKind::Optional => {
            if !canon.is_pointer() {
                return Err(Error::Structure {
                    message: "'!optional' must be applied on a pointer type.".to_string(),
                    range: field.range,
                });
            }
            pointer_kind = PtrKind::OptionalValue;
        }
        AnnotationKind::None => {}
        other => {
            return Err(Error::Annotation {
                message: format!("Annotation '{}' not valid here.", other.name()),
                range: field.range,
            })
        }
    }

    if let Some(pointee) = canon.pointee() {
        if pointee.is_pointer() {
            return Err(Error::Structure {
                message: "pointer to pointer not supported.".to_string(),
                range: field.range,
            });
        }
        let spelling = resolver.spelling(pointee);
        let index = registry.lookup(&spelling).ok_or_else(|| Error::UnknownType {
            name: spelling.to_string(),
            range: field.range,
        })?;
        let mut descriptor = registry.get(index).clone();
        descriptor.flags.pointer = pointer_kind;
        descriptor.flags.default = DefaultKind::None;
        descriptor.spelling = spelling;
        Ok(FieldOutcome::Added(descriptor))
    } else {
        let spelling = resolver.spelling(&canon);
        let index = registry.lookup(&spelling).ok_or_else(|| Error::UnknownType {
            name: spelling.to_string(),
            range: field.range,
        })?;
        let mut descriptor = registry.get(index).clone();
        descriptor.flags.default = if wants_default {
            infer_default(&canon, &descriptor, &spelling, field)?
        } else {
            DefaultKind::None
        };
        descriptor.spelling = spelling;
        Ok(FieldOutcome::Added(descriptor))
    }
}

/// Which default-value flavor a non-pointer field admits.
fn infer_default(
    canon: &CanonType,
    descriptor: &TypeDescriptor,
    spelling: &str,
    field: &FieldDecl,
) -> Result<DefaultKind, Error> {
    match canon {
        CanonType::Prim(p) if p.has_integer_default() => Ok(DefaultKind::Int),
        CanonType::Prim(p) if p.has_float_default() => Ok(DefaultKind::Float),
        CanonType::Prim(PrimKind::Bool) => Ok(DefaultKind::Bool),
        CanonType::Enum(_) => Ok(DefaultKind::Enum),
        CanonType::Record(_) => {
            if descriptor.flags.kind == TypeKind::List {
                Ok(DefaultKind::List)
            } else {
                Err(Error::Structure {
                    message: "type of '!default' struct must be a list!".to_string(),
                    range: field.range,
                })
            }
        }
        _ => Err(Error::Structure {
            message: format!("'!default' not supported for {spelling}."),
            range: field.range,
        }),
    }
}

/// Descriptor for `!string` / `!optional_string` fields; strings are built
/// by the runtime's own constructor and have no registry entry.
fn string_descriptor(kind: PtrKind) -> TypeDescriptor {
    TypeDescriptor {
        spelling: SmolStr::new("char"),
        decl: crate::registry::DeclRef::None,
        flags: crate::registry::TypeFlags {
            kind: TypeKind::Primitive,
            pointer: kind,
            default: DefaultKind::None,
        },
        constructor: None,
        destructor: None,
        converter: None,
        range: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover;
    use crate::frontend::{self, ast::Header, ParseOptions};
    use crate::registry::TypeRegistry;

    /// Parse a header whose last struct's fields are under test.
    fn analyze_last_struct(
        source: &str,
    ) -> (Header, TypeRegistry, Vec<Result<FieldOutcome, Error>>) {
        let header = frontend::parse(source, &ParseOptions::default()).unwrap();
        let mut discovered = discover::discover(&header).unwrap();
        crate::symbols::assign_symbols(&mut discovered.registry);
        let record_id = header
            .decls
            .iter()
            .rev()
            .find_map(|d| match d {
                crate::frontend::ast::Decl::Record(id) => Some(*id),
                _ => None,
            })
            .expect("a struct to analyze");
        let resolver = Resolver::new(&header);
        let outcomes = header
            .record(record_id)
            .fields
            .iter()
            .map(|f| describe_field(f, &resolver, &discovered.registry))
            .collect();
        (header, discovered.registry, outcomes)
    }

    fn added(outcome: &Result<FieldOutcome, Error>) -> &TypeDescriptor {
        match outcome {
            Ok(FieldOutcome::Added(d)) => d,
            Ok(FieldOutcome::Ignored) => panic!("field unexpectedly ignored"),
            Err(e) => panic!("field unexpectedly failed: {e}"),
        }
    }

    #[test]
    fn plain_value_fields_resolve_through_the_registry() {
        let (_, _, outcomes) = analyze_last_struct("struct s { int a; float b; };");
        let a = added(&outcomes[0]);
        assert_eq!(a.spelling, "int");
        assert_eq!(a.flags.pointer, PtrKind::None);
        assert_eq!(a.flags.default, DefaultKind::None);
        let b = added(&outcomes[1]);
        assert_eq!(b.constructor.as_deref(), Some("yaml_construct_float"));
    }

    #[test]
    fn string_annotations_require_char_pointers() {
        let (_, _, outcomes) =
            analyze_last_struct("struct s { //!string\n char* ok; //!string\n int* bad; };");
        let ok = added(&outcomes[0]);
        assert_eq!(ok.flags.pointer, PtrKind::String);
        let err = outcomes[1].as_ref().err().expect("int* must be rejected");
        assert!(err.to_string().contains("char pointer"));
    }

    #[test]
    fn optional_string_yields_optional_flavor() {
        let (_, _, outcomes) =
            analyze_last_struct("struct s { //!optional_string\n char* os; };");
        assert_eq!(added(&outcomes[0]).flags.pointer, PtrKind::OptionalString);
    }

    #[test]
    fn unannotated_pointer_is_a_non_null_object() {
        let (_, _, outcomes) = analyze_last_struct(
            "struct inner { int v; };\nstruct s { struct inner* p; int* q; };",
        );
        let p = added(&outcomes[0]);
        assert_eq!(p.flags.pointer, PtrKind::ObjectPointer);
        assert_eq!(p.spelling, "struct inner");
        let q = added(&outcomes[1]);
        assert_eq!(q.flags.pointer, PtrKind::ObjectPointer);
        assert_eq!(q.spelling, "int");
    }

    #[test]
    fn optional_requires_a_pointer() {
        let (_, _, outcomes) = analyze_last_struct(
            "struct s { //!optional\n int* ok; //!optional\n int bad; };",
        );
        assert_eq!(added(&outcomes[0]).flags.pointer, PtrKind::OptionalValue);
        assert!(outcomes[1].is_err());
    }

    #[test]
    fn pointer_to_pointer_is_rejected() {
        let (_, _, outcomes) = analyze_last_struct("struct s { int** pp; };");
        let err = outcomes[0].as_ref().err().unwrap();
        assert!(err.to_string().contains("pointer to pointer"));
    }

    #[test]
    fn default_inference_by_shape() {
        let (_, _, outcomes) = analyze_last_struct(
            "enum e { A };\n//!list\nstruct l { int* data; size_t count; size_t capacity; };\nstruct s { //!default\n int i; //!default\n double d; //!default\n _Bool b; //!default\n enum e ev; //!default\n struct l xs; };",
        );
        assert_eq!(added(&outcomes[0]).flags.default, DefaultKind::Int);
        assert_eq!(added(&outcomes[1]).flags.default, DefaultKind::Float);
        assert_eq!(added(&outcomes[2]).flags.default, DefaultKind::Bool);
        assert_eq!(added(&outcomes[3]).flags.default, DefaultKind::Enum);
        assert_eq!(added(&outcomes[4]).flags.default, DefaultKind::List);
    }

    #[test]
    fn default_on_pointer_or_plain_struct_is_rejected() {
        let (_, _, outcomes) = analyze_last_struct(
            "struct inner { int v; };\nstruct s { //!default\n int* p; //!default\n struct inner v; //!default\n long double ld; };",
        );
        assert!(outcomes[0]
            .as_ref()
            .err()
            .unwrap()
            .to_string()
            .contains("may not be applied on a pointer"));
        assert!(outcomes[1]
            .as_ref()
            .err()
            .unwrap()
            .to_string()
            .contains("must be a list"));
        assert!(outcomes[2]
            .as_ref()
            .err()
            .unwrap()
            .to_string()
            .contains("not supported for long double"));
    }

    #[test]
    fn ignored_fields_are_ignored() {
        let (_, _, outcomes) = analyze_last_struct("struct s { //!ignored\n void* handle; };");
        assert!(matches!(outcomes[0], Ok(FieldOutcome::Ignored)));
    }

    #[test]
    fn unknown_types_are_reported_by_spelling() {
        let (_, _, outcomes) = analyze_last_struct("struct s { wobble_t w; };");
        let err = outcomes[0].as_ref().err().unwrap();
        assert_eq!(err.to_string(), "Unknown type: wobble_t");
    }

    #[test]
    fn misplaced_annotations_are_hard_errors() {
        for bad in ["//!repr x", "//!list", "//!tagged", "//!custom"] {
            let source = format!("struct s {{ {bad}\n int f; }};");
            let (_, _, outcomes) = analyze_last_struct(&source);
            let err = outcomes[0].as_ref().err().unwrap();
            assert!(
                err.to_string().contains("not valid here"),
                "{bad} should be rejected, got: {err}"
            );
        }
    }
}
