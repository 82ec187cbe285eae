//! Type discovery pass
//!
//! Walks the top-level declarations in source order, applies annotations,
//! enforces per-kind structural constraints, and populates the type
//! registry. Custom constructor/destructor prototypes are collected here
//! and verified once symbol names have been assigned.

use smol_str::SmolStr;
use text_size::TextRange;
use tracing::debug;

use crate::annotation::{self, Annotation, AnnotationKind};
use crate::errors::Error;
use crate::frontend::ast::{Decl, Header, RecordDecl, RecordKeyword, TypeExpr};
use crate::frontend::types::{CanonType, Resolver};
use crate::registry::{DeclRef, DefaultKind, PtrKind, TypeDescriptor, TypeFlags, TypeKind, TypeRegistry};
use crate::symbols;

/// Everything the discovery pass produces
#[derive(Debug)]
pub struct Discovered {
    pub registry: TypeRegistry,
    /// Names of declared `yaml_construct_*` prototypes
    pub constructor_names: Vec<SmolStr>,
    /// Names of declared `yaml_delete_*` prototypes
    pub destructor_names: Vec<SmolStr>,
}

/// Run the discovery pass over a parsed header.
pub fn discover(header: &Header) -> Result<Discovered, Error> {
    let mut pass = Discovery {
        header,
        resolver: Resolver::new(header),
        registry: TypeRegistry::new(),
        constructor_names: Vec::new(),
        destructor_names: Vec::new(),
        recent_def: None,
    };
    pass.run()?;
    Ok(Discovered {
        registry: pass.registry,
        constructor_names: pass.constructor_names,
        destructor_names: pass.destructor_names,
    })
}

/// Verify that every `!custom` type has both of its user-declared symbols.
///
/// Must run after symbol assignment, which computes the expected names.
pub fn verify_custom_symbols(discovered: &Discovered) -> Result<(), Error> {
    for (_, entry) in discovered.registry.iter() {
        if entry.flags.kind != TypeKind::Custom {
            continue;
        }
        let range = entry.range.unwrap_or_else(|| TextRange::empty(0.into()));
        if let Some(constructor) = &entry.constructor {
            if !discovered.constructor_names.contains(constructor) {
                return Err(Error::MissingCustomConstructor { range });
            }
        }
        if let Some(destructor) = &entry.destructor {
            if !discovered.destructor_names.contains(destructor) {
                return Err(Error::MissingCustomDestructor { range });
            }
        }
    }
    Ok(())
}

struct Discovery<'h> {
    header: &'h Header,
    resolver: Resolver<'h>,
    registry: TypeRegistry,
    constructor_names: Vec<SmolStr>,
    destructor_names: Vec<SmolStr>,
    /// Canonical type of the most recently registered declaration; a
    /// typedef whose canonical type matches re-keys that entry instead of
    /// creating a new one.
    recent_def: Option<CanonType>,
}

impl Discovery<'_> {
    fn run(&mut self) -> Result<(), Error> {
        for decl in &self.header.decls {
            match decl {
                Decl::Record(id) => self.discover_record(*id)?,
                Decl::Enum(id) => self.discover_enum(*id)?,
                Decl::Typedef(td) => self.discover_typedef(td)?,
                Decl::Function(f) => self.discover_function(&f.name, f.range)?,
                Decl::Unsupported { what, range } => {
                    return Err(Error::Structure {
                        message: format!("unsupported element: \"{what}\""),
                        range: *range,
                    })
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Records and enums
    // -------------------------------------------------------------------------

    fn discover_record(&mut self, id: usize) -> Result<(), Error> {
        let record = self.header.record(id);
        if record.keyword == RecordKeyword::Union {
            let message = match &record.name {
                Some(name) => format!("named unions not supported: \"{name}\""),
                None => "anonymous unions not supported at top level!".to_string(),
            };
            return Err(Error::Structure {
                message,
                range: record.range,
            });
        }

        let Some(name) = &record.name else {
            // Anonymous record at outer scope: never registered, but its
            // fields still undergo the structural checks.
            return self.check_record_fields(record);
        };

        let annotation = annotation::parse(record.doc.as_ref())?;
        if annotation.kind == AnnotationKind::Ignored {
            return Ok(());
        }
        let spelling = SmolStr::new(format!("struct {name}"));
        let descriptor = self.build_descriptor(
            spelling.clone(),
            DeclRef::Record(id),
            &annotation,
            record.range,
        )?;
        let custom = descriptor.flags.kind == TypeKind::Custom;
        let index = self.registry.add(descriptor);
        self.registry.add_name(&spelling, index, record.range)?;
        self.recent_def = Some(CanonType::Record(id));
        debug!(type_name = %spelling, index, "registered record");

        // custom types are not inspected further
        if !custom {
            self.check_record_fields(record)?;
        }
        Ok(())
    }

    fn discover_enum(&mut self, id: usize) -> Result<(), Error> {
        let decl = self.header.enum_(id);
        let Some(name) = &decl.name else {
            return Ok(());
        };
        let annotation = annotation::parse(decl.doc.as_ref())?;
        if annotation.kind == AnnotationKind::Ignored {
            return Ok(());
        }
        let spelling = SmolStr::new(format!("enum {name}"));
        let descriptor =
            self.build_descriptor(spelling.clone(), DeclRef::Enum(id), &annotation, decl.range)?;
        let index = self.registry.add(descriptor);
        self.registry.add_name(&spelling, index, decl.range)?;
        self.recent_def = Some(CanonType::Enum(id));
        debug!(type_name = %spelling, index, "registered enum");
        Ok(())
    }

    /// Structural checks applied while walking record bodies: no anonymous
    /// struct fields, no nested definitions. Anonymous inline unions are
    /// legal here (tagged unions depend on them), but their members undergo
    /// the same checks.
    fn check_record_fields(&self, record: &RecordDecl) -> Result<(), Error> {
        for field in &record.fields {
            if let Some(message) = self.nested_definition(&field.ty) {
                return Err(Error::Structure {
                    message,
                    range: field.range,
                });
            }
            let canon = self.resolver.canonicalize(&field.ty);
            if self.resolver.is_anonymous_struct(&canon) {
                return Err(Error::Structure {
                    message: "Anonymous struct not supported!".to_string(),
                    range: field.range,
                });
            }
            if let TypeExpr::InlineRecord(id) = &field.ty {
                let inline = self.header.record(*id);
                if inline.keyword == RecordKeyword::Union && inline.name.is_none() {
                    self.check_record_fields(inline)?;
                }
            }
        }
        Ok(())
    }

    /// A named definition in field position is a nested definition.
    fn nested_definition(&self, ty: &TypeExpr) -> Option<String> {
        match ty {
            TypeExpr::InlineRecord(id) => {
                let record = self.header.record(*id);
                record.name.as_ref().map(|name| {
                    format!(
                        "nested {} definition not supported: \"{name}\"",
                        record.keyword.as_str()
                    )
                })
            }
            TypeExpr::InlineEnum(id) => self
                .header
                .enum_(*id)
                .name
                .as_ref()
                .map(|name| format!("nested enum definition not supported: \"{name}\"")),
            TypeExpr::Pointer(inner) => self.nested_definition(inner),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Typedefs
    // -------------------------------------------------------------------------

    fn discover_typedef(&mut self, td: &crate::frontend::ast::TypedefDecl) -> Result<(), Error> {
        let canon = self.resolver.canonicalize(&td.underlying);
        let canon_spelling = self.resolver.spelling(&canon);

        let target = match self.registry.lookup(&canon_spelling) {
            Some(underlying) => {
                if self.recent_def.as_ref() == Some(&canon) {
                    // The alias directly follows the definition it names;
                    // it becomes another key of the same entry.
                    Some(underlying)
                } else {
                    let annotation = annotation::parse(td.doc.as_ref())?;
                    if annotation.kind == AnnotationKind::Ignored {
                        return Ok(());
                    }
                    let descriptor = self.build_descriptor(
                        td.name.clone(),
                        decl_ref(&canon),
                        &annotation,
                        td.range,
                    )?;
                    let existing = self.registry.get(underlying);
                    if existing.decl == descriptor.decl && existing.flags == descriptor.flags {
                        // Same shape under a new name: the entry is
                        // re-spelled to the alias, which is observable in
                        // the emitted symbol names.
                        self.registry.get_mut(underlying).spelling = td.name.clone();
                        Some(underlying)
                    } else {
                        let index = self.registry.add(descriptor);
                        self.recent_def = Some(canon);
                        Some(index)
                    }
                }
            }
            None => {
                let annotation = annotation::parse(td.doc.as_ref())?;
                if annotation.kind == AnnotationKind::Ignored {
                    return Ok(());
                }
                let descriptor = self.build_descriptor(
                    td.name.clone(),
                    decl_ref(&canon),
                    &annotation,
                    td.range,
                )?;
                let index = self.registry.add(descriptor);
                self.recent_def = Some(canon);
                Some(index)
            }
        };

        if let Some(index) = target {
            self.registry.add_name(&td.name, index, td.range)?;
            debug!(alias = %td.name, index, "registered typedef");
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Functions
    // -------------------------------------------------------------------------

    fn discover_function(&mut self, name: &SmolStr, range: TextRange) -> Result<(), Error> {
        if name.starts_with(symbols::CONSTRUCTOR_PREFIX) {
            self.constructor_names.push(name.clone());
            Ok(())
        } else if name.starts_with(symbols::DESTRUCTOR_PREFIX) {
            self.destructor_names.push(name.clone());
            Ok(())
        } else {
            Err(Error::Structure {
                message: format!(
                    "unsupported function (expected constructor or destructor): {name}"
                ),
                range,
            })
        }
    }

    // -------------------------------------------------------------------------
    // Descriptor construction
    // -------------------------------------------------------------------------

    /// Build a descriptor from a declaration and its annotation, mirroring
    /// how type-level annotations map to flags.
    fn build_descriptor(
        &self,
        spelling: SmolStr,
        decl: DeclRef,
        annotation: &Annotation,
        range: TextRange,
    ) -> Result<TypeDescriptor, Error> {
        match annotation.kind {
            AnnotationKind::Repr => {
                return Err(Error::Annotation {
                    message: "'!repr' annotation cannot be applied on a type declaration"
                        .to_string(),
                    range,
                })
            }
            AnnotationKind::Default => {
                return Err(Error::Annotation {
                    message: "'!default' annotation is not valid on a type declaration"
                        .to_string(),
                    range,
                })
            }
            _ => {}
        }
        let kind = match annotation.kind {
            AnnotationKind::List => TypeKind::List,
            AnnotationKind::Tagged => TypeKind::Tagged,
            AnnotationKind::Custom => TypeKind::Custom,
            _ => match decl {
                DeclRef::Record(_) => TypeKind::Record,
                DeclRef::Enum(_) => TypeKind::Enum,
                DeclRef::None => TypeKind::Record,
            },
        };
        let pointer = match annotation.kind {
            AnnotationKind::String => PtrKind::String,
            AnnotationKind::Optional => PtrKind::OptionalValue,
            AnnotationKind::OptionalString => PtrKind::OptionalString,
            _ => PtrKind::None,
        };
        Ok(TypeDescriptor {
            spelling,
            decl,
            flags: TypeFlags {
                kind,
                pointer,
                default: DefaultKind::None,
            },
            constructor: None,
            destructor: None,
            converter: None,
            range: Some(range),
        })
    }
}

fn decl_ref(canon: &CanonType) -> DeclRef {
    match canon {
        CanonType::Record(id) => DeclRef::Record(*id),
        CanonType::Enum(id) => DeclRef::Enum(*id),
        _ => DeclRef::None,
    }
}
