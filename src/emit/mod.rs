//! Emission of the generated C sources
//!
//! The generator walks the registry in insertion order and delegates each
//! entry to the emitter for its kind. The emitted code consumes the
//! runtime library's event-stream interface (`yaml_loader_t`, the
//! `YAML_CONSTRUCTOR_WALK` / `YAML_CONSTRUCTOR_APPEND` macros, and the
//! predefined scalar constructors).

mod enums;
mod list;
mod record;
mod root;
mod snippets;
mod tagged;

use std::io::Write;

use text_size::TextRange;
use tracing::debug;

use crate::config::Config;
use crate::errors::Error;
use crate::frontend::ast::Header;
use crate::frontend::types::Resolver;
use crate::registry::{DeclRef, TypeDescriptor, TypeKind, TypeRegistry};

pub use snippets::FieldSlot;

/// One emission run: the registry plus the AST it refers to.
pub struct Generator<'a> {
    header: &'a Header,
    registry: &'a TypeRegistry,
    resolver: Resolver<'a>,
    root: usize,
}

impl<'a> Generator<'a> {
    pub fn new(header: &'a Header, registry: &'a TypeRegistry, root: usize) -> Self {
        Self {
            header,
            registry,
            resolver: Resolver::new(header),
            root,
        }
    }

    fn root_descriptor(&self) -> &TypeDescriptor {
        self.registry.get(self.root)
    }

    /// Write the public header: includes, the root loader/deallocator, and
    /// the low-level constructor/destructor declarations.
    pub fn write_header<W: Write>(&self, out: &mut W, config: &Config) -> Result<(), Error> {
        writeln!(out, "#include <yaml.h>")?;
        writeln!(out, "#include <yaml_loader.h>")?;
        writeln!(out, "#include <{}>", config.input_file_name)?;
        writeln!(out)?;
        writeln!(
            out,
            "/* main functions for loading / deallocating the root type */"
        )?;
        writeln!(out)?;
        root::write_declarations(self.root_descriptor(), out)?;
        writeln!(out)?;
        writeln!(
            out,
            "/* low-level functions; only necessary when writing custom constructors */"
        )?;
        writeln!(out)?;
        for (_, entry) in self.registry.iter() {
            if entry.is_predefined() || entry.flags.kind == TypeKind::Custom {
                continue;
            }
            writeln!(out, "{};", snippets::constructor_decl(entry))?;
            if entry.destructor.is_some() {
                writeln!(out, "{};", snippets::destructor_decl(entry))?;
            }
        }
        Ok(())
    }

    /// Write the implementation file: converter declarations, every
    /// constructor/destructor definition, and the root entry point.
    pub fn write_implementation<W: Write>(
        &self,
        out: &mut W,
        config: &Config,
    ) -> Result<(), Error> {
        writeln!(out, "#include <yaml_constructor.h>")?;
        writeln!(out, "#include <stdbool.h>")?;
        writeln!(out, "#include <locale.h>")?;
        writeln!(out, "#include <stdint.h>")?;
        writeln!(out, "#include \"{}\"", config.output_header_name)?;

        // forward declarations of the internal enum converters
        for (_, entry) in self.registry.iter() {
            if entry.is_predefined() || entry.flags.kind == TypeKind::Custom {
                continue;
            }
            if matches!(entry.decl, DeclRef::Enum(_)) {
                writeln!(out, "{};", snippets::converter_decl(entry))?;
            }
        }

        for (_, entry) in self.registry.iter() {
            if entry.is_predefined() || entry.flags.kind == TypeKind::Custom {
                continue;
            }
            debug!(type_name = %entry.spelling, kind = ?entry.flags.kind, "emitting type");
            match entry.decl {
                DeclRef::Record(id) => {
                    let record = self.header.record(id);
                    match entry.flags.kind {
                        TypeKind::List => list::emit(self, entry, record, out)?,
                        TypeKind::Tagged => tagged::emit(self, entry, record, out)?,
                        _ => record::emit(self, entry, record, out)?,
                    }
                }
                DeclRef::Enum(id) => {
                    let decl = self.header.enum_(id);
                    enums::emit(self, entry, decl, out)?;
                }
                DeclRef::None => {
                    return Err(Error::Structure {
                        message: format!("Unexpected type item: {}", entry.spelling),
                        range: entry
                            .range
                            .unwrap_or_else(|| TextRange::empty(0.into())),
                    });
                }
            }
        }

        root::emit(self, out)?;
        Ok(())
    }

    pub(crate) fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    pub(crate) fn resolver(&self) -> &Resolver<'a> {
        &self.resolver
    }
}
