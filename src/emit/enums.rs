//! Constructor and converter emission for enumerations
//!
//! Each enumeration gets an internal converter — a pure function from the
//! YAML-side representation to the enum value, driven by a minimized DFA —
//! and a public constructor that requires a scalar event and delegates to
//! the converter. Enumerations have no destructor.

use std::io::Write;

use smol_str::SmolStr;

use crate::annotation::{self, AnnotationKind};
use crate::dfa::{InsertError, NameDfa};
use crate::errors::Error;
use crate::frontend::ast::EnumDecl;
use crate::registry::TypeDescriptor;

use super::snippets::{constructor_decl, control_table, converter_decl};
use super::Generator;

pub(super) fn emit<W: Write>(
    _generator: &Generator<'_>,
    desc: &TypeDescriptor,
    decl: &EnumDecl,
    out: &mut W,
) -> Result<(), Error> {
    let dfa = representation_dfa(decl)?;

    let converter = desc
        .converter
        .as_deref()
        .expect("enums have converters assigned");

    // converter: representation string → enum value
    writeln!(out, "{} {{", converter_decl(desc))?;
    if dfa.alphabet().is_some() {
        let (min, max) = dfa.alphabet().expect("checked above");
        write!(out, "{}", control_table(&dfa))?;
        write!(
            out,
            "  uint16_t res;\n  YAML_CONSTRUCTOR_WALK(table, (unsigned char*)value, {}, {}, res);\n  \
             switch(res) {{\n",
            min - 1,
            max + 1
        )?;
        for (node_id, constant) in dfa.finals() {
            write!(
                out,
                "      case {node_id}:\n        *result = {constant};\n        break;\n"
            )?;
        }
        write!(out, "    default: return false;\n  }}\n  return true;\n}}\n\n")?;
    } else {
        // every constant ignored: nothing can convert
        write!(out, "  (void)value;\n  (void)result;\n  return false;\n}}\n\n")?;
    }

    // public constructor: scalar event → converter
    writeln!(out, "{} {{", constructor_decl(desc))?;
    write!(
        out,
        "  if (!yaml_constructor_check_event_type(loader, cur, YAML_SCALAR_EVENT))\n    \
         return false;\n  if ({converter}((const char*)cur->data.scalar.value, value)) {{\n    \
         return true;\n  }} else {{\n    const char typename[] = \"{spelling}\";\n    \
         loader->error_info.expected = malloc(sizeof(typename));\n    \
         if (loader->error_info.expected == NULL) {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n      \
         yaml_event_delete(cur);\n    }} else {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_VALUE;\n      \
         memcpy(loader->error_info.expected, typename, sizeof(typename));\n      \
         loader->error_info.event = *cur;\n    }}\n    return false;\n  }}\n}}\n\n",
        spelling = desc.spelling,
    )?;
    Ok(())
}

/// Build the DFA over each constant's YAML-side representation: its
/// `!repr` parameter when given, the constant's identifier otherwise.
fn representation_dfa(decl: &EnumDecl) -> Result<NameDfa<SmolStr>, Error> {
    let mut dfa = NameDfa::new();
    for constant in &decl.constants {
        let annotation = annotation::parse(constant.doc.as_ref())?;
        let representation = match annotation.kind {
            AnnotationKind::Repr => annotation
                .param
                .clone()
                .expect("repr always carries a parameter"),
            AnnotationKind::None => constant.name.clone(),
            AnnotationKind::Ignored => continue,
            other => {
                return Err(Error::Annotation {
                    message: format!(
                        "Unsupported annotation for enum constant: '{}'",
                        other.name()
                    ),
                    range: constant.range,
                })
            }
        };
        match dfa.insert(&representation, constant.name.clone()) {
            Ok(()) => {}
            Err(InsertError::Duplicate) => {
                return Err(Error::Structure {
                    message: format!(
                        "duplicate enumeration representation: \"{representation}\""
                    ),
                    range: constant.range,
                })
            }
            Err(InsertError::CapacityExhausted) => {
                return Err(Error::DfaCapacity {
                    range: constant.range,
                })
            }
        }
    }
    Ok(dfa)
}
