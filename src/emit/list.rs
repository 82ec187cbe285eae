//! Constructor and destructor emission for list types
//!
//! A list is a record with exactly the fields `data`, `count`, and
//! `capacity`, loaded from a YAML sequence. The constructor starts with a
//! 16-element allocation and grows geometrically through the runtime's
//! append macro; element failures roll the partially-built list back
//! through the list destructor.

use std::io::Write;

use crate::annotation::{self, AnnotationKind};
use crate::errors::Error;
use crate::frontend::ast::RecordDecl;
use crate::frontend::types::CanonType;
use crate::registry::TypeDescriptor;

use super::snippets::{constructor_decl, destructor_call, destructor_decl};
use super::Generator;

pub(super) fn emit<W: Write>(
    generator: &Generator<'_>,
    desc: &TypeDescriptor,
    record: &RecordDecl,
    out: &mut W,
) -> Result<(), Error> {
    let element = validate_shape(generator, record)?;
    let element_spelling = generator.resolver().spelling(&element);
    let element_index = generator
        .registry()
        .lookup(&element_spelling)
        .ok_or_else(|| Error::UnknownType {
            name: element_spelling.to_string(),
            range: record.range,
        })?;
    let inner = generator.registry().get(element_index);
    let inner_constructor = inner
        .constructor
        .as_deref()
        .expect("registered element types have constructors");

    writeln!(out)?;
    writeln!(out, "{} {{", constructor_decl(desc))?;
    write!(
        out,
        "  if (!yaml_constructor_check_event_type(loader, cur, YAML_SEQUENCE_START_EVENT))\n    \
         return false;\n  value->data = malloc(16 * sizeof({element_spelling}));\n  \
         if (value->data == NULL) {{\n    \
         loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n    \
         yaml_event_delete(cur);\n    return false;\n  }}\n  value->count = 0;\n  \
         value->capacity = 16;\n  yaml_event_t event;\n  \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n    \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n    yaml_event_delete(cur);\n    \
         return false;\n  }}\n  while (event.type != YAML_SEQUENCE_END_EVENT) {{\n    \
         {element_spelling} *item;\n    YAML_CONSTRUCTOR_APPEND(value, item);\n    \
         bool ret = false;\n    if (item == NULL) {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n      \
         yaml_event_delete(cur);\n    }} else {{\n      \
         ret = {inner_constructor}(item, loader, &event);\n      if (!ret) {{\n        \
         value->count--;\n        yaml_event_delete(cur);\n      }}\n    }}\n    \
         if (ret) {{\n      yaml_event_delete(&event);\n      \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n        \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n        \
         yaml_event_delete(cur);\n        ret = false;\n      }}\n    }}\n    \
         if (!ret) {{\n"
    )?;
    if let Some(rollback) = destructor_call(desc, "value", true) {
        writeln!(out, "      {rollback}")?;
    }
    write!(
        out,
        "      return false;\n    }}\n  }}\n  yaml_event_delete(&event);\n  return true;\n}}\n"
    )?;

    writeln!(out, "{} {{", destructor_decl(desc))?;
    if !inner.is_predefined() {
        writeln!(out, "  for(size_t i = 0; i < value->count; ++i) {{")?;
        if let Some(element_destructor) = destructor_call(inner, "value->data[i]", false) {
            writeln!(out, "    {element_destructor}")?;
        }
        writeln!(out, "  }}")?;
    }
    writeln!(out, "  if (value->data != NULL) free(value->data);\n}}")?;
    Ok(())
}

/// Enforce the list shape: fields `data` (pointer to the element type),
/// `count` and `capacity` (unsigned integers), nothing else, and no
/// annotations beyond `!ignored`.
fn validate_shape(generator: &Generator<'_>, record: &RecordDecl) -> Result<CanonType, Error> {
    let resolver = generator.resolver();
    let mut element: Option<CanonType> = None;
    let mut seen_count = false;
    let mut seen_capacity = false;

    for field in &record.fields {
        let annotation = annotation::parse(field.doc.as_ref())?;
        match annotation.kind {
            AnnotationKind::Ignored => continue,
            AnnotationKind::None => {}
            _ => {
                return Err(Error::Structure {
                    message: "list fields may not carry annotations!".to_string(),
                    range: field.range,
                })
            }
        }
        let canon = resolver.canonicalize(&field.ty);
        match field.name.as_deref() {
            Some("data") => {
                let Some(pointee) = canon.pointee() else {
                    return Err(Error::Structure {
                        message: "data field of list must be a pointer!".to_string(),
                        range: field.range,
                    });
                };
                if pointee.is_pointer() {
                    return Err(Error::Structure {
                        message: "pointer to pointer not supported as list!".to_string(),
                        range: field.range,
                    });
                }
                element = Some(pointee.clone());
            }
            Some("count") => {
                require_unsigned(&canon, "count", field.range)?;
                seen_count = true;
            }
            Some("capacity") => {
                require_unsigned(&canon, "capacity", field.range)?;
                seen_capacity = true;
            }
            other => {
                return Err(Error::Structure {
                    message: format!(
                        "illegal field \"{}\" for list!",
                        other.unwrap_or_default()
                    ),
                    range: field.range,
                })
            }
        }
    }

    let element = element.ok_or_else(|| Error::Structure {
        message: "data field for list missing!".to_string(),
        range: record.range,
    })?;
    if !seen_count {
        return Err(Error::Structure {
            message: "count field for list missing!".to_string(),
            range: record.range,
        });
    }
    if !seen_capacity {
        return Err(Error::Structure {
            message: "capacity field for list missing!".to_string(),
            range: record.range,
        });
    }
    Ok(element)
}

fn require_unsigned(
    canon: &CanonType,
    name: &str,
    range: text_size::TextRange,
) -> Result<(), Error> {
    match canon {
        CanonType::Prim(p) if p.is_unsigned_integer() => Ok(()),
        _ => Err(Error::Structure {
            message: format!("\"{name}\" field must be an unsigned type!"),
            range,
        }),
    }
}
