//! Root entry point emission
//!
//! The public loader drives the document framing around the root type's
//! constructor: an optional stream-start is consumed, a document-start is
//! required, the root constructor runs on the first body event, and a
//! document-end closes the run. The numeric locale is saved and restored
//! around the whole sequence so decimal parsing is portable. A companion
//! deallocator forwards to the root destructor.

use std::io::Write;

use crate::errors::Error;
use crate::registry::TypeDescriptor;
use crate::symbols::{self, DEALLOCATOR_PREFIX, LOADER_PREFIX};

use super::snippets::destructor_call;
use super::Generator;

/// Loader and deallocator declarations for the generated header.
pub(super) fn write_declarations<W: Write>(
    root: &TypeDescriptor,
    out: &mut W,
) -> Result<(), Error> {
    let symbol = symbols::type_symbol(&root.spelling);
    writeln!(
        out,
        "bool {LOADER_PREFIX}{symbol}({spelling} *value, yaml_loader_t *loader);",
        spelling = root.spelling
    )?;
    writeln!(
        out,
        "void {DEALLOCATOR_PREFIX}{symbol}({spelling} *value);",
        spelling = root.spelling
    )?;
    Ok(())
}

pub(super) fn emit<W: Write>(generator: &Generator<'_>, out: &mut W) -> Result<(), Error> {
    let root = generator.root_descriptor();
    let symbol = symbols::type_symbol(&root.spelling);
    let constructor = root
        .constructor
        .as_deref()
        .expect("the root type has a constructor");

    writeln!(
        out,
        "bool {LOADER_PREFIX}{symbol}({spelling} *value, yaml_loader_t *loader) {{",
        spelling = root.spelling
    )?;
    write!(
        out,
        "  char *old_locale = setlocale(LC_NUMERIC, NULL);\n  \
         setlocale(LC_NUMERIC, \"C\");\n  yaml_event_t event;\n  \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n    \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n    return false;\n  }}\n  \
         if (event.type == YAML_STREAM_START_EVENT) {{\n    yaml_event_delete(&event);\n    \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n      return false;\n    }}\n  }}\n  \
         if (!yaml_constructor_check_event_type(loader, &event, YAML_DOCUMENT_START_EVENT))\n    \
         return false;\n  yaml_event_delete(&event);\n  \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n    \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n    return false;\n  }}\n  \
         bool ret = {constructor}(value, loader, &event);\n  if (ret) {{\n    \
         yaml_event_delete(&event);\n    \
         if (yaml_parser_parse(loader->parser, &event) == 0) {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n      return false;\n    \
         }} else if (!yaml_constructor_check_event_type(loader, &event, YAML_DOCUMENT_END_EVENT))\n      \
         return false;\n    yaml_event_delete(&event);\n  }}\n  \
         setlocale(LC_NUMERIC, old_locale);\n  return ret;\n}}\n"
    )?;

    writeln!(
        out,
        "void {DEALLOCATOR_PREFIX}{symbol}({spelling} *value) {{",
        spelling = root.spelling
    )?;
    if let Some(call) = destructor_call(root, "value", true) {
        writeln!(out, "  {call}")?;
    }
    writeln!(out, "}}")?;
    Ok(())
}
