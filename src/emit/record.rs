//! Constructor and destructor emission for plain records
//!
//! A record loads from a YAML mapping. Keys dispatch through a control
//! table compiled from a per-record field-name DFA; each known field
//! tracks duplicate occurrence in a `found[]` bitmap, missing required
//! keys are reported after the mapping closes, and any failure rolls back
//! every field already constructed.

use std::io::Write;

use crate::analyze::{describe_field, FieldOutcome};
use crate::dfa::{InsertError, NameDfa};
use crate::errors::Error;
use crate::frontend::ast::RecordDecl;
use crate::registry::TypeDescriptor;

use super::snippets::{
    constructor_decl, control_table, default_assignments, destructor_call, destructor_decl,
    field_deserialization, FieldSlot,
};
use super::Generator;

/// Build the field-dispatch DFA for a record.
pub(super) fn field_dfa(
    generator: &Generator<'_>,
    record: &RecordDecl,
) -> Result<NameDfa<FieldSlot>, Error> {
    let mut dfa = NameDfa::new();
    for field in &record.fields {
        let descriptor =
            match describe_field(field, generator.resolver(), generator.registry())? {
                FieldOutcome::Ignored => continue,
                FieldOutcome::Added(descriptor) => descriptor,
            };
        let Some(name) = &field.name else {
            // unreachable in practice: anonymous members never resolve
            return Err(Error::Structure {
                message: "expected field name".to_string(),
                range: field.range,
            });
        };
        let accessor = format!("value->{name}");
        let slot = FieldSlot {
            name: name.clone(),
            loader: field_deserialization(name, &descriptor, "&event"),
            destructor: destructor_call(&descriptor, &accessor, false),
            defaults: default_assignments(&descriptor, &accessor),
        };
        match dfa.insert(name, slot) {
            Ok(()) => {}
            Err(InsertError::Duplicate) => {
                return Err(Error::Structure {
                    message: format!("duplicate field name: \"{name}\""),
                    range: field.range,
                })
            }
            Err(InsertError::CapacityExhausted) => {
                return Err(Error::DfaCapacity { range: field.range })
            }
        }
    }
    Ok(dfa)
}

pub(super) fn emit<W: Write>(
    generator: &Generator<'_>,
    desc: &TypeDescriptor,
    record: &RecordDecl,
    out: &mut W,
) -> Result<(), Error> {
    let dfa = field_dfa(generator, record)?;
    // slot order is node-id order; `found`/`optional`/`names` share it
    let slots: Vec<(usize, &FieldSlot)> = dfa.finals().collect();

    writeln!(out)?;
    writeln!(out, "{} {{", constructor_decl(desc))?;
    if !slots.is_empty() {
        write!(out, "{}", control_table(&dfa))?;
    }
    write!(
        out,
        "  if (!yaml_constructor_check_event_type(loader, cur, YAML_MAPPING_START_EVENT))\n    \
         return false;\n  yaml_event_t key;\n  if (yaml_parser_parse(loader->parser, &key) == 0) {{\n    \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n    yaml_event_delete(cur);\n    \
         return false;\n  }}\n  bool ret = true;\n"
    )?;

    if slots.is_empty() {
        write!(
            out,
            "  if (!yaml_constructor_check_event_type(loader, &key, YAML_MAPPING_END_EVENT)) {{\n    \
             yaml_event_delete(cur);\n    return false;\n  }}\n"
        )?;
        writeln!(out, "  return ret;\n}}")?;
    } else {
        emit_field_loop(&dfa, &slots, out)?;
        emit_epilogue(&slots, out)?;
        writeln!(out, "  return ret;\n}}")?;
    }

    // destructor: every field that contributed a destructor snippet, in
    // slot order
    write!(out, "\n{} {{", destructor_decl(desc))?;
    for (_, slot) in &slots {
        if let Some(destructor) = &slot.destructor {
            write!(out, "\n  {destructor}")?;
        }
    }
    writeln!(out, "\n}}")?;
    Ok(())
}

fn emit_field_loop<W: Write>(
    dfa: &NameDfa<FieldSlot>,
    slots: &[(usize, &FieldSlot)],
    out: &mut W,
) -> Result<(), Error> {
    let (min, max) = dfa.alphabet().expect("records with fields have an alphabet");

    let found_init = vec!["false"; slots.len()].join(", ");
    writeln!(out, "  bool found[] = {{{found_init}}};")?;
    let optional_init = slots
        .iter()
        .map(|(_, slot)| if slot.defaults.is_empty() { "false" } else { "true" })
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "  static const bool optional[] = {{{optional_init}}};")?;
    for (_, slot) in slots {
        for line in &slot.defaults {
            writeln!(out, "  {line}")?;
        }
    }
    let names_init = slots
        .iter()
        .map(|(_, slot)| format!("\"{}\"", slot.name))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "  static char const *const names[] = {{{names_init}}};")?;

    write!(
        out,
        "  while(key.type != YAML_MAPPING_END_EVENT) {{\n    \
         if (!yaml_constructor_check_event_type(loader, &key, YAML_SCALAR_EVENT)) {{\n      \
         ret = false;\n      break;\n    }}\n    uint16_t result;\n    \
         YAML_CONSTRUCTOR_WALK(table, key.data.scalar.value, {}, {}, result);\n    \
         yaml_event_t event;\n    \
         const char *const name = (const char*)key.data.scalar.value;\n    \
         const size_t name_len = strlen(name) + 1;\n    switch(result) {{\n",
        min - 1,
        max + 1
    )?;

    for (slot_index, (node_id, slot)) in slots.iter().enumerate() {
        write!(
            out,
            "      case {node_id}:\n        if (found[{slot_index}]) {{\n          \
             loader->error_info.expected = malloc(name_len);\n          \
             if (loader->error_info.expected == NULL) {{\n            \
             loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n            \
             yaml_event_delete(&key);\n          }} else {{\n            \
             loader->error_info.type = YAML_LOADER_ERROR_DUPLICATE_KEY;\n            \
             memcpy(loader->error_info.expected, name, name_len);\n            \
             loader->error_info.event = key;\n          }}\n          ret = false;\n        \
             }} else {{\n          if (yaml_parser_parse(loader->parser, &event) == 0) {{\n            \
             loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n            \
             yaml_event_delete(&key);\n            ret = false;\n          }} else {{\n            \
             {}            if (ret) {{\n              yaml_event_delete(&event);\n              \
             found[{slot_index}] = true;\n            }}\n          }}\n        }}\n        break;\n",
            slot.loader
        )?;
    }

    write!(
        out,
        "      default: {{\n        loader->error_info.expected = malloc(name_len);\n        \
         if (loader->error_info.expected == NULL) {{\n          \
         loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n          \
         yaml_event_delete(&key);\n        }} else {{\n          \
         loader->error_info.type = YAML_LOADER_ERROR_UNKNOWN_KEY;\n          \
         memcpy(loader->error_info.expected, name, name_len);\n          \
         loader->error_info.event = key;\n        }}\n        ret = false;\n        break;\n      \
         }}\n    }}\n    if (!ret) break;\n    yaml_event_delete(&key);\n    \
         if (yaml_parser_parse(loader->parser, &key) == 0) {{\n      \
         loader->error_info.type = YAML_LOADER_ERROR_PARSER;\n      ret = false;\n      \
         break;\n    }}\n  }}\n"
    )?;
    Ok(())
}

fn emit_epilogue<W: Write>(slots: &[(usize, &FieldSlot)], out: &mut W) -> Result<(), Error> {
    write!(
        out,
        "  if (ret) {{\n    yaml_event_delete(&key);\n    \
         for (size_t i = 0; i < sizeof(found); i++) {{\n      \
         if (!found[i] && !optional[i]) {{\n        \
         const size_t missing_len = strlen(names[i]) + 1;\n        \
         loader->error_info.expected = malloc(missing_len);\n        \
         if (loader->error_info.expected == NULL) {{\n          \
         loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n          \
         yaml_event_delete(cur);\n        }} else {{\n          \
         loader->error_info.type = YAML_LOADER_ERROR_MISSING_KEY;\n          \
         memcpy(loader->error_info.expected, names[i], missing_len);\n          \
         loader->error_info.event = *cur;\n        }}\n        ret = false;\n        \
         break;\n      }}\n    }}\n  }} else yaml_event_delete(cur);\n"
    )?;
    write!(out, "  if (!ret) {{\n")?;
    for (slot_index, (_, slot)) in slots.iter().enumerate() {
        if let Some(destructor) = &slot.destructor {
            write!(
                out,
                "    if (found[{slot_index}]) {{\n      {destructor}\n    }}\n"
            )?;
        }
    }
    write!(out, "  }}\n")?;
    Ok(())
}
