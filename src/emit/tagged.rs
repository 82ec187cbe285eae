//! Constructor and destructor emission for tagged unions
//!
//! A tagged union is a record with exactly two fields: an enum
//! discriminant followed by an anonymous union. The YAML tag on the
//! current event selects the variant; the tagged event itself is the
//! value, so no extra event is consumed. Variants without a union field
//! require an empty scalar.

use std::io::Write;

use crate::analyze::{describe_field, FieldOutcome};
use crate::errors::Error;
use crate::frontend::ast::RecordDecl;
use crate::frontend::types::CanonType;
use crate::registry::TypeDescriptor;

use super::snippets::{
    constructor_decl, destructor_call, destructor_decl, field_deserialization,
};
use super::Generator;

pub(super) fn emit<W: Write>(
    generator: &Generator<'_>,
    desc: &TypeDescriptor,
    record: &RecordDecl,
    out: &mut W,
) -> Result<(), Error> {
    let resolver = generator.resolver();
    let registry = generator.registry();

    let mut fields = record.fields.iter();

    // discriminant
    let Some(discriminant_field) = fields.next() else {
        return Err(Error::Structure {
            message: "tagged union must have an enum field and a union field!".to_string(),
            range: record.range,
        });
    };
    let discriminant_canon = resolver.canonicalize(&discriminant_field.ty);
    let CanonType::Enum(enum_id) = discriminant_canon else {
        return Err(Error::Structure {
            message: format!(
                "first field of tagged union must be an enum, found a {}!",
                resolver.spelling(&discriminant_canon)
            ),
            range: discriminant_field.range,
        });
    };
    let enum_spelling = resolver.spelling(&discriminant_canon);
    let enum_index = registry
        .lookup(&enum_spelling)
        .ok_or_else(|| Error::Structure {
            message: "cannot use this enum as discriminant: not declared in this header!"
                .to_string(),
            range: discriminant_field.range,
        })?;
    let enum_descriptor = registry.get(enum_index);
    let constants = &generator.header.enum_(enum_id).constants;
    if constants.is_empty() {
        return Err(Error::Structure {
            message: "enum for tagged union must have at least one item!".to_string(),
            range: discriminant_field.range,
        });
    }
    let Some(discriminant) = &discriminant_field.name else {
        return Err(Error::Structure {
            message: "tagged union discriminant must be named!".to_string(),
            range: discriminant_field.range,
        });
    };

    // payload union
    let Some(union_field) = fields.next() else {
        return Err(Error::Structure {
            message: "tagged union must have an enum field and a union field!".to_string(),
            range: record.range,
        });
    };
    let union_canon = resolver.canonicalize(&union_field.ty);
    let CanonType::Record(union_id) = union_canon else {
        return Err(Error::Structure {
            message: format!(
                "second field of tagged union must be a union, found a {}!",
                resolver.spelling(&union_canon)
            ),
            range: union_field.range,
        });
    };
    if let Some(extra) = fields.next() {
        return Err(Error::Structure {
            message: "tagged union must not have more than two fields!".to_string(),
            range: extra.range,
        });
    }

    let converter = enum_descriptor
        .converter
        .as_deref()
        .ok_or_else(|| Error::Structure {
            message: "cannot use this enum as discriminant: not declared in this header!"
                .to_string(),
            range: discriminant_field.range,
        })?;

    writeln!(out)?;
    writeln!(out, "{} {{", constructor_decl(desc))?;
    write!(
        out,
        "  const char typename[] = \"{}\";\n  yaml_char_t *tag;\n  switch(cur->type) {{\n    \
         case YAML_SCALAR_EVENT:\n      tag = cur->data.scalar.tag;\n      break;\n    \
         case YAML_MAPPING_START_EVENT:\n      tag = cur->data.mapping_start.tag;\n      \
         break;\n    case YAML_SEQUENCE_START_EVENT:\n      \
         tag = cur->data.sequence_start.tag;\n      break;\n    default:\n      \
         loader->error_info.type = YAML_LOADER_ERROR_STRUCTURAL;\n      \
         loader->error_info.event = *cur;\n      \
         loader->error_info.expected_event_type = YAML_SCALAR_EVENT;\n      \
         return false;\n  }}\n  if (tag == NULL || tag[0] != '!' || tag[1] == '\\0') {{\n{tag_error}    \
         return false;\n  }}\n  bool res = {converter}((const char*)(tag + 1), &value->{discriminant});\n  \
         if (!res) {{\n{tag_error}    return false;\n  }}\n  bool ret = false;\n  \
         switch(value->{discriminant}) {{\n",
        enum_descriptor.spelling,
        tag_error = tag_error_block(),
        converter = converter,
        discriminant = discriminant,
    )?;

    // variant arms, pairing union fields with enum constants in order
    let union_decl = generator.header.record(union_id);
    let mut variant_destructors: Vec<Option<String>> = vec![None; constants.len()];
    let mut variant = 0usize;
    for field in &union_decl.fields {
        if variant == constants.len() {
            return Err(Error::Structure {
                message: "More union items than enum values!".to_string(),
                range: field.range,
            });
        }
        let descriptor = match describe_field(field, resolver, registry)? {
            FieldOutcome::Ignored => continue,
            FieldOutcome::Added(descriptor) => descriptor,
        };
        let Some(name) = &field.name else {
            return Err(Error::Structure {
                message: "expected field name".to_string(),
                range: field.range,
            });
        };
        let loader = field_deserialization(name, &descriptor, "cur");
        write!(
            out,
            "    case {}:\n      {}      break;\n",
            constants[variant].name, loader
        )?;
        variant_destructors[variant] =
            destructor_call(&descriptor, &format!("value->{name}"), false);
        variant += 1;
    }

    // variants without payload require an empty scalar
    let has_empty_variants = variant < constants.len();
    for constant in &constants[variant..] {
        writeln!(out, "    case {}:", constant.name)?;
    }
    if has_empty_variants {
        write!(
            out,
            "      if (cur->type != YAML_SCALAR_EVENT ||\n          \
             (cur->data.scalar.value[0] != '\\0')) {{\n  {tag_error}      \
             }} else ret = true;\n      break;\n",
            tag_error = tag_error_block(),
        )?;
    }
    write!(out, "  }}\n  return ret;\n}}\n")?;

    // destructor switches on the discriminant
    write!(
        out,
        "\n{} {{\n  switch(value->{discriminant}) {{\n",
        destructor_decl(desc)
    )?;
    for (constant, destructor) in constants.iter().zip(&variant_destructors) {
        match destructor {
            Some(call) => write!(
                out,
                "    case {}:\n      {}\n      break;\n",
                constant.name, call
            )?,
            None => writeln!(out, "    case {}: break;", constant.name)?,
        }
    }
    write!(out, "  }}\n}}\n")?;
    Ok(())
}

/// The block reporting a missing/invalid tag, with `typename` in scope.
fn tag_error_block() -> &'static str {
    "    loader->error_info.expected = malloc(sizeof(typename));\n    \
     if (loader->error_info.expected == NULL) {\n      \
     loader->error_info.type = YAML_LOADER_ERROR_OUT_OF_MEMORY;\n      \
     yaml_event_delete(cur);\n    } else {\n      \
     loader->error_info.type = YAML_LOADER_ERROR_TAG;\n      \
     memcpy(loader->error_info.expected, typename, sizeof(typename));\n      \
     loader->error_info.event = *cur;\n    }\n"
}
