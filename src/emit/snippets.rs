//! Shared code-snippet rendering
//!
//! Small pure functions that render the recurring fragments of generated
//! C: function heads, per-field loader calls (including allocation for
//! pointer flavors), destructor calls honoring the ownership discipline,
//! and default assignments.

use std::fmt::Write as _;

use smol_str::SmolStr;

use crate::registry::{DefaultKind, PtrKind, TypeDescriptor};

/// Payload of a record's field-dispatch DFA: everything emission needs to
/// know about one loadable field.
pub struct FieldSlot {
    /// YAML key spelling (used in the `names[]` error table)
    pub name: SmolStr,
    /// Code loading the field's value from the current event
    pub loader: String,
    /// Code releasing the field's value; not every field has any
    pub destructor: Option<String>,
    /// Assignments applied up-front when the key may be absent
    pub defaults: Vec<String>,
}

/// `bool yaml_construct_X(T *const value, ...)`
pub fn constructor_decl(desc: &TypeDescriptor) -> String {
    format!(
        "bool {}({} *const value, yaml_loader_t *const loader, yaml_event_t *cur)",
        desc.constructor.as_deref().expect("symbols are assigned before emission"),
        desc.spelling
    )
}

/// `void yaml_delete_X(T *const value)`
pub fn destructor_decl(desc: &TypeDescriptor) -> String {
    format!(
        "void {}({} *const value)",
        desc.destructor.as_deref().expect("destructor presence checked by caller"),
        desc.spelling
    )
}

/// `static bool convert_to_X(const char *const value, T *const result)`
pub fn converter_decl(desc: &TypeDescriptor) -> String {
    format!(
        "static bool {}(const char *const value, {} *const result)",
        desc.converter.as_deref().expect("enums have converters assigned"),
        desc.spelling
    )
}

/// Render a call to a constructor deserializing into `value-><field>`.
fn deserialization(constructor: &str, field: &str, event_ref: &str, is_pointer: bool) -> String {
    let amp = if is_pointer { "" } else { "&" };
    format!("ret = {constructor}({amp}value->{field}, loader, {event_ref});\n")
}

/// Render the loader snippet for one field, including allocation when the
/// field is a pointer flavor.
pub fn field_deserialization(name: &str, desc: &TypeDescriptor, event_ref: &str) -> String {
    match desc.flags.pointer {
        PtrKind::String | PtrKind::OptionalString => {
            deserialization("yaml_construct_string", name, event_ref, false)
        }
        PtrKind::ObjectPointer | PtrKind::OptionalValue => {
            let constructor = desc
                .constructor
                .as_deref()
                .expect("pointee types resolve through the registry");
            let inner = deserialization(constructor, name, event_ref, true);
            format!(
                "value->{name} = malloc(sizeof({spelling}));\n          {inner}          if (!ret) free(value->{name});\n",
                spelling = desc.spelling
            )
        }
        PtrKind::None => {
            let constructor = desc
                .constructor
                .as_deref()
                .expect("value types resolve through the registry");
            deserialization(constructor, name, event_ref, false)
        }
    }
}

/// Render the destructor call for a value of the described type, or `None`
/// when nothing needs releasing. `subject` is the expression referencing
/// the value; `is_ref` marks subjects that are already pointers.
pub fn destructor_call(desc: &TypeDescriptor, subject: &str, is_ref: bool) -> Option<String> {
    let pointer = desc.flags.pointer.is_pointer();
    if desc.destructor.is_none() && !pointer {
        return None;
    }
    let optional = desc.flags.pointer.is_optional();
    let mut out = String::new();
    if optional {
        let _ = write!(out, "if ({subject} != NULL) {{");
    }
    if let Some(destructor) = &desc.destructor {
        let amp = if pointer || is_ref { "" } else { "&" };
        let _ = write!(out, "{destructor}({amp}{subject});");
    }
    if pointer {
        let _ = write!(out, "free({subject});");
    }
    if optional {
        out.push('}');
    }
    Some(out)
}

/// Render the assignments applied when the field's key may be absent.
///
/// Optional pointers null out; `!default` fields get their zero value;
/// everything else gets nothing and stays required.
pub fn default_assignments(desc: &TypeDescriptor, accessor: &str) -> Vec<String> {
    if desc.flags.pointer.is_optional() {
        return vec![format!("{accessor} = NULL;")];
    }
    match desc.flags.default {
        DefaultKind::None => vec![],
        DefaultKind::Int => vec![format!("{accessor} = 0;")],
        DefaultKind::Float => vec![format!("{accessor} = 0.0;")],
        DefaultKind::Bool => vec![format!("{accessor} = false;")],
        DefaultKind::Enum => vec![format!("{accessor} = ({})0;", desc.spelling)],
        DefaultKind::List => vec![
            format!("{accessor}.data = NULL;"),
            format!("{accessor}.capacity = 0;"),
            format!("{accessor}.count = 0;"),
        ],
    }
}

/// Render the dense control table for a field or representation DFA.
pub fn control_table<P>(dfa: &crate::dfa::NameDfa<P>) -> String {
    let Some((min, max)) = dfa.alphabet() else {
        return String::new();
    };
    let width = max as usize - min as usize + 3;
    let rows = dfa.emit_table();
    let mut out = String::new();
    let _ = writeln!(out, "  static const uint16_t table[][{width}] = {{");
    for (i, row) in rows.iter().enumerate() {
        let cells = row
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let trailer = if i + 1 < rows.len() { "," } else { "" };
        let _ = writeln!(out, "      {{{cells}}}{trailer}");
    }
    let _ = writeln!(out, "  }};");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DeclRef, TypeFlags, TypeKind};

    fn descriptor(pointer: PtrKind, default: DefaultKind) -> TypeDescriptor {
        TypeDescriptor {
            spelling: SmolStr::new("struct person"),
            decl: DeclRef::None,
            flags: TypeFlags {
                kind: TypeKind::Record,
                pointer,
                default,
            },
            constructor: Some(SmolStr::new("yaml_construct_struct_person")),
            destructor: Some(SmolStr::new("yaml_delete_struct_person")),
            converter: None,
            range: None,
        }
    }

    #[test]
    fn value_fields_deserialize_by_address() {
        let desc = descriptor(PtrKind::None, DefaultKind::None);
        assert_eq!(
            field_deserialization("friend", &desc, "&event"),
            "ret = yaml_construct_struct_person(&value->friend, loader, &event);\n"
        );
    }

    #[test]
    fn pointer_fields_allocate_and_roll_back() {
        let desc = descriptor(PtrKind::ObjectPointer, DefaultKind::None);
        let snippet = field_deserialization("friend", &desc, "&event");
        assert!(snippet.starts_with("value->friend = malloc(sizeof(struct person));\n"));
        assert!(snippet
            .contains("ret = yaml_construct_struct_person(value->friend, loader, &event);\n"));
        assert!(snippet.contains("if (!ret) free(value->friend);"));
    }

    #[test]
    fn string_fields_use_the_runtime_constructor() {
        let mut desc = descriptor(PtrKind::String, DefaultKind::None);
        desc.constructor = None;
        desc.destructor = None;
        assert_eq!(
            field_deserialization("name", &desc, "cur"),
            "ret = yaml_construct_string(&value->name, loader, cur);\n"
        );
    }

    #[test]
    fn destructor_calls_follow_ownership() {
        let value = descriptor(PtrKind::None, DefaultKind::None);
        assert_eq!(
            destructor_call(&value, "value->p", false).unwrap(),
            "yaml_delete_struct_person(&value->p);"
        );

        let object = descriptor(PtrKind::ObjectPointer, DefaultKind::None);
        assert_eq!(
            destructor_call(&object, "value->p", false).unwrap(),
            "yaml_delete_struct_person(value->p);free(value->p);"
        );

        let optional = descriptor(PtrKind::OptionalValue, DefaultKind::None);
        assert_eq!(
            destructor_call(&optional, "value->p", false).unwrap(),
            "if (value->p != NULL) {yaml_delete_struct_person(value->p);free(value->p);}"
        );

        let mut string = descriptor(PtrKind::String, DefaultKind::None);
        string.destructor = None;
        assert_eq!(
            destructor_call(&string, "value->s", false).unwrap(),
            "free(value->s);"
        );

        let mut plain_int = descriptor(PtrKind::None, DefaultKind::None);
        plain_int.destructor = None;
        assert_eq!(destructor_call(&plain_int, "value->i", false), None);
    }

    #[test]
    fn default_assignments_match_kinds() {
        let optional = descriptor(PtrKind::OptionalValue, DefaultKind::None);
        assert_eq!(
            default_assignments(&optional, "value->p"),
            vec!["value->p = NULL;"]
        );

        let mut with_enum = descriptor(PtrKind::None, DefaultKind::Enum);
        with_enum.spelling = SmolStr::new("enum gender_t");
        assert_eq!(
            default_assignments(&with_enum, "value->g"),
            vec!["value->g = (enum gender_t)0;"]
        );

        let list = descriptor(PtrKind::None, DefaultKind::List);
        assert_eq!(
            default_assignments(&list, "value->xs"),
            vec![
                "value->xs.data = NULL;",
                "value->xs.capacity = 0;",
                "value->xs.count = 0;"
            ]
        );
    }

    #[test]
    fn control_table_renders_dense_rows() {
        let mut dfa = crate::dfa::NameDfa::new();
        dfa.insert("b", 7).unwrap();
        let rendered = control_table(&dfa);
        assert!(rendered.starts_with("  static const uint16_t table[][3] = {\n"));
        assert!(rendered.contains("{65535, 1, 65535}"));
        assert!(rendered.trim_end().ends_with("};"));
    }
}
