//! Symbol-name formation for generated functions
//!
//! Every registered type gets deterministic public symbols derived from its
//! spelling: the namespace space in elaborated spellings (`struct foo`)
//! becomes an underscore, so the constructor of `struct foo` is
//! `yaml_construct_struct_foo`.

use smol_str::SmolStr;

use crate::registry::{DeclRef, TypeRegistry};

pub const LOADER_PREFIX: &str = "yaml_load_";
pub const DEALLOCATOR_PREFIX: &str = "yaml_free_";
pub const CONSTRUCTOR_PREFIX: &str = "yaml_construct_";
pub const CONVERTER_PREFIX: &str = "convert_to_";
pub const DESTRUCTOR_PREFIX: &str = "yaml_delete_";

/// Spelling with namespace whitespace flattened: `struct foo` → `struct_foo`
pub fn type_symbol(spelling: &str) -> String {
    spelling.replace(' ', "_")
}

/// Assign constructor/destructor/converter names to every non-predefined
/// entry. Runs after discovery so that re-spelled aliases are picked up,
/// and before custom-symbol verification which compares against these
/// names.
pub fn assign_symbols(registry: &mut TypeRegistry) {
    for index in 0..registry.len() {
        let entry = registry.get(index);
        if entry.is_predefined() {
            continue;
        }
        let symbol = type_symbol(&entry.spelling);
        let is_enum = matches!(entry.decl, DeclRef::Enum(_));
        let is_custom = entry.flags.kind == crate::registry::TypeKind::Custom;
        let constructor = Some(SmolStr::new(format!("{CONSTRUCTOR_PREFIX}{symbol}")));
        let destructor = if is_enum {
            None
        } else {
            Some(SmolStr::new(format!("{DESTRUCTOR_PREFIX}{symbol}")))
        };
        let converter = if is_enum && !is_custom {
            Some(SmolStr::new(format!("{CONVERTER_PREFIX}{symbol}")))
        } else {
            None
        };
        let entry = registry.get_mut(index);
        entry.constructor = constructor;
        entry.destructor = destructor;
        entry.converter = converter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elaborated_spellings_flatten_to_underscores() {
        assert_eq!(type_symbol("struct person"), "struct_person");
        assert_eq!(type_symbol("person_list"), "person_list");
    }

    #[test]
    fn enums_get_converters_but_no_destructors() {
        let source = "enum e { A };\nstruct s { int x; };\n";
        let header = crate::frontend::parse(source, &Default::default()).unwrap();
        let mut discovered = crate::discover::discover(&header).unwrap();
        assign_symbols(&mut discovered.registry);
        let registry = &discovered.registry;

        let e = registry.get(registry.lookup("enum e").unwrap());
        assert_eq!(e.constructor.as_deref(), Some("yaml_construct_enum_e"));
        assert_eq!(e.destructor, None);
        assert_eq!(e.converter.as_deref(), Some("convert_to_enum_e"));

        let s = registry.get(registry.lookup("struct s").unwrap());
        assert_eq!(s.constructor.as_deref(), Some("yaml_construct_struct_s"));
        assert_eq!(s.destructor.as_deref(), Some("yaml_delete_struct_s"));
        assert_eq!(s.converter, None);

        let int = registry.get(registry.lookup("int").unwrap());
        assert_eq!(int.constructor.as_deref(), Some("yaml_construct_int"));
    }
}
