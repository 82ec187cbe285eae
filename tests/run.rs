//! Whole-run tests: input file in, two output files out

use std::fs;
use std::path::PathBuf;

use yamlgen::config::Config;
use yamlgen::errors::Error;
use yamlgen::frontend::ParseOptions;

fn config_for(dir: &std::path::Path, input: PathBuf, root: &str) -> Config {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{stem}_loading");
    Config {
        root_name: root.to_string(),
        parse_options: ParseOptions::default(),
        input_file_name: input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        input_path: input,
        output_header_path: dir.join(format!("{base}.h")),
        output_impl_path: dir.join(format!("{base}.c")),
        output_header_name: format!("{base}.h"),
    }
}

#[test]
fn run_writes_header_and_implementation() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("config.h");
    fs::write(&input, "struct root {\n  int retries;\n  //!string\n  char* path;\n};\n").unwrap();

    let config = config_for(dir.path(), input, "struct root");
    yamlgen::run(&config).unwrap_or_else(|f| panic!("run failed: {}", f.error));

    let header = fs::read_to_string(dir.path().join("config_loading.h")).unwrap();
    let implementation = fs::read_to_string(dir.path().join("config_loading.c")).unwrap();
    assert!(header.contains("#include <config.h>"));
    assert!(header.contains("bool yaml_load_struct_root(struct root *value, yaml_loader_t *loader);"));
    assert!(implementation.contains("#include \"config_loading.h\""));
    assert!(implementation.contains("ret = yaml_construct_string(&value->path, loader, &event);"));
}

#[test]
fn run_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path(), dir.path().join("nope.h"), "struct root");
    let failure = yamlgen::run(&config).unwrap_err();
    assert!(matches!(failure.error, Error::Input { .. }));
    assert!(failure.source.is_none());
}

#[test]
fn run_reports_unwritable_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("types.h");
    fs::write(&input, "struct root { int a; };\n").unwrap();

    let mut config = config_for(dir.path(), input, "struct root");
    let missing = dir.path().join("no_such_dir");
    config.output_header_path = missing.join("types_loading.h");
    config.output_impl_path = missing.join("types_loading.c");

    let failure = yamlgen::run(&config).unwrap_err();
    assert!(matches!(failure.error, Error::OutputFile { .. }));
}

#[test]
fn analysis_errors_carry_the_source_for_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.h");
    fs::write(&input, "struct root {\n  //!wibble\n  int a;\n};\n").unwrap();

    let config = config_for(dir.path(), input.clone(), "struct root");
    let failure = yamlgen::run(&config).unwrap_err();
    let source = failure.source.expect("annotation errors are located");
    let line_index = yamlgen::base::LineIndex::new(&source);
    let rendered = failure.error.render(&input, &line_index);
    assert!(rendered.contains("bad.h:2:3:"));
    assert!(rendered.contains("unknown annotation: \"wibble\""));
}
