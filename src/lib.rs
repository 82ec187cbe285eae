//! # yamlgen
//!
//! Code generator that turns an annotated C header into C loaders and
//! deallocators constructing the declared types from YAML documents.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! emit       → C source emission (records, lists, tagged unions, enums, root)
//!   ↓
//! analyze    → per-field classification into field descriptors
//!   ↓
//! discover   → top-level declaration classification, type registry population
//!   ↓
//! registry   → type descriptors, registry keyed by a name DFA
//!   ↓
//! frontend   → Logos lexer, recursive-descent parser for the C header subset
//!   ↓
//! base       → Primitives (TextRange, LineIndex)
//! ```
//!
//! `annotation`, `dfa`, and `symbols` are leaf utilities shared by the
//! passes; `config` carries the command-line surface; `errors` the
//! diagnostics every pass reports through.

/// Foundation types: byte ranges, line/column conversion
pub mod base;

/// Frontend: Logos lexer, recursive-descent parser, canonical types
pub mod frontend;

/// Annotation extraction from doc comments (`//!keyword param`)
pub mod annotation;

/// Octet trie with compressed-alphabet control-table emission
pub mod dfa;

/// Type descriptors and the run-wide type registry
pub mod registry;

/// Discovery pass: classify top-level declarations into the registry
pub mod discover;

/// Field analyzer: classify one record field or union variant slot
pub mod analyze;

/// Loader/deallocator/constructor/destructor/converter symbol formation
pub mod symbols;

/// Emitters for the generated C header and implementation
pub mod emit;

/// Command-line configuration
pub mod config;

/// Error taxonomy and diagnostic rendering
pub mod errors;

pub use config::Config;
pub use errors::Error;

use std::io::Write;

/// Everything the emitters need, produced by the front half of the pipeline.
pub struct Analysis {
    pub header: frontend::ast::Header,
    pub registry: registry::TypeRegistry,
    /// Registry index of the root type.
    pub root: usize,
}

/// Run parsing, discovery and symbol assignment over header source.
///
/// Splitting this from [`generate`] lets tests inspect the registry without
/// emitting anything.
pub fn analyze_header(source: &str, config: &Config) -> Result<Analysis, Error> {
    let header = frontend::parse(source, &config.parse_options)?;
    let mut discovered = discover::discover(&header)?;
    symbols::assign_symbols(&mut discovered.registry);
    discover::verify_custom_symbols(&discovered)?;
    let registry = discovered.registry;
    let root = registry
        .lookup(&config.root_name)
        .ok_or_else(|| Error::UnknownRoot {
            name: config.root_name.clone(),
        })?;
    Ok(Analysis {
        header,
        registry,
        root,
    })
}

/// Run the full pipeline, writing the generated header and implementation
/// to the given sinks.
pub fn generate<H: Write, I: Write>(
    source: &str,
    config: &Config,
    header_out: &mut H,
    impl_out: &mut I,
) -> Result<(), Error> {
    let analysis = analyze_header(source, config)?;
    let generator = emit::Generator::new(&analysis.header, &analysis.registry, analysis.root);
    generator.write_header(header_out, config)?;
    generator.write_implementation(impl_out, config)?;
    Ok(())
}

/// Convenience wrapper returning the generated sources as strings.
pub fn generate_to_strings(source: &str, config: &Config) -> Result<(String, String), Error> {
    let mut header = Vec::new();
    let mut implementation = Vec::new();
    generate(source, config, &mut header, &mut implementation)?;
    // Emission only ever writes UTF-8.
    Ok((
        String::from_utf8(header).expect("generated header is UTF-8"),
        String::from_utf8(implementation).expect("generated implementation is UTF-8"),
    ))
}

/// A pipeline failure plus the input source it refers to, when it was read
/// far enough to have one. The binary uses the source to render
/// `file:line:col` diagnostics.
pub struct RunFailure {
    pub error: Error,
    pub source: Option<String>,
}

/// Run a full generator invocation: read the input header, analyze it, and
/// write both output files.
///
/// The output files are created before emission begins; when emission
/// fails partway, partial output stays on disk and the error return
/// invalidates it.
pub fn run(config: &Config) -> Result<(), RunFailure> {
    use std::fs;
    use std::io::BufWriter;

    let source = fs::read_to_string(&config.input_path).map_err(|e| RunFailure {
        error: Error::Input {
            path: config.input_path.clone(),
            source: e,
        },
        source: None,
    })?;

    let located = |error: Error| RunFailure {
        error,
        source: Some(source.clone()),
    };

    let analysis = analyze_header(&source, config).map_err(&located)?;

    let header_file = fs::File::create(&config.output_header_path).map_err(|e| RunFailure {
        error: Error::OutputFile {
            path: config.output_header_path.clone(),
            source: e,
        },
        source: None,
    })?;
    let impl_file = fs::File::create(&config.output_impl_path).map_err(|e| RunFailure {
        error: Error::OutputFile {
            path: config.output_impl_path.clone(),
            source: e,
        },
        source: None,
    })?;

    let generator = emit::Generator::new(&analysis.header, &analysis.registry, analysis.root);
    let mut header_out = BufWriter::new(header_file);
    let mut impl_out = BufWriter::new(impl_file);
    generator
        .write_header(&mut header_out, config)
        .map_err(&located)?;
    generator
        .write_implementation(&mut impl_out, config)
        .map_err(&located)?;
    Ok(())
}
