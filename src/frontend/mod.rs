//! C header front-end
//!
//! The generator consumes headers through this module: a Logos lexer, a
//! recursive-descent parser producing a flat declaration list with attached
//! doc comments, and canonical-type resolution. The supported surface is
//! the declaration subset the generator can map to YAML: struct/union/enum
//! definitions, typedef aliases, one-level pointers, and function
//! prototypes. Preprocessor lines are skipped except for object-like
//! `#define`s, which are applied as single-token substitutions.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod types;

use smol_str::SmolStr;

use crate::errors::Error;

pub use types::{CanonType, Resolver};

/// Options forwarded from the command line to the front-end:
/// the dialect selector and object-like definitions.
#[derive(Debug, Default, Clone)]
pub struct ParseOptions {
    /// `-D NAME[=VALUE]` definitions, applied like `#define` lines
    pub defines: Vec<(SmolStr, Option<SmolStr>)>,
}

impl ParseOptions {
    /// Build options from raw `-std=...` / `-D...` arguments.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, Error> {
        let mut options = ParseOptions::default();
        let mut iter = args.iter().map(|s| s.as_ref());
        while let Some(arg) = iter.next() {
            if let Some(dialect) = arg.strip_prefix("-std=") {
                if dialect != "c11" {
                    return Err(Error::UnsupportedOption {
                        option: arg.to_string(),
                    });
                }
            } else if let Some(rest) = arg.strip_prefix("-D") {
                let definition = if rest.is_empty() {
                    iter.next().ok_or_else(|| Error::UnsupportedOption {
                        option: arg.to_string(),
                    })?
                } else {
                    rest
                };
                match definition.split_once('=') {
                    Some((name, value)) => options
                        .defines
                        .push((SmolStr::new(name), Some(SmolStr::new(value)))),
                    None => options.defines.push((SmolStr::new(definition), None)),
                }
            } else {
                return Err(Error::UnsupportedOption {
                    option: arg.to_string(),
                });
            }
        }
        Ok(options)
    }
}

/// Parse header source into its AST.
pub fn parse(source: &str, options: &ParseOptions) -> Result<ast::Header, Error> {
    parser::parse(source, options)
}
