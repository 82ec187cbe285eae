//! Command-line configuration
//!
//! The binary surface: one input header, an output directory, the root
//! type name, the output base name, and pass-through options for the
//! front-end (always prefixed with the C11 dialect selector).

use std::path::{Path, PathBuf};

use clap::Parser;
use smol_str::SmolStr;

use crate::errors::Error;
use crate::frontend::ParseOptions;

/// Generate C loaders and deallocators that construct the types declared
/// in an annotated header from YAML documents.
#[derive(Debug, Parser)]
#[command(name = "yamlgen")]
pub struct Cli {
    /// Input header file
    pub input: PathBuf,

    /// Directory the output files are written to
    #[arg(short = 'o', value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Name of the root type
    #[arg(short = 'r', value_name = "NAME", default_value = "struct root")]
    pub root: String,

    /// Base name of the output files (`NAME.h` / `NAME.c`);
    /// defaults to the input file name stem with `_loading` appended
    #[arg(short = 'n', value_name = "NAME")]
    pub name: Option<String>,

    /// Arguments after `--` are forwarded to the front-end as parse
    /// options (e.g. `-DNAME=VALUE`)
    #[arg(last = true, value_name = "PARSE_OPTION")]
    pub parser_args: Vec<String>,
}

/// Resolved configuration the pipeline runs with
#[derive(Debug, Clone)]
pub struct Config {
    /// Spelling of the root type, e.g. `struct root`
    pub root_name: String,
    /// Front-end options (dialect always C11)
    pub parse_options: ParseOptions,
    /// Path of the input header
    pub input_path: PathBuf,
    /// Basename of the input header, included by the generated header
    pub input_file_name: String,
    /// `DIR/BASE.h`
    pub output_header_path: PathBuf,
    /// `DIR/BASE.c`
    pub output_impl_path: PathBuf,
    /// `BASE.h`, included by the generated implementation
    pub output_header_name: String,
}

impl Cli {
    /// Resolve defaults and derived paths into a [`Config`].
    pub fn into_config(self) -> Result<Config, Error> {
        let mut forwarded: Vec<SmolStr> = vec![SmolStr::new("-std=c11")];
        forwarded.extend(self.parser_args.iter().map(SmolStr::new));
        let parse_options = ParseOptions::from_args(&forwarded)?;

        let base = match self.name {
            Some(name) => name,
            None => {
                let stem = self
                    .input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                format!("{stem}_loading")
            }
        };
        let output_header_name = format!("{base}.h");
        let output_header_path = self.output_dir.join(&output_header_name);
        let output_impl_path = self.output_dir.join(format!("{base}.c"));
        let input_file_name = self
            .input
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Config {
            root_name: self.root,
            parse_options,
            input_path: self.input,
            input_file_name,
            output_header_path,
            output_impl_path,
            output_header_name,
        })
    }
}

impl Config {
    /// A configuration for driving [`crate::generate`] directly, without
    /// the binary's path plumbing.
    pub fn in_memory(input_file_name: &str, root_name: &str) -> Self {
        let base = format!(
            "{}_loading",
            Path::new(input_file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        Self {
            root_name: root_name.to_string(),
            parse_options: ParseOptions::default(),
            input_path: PathBuf::from(input_file_name),
            input_file_name: input_file_name.to_string(),
            output_header_path: PathBuf::from(format!("{base}.h")),
            output_impl_path: PathBuf::from(format!("{base}.c")),
            output_header_name: format!("{base}.h"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse_cli(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("yamlgen").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_apply() {
        let config = parse_cli(&["input.h"]).unwrap().into_config().unwrap();
        assert_eq!(config.root_name, "struct root");
        assert_eq!(config.input_file_name, "input.h");
        assert_eq!(config.output_header_name, "input_loading.h");
        assert_eq!(
            config.output_header_path,
            PathBuf::from("./input_loading.h")
        );
        assert_eq!(config.output_impl_path, PathBuf::from("./input_loading.c"));
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse_cli(&["-o", "gen", "-r", "struct cfg", "-n", "cfg_io", "types.h"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.root_name, "struct cfg");
        assert_eq!(config.output_header_path, PathBuf::from("gen/cfg_io.h"));
        assert_eq!(config.output_impl_path, PathBuf::from("gen/cfg_io.c"));
    }

    #[test]
    fn stem_strips_only_the_last_extension() {
        let config = parse_cli(&["dir/types.gen.h"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.output_header_name, "types.gen_loading.h");
    }

    #[test]
    fn duplicate_flags_are_rejected() {
        let err = parse_cli(&["-r", "a", "-r", "b", "input.h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = parse_cli(&["-x", "input.h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn extra_positional_arguments_are_rejected() {
        assert!(parse_cli(&["one.h", "two.h"]).is_err());
    }

    #[test]
    fn missing_input_is_rejected() {
        assert!(parse_cli(&[]).is_err());
    }

    #[test]
    fn trailing_arguments_feed_the_front_end() {
        let config = parse_cli(&["input.h", "--", "-DFOO=1"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.parse_options.defines.len(), 1);
        assert_eq!(config.parse_options.defines[0].0, "FOO");
    }

    #[test]
    fn help_flag_exits_zero() {
        let err = parse_cli(&["-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
