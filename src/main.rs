//! yamlgen binary: parse the input header, run discovery, and write the
//! generated loader header and implementation.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use yamlgen::base::LineIndex;
use yamlgen::config::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.into_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };
    match yamlgen::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            let line_index = LineIndex::new(failure.source.as_deref().unwrap_or(""));
            eprintln!(
                "{}",
                failure.error.render(&config.input_path, &line_index)
            );
            ExitCode::FAILURE
        }
    }
}
