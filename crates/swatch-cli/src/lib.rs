//! swatch CLI library
//!
//! This module contains the core CLI logic for the swatch token compiler.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, CheckArgs, Command};

use std::fs;

use log::info;

use swatch::{Diagnostic, SwatchError, TokenSetBuilder, config::AppConfig};

/// What a successful check produced.
#[derive(Debug)]
pub struct Outcome {
    /// Number of tokens in the compiled set
    pub tokens: usize,
    /// Warnings and notices to show the user
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the swatch CLI application
///
/// # Errors
///
/// Returns `SwatchError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Token compilation errors
pub async fn run(args: &Args) -> Result<Outcome, SwatchError> {
    let app_config = config::load_config(args.config.as_ref())?;

    match &args.command {
        Command::Check(check) => run_check(check, app_config).await,
    }
}

async fn run_check(check: &CheckArgs, app_config: AppConfig) -> Result<Outcome, SwatchError> {
    info!(inputs = check.inputs.len(); "Checking token files");

    let app_config = if check.continue_on_error {
        let parser = swatch::config::ParserConfig::new(true, app_config.parser().skip_lint());
        AppConfig::new(parser, app_config.lint().clone())
    } else {
        app_config
    };

    let builder = TokenSetBuilder::new(app_config);
    #[cfg(feature = "yaml")]
    let builder = builder.with_grammar(std::sync::Arc::new(swatch_parser::YamlGrammar));

    let result = builder.parse_files(check.inputs.as_slice()).await?;

    if let Some(output) = &check.output {
        let document = result.tokens.to_document();
        let json = serde_json::to_string_pretty(&document)
            .map_err(|err| SwatchError::Io(err.into()))?;
        fs::write(output, json)?;
        info!(output_file = output.display().to_string(); "Normalized tokens written");
    }

    Ok(Outcome {
        tokens: result.tokens.len(),
        diagnostics: result.diagnostics,
    })
}
