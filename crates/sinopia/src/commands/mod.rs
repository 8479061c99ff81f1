//! CLI commands.

pub mod build;
pub mod render;

use clap::{Args, ValueEnum};
use sinopia_atelier_dom::DomCompilerOptions;
use sinopia_relief::WhitespaceStrategy;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Whitespace {
    /// Drop whitespace-only text with line breaks, collapse the rest
    Condense,
    /// Keep whitespace-only text as a single space
    Preserve,
}

impl From<Whitespace> for WhitespaceStrategy {
    fn from(value: Whitespace) -> Self {
        match value {
            Whitespace::Condense => WhitespaceStrategy::Condense,
            Whitespace::Preserve => WhitespaceStrategy::Preserve,
        }
    }
}

/// Compiler flags shared by every command. Each one given overrides
/// `sinopia.config.json`.
#[derive(Args, Debug, Clone, Default)]
pub struct CompilerArgs {
    /// Interpolation delimiters as "open,close" (e.g. "[[,]]")
    #[arg(long)]
    pub delimiters: Option<String>,

    /// Whitespace handling
    #[arg(long, value_enum)]
    pub whitespace: Option<Whitespace>,

    /// Keep HTML comments in the output
    #[arg(long)]
    pub comments: bool,

    /// Disable static subtree hoisting
    #[arg(long)]
    pub no_optimize: bool,
}

impl CompilerArgs {
    pub fn apply(&self, mut options: DomCompilerOptions) -> Result<DomCompilerOptions, CliError> {
        if let Some(delimiters) = &self.delimiters {
            options.delimiters = Some(parse_delimiters(delimiters)?);
        }
        if let Some(whitespace) = self.whitespace {
            options.whitespace = Some(whitespace.into());
        }
        if self.comments {
            options.comments = true;
        }
        if self.no_optimize {
            options.optimize = false;
        }
        Ok(options)
    }
}

fn parse_delimiters(
    value: &str,
) -> Result<(sinopia_carton::String, sinopia_carton::String), CliError> {
    match value.split_once(',') {
        Some((open, close)) if !open.is_empty() && !close.is_empty() => {
            Ok((open.into(), close.into()))
        }
        _ => Err(CliError::Delimiters(value.to_string())),
    }
}
