//! Render command - Mount a template against JSON state and print the result

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use sinopia_atelier_dom::DomCompilerOptions;
use sinopia_canvas::{mount, MountOptions, Value};

use super::CompilerArgs;
use crate::config::load_config_or_default;
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template file to render
    pub template: PathBuf,

    /// JSON file holding the state (default: {})
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Print HTML instead of the VNode tree
    #[arg(long)]
    pub html: bool,

    #[command(flatten)]
    pub compiler: CompilerArgs,
}

pub fn run(args: RenderArgs) -> Result<(), CliError> {
    let config = load_config_or_default(None);
    let options = args.compiler.apply(config.compiler)?;
    let output = render_file(&args.template, args.data.as_deref(), &options, args.html)?;
    println!("{}", output);
    Ok(())
}

/// Render `template` once against the JSON in `data`.
pub fn render_file(
    template: &Path,
    data: Option<&Path>,
    options: &DomCompilerOptions,
    html: bool,
) -> Result<String, CliError> {
    let source = fs::read_to_string(template).map_err(|source| CliError::Read {
        path: template.to_path_buf(),
        source,
    })?;
    let state = match data {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            serde_json::from_str(&json).map_err(|source| CliError::Data {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => serde_json::json!({}),
    };

    let mounted = mount(
        source.trim(),
        Value::from_json(&state),
        MountOptions {
            compiler: options.clone(),
            ..MountOptions::default()
        },
    );
    let output = if html {
        mounted.html()
    } else {
        serde_json::to_string_pretty(&mounted.vnode().to_json()).unwrap_or_default()
    };
    mounted.destroy();
    Ok(output)
}
