//! Build command - Compile template files to render functions

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Args, ValueEnum};
use ignore::Walk;
use rayon::prelude::*;
use serde::Serialize;
use sinopia_atelier_dom::{compile_template_with_options, DomCompilerOptions};

use super::CompilerArgs;
use crate::config::load_config_or_default;
use crate::error::CliError;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Output an ES module exporting `render` and `staticRenderFns`
    #[default]
    Js,
    /// Output JSON with code and tips
    Json,
    /// Only show statistics (no output)
    Stats,
}

#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Glob pattern(s), directories or files (default: ./**/*.html)
    #[arg(default_value = "./**/*.html")]
    pub patterns: Vec<String>,

    /// Output directory (default: build.outDir from the config, or ./dist)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "js")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub compiler: CompilerArgs,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Show timing profile breakdown
    #[arg(long)]
    pub profile: bool,

    /// Write the files that compiled even when others failed
    #[arg(long)]
    pub continue_on_error: bool,
}

/// One compiled template.
#[derive(Debug, Serialize)]
pub struct BuildOutput {
    pub filename: String,
    /// xxHash3 of the template source, for cache busting.
    pub hash: String,
    pub render: String,
    pub static_render_fns: Vec<String>,
    pub tips: Vec<String>,
}

impl BuildOutput {
    /// The ES module form of the render functions.
    pub fn to_module(&self) -> String {
        let mut out = String::new();
        out.push_str("export function render() {\n  ");
        out.push_str(&self.render);
        out.push_str("\n}\n\nexport const staticRenderFns = [");
        for code in &self.static_render_fns {
            out.push_str("\n  function () { ");
            out.push_str(code);
            out.push_str(" },");
        }
        if !self.static_render_fns.is_empty() {
            out.push('\n');
        }
        out.push_str("];\n");
        out
    }
}

pub fn run(args: BuildArgs) -> Result<(), CliError> {
    let start = Instant::now();
    let config = load_config_or_default(None);
    let options = args.compiler.apply(config.compiler)?;
    let output_dir = args
        .output
        .or(config.build.out_dir.clone())
        .unwrap_or_else(|| PathBuf::from("./dist"));

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let files = collect_files(&args.patterns, &config.build.extensions());
    if files.is_empty() {
        return Err(CliError::NoFiles(args.patterns));
    }
    let collect_elapsed = start.elapsed();

    if args.profile {
        eprintln!(
            "Found {} files in {:.4}s. Compiling using {} threads...",
            files.len(),
            collect_elapsed.as_secs_f64(),
            rayon::current_num_threads()
        );
    }

    let failed = AtomicUsize::new(0);
    let compile_start = Instant::now();
    let results: Vec<_> = files
        .par_iter()
        .filter_map(|path| match compile_file(path, &options) {
            Ok(output) => {
                for tip in &output.tips {
                    eprintln!("  {} tip: {}", path.display(), tip);
                }
                Some((path.clone(), output))
            }
            Err(e) => {
                failed.fetch_add(1, Ordering::Relaxed);
                eprintln!("{}", e);
                None
            }
        })
        .collect();
    let compile_elapsed = compile_start.elapsed();
    let failed = failed.into_inner();
    let success = results.len();

    let io_start = Instant::now();
    if failed == 0 || args.continue_on_error {
        write_outputs(&output_dir, args.format, results)?;
    }
    let io_elapsed = io_start.elapsed();
    let total_elapsed = start.elapsed();

    if args.profile {
        eprintln!();
        eprintln!("Timing breakdown:");
        eprintln!("  File collection: {:.4}s", collect_elapsed.as_secs_f64());
        eprintln!("  Compilation:     {:.4}s", compile_elapsed.as_secs_f64());
        eprintln!("  I/O operations:  {:.4}s", io_elapsed.as_secs_f64());
        eprintln!("  Total:           {:.4}s", total_elapsed.as_secs_f64());
        eprintln!();
    }

    if failed > 0 {
        eprintln!(
            "✗ {} file(s) failed, {} compiled in {:.4}s",
            failed,
            success,
            total_elapsed.as_secs_f64()
        );
        return Err(CliError::Failed { failed });
    }
    let file_word = if success == 1 { "file" } else { "files" };
    eprintln!(
        "✓ {} {} compiled in {:.4}s",
        success,
        file_word,
        total_elapsed.as_secs_f64()
    );
    Ok(())
}

fn write_outputs(
    output_dir: &Path,
    format: OutputFormat,
    results: Vec<(PathBuf, BuildOutput)>,
) -> Result<(), CliError> {
    let ext = match format {
        OutputFormat::Stats => return Ok(()),
        OutputFormat::Js => "js",
        OutputFormat::Json => "json",
    };
    fs::create_dir_all(output_dir).map_err(|source| CliError::Write {
        path: output_dir.to_path_buf(),
        source,
    })?;

    for (path, output) in results {
        let filename = path
            .file_name()
            .map(|f| PathBuf::from(f).with_extension(ext))
            .unwrap_or_else(|| PathBuf::from("output").with_extension(ext));
        let out_path = output_dir.join(filename);
        let content = match format {
            OutputFormat::Json => serde_json::to_string_pretty(&output).unwrap_or_default(),
            _ => output.to_module(),
        };
        fs::write(&out_path, content).map_err(|source| CliError::Write {
            path: out_path.clone(),
            source,
        })?;
        tracing::debug!(path = %out_path.display(), "wrote render module");
    }
    Ok(())
}

/// Compile one template file. Template errors fail the file; tips don't.
pub fn compile_file(path: &Path, options: &DomCompilerOptions) -> Result<BuildOutput, CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let result = compile_template_with_options(source.trim(), options.clone());
    if !result.errors.is_empty() {
        return Err(CliError::Compile {
            path: path.to_path_buf(),
            errors: result.errors.iter().map(|e| format!("- {}", e.msg)).collect(),
        });
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("anonymous.html")
        .to_string();
    Ok(BuildOutput {
        filename,
        hash: sinopia_carton::content_hash(&source),
        render: result.render.to_string(),
        static_render_fns: result.static_render_fns.iter().map(|f| f.to_string()).collect(),
        tips: result.tips.iter().map(|t| t.msg.to_string()).collect(),
    })
}

/// Expand patterns into the template files they name, sorted and deduplicated.
pub fn collect_files(patterns: &[String], extensions: &[String]) -> Vec<PathBuf> {
    let has_extension = |path: &Path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e == ext))
    };
    let mut files = Vec::new();

    for pattern in patterns {
        let (root, matcher) = parse_pattern(pattern);
        if root.is_file() {
            files.push(root);
            continue;
        }
        for entry in Walk::new(&root).flatten() {
            let path = entry.path();
            if !path.is_file() || !has_extension(path) {
                continue;
            }
            let matched = match &matcher {
                Some(matcher) => matcher.matches_path(&normalize(path)),
                None => true,
            };
            if matched {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Split a pattern into the directory to walk and the glob paths must match.
fn parse_pattern(pattern: &str) -> (PathBuf, Option<glob::Pattern>) {
    if let Some(pos) = pattern.find(['*', '?', '[']) {
        let root = match pattern[..pos].rfind('/') {
            Some(0) => "/",
            Some(last_slash) => &pattern[..last_slash],
            None => ".",
        };
        let matcher = glob::Pattern::new(&normalize(Path::new(pattern)).to_string_lossy()).ok();
        return (PathBuf::from(root), matcher);
    }
    (PathBuf::from(pattern), None)
}

fn normalize(path: &Path) -> PathBuf {
    let path = path.to_string_lossy().replace('\\', "/");
    PathBuf::from(path.strip_prefix("./").unwrap_or(&path))
}
