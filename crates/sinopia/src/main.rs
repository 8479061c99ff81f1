//! The `sinopia` command-line tool.

use clap::{Parser, Subcommand};
use sinopia::commands;

#[derive(Parser)]
#[command(name = "sinopia")]
#[command(about = "Reactive template compiler and renderer", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile template files to render functions (default command)
    #[command(visible_alias = "atelier")]
    Build(commands::build::BuildArgs),

    /// Render a template against JSON state
    #[command(visible_alias = "canvas")]
    Render(commands::render::RenderArgs),
}

fn main() {
    sinopia::logging::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Build(args)) => commands::build::run(args),
        Some(Commands::Render(args)) => commands::render::run(args),
        None => commands::build::run(commands::build::BuildArgs {
            patterns: vec!["./**/*.html".to_string()],
            ..Default::default()
        }),
    };

    if let Err(e) = result {
        eprintln!("\x1b[31mError:\x1b[0m {}", e);
        std::process::exit(1);
    }
}
