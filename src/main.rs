//! # hooks-build CLI Entry Point
//!
//! Parses CLI arguments using clap and routes commands to the handlers in
//! [`hooks_build::commands`].
//!
//! ## Commands
//! - `compile-c <in_path> [out_dir]` - build a `.c` file or a directory of them
//! - `info` - show the resolved compile host and scan settings

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hooks_build::commands;
use hooks_build::commands::compile::CompileArgs;

#[derive(Parser)]
#[command(name = "hooks-build")]
#[command(about = "Build C hooks to WebAssembly with a remote compile service", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Compile service base URL (overrides HOOKS_COMPILE_HOST and hooks.toml)
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a C file, or every C file under a directory
    CompileC {
        /// Source file or directory
        in_path: String,
        /// Output directory for .wasm artifacts and .log files
        #[arg(default_value = "build")]
        out_dir: String,
        /// Directory of header files sent with every unit
        #[arg(long)]
        headers: Option<String>,
        /// Show each request as it is sent
        #[arg(short, long)]
        verbose: bool,
    },
    /// Show the configuration a build would use
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let project_dir = std::env::current_dir().context("Failed to read current directory")?;

    match &cli.command {
        Commands::CompileC {
            in_path,
            out_dir,
            headers,
            verbose,
        } => {
            let args = CompileArgs {
                in_path,
                out_dir,
                headers: headers.as_deref(),
                host: cli.host.as_deref(),
                verbose: *verbose,
            };
            commands::compile::compile_c(&args, &project_dir)
        }
        Commands::Info => commands::info::run_info(&project_dir, cli.host.as_deref()),
    }
}
