// glbind-cli: command line front end for binding generation.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "glbind", about = "glbind: marshaling Rust bindings for OpenGL-style C APIs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the entry-point table, enums and wrappers from a specification.
    Generate {
        /// Path to glbind.config.toml.
        #[arg(long, default_value = "glbind.config.toml")]
        config: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config } => match glbind_codegen::run_generate(&config) {
            Ok(report) => {
                println!(
                    "{} slots, {} wrappers, {} skipped, {} files",
                    report.slots,
                    report.wrappers,
                    report.skipped.len(),
                    report.files.len()
                );
                for (function, reason) in &report.skipped {
                    println!("  skipped {function}: {reason}");
                }
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!("{err}");
                ExitCode::FAILURE
            }
        },
    }
}
