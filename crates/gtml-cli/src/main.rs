use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gtml_cli::BuildConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gtml")]
#[command(about = "GTML: compile HTML templates to Go functions")]
#[command(version)]
struct Cli {
    /// Log debug output (overridden by GTML_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile every .html file under a directory into one Go file
    Build {
        /// Directory searched recursively for .html templates
        input_dir: PathBuf,
        /// Go file to write
        output_file: PathBuf,
        /// Package clause of the generated file
        package_name: String,
        /// Rebuild whenever a template changes
        #[arg(long)]
        watch: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Build {
            input_dir,
            output_file,
            package_name,
            watch,
        } => cmd_build(BuildConfig {
            input_dir,
            output_file,
            package_name,
            watch,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("GTML_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_build(config: BuildConfig) -> anyhow::Result<()> {
    config.validate()?;
    if config.watch {
        return gtml_cli::watch(&config);
    }
    let report = gtml_cli::build(&config)?;
    eprintln!(
        "Built: {} ({} components from {} files)",
        report.output.display(),
        report.components,
        report.files
    );
    Ok(())
}
