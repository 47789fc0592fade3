//! # packcheck CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.
//! With no subcommand, `check` runs with the top-level flags.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use packcheck_cli::check::{run_check, CheckArgs};
use packcheck_cli::manifest::{run_manifest, ManifestArgs};
use packcheck_cli::render_inputs::{run_render_inputs, RenderInputsArgs};
use packcheck_cli::PackContext;
use packcheck_core::Verdict;

/// packcheck: consistency checks for document packs.
///
/// Verifies file fingerprints against the pack manifest, validates schemas
/// and report test vectors, and resolves preset bindings against the
/// pack's libraries.
#[derive(Parser, Debug)]
#[command(name = "packcheck", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Root of the pack to check.
    #[arg(long, global = true, default_value = ".")]
    pack_root: PathBuf,

    /// Pack layout configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    check: CheckArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every check and print the aggregated report (the default).
    Check(CheckArgs),

    /// Generate or verify the pack manifest.
    Manifest(ManifestArgs),

    /// Check a render-input payload covers a document schema's placeholders.
    RenderInputs(RenderInputsArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!(pack_root = %cli.pack_root.display(), "packcheck starting");

    let ctx = match PackContext::new(cli.pack_root, cli.config.as_deref(), cli.verbose) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::from(Verdict::Misconfig.exit_code());
        }
    };

    let result = match cli.command {
        None => run_check(&cli.check, &ctx),
        Some(Commands::Check(args)) => run_check(&args, &ctx),
        Some(Commands::Manifest(args)) => run_manifest(&args, &ctx),
        Some(Commands::RenderInputs(args)) => run_render_inputs(&args, &ctx),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(Verdict::Misconfig.exit_code())
        }
    }
}
