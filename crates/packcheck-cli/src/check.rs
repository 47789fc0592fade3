//! # Check Subcommand
//!
//! Runs every stage against the pack and prints the aggregated report:
//!
//! ```text
//! packcheck: pack_root: /path/to/pack
//!
//! Results:
//! - PASS  manifest.verify
//! - FAIL  report.vectors
//!     Report vector validation failures (1): ...
//!
//! Overall: FAIL
//! ```
//!
//! Details are printed for failing stages, and for every stage under `-v`.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use packcheck_core::{RunReport, Verdict};

use crate::runner::Runner;
use crate::PackContext;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Skip manifest verification (hash and size).
    #[arg(long)]
    pub skip_manifest: bool,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Execute the check subcommand. Returns the process exit code.
pub fn run_check(args: &CheckArgs, ctx: &PackContext) -> Result<u8> {
    let runner = Runner::new(&ctx.pack_root, ctx.layout.clone()).skip_manifest(args.skip_manifest);
    let report = match runner.run() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return Ok(Verdict::Misconfig.exit_code());
        }
    };
    let verdict = report.verdict();

    if args.json {
        let doc = json!({
            "pack_root": ctx.pack_root.display().to_string(),
            "results": report.results(),
            "overall": verdict.to_string(),
        });
        let text = serde_json::to_string_pretty(&doc).context("failed to serialize report")?;
        println!("{text}");
    } else {
        println!("packcheck: pack_root: {}", ctx.pack_root.display());
        print!("{}", render_report(&report, ctx.verbose > 0));
    }
    Ok(verdict.exit_code())
}

/// Render the `Results:` block and overall verdict.
pub fn render_report(report: &RunReport, verbose: bool) -> String {
    let mut out = String::from("\nResults:\n");
    for result in report.results() {
        out.push_str(&format!("- {result}\n"));
        if !result.details.is_empty() && (verbose || !result.ok) {
            out.push_str(&format!("    {}\n", result.details));
        }
    }
    out.push_str(&format!("\nOverall: {}\n", report.verdict()));
    out
}
