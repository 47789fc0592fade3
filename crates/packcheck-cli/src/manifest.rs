//! # Manifest Subcommand
//!
//! `manifest generate` scans the pack and writes `manifest.yaml`. With
//! `--check` it compares a fresh scan against the existing manifest and
//! reports drift without writing.
//!
//! `manifest verify` verifies the existing manifest and lists every
//! missing, mismatched, and extra path in full.
//!
//! ## Timestamp Resolution
//!
//! `created_at_utc` is taken from, in order: `--created-at`, the
//! `SOURCE_DATE_EPOCH` environment variable, the current UTC time.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use packcheck_core::{DigestAlgorithm, PackError, Timestamp, Verdict};
use packcheck_pack::{verify, verify_pack, FileScanner, Manifest, PackMetadata, VerificationOutcome};

use crate::PackContext;

const DEFAULT_PACK_VERSION: &str = "v1.0.0";

/// Arguments for the `manifest` subcommand.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// The manifest operation to run.
    #[command(subcommand)]
    pub command: ManifestCommand,
}

/// Manifest operations.
#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Generate manifest.yaml from the current pack contents.
    Generate(GenerateArgs),
    /// Verify the pack against manifest.yaml, listing every difference.
    Verify,
}

/// Arguments for `manifest generate`.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Pack name. Defaults to the existing manifest's, else the directory name.
    #[arg(long)]
    pub name: Option<String>,

    /// Pack version. Defaults to the existing manifest's, else v1.0.0.
    #[arg(long)]
    pub pack_version: Option<String>,

    /// Override created_at_utc (ISO-8601 UTC with trailing Z).
    #[arg(long)]
    pub created_at: Option<String>,

    /// Compare with the existing manifest instead of writing.
    #[arg(long)]
    pub check: bool,
}

/// Execute the manifest subcommand. Returns the process exit code.
pub fn run_manifest(args: &ManifestArgs, ctx: &PackContext) -> Result<u8> {
    match &args.command {
        ManifestCommand::Generate(generate) => run_generate(generate, ctx),
        ManifestCommand::Verify => run_verify(ctx),
    }
}

fn run_generate(args: &GenerateArgs, ctx: &PackContext) -> Result<u8> {
    let root = &ctx.pack_root;
    if !root.is_dir() {
        eprintln!("ERROR: pack root not found: {}", root.display());
        return Ok(Verdict::Misconfig.exit_code());
    }
    let manifest_path = root.join(&ctx.layout.manifest_file);
    let existing = if manifest_path.is_file() {
        match Manifest::load(&manifest_path) {
            Ok(m) => Some(m),
            Err(e) if args.check => {
                eprintln!("ERROR: {e}");
                return Ok(Verdict::Misconfig.exit_code());
            }
            Err(e) => {
                tracing::warn!("existing manifest ignored: {e}");
                None
            }
        }
    } else {
        None
    };

    let entries = FileScanner::new(root, &ctx.layout)
        .scan()
        .with_context(|| format!("failed to scan {}", root.display()))?;
    let pack = PackMetadata {
        name: resolve_name(args, existing.as_ref(), root),
        pack_version: args
            .pack_version
            .clone()
            .or_else(|| existing.as_ref().map(|m| m.pack.pack_version.clone()))
            .unwrap_or_else(|| DEFAULT_PACK_VERSION.to_string()),
        created_at_utc: resolve_created_at(args.created_at.as_deref())?,
        hash_algorithm: DigestAlgorithm::Sha256,
        root: ".".to_string(),
    };
    let manifest = Manifest::generate(pack, entries, &ctx.layout.manifest_file);

    if args.check {
        let Some(existing) = existing else {
            println!("FAIL: manifest does not exist: {}", manifest_path.display());
            return Ok(Verdict::Fail.exit_code());
        };
        if existing.same_entries(&manifest) {
            println!("OK: manifest is up to date ({} files)", manifest.files.len());
            return Ok(Verdict::Pass.exit_code());
        }
        println!("FAIL: manifest is out of date");
        print!("{}", render_outcome(&verify(&existing, &manifest.files)));
        return Ok(Verdict::Fail.exit_code());
    }

    manifest
        .write(&manifest_path)
        .with_context(|| format!("failed to write manifest: {}", manifest_path.display()))?;
    println!(
        "OK: wrote {} with {} files",
        manifest_path.display(),
        manifest.files.len()
    );
    Ok(Verdict::Pass.exit_code())
}

fn resolve_name(args: &GenerateArgs, existing: Option<&Manifest>, root: &Path) -> String {
    if let Some(name) = &args.name {
        return name.clone();
    }
    if let Some(m) = existing {
        return m.pack.name.clone();
    }
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .unwrap_or_else(|| "pack".to_string())
}

/// Resolve `created_at_utc`: explicit flag, then `SOURCE_DATE_EPOCH`, then now.
fn resolve_created_at(flag: Option<&str>) -> Result<Timestamp> {
    if let Some(ts) = flag {
        return Timestamp::parse(ts).map_err(|e| anyhow::anyhow!("invalid --created-at: {e}"));
    }
    if let Ok(epoch) = std::env::var("SOURCE_DATE_EPOCH") {
        let secs: i64 = match epoch.trim().parse() {
            Ok(secs) => secs,
            Err(_) => bail!("SOURCE_DATE_EPOCH is not an integer: {epoch:?}"),
        };
        return Timestamp::from_epoch_secs(secs)
            .map_err(|e| anyhow::anyhow!("invalid SOURCE_DATE_EPOCH: {e}"));
    }
    Ok(Timestamp::now())
}

fn run_verify(ctx: &PackContext) -> Result<u8> {
    match verify_pack(&ctx.pack_root, &ctx.layout) {
        Ok(outcome) => {
            print!("{}", render_outcome(&outcome));
            if outcome.is_pass() {
                println!("OK: verified {} files", outcome.checked());
                Ok(Verdict::Pass.exit_code())
            } else {
                println!("FAIL: pack does not match manifest");
                Ok(Verdict::Fail.exit_code())
            }
        }
        Err(PackError::Configuration(e)) => {
            eprintln!("ERROR: {e}");
            Ok(Verdict::Misconfig.exit_code())
        }
        Err(e) => Err(e).context("manifest verification failed"),
    }
}

/// Every difference, untruncated.
pub fn render_outcome(outcome: &VerificationOutcome) -> String {
    let mut out = String::new();
    if !outcome.missing.is_empty() {
        out.push_str(&format!("Missing ({}):\n", outcome.missing.len()));
        for path in &outcome.missing {
            out.push_str(&format!("  - {path}\n"));
        }
    }
    if !outcome.mismatched.is_empty() {
        out.push_str(&format!("Mismatched ({}):\n", outcome.mismatched.len()));
        for mismatch in &outcome.mismatched {
            out.push_str(&format!("  - {mismatch}\n"));
        }
    }
    if !outcome.extra.is_empty() {
        out.push_str(&format!("Extra ({}):\n", outcome.extra.len()));
        for path in &outcome.extra {
            out.push_str(&format!("  - {path}\n"));
        }
    }
    out
}
