//! # Render-Inputs Subcommand
//!
//! Checks that a render-input payload supplies every placeholder a
//! document schema requires. The schema is named explicitly with
//! `--schema`, or derived from a template file name with `--template`
//! (`T4_URS.md` maps to `<document_schema_dir>/T4_URS.schema.json`).
//!
//! With `--full` the payload is also validated against the whole schema.
//!
//! Exit `0` if covered, `1` if any placeholder is missing (or `--full`
//! validation fails), `2` if the schema or data cannot be found or read.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use packcheck_core::{load_document, load_json, Verdict};
use packcheck_schema::{coverage, SchemaEngine, SchemaStore, SchemaValidationError};

use crate::{resolve_path, PackContext};

/// Arguments for the `render-inputs` subcommand.
#[derive(Args, Debug)]
pub struct RenderInputsArgs {
    /// Path to a document schema.
    #[arg(long, conflicts_with = "template", required_unless_present = "template")]
    pub schema: Option<PathBuf>,

    /// Template file name; the schema name is inferred from its stem.
    #[arg(long)]
    pub template: Option<String>,

    /// Path to the render-input payload (JSON or YAML).
    #[arg(long)]
    pub data: PathBuf,

    /// Also validate the payload against the full schema.
    #[arg(long)]
    pub full: bool,
}

/// Execute the render-inputs subcommand. Returns the process exit code.
pub fn run_render_inputs(args: &RenderInputsArgs, ctx: &PackContext) -> Result<u8> {
    let Some(schema_path) = schema_path(args, ctx) else {
        eprintln!("ERROR: provide --schema or --template");
        return Ok(Verdict::Misconfig.exit_code());
    };
    let data_path = resolve_path(&args.data, &ctx.pack_root);

    if !schema_path.is_file() {
        eprintln!("ERROR: schema not found: {}", schema_path.display());
        return Ok(Verdict::Misconfig.exit_code());
    }
    if !data_path.is_file() {
        eprintln!("ERROR: data not found: {}", data_path.display());
        return Ok(Verdict::Misconfig.exit_code());
    }

    let loaded = load_json(&schema_path).and_then(|schema| {
        let data = load_document(&data_path)?;
        Ok((schema, data))
    });
    let (schema, data) = match loaded {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return Ok(Verdict::Misconfig.exit_code());
        }
    };

    let report = match coverage(&schema, &data) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {}: {e}", schema_path.display());
            return Ok(Verdict::Misconfig.exit_code());
        }
    };
    tracing::debug!(
        schema = %schema_path.display(),
        required = report.required.len(),
        missing = report.missing.len(),
        "placeholder coverage computed"
    );

    let mut verdict = Verdict::Pass;
    if report.is_covered() {
        println!(
            "OK: render-input payload covers all {} required placeholders",
            report.required.len()
        );
    } else {
        println!("FAIL: missing required render-input tokens:");
        for path in &report.missing {
            println!("- {path}");
        }
        verdict = Verdict::Fail;
    }

    if args.full {
        let name = schema_path.display().to_string();
        match full_validation(ctx, &name, &schema, &data) {
            Ok(()) => println!("OK: payload conforms to {name}"),
            Err(SchemaValidationError::ValidationFailed { violations, .. }) => {
                println!("FAIL: payload does not conform to {name}:");
                println!("{violations}");
                verdict = Verdict::Fail;
            }
            Err(e) => {
                eprintln!("ERROR: {e}");
                return Ok(Verdict::Misconfig.exit_code());
            }
        }
    }
    Ok(verdict.exit_code())
}

fn schema_path(args: &RenderInputsArgs, ctx: &PackContext) -> Option<PathBuf> {
    if let Some(schema) = &args.schema {
        return Some(resolve_path(schema, &ctx.pack_root));
    }
    let template = args.template.as_deref()?;
    Some(
        ctx.pack_root
            .join(&ctx.layout.document_schema_dir)
            .join(ctx.layout.schema_name_for_template(template)),
    )
}

/// Validate against the whole schema, with the pack's schemas available
/// for `$ref` resolution when they can be loaded.
fn full_validation(
    ctx: &PackContext,
    name: &str,
    schema: &Value,
    data: &Value,
) -> Result<(), SchemaValidationError> {
    let engine = match SchemaStore::load(&ctx.pack_root, &ctx.layout) {
        Ok(store) => SchemaEngine::new(&store),
        Err(e) => {
            tracing::warn!("pack schemas unavailable for $ref resolution: {e}");
            SchemaEngine::empty()
        }
    };
    engine.validate(name, schema, data)
}
