// glbind-codegen: reads the specification JSON, generates marshaling Rust
// wrappers and the entry-point table they call through.

pub mod schema;
pub mod naming;
pub mod config;
pub mod context;
pub mod type_map;
pub mod filter;
pub mod error;
pub mod classify;
pub mod synth;
pub mod entry_points;
pub mod decl;
pub mod docs;
pub mod rust_gen;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{error, info, warn};

use crate::config::{CodegenConfig, GlbindConfig};
use crate::context::GenContext;
use crate::entry_points::EntryPointTable;
use crate::error::GenerateError;
use crate::rust_gen::wrappers::WrapperOutcome;
use crate::schema::SpecFile;
use crate::synth::{SynthOptions, synthesize};

pub use crate::error::SynthError;

/// Summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub slots: usize,
    pub wrappers: usize,
    /// `(function, reason)` for every function without a wrapper.
    pub skipped: Vec<(String, String)>,
    pub files: Vec<PathBuf>,
}

/// Load and parse the config file.
pub fn load_config(config_path: &Path) -> Result<GlbindConfig, GenerateError> {
    let text =
        std::fs::read_to_string(config_path).map_err(|e| GenerateError::io(config_path, e))?;
    toml::from_str(&text).map_err(|source| GenerateError::Toml {
        path: config_path.to_path_buf(),
        source,
    })
}

/// Load and parse a specification JSON file.
pub fn load_spec(spec_path: &Path) -> Result<SpecFile, GenerateError> {
    let text = std::fs::read_to_string(spec_path).map_err(|e| GenerateError::io(spec_path, e))?;
    serde_json::from_str(&text).map_err(|source| GenerateError::Json {
        path: spec_path.to_path_buf(),
        source,
    })
}

/// Run the generate command. Main entry point for codegen.
pub fn run_generate(config_path: &Path) -> Result<GenerateReport, GenerateError> {
    let config = load_config(config_path)?;
    let codegen = &config.codegen;

    // Resolve paths relative to the config file directory.
    let config_dir = config_path.parent().unwrap_or(Path::new("."));
    let spec_path = config_dir.join(&codegen.paths.spec_input);
    let rust_out = config_dir.join(&codegen.paths.rust_out);

    info!(spec = %spec_path.display(), "loading specification");
    let spec = load_spec(&spec_path)?;
    info!(
        functions = spec.functions.len(),
        delegates = spec.delegates.len(),
        enums = spec.enums.len(),
        "specification loaded"
    );

    generate(spec, codegen, &rust_out)
}

/// Generate bindings for an already loaded specification into `rust_out`.
pub fn generate(
    spec: SpecFile,
    codegen: &CodegenConfig,
    rust_out: &Path,
) -> Result<GenerateReport, GenerateError> {
    let mut ctx = GenContext::new(spec);
    filter::apply_filters(&mut ctx, &codegen.blocklist);
    info!(functions = ctx.functions.len(), "filtered");

    // Every slot-eligible delegate gets a slot, blocklisted wrappers included.
    let table = EntryPointTable::build(ctx.delegates.values(), &codegen.function_prefix);
    info!(slots = table.len(), "entry-point table built");

    let options = SynthOptions {
        error_checking: codegen.error_checking && has_error_query(&ctx, &table),
    };
    if codegen.error_checking && !options.error_checking {
        warn!("no error-query function with a resolvable slot; error checking disabled");
    }

    // Functions are independent; collect keeps input order.
    let outcomes: Vec<WrapperOutcome<'_>> = ctx
        .functions
        .par_iter()
        .map(|entry| WrapperOutcome {
            entry,
            result: synthesize(entry, &ctx, &table, options),
        })
        .collect();

    let mut report = GenerateReport {
        slots: table.len(),
        ..GenerateReport::default()
    };
    for outcome in &outcomes {
        match &outcome.result {
            Ok(_) => report.wrappers += 1,
            Err(err) => {
                error!(function = %outcome.entry.func.name, "skipped: {err}");
                report
                    .skipped
                    .push((outcome.entry.func.name.clone(), err.to_string()));
            }
        }
    }

    let files = rust_gen::render(&ctx, &table, &outcomes, codegen.documentation);
    report.files = rust_gen::write_files(rust_out, &files)?;

    verify_output(&table, rust_out, &files)?;
    info!(
        slots = report.slots,
        wrappers = report.wrappers,
        skipped = report.skipped.len(),
        "done"
    );
    Ok(report)
}

fn has_error_query(ctx: &GenContext, table: &EntryPointTable) -> bool {
    ctx.error_query()
        .and_then(|q| ctx.delegate_for(&q.func))
        .is_some_and(|d| table.slot_for(&d.name).is_ok())
}

/// Verify codegen output integrity.
fn verify_output(
    table: &EntryPointTable,
    rust_out: &Path,
    files: &[rust_gen::RenderedFile],
) -> Result<(), GenerateError> {
    let mut errors: Vec<String> = Vec::new();

    // 1. Slot contiguity: slots must be 0..N-1 with no gaps.
    for (i, entry) in table.entries().iter().enumerate() {
        if entry.slot.index() != i {
            errors.push(format!(
                "slot gap: expected {i} for {}, got {} (total slots: {})",
                entry.symbol,
                entry.slot,
                table.len()
            ));
            break;
        }
    }

    // 2. Offsets agree with the name blob.
    if let Err(e) = glbind_ffi::validate_layout(&table.name_blob(), &table.offsets()) {
        errors.push(format!("entry-point layout: {e}"));
    }

    // 3. Every rendered file exists and is non-empty.
    for file in files {
        let path = rust_out.join(&file.name);
        match std::fs::metadata(&path) {
            Ok(m) if m.len() == 0 => errors.push(format!("output empty: {}", path.display())),
            Err(_) => errors.push(format!("output missing: {}", path.display())),
            _ => {}
        }
    }
    for required in ["mod.rs", "entry_points.rs", "enums.rs"] {
        if !files.iter().any(|f| f.name == required) {
            errors.push(format!("output missing: {required}"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(GenerateError::Verify(errors))
    }
}
