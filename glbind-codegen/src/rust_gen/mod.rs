// Rust code generation orchestrator.

pub mod entry_points;
pub mod enums;
pub mod module;
pub mod wrappers;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::context::GenContext;
use crate::entry_points::EntryPointTable;
use crate::error::GenerateError;
use crate::schema::TypeInfo;
use crate::type_map::{self, TypeKind};

use self::wrappers::WrapperOutcome;

/// One generated file, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub name: String,
    pub contents: String,
}

/// Render every output file in a fixed order. Pure: no file system access.
pub fn render(
    ctx: &GenContext,
    table: &EntryPointTable,
    outcomes: &[WrapperOutcome<'_>],
    documentation: bool,
) -> Vec<RenderedFile> {
    let slot_consts = entry_points::slot_const_names(table);
    let mut files = Vec::new();

    files.push(RenderedFile {
        name: "entry_points.rs".into(),
        contents: entry_points::generate_entry_points(ctx, table),
    });

    files.push(RenderedFile {
        name: "enums.rs".into(),
        contents: generate_enums_file(ctx, outcomes),
    });

    let mut groups: BTreeMap<&str, Vec<&WrapperOutcome<'_>>> = BTreeMap::new();
    for outcome in outcomes {
        groups
            .entry(outcome.entry.module_name.as_str())
            .or_default()
            .push(outcome);
    }
    for (group, members) in &groups {
        files.push(RenderedFile {
            name: module::group_file_name(group),
            contents: wrappers::generate_group(members, &slot_consts, documentation),
        });
    }

    files.push(RenderedFile {
        name: "mod.rs".into(),
        contents: module::generate_mod_rs(groups.keys().copied()),
    });

    files
}

/// Write rendered files into `out_dir`, creating it if needed.
pub fn write_files(out_dir: &Path, files: &[RenderedFile]) -> Result<Vec<PathBuf>, GenerateError> {
    std::fs::create_dir_all(out_dir).map_err(|e| GenerateError::io(out_dir, e))?;
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = out_dir.join(&file.name);
        std::fs::write(&path, &file.contents).map_err(|e| GenerateError::io(&path, e))?;
        debug!(path = %path.display(), bytes = file.contents.len(), "wrote");
        written.push(path);
    }
    Ok(written)
}

fn enum_name(ty: &TypeInfo, ctx: &GenContext) -> Option<String> {
    match type_map::kind_of(ty, &ctx.enums) {
        TypeKind::Enum { name, .. } => Some(name),
        _ => None,
    }
}

/// All enums in one file, each with the wrappers that use it.
fn generate_enums_file(ctx: &GenContext, outcomes: &[WrapperOutcome<'_>]) -> String {
    let mut used_in: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for outcome in outcomes.iter().filter(|o| o.result.is_ok()) {
        let func = &outcome.entry.func;
        let mut names: Vec<String> = func
            .params
            .iter()
            .filter_map(|p| enum_name(&p.ty, ctx))
            .chain(enum_name(&func.return_type, ctx))
            .collect();
        names.sort();
        names.dedup();
        for name in names {
            used_in
                .entry(name)
                .or_default()
                .push(outcome.entry.rust_func_name.as_str());
        }
    }

    let mut out = String::from("// Generated by glbind. Do not edit.\n");
    for e in ctx.enums.values() {
        out.push('\n');
        let users = used_in.get(&e.name).map(Vec::as_slice).unwrap_or(&[]);
        out.push_str(&enums::generate_enum(e, users));
    }
    out
}
