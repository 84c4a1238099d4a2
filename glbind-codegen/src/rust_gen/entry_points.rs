// entry_points.rs generation: slot constants, persisted layout, loader.

use std::collections::HashSet;
use std::fmt::Write;

use crate::context::GenContext;
use crate::decl;
use crate::entry_points::EntryPointTable;
use crate::naming::to_screaming_snake_case;

/// Offsets per line in the generated offset table.
const OFFSETS_PER_LINE: usize = 8;

/// `SLOT_*` constant name of every slot, indexed by slot. Symbols that collide
/// after case conversion get their slot number appended.
pub fn slot_const_names(table: &EntryPointTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .entries()
        .iter()
        .map(|e| {
            let base = format!("SLOT_{}", to_screaming_snake_case(&e.symbol));
            if seen.insert(base.clone()) {
                base
            } else {
                format!("{base}_{}", e.slot.0)
            }
        })
        .collect()
}

/// Escape a byte for a byte-string literal.
fn push_escaped(out: &mut String, byte: u8) {
    match byte {
        b'"' => out.push_str("\\\""),
        b'\\' => out.push_str("\\\\"),
        0 => out.push_str("\\0"),
        0x20..=0x7e => out.push(byte as char),
        _ => {
            let _ = write!(out, "\\x{byte:02x}");
        }
    }
}

/// Generate `entry_points.rs`.
pub fn generate_entry_points(ctx: &GenContext, table: &EntryPointTable) -> String {
    let mut out = String::with_capacity(256 + table.len() * 96);
    out.push_str("// Generated by glbind. Do not edit.\n\n");
    out.push_str("use glbind_runtime::{EntryPointLayout, EntryPoints, LoadReport, SlotId};\n\n");

    let consts = slot_const_names(table);
    for (entry, name) in table.entries().iter().zip(&consts) {
        let _ = writeln!(out, "pub const {name}: SlotId = SlotId({});", entry.slot.0);
    }
    if !consts.is_empty() {
        out.push('\n');
    }

    // One symbol per line; a trailing backslash continues the literal.
    out.push_str("const NAMES: &[u8] = b\"");
    for entry in table.entries() {
        out.push_str("\\\n    ");
        for byte in entry.symbol.bytes() {
            push_escaped(&mut out, byte);
        }
        push_escaped(&mut out, 0);
    }
    out.push_str("\";\n\n");

    out.push_str("const OFFSETS: &[u32] = &[");
    let offsets = table.offsets();
    for chunk in offsets.chunks(OFFSETS_PER_LINE) {
        let line: Vec<String> = chunk.iter().map(u32::to_string).collect();
        let _ = write!(out, "\n    {},", line.join(", "));
    }
    if !offsets.is_empty() {
        out.push('\n');
    }
    out.push_str("];\n\n");

    out.push_str(
        "/// Native entry points of this binding. Resolve them with [`load_with`]\n\
         /// before calling any wrapper.\n\
         pub static ENTRY_POINTS: EntryPoints = EntryPoints::new(EntryPointLayout::new(NAMES, OFFSETS));\n\n\
         /// Resolve every entry point through `resolve`, which returns null for\n\
         /// symbols it cannot find. Only the first call resolves; later calls\n\
         /// return the same report.\n\
         pub fn load_with<F>(resolve: F) -> LoadReport\n\
         where\n\
         \x20   F: FnMut(&std::ffi::CStr) -> *const std::ffi::c_void,\n\
         {\n\
         \x20   ENTRY_POINTS.load_with(resolve)\n\
         }\n",
    );

    if let Some(query) = ctx.error_query()
        && let Some(delegate) = ctx.delegate_for(&query.func)
        && let Ok(slot) = table.slot_for(&delegate.name)
        && let Some(name) = consts.get(slot.index())
    {
        let fn_type = decl::delegate_fn_type(delegate, &ctx.enums);
        let _ = write!(
            out,
            "\n/// Pending native error code, through `{}`.\n\
             pub(crate) fn native_error_code() -> glbind_runtime::NativeErrorCode {{\n\
             \x20   type RawFn = {fn_type};\n\
             \x20   // SAFETY: the slot holds the error-query entry point, which takes no arguments.\n\
             \x20   let raw = unsafe {{\n\
             \x20       std::mem::transmute::<*const std::ffi::c_void, RawFn>(ENTRY_POINTS.require({name}))()\n\
             \x20   }};\n\
             \x20   glbind_runtime::NativeErrorCode(raw as u32)\n\
             }}\n",
            query.func.name
        );
    }

    out
}
