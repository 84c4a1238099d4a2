// Secondary filtering: blocklist, obsolete functions, overload renaming.

use std::collections::HashMap;

use tracing::debug;

use crate::config::Blocklist;
use crate::context::GenContext;

/// Apply all filters to the context's function list in place.
pub fn apply_filters(ctx: &mut GenContext, blocklist: &Blocklist) {
    let blocked = blocklist.function_tuples();

    ctx.functions.retain(|entry| {
        let f = &entry.func;
        // Function-level blocklist. Delegates keep their slot.
        let is_blocked = blocked.iter().any(|(group, name)| {
            (name == &f.name || name == f.display_name())
                && group.as_ref().is_none_or(|g| g == &f.group)
        });
        if is_blocked {
            debug!(function = %f.name, "blocklisted");
            return false;
        }

        // Obsolete entry points are not emitted at all.
        if let Some(reason) = &f.obsolete {
            debug!(function = %f.name, reason = %reason, "obsolete, skipped");
            return false;
        }

        true
    });

    rename_overloads(ctx);
}

/// Wrappers sharing a Rust name within one module get `_1`, `_2`, ... suffixes
/// in sorted order.
fn rename_overloads(ctx: &mut GenContext) {
    let mut name_counts: HashMap<(String, String), usize> = HashMap::new();
    for e in &ctx.functions {
        *name_counts
            .entry((e.module_name.clone(), e.rust_func_name.clone()))
            .or_default() += 1;
    }

    let mut name_indices: HashMap<(String, String), usize> = HashMap::new();
    for e in ctx.functions.iter_mut() {
        let key = (e.module_name.clone(), e.rust_func_name.clone());
        if name_counts.get(&key).copied().unwrap_or(0) > 1 {
            let idx = name_indices.entry(key).or_insert(0);
            *idx += 1;
            let base = crate::naming::strip_raw_prefix(&e.rust_func_name).to_string();
            e.rust_func_name = format!("{base}_{idx}");
        }
    }
}
