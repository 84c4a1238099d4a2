// mod.rs generation for the output directory.

use crate::naming::strip_raw_prefix;

/// Generate the top-level `mod.rs` declaring every generated module.
pub fn generate_mod_rs<'a, I>(groups: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = String::from("// Generated by glbind. Do not edit.\n\n");
    out.push_str("pub mod entry_points;\npub mod enums;\n");
    let mut groups: Vec<&str> = groups.into_iter().collect();
    groups.sort_unstable();
    groups.dedup();
    for group in &groups {
        out.push_str(&format!("pub mod {group};\n"));
    }

    out.push_str("\npub use entry_points::{ENTRY_POINTS, load_with};\npub use enums::*;\n");
    out
}

/// File name of a group module: `r#type` lives in `type.rs`.
pub fn group_file_name(group: &str) -> String {
    format!("{}.rs", strip_raw_prefix(group))
}
