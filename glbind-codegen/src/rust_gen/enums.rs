// Rust enum generation.
//
// Every enum becomes a transparent newtype over its backing integer with one
// associated constant per specification constant, so any raw value the native
// side hands back is representable.

use std::collections::HashSet;
use std::fmt::Write;

use crate::naming::{sanitize_ident, to_screaming_snake_case};
use crate::schema::EnumInfo;
use crate::type_map::enum_repr;

/// Functions mentioned by name in an enum's usage line before summarizing.
const USAGE_LISTED: usize = 3;

/// Generate the Rust code for one enum. `used_in` lists the wrappers taking or
/// returning it, in output order.
pub fn generate_enum(e: &EnumInfo, used_in: &[&str]) -> String {
    let mut out = String::with_capacity(1024);
    let name = &e.name;

    // Promote to a signed repr when a constant is negative, and normalize
    // values through that width (0xFFFF_FFFF and -1 collide in i32).
    let has_negative = e.constants.iter().any(|(_, v)| *v < 0);
    let repr = if has_negative {
        signed_repr(enum_repr(e))
    } else {
        enum_repr(e)
    };

    let mut seen_names = HashSet::new();
    let mut constants: Vec<(String, i64)> = Vec::new();
    for (constant, value) in &e.constants {
        let ident = const_ident(constant);
        if !seen_names.insert(ident.clone()) {
            continue;
        }
        let value = if has_negative {
            normalize_to_signed(*value, repr)
        } else {
            *value
        };
        constants.push((ident, value));
    }

    if !used_in.is_empty() {
        let _ = writeln!(out, "/// {}", usage_line(used_in));
    }
    let _ = writeln!(
        out,
        "#[repr(transparent)]\n\
         #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]\n\
         pub struct {name}(pub {repr});\n"
    );

    let _ = writeln!(out, "impl {name} {{");
    for (ident, value) in &constants {
        let _ = writeln!(out, "    pub const {ident}: {name} = {name}({value});");
    }

    // name(): first constant wins for aliased values.
    let mut seen_values = HashSet::new();
    out.push_str("\n    /// Name of the first constant with this value.\n");
    out.push_str("    pub fn name(self) -> Option<&'static str> {\n");
    if constants.is_empty() {
        out.push_str("        None\n");
    } else {
        out.push_str("        match self.0 {\n");
        for (ident, value) in &constants {
            if seen_values.insert(*value) {
                let _ = writeln!(out, "            {value} => Some(\"{ident}\"),");
            }
        }
        out.push_str("            _ => None,\n        }\n");
    }
    out.push_str("    }\n");

    if e.flags {
        let _ = writeln!(
            out,
            "\n    pub fn contains(self, other: {name}) -> bool {{\n\
             \x20       self.0 & other.0 == other.0\n\
             \x20   }}"
        );
    }
    out.push_str("}\n");

    let _ = writeln!(
        out,
        "\nimpl glbind_runtime::RawEnum for {name} {{\n\
         \x20   type Repr = {repr};\n\n\
         \x20   #[inline]\n\
         \x20   fn from_raw(raw: {repr}) -> Self {{\n\
         \x20       {name}(raw)\n\
         \x20   }}\n\n\
         \x20   #[inline]\n\
         \x20   fn into_raw(self) -> {repr} {{\n\
         \x20       self.0\n\
         \x20   }}\n\
         }}"
    );

    let _ = writeln!(
        out,
        "\nimpl std::fmt::Debug for {name} {{\n\
         \x20   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {{\n\
         \x20       match self.name() {{\n\
         \x20           Some(n) => write!(f, \"{name}::{{n}}\"),\n\
         \x20           None => write!(f, \"{name}({{}})\", self.0),\n\
         \x20       }}\n\
         \x20   }}\n\
         }}"
    );

    if e.flags {
        for (tr, method, op) in [("BitOr", "bitor", "|"), ("BitAnd", "bitand", "&")] {
            let _ = writeln!(
                out,
                "\nimpl std::ops::{tr} for {name} {{\n\
                 \x20   type Output = {name};\n\n\
                 \x20   fn {method}(self, rhs: {name}) -> {name} {{\n\
                 \x20       {name}(self.0 {op} rhs.0)\n\
                 \x20   }}\n\
                 }}"
            );
        }
    }

    out
}

/// "Used in `a`, `b` and `c`" or "Used in `a`, `b`, `c` and 4 other functions".
fn usage_line(used_in: &[&str]) -> String {
    let listed: Vec<String> = used_in
        .iter()
        .take(USAGE_LISTED)
        .map(|f| format!("`{f}`"))
        .collect();
    let rest = used_in.len().saturating_sub(USAGE_LISTED);
    match (listed.as_slice(), rest) {
        ([only], 0) => format!("Used in {only}."),
        (names, 0) => {
            let (last, head) = names.split_last().map_or(("", &[][..]), |(l, h)| (l.as_str(), h));
            format!("Used in {} and {last}.", head.join(", "))
        }
        (names, 1) => format!("Used in {} and 1 other function.", names.join(", ")),
        (names, n) => format!("Used in {} and {n} other functions.", names.join(", ")),
    }
}

/// `InvalidEnum` -> `INVALID_ENUM`, `2D` -> `_2D`.
fn const_ident(constant: &str) -> String {
    let ident = to_screaming_snake_case(&sanitize_ident(constant));
    if ident == "SELF" {
        "SELF_".to_string()
    } else {
        ident
    }
}

fn signed_repr(repr: &'static str) -> &'static str {
    match repr {
        "u8" => "i8",
        "u16" => "i16",
        "u32" => "i32",
        "u64" => "i64",
        "usize" => "isize",
        other => other,
    }
}

/// Normalize a value to the signed representation of `repr`'s width.
fn normalize_to_signed(value: i64, repr: &str) -> i64 {
    match repr {
        "i8" => (value as i8) as i64,
        "i16" => (value as i16) as i64,
        "i32" => (value as i32) as i64,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_info(flags: bool, constants: &[(&str, i64)]) -> EnumInfo {
        EnumInfo {
            name: "ErrorCode".into(),
            underlying_type: "uint".into(),
            flags,
            constants: constants.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn constants_become_associated_consts() {
        let code = generate_enum(
            &enum_info(false, &[("NoError", 0), ("InvalidEnum", 1280), ("NoErrorAlias", 0)]),
            &[],
        );
        assert!(code.contains("pub struct ErrorCode(pub u32);"));
        assert!(code.contains("pub const INVALID_ENUM: ErrorCode = ErrorCode(1280);"));
        assert!(code.contains("pub const NO_ERROR_ALIAS: ErrorCode = ErrorCode(0);"));
        // Aliased value keeps its first name.
        assert!(code.contains("0 => Some(\"NO_ERROR\"),"));
        assert!(!code.contains("0 => Some(\"NO_ERROR_ALIAS\"),"));
        assert!(code.contains("impl glbind_runtime::RawEnum for ErrorCode"));
        assert!(syn::parse_file(&code).is_ok());
    }

    #[test]
    fn negative_values_promote_to_signed() {
        let code = generate_enum(&enum_info(false, &[("Invalid", -1), ("All", 0xFFFF_FFFF)]), &[]);
        assert!(code.contains("pub struct ErrorCode(pub i32);"));
        assert!(code.contains("pub const ALL: ErrorCode = ErrorCode(-1);"));
    }

    #[test]
    fn flag_enums_get_bit_operators() {
        let code = generate_enum(&enum_info(true, &[("ColorBufferBit", 0x4000)]), &[]);
        assert!(code.contains("impl std::ops::BitOr for ErrorCode"));
        assert!(code.contains("pub fn contains(self, other: ErrorCode) -> bool"));
        assert!(syn::parse_file(&code).is_ok());
    }

    #[test]
    fn usage_line_summarizes_long_lists() {
        assert_eq!(usage_line(&["get_error"]), "Used in `get_error`.");
        assert_eq!(usage_line(&["a", "b"]), "Used in `a` and `b`.");
        assert_eq!(
            usage_line(&["a", "b", "c", "d", "e"]),
            "Used in `a`, `b`, `c` and 2 other functions."
        );
    }
}
