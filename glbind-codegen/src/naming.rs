// Name conversion utilities for codegen.

/// Convert a camelCase, PascalCase or UPPER_CASE name to snake_case.
pub fn to_snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 8);
    let chars: Vec<char> = name.chars().collect();

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                // Underscore before an uppercase letter that follows lowercase/digit,
                // or that starts a new word after an acronym ("HTTPServer" -> "http_server").
                if prev.is_ascii_lowercase() || prev.is_ascii_digit() {
                    result.push('_');
                } else if prev.is_ascii_uppercase()
                    && i + 1 < chars.len()
                    && chars[i + 1].is_ascii_lowercase()
                {
                    result.push('_');
                }
            }
            result.push(ch.to_ascii_lowercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// `glDrawArrays` -> `GL_DRAW_ARRAYS`.
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

const RESERVED_WORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false",
    "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
    "trait", "true", "type", "unsafe", "use", "where", "while", "async",
    "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Check if a name is a Rust reserved word.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Escape Rust reserved words by prepending `r#`. `self`, `Self`, `super` and
/// `crate` cannot be raw identifiers and get a trailing underscore instead.
pub fn escape_reserved(name: &str) -> String {
    match name {
        "self" | "Self" | "super" | "crate" => format!("{name}_"),
        _ if is_reserved(name) => format!("r#{name}"),
        _ => name.to_string(),
    }
}

/// Drop a raw-identifier prefix: `r#type` -> `type`.
pub fn strip_raw_prefix(name: &str) -> &str {
    name.strip_prefix("r#").unwrap_or(name)
}

/// Rust parameter name for a specification parameter name.
pub fn param_name(name: &str) -> String {
    escape_reserved(&to_snake_case(name))
}

/// Make an arbitrary constant or module name a valid Rust identifier.
pub fn sanitize_ident(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 1);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            if i == 0 && ch.is_ascii_digit() {
                result.push('_');
            }
            result.push(ch);
        } else {
            result.push('_');
        }
    }
    if result.is_empty() {
        result.push_str("_Unknown");
    }
    result
}

/// Generated files a function group must not shadow.
const GENERATED_MODULES: &[&str] = &["entry_points", "enums", "mod"];

/// Rust module name for a function group.
pub fn to_module_name(name: &str) -> String {
    let snake = to_snake_case(&sanitize_ident(name));
    if GENERATED_MODULES.contains(&snake.as_str()) {
        return format!("{snake}_group");
    }
    escape_reserved(&snake)
}
