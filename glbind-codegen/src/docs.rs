// Doc comment text for generated wrappers.

use tracing::warn;

use crate::schema::{FunctionInfo, ParamDoc, SizeHint};
use crate::synth::WorkingParam;

/// `[requires: v2.0]`, or `[requires: ARB_debug_output]` for extension
/// categories.
fn requires_tag(func: &FunctionInfo) -> Option<String> {
    if !func.category.is_empty() && !func.category.starts_with("VERSION") {
        return Some(format!("[requires: {}]", func.category));
    }
    if !func.version.is_empty() {
        return Some(format!("[requires: v{}]", func.version));
    }
    None
}

fn length_tag(hint: &SizeHint) -> String {
    match hint {
        SizeHint::Count(n) => format!("[length: {n}]"),
        SizeHint::Param(name) => format!("[length: {name}]"),
        SizeHint::Computed(names) => format!("[length: COMPSIZE({})]", names.join(", ")),
    }
}

/// Length tag for a hint; a hint naming no sibling parameter counts as absent.
fn checked_length_tag(
    func: &FunctionInfo,
    params: &[WorkingParam],
    param: &str,
    hint: &SizeHint,
) -> Option<String> {
    if let SizeHint::Param(name) = hint
        && !params.iter().any(|p| p.spec.name == *name)
    {
        warn!(function = %func.name, param, hint = %name, "size hint names no sibling parameter");
        return None;
    }
    Some(length_tag(hint))
}

/// Doc entry for parameter `index`: by name first, then an unnamed entry at the
/// same position.
fn param_doc<'a>(docs: &'a [ParamDoc], name: &str, index: usize) -> Option<&'a ParamDoc> {
    docs.iter()
        .find(|d| d.name == name)
        .or_else(|| docs.get(index).filter(|d| d.name.is_empty()))
}

/// Non-blank lines of a doc string, trimmed.
fn text_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Doc comment lines (without the `///` marker) for one wrapper. No returned
/// line contains a line break.
pub fn doc_lines(func: &FunctionInfo, params: &[WorkingParam]) -> Vec<String> {
    let mut lines = Vec::new();

    let mut summary: Vec<String> = Vec::new();
    if let Some(tag) = requires_tag(func) {
        summary.push(tag);
    }
    if let Some(v) = &func.deprecated_version {
        summary.push(format!("[deprecated: v{v}]"));
    }
    let mut summary_rest = Vec::new();
    if let Some(docs) = &func.docs {
        let mut text = text_lines(&docs.summary);
        if let Some(first) = text.next() {
            summary.push(first.to_string());
        }
        summary_rest.extend(text.map(str::to_string));
    }
    if !summary.is_empty() {
        lines.push(summary.join(" "));
    }
    lines.extend(summary_rest);

    let docs = func.docs.as_ref().map(|d| d.params.as_slice()).unwrap_or(&[]);
    let mut param_lines = Vec::new();
    for (i, p) in params.iter().enumerate() {
        let mut text: Vec<String> = match param_doc(docs, &p.spec.name, i) {
            Some(d) => text_lines(&d.doc).map(str::to_string).collect(),
            None => {
                if !docs.is_empty() {
                    warn!(function = %func.name, param = %p.spec.name, "no documentation for parameter");
                }
                Vec::new()
            }
        };
        let tag = p
            .spec
            .size_hint
            .as_ref()
            .and_then(|h| checked_length_tag(func, params, &p.spec.name, h));
        if let Some(tag) = tag {
            match text.last_mut() {
                Some(last) => {
                    last.push(' ');
                    last.push_str(&tag);
                }
                None => text.push(tag),
            }
        }
        let mut text = text.into_iter();
        if let Some(first) = text.next() {
            param_lines.push(format!("* `{}` - {first}", p.rust_name));
            param_lines.extend(text.map(|l| format!("  {l}")));
        }
    }

    for d in docs {
        if !d.name.is_empty() && !params.iter().any(|p| p.spec.name == d.name) {
            warn!(function = %func.name, doc = %d.name, "documentation names an unknown parameter");
        }
    }

    if !param_lines.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(param_lines);
    }
    lines
}
