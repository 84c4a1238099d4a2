// Wrapper function generation: renders synthesized bodies as Rust.
//
// The op stream is folded into a tree first. Each scope then renders as a
// block expression; a block whose value is followed by more statements (pin
// releases, a resume call) binds it to `__result` and yields that instead.

use std::fmt::Write;

use crate::classify::HandleKind;
use crate::context::FuncEntry;
use crate::{decl, docs};
use crate::error::SynthError;
use crate::schema::ErrorCheckMode;
use crate::synth::{
    AddressPinDecl, ArgSource, AssignBack, BufferCapacity, CallArg, CallExpr, Op, ReturnShape,
    Scope, Stmt, SynthesizedFunction,
};

/// Result of synthesizing one function, in output order.
pub struct WrapperOutcome<'a> {
    pub entry: &'a FuncEntry,
    pub result: Result<SynthesizedFunction, SynthError>,
}

#[derive(Debug)]
enum Node<'a> {
    Scope(&'a Scope, Vec<Node<'a>>),
    Stmt(&'a Stmt),
}

/// Fold a balanced op stream into a tree.
fn build_tree(ops: &[Op]) -> Vec<Node<'_>> {
    let mut stack: Vec<(Option<&Scope>, Vec<Node<'_>>)> = vec![(None, Vec::new())];
    for op in ops {
        match op {
            Op::Open(scope) => stack.push((Some(scope), Vec::new())),
            Op::Emit(stmt) => {
                if let Some((_, children)) = stack.last_mut() {
                    children.push(Node::Stmt(stmt));
                }
            }
            Op::Close(_) => {
                if stack.len() > 1
                    && let Some((Some(scope), children)) = stack.pop()
                    && let Some((_, parent)) = stack.last_mut()
                {
                    parent.push(Node::Scope(scope, children));
                }
            }
        }
    }
    stack.into_iter().next().map(|(_, nodes)| nodes).unwrap_or_default()
}

type Lines = Vec<String>;

fn indent(lines: Lines) -> Lines {
    lines.into_iter().map(|l| format!("    {l}")).collect()
}

/// Statements of a block plus the expression it evaluates to.
#[derive(Default)]
struct Block {
    stmts: Lines,
    value: Option<Lines>,
}

impl Block {
    fn push_stmt(&mut self, lines: Lines) {
        if let Some(value) = self.value.take() {
            self.stmts.extend(bind("__result", value));
            self.value = Some(vec!["__result".into()]);
        }
        self.stmts.extend(lines);
    }

    fn set_value(&mut self, lines: Lines) {
        self.value = Some(lines);
    }

    /// `prefix { stmts value }`, used as the value when the inner block has one.
    fn push_block(&mut self, prefix: &str, inner: Block) {
        let has_value = inner.value.is_some();
        let mut lines = vec![format!("{prefix}{{")];
        lines.extend(indent(inner.stmts));
        if let Some(value) = inner.value {
            lines.extend(indent(value));
        }
        lines.push("}".into());
        if has_value {
            self.set_value(lines);
        } else {
            self.push_stmt(lines);
        }
    }

    fn into_lines(mut self) -> Lines {
        if let Some(value) = self.value.take() {
            self.stmts.extend(value);
        }
        self.stmts
    }
}

/// `let name = <expr>;` over a possibly multi-line expression.
fn bind(name: &str, mut value: Lines) -> Lines {
    if let Some(first) = value.first_mut() {
        *first = format!("let {name} = {first}");
    }
    if let Some(last) = value.last_mut() {
        last.push(';');
    }
    value
}

struct Renderer<'a> {
    f: &'a SynthesizedFunction,
    slot_consts: &'a [String],
}

impl Renderer<'_> {
    fn seq(&self, nodes: &[Node<'_>], in_unsafe: bool) -> Block {
        let mut b = Block::default();
        for node in nodes {
            match node {
                Node::Stmt(Stmt::Call(call)) => {
                    let expr = self.call(call, in_unsafe);
                    if call.capture {
                        b.push_stmt(vec![format!("let retval = {expr};")]);
                    } else if call.shape == ReturnShape::Void {
                        b.push_stmt(vec![format!("{expr};")]);
                    } else {
                        b.set_value(vec![expr]);
                    }
                }
                Node::Stmt(Stmt::Return) => b.set_value(vec!["retval".into()]),
                Node::Stmt(stmt) => b.push_stmt(self.stmt(stmt, in_unsafe)),
                Node::Scope(scope, children) => match scope {
                    Scope::Unsafe => b.push_block("unsafe ", self.seq(children, true)),
                    Scope::AddressPins(pins) => {
                        let mut inner = self.seq(children, in_unsafe);
                        let mut stmts: Lines = pins.iter().map(address_pin).collect();
                        stmts.append(&mut inner.stmts);
                        inner.stmts = stmts;
                        b.push_block("", inner);
                    }
                    Scope::Protected => b.push_block("", self.seq(children, in_unsafe)),
                    // Finally and a nested error check flatten into the parent.
                    Scope::Finally | Scope::ErrorCheck { .. } => {
                        let inner = self.seq(children, in_unsafe);
                        for stmt in inner.stmts {
                            b.push_stmt(vec![stmt]);
                        }
                        if let Some(value) = inner.value {
                            b.set_value(value);
                        }
                    }
                },
            }
        }
        b
    }

    fn stmt(&self, stmt: &Stmt, in_unsafe: bool) -> Lines {
        let line = match stmt {
            Stmt::AllocTextBuffer { buffer, capacity } => match capacity {
                BufferCapacity::Param(param) => {
                    format!("let mut {buffer} = glbind_runtime::TextBuffer::with_len({param});")
                }
                BufferCapacity::Fixed(n) => {
                    format!("let mut {buffer} = glbind_runtime::TextBuffer::with_capacity({n});")
                }
            },
            Stmt::PinHandle { param, handle, kind } => match kind {
                HandleKind::Boxed => {
                    format!("let {handle} = glbind_runtime::HandlePin::boxed(&*{param});")
                }
                HandleKind::Slice => format!("let {handle} = glbind_runtime::HandlePin::slice({param});"),
                HandleKind::SliceMut => {
                    format!("let {handle} = glbind_runtime::HandlePin::slice_mut({param});")
                }
            },
            Stmt::AssignBack(AssignBack::HandleTarget { param, handle }) => {
                format!("*{param} = {handle}.target();")
            }
            Stmt::AssignBack(AssignBack::Deref { param, ptr }) => {
                if in_unsafe {
                    format!("*{param} = *{ptr};")
                } else {
                    format!("*{param} = unsafe {{ *{ptr} }};")
                }
            }
            Stmt::AssignBack(AssignBack::Text { param, buffer }) => {
                format!("*{param} = {buffer}.to_string_lossy();")
            }
            Stmt::ReleaseHandle { handle } => format!("{handle}.release();"),
            Stmt::Call(_) | Stmt::Return => String::new(),
        };
        vec![line]
    }

    fn call(&self, call: &CallExpr, in_unsafe: bool) -> String {
        let slot = self
            .slot_consts
            .get(call.slot.index())
            .cloned()
            .unwrap_or_else(|| format!("glbind_runtime::SlotId({})", call.slot.0));
        let args: Vec<String> = call.args.iter().map(arg).collect();
        let raw = format!(
            "std::mem::transmute::<*const std::ffi::c_void, RawFn>(ENTRY_POINTS.require({slot}))({})",
            args.join(", ")
        );
        let converted = match &call.shape {
            ReturnShape::Void | ReturnShape::Value => raw,
            ReturnShape::String => format!("glbind_runtime::string_from_ptr({raw})"),
            ReturnShape::Bool => format!("glbind_runtime::bool_from_raw({raw})"),
            ReturnShape::Enum(name) => format!("<{name} as glbind_runtime::RawEnum>::from_raw({raw})"),
        };
        if in_unsafe {
            converted
        } else {
            format!("unsafe {{ {converted} }}")
        }
    }

    fn body(&self) -> Lines {
        let mut lines = vec![format!("type RawFn = {};", self.f.fn_type)];
        let tree = build_tree(self.f.body.ops());

        let block = match tree.as_slice() {
            [Node::Scope(Scope::ErrorCheck { function, mode }, children)] => {
                lines.push("#[cfg(debug_assertions)]".into());
                lines.push(format!(
                    "let _check = glbind_runtime::ErrorCheck::enter(\"{function}\", native_error_code);"
                ));
                if *mode == ErrorCheckMode::Suspend {
                    lines.push("if cfg!(debug_assertions) {".into());
                    lines.push("    glbind_runtime::ErrorCheck::suspend();".into());
                    lines.push("}".into());
                }
                let mut block = self.seq(children, false);
                if *mode == ErrorCheckMode::Resume {
                    block.push_stmt(vec![
                        "if cfg!(debug_assertions) {".into(),
                        "    glbind_runtime::ErrorCheck::resume();".into(),
                        "}".into(),
                    ]);
                }
                block
            }
            nodes => self.seq(nodes, false),
        };
        lines.extend(block.into_lines());
        lines
    }
}

fn address_pin(pin: &AddressPinDecl) -> String {
    let AddressPinDecl {
        param,
        ptr,
        slice,
        mutable,
        ..
    } = pin;
    match (slice, mutable) {
        (true, true) => format!("let {ptr} = {param}.as_mut_ptr();"),
        (true, false) => format!("let {ptr} = {param}.as_ptr();"),
        (false, true) => format!("let {ptr} = std::ptr::from_mut(&mut *{param});"),
        (false, false) => format!("let {ptr} = std::ptr::from_ref({param});"),
    }
}

fn arg(a: &CallArg) -> String {
    let ffi = &a.ffi_ty;
    match &a.source {
        ArgSource::Value { param, cast: false } => param.clone(),
        ArgSource::Value { param, cast: true } => format!("{param} as {ffi}"),
        ArgSource::Enum { param } => format!("glbind_runtime::RawEnum::into_raw({param}) as {ffi}"),
        ArgSource::Bool { param } | ArgSource::Pointer { param } => format!("{param} as {ffi}"),
        ArgSource::EnumStorage { param, by_ref: true } => {
            format!("std::ptr::from_mut(&mut *{param}) as {ffi}")
        }
        ArgSource::EnumStorage { param, by_ref: false } => format!("{param} as {ffi}"),
        ArgSource::AddressPin { ptr } => format!("{ptr} as {ffi}"),
        ArgSource::Handle { handle } => format!("{handle}.addr() as {ffi}"),
        ArgSource::Buffer { buffer } => format!("{buffer}.as_mut_ptr() as {ffi}"),
        ArgSource::Text { param } => format!("{param}.as_ptr() as {ffi}"),
    }
}

fn safety_lines(f: &SynthesizedFunction) -> Vec<String> {
    let raw = f.params.iter().any(|p| decl::takes_raw_pointer(&p.spec, &p.marshal));
    let sized = f.params.iter().any(|p| decl::caller_sized(&p.marshal));
    let mut lines = Vec::new();
    if raw || !sized {
        lines.push("Pointer arguments must be valid for the native call.".to_string());
    }
    if sized {
        lines.push(
            "Slices and generic references must hold at least as many elements as the \
             native call reads or writes, as implied by the other arguments."
                .to_string(),
        );
    }
    lines
}

/// Render one wrapper, doc comment included when `documentation`.
pub fn render_wrapper(
    f: &SynthesizedFunction,
    entry: &FuncEntry,
    slot_consts: &[String],
    documentation: bool,
) -> String {
    let mut out = String::new();
    if documentation {
        let mut doc = docs::doc_lines(&entry.func, &f.params);
        if f.is_unsafe {
            if !doc.is_empty() {
                doc.push(String::new());
            }
            doc.push("# Safety".into());
            doc.push(String::new());
            doc.extend(safety_lines(f));
        }
        for line in doc.iter().flat_map(|l| l.split('\n')) {
            let line = line.trim_end();
            if line.is_empty() {
                out.push_str("///\n");
            } else {
                let _ = writeln!(out, "/// {line}");
            }
        }
    }
    let _ = writeln!(out, "{} {{", f.signature());
    for line in indent(Renderer { f, slot_consts }.body()) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

/// Generate the file for one function group.
pub fn generate_group(
    outcomes: &[&WrapperOutcome<'_>],
    slot_consts: &[String],
    documentation: bool,
) -> String {
    let mut out = String::with_capacity(outcomes.len() * 512 + 256);
    out.push_str("// Generated by glbind. Do not edit.\n\n");
    out.push_str(
        "#![allow(unused_imports, clippy::too_many_arguments, clippy::unnecessary_cast)]\n\n",
    );
    out.push_str("use super::entry_points::*;\nuse super::enums::*;\n");

    for outcome in outcomes {
        out.push('\n');
        match &outcome.result {
            Ok(f) => out.push_str(&render_wrapper(f, outcome.entry, slot_consts, documentation)),
            Err(err) => {
                let _ = writeln!(out, "// glbind: skipped {}: {err}", outcome.entry.func.name);
            }
        }
    }
    out
}
