// Marshaling strategy synthesizer.
//
// Turns one function, its delegate and the per-parameter classifications into a
// target-neutral body: a flat stream of scope opens, statements and scope
// closes. Scopes nest as a strict stack:
//
//   ErrorCheck > Unsafe > AddressPins > Protected, then Finally
//
// Handle pins are opened before the protected region and released in the
// finally region, so every pin has exactly one release.

use glbind_ffi::SlotId;

use crate::classify::{self, Capacity, DEFAULT_BUFFER_CAPACITY, HandleKind, Marshal, PinCast};
use crate::context::{FuncEntry, GenContext};
use crate::decl;
use crate::entry_points::EntryPointTable;
use crate::error::SynthError;
use crate::naming;
use crate::schema::{ErrorCheckMode, ParamInfo, TypeInfo};
use crate::type_map::{self, TypeKind};

// ---------------------------------------------------------------------------
// IR
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    ErrorCheck,
    Unsafe,
    AddressPins,
    Protected,
    Finally,
}

/// One address pin: `ptr` holds the address of `param` for the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressPinDecl {
    pub param: String,
    pub ptr: String,
    pub slice: bool,
    pub mutable: bool,
    pub cast: PinCast,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    ErrorCheck { function: String, mode: ErrorCheckMode },
    Unsafe,
    /// All address pins of the call, in parameter order.
    AddressPins(Vec<AddressPinDecl>),
    Protected,
    Finally,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::ErrorCheck { .. } => ScopeKind::ErrorCheck,
            Scope::Unsafe => ScopeKind::Unsafe,
            Scope::AddressPins(_) => ScopeKind::AddressPins,
            Scope::Protected => ScopeKind::Protected,
            Scope::Finally => ScopeKind::Finally,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferCapacity {
    /// Runtime value of this wrapper parameter.
    Param(String),
    Fixed(usize),
}

/// Where a call argument comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgSource {
    /// Parameter passed as is, with an `as` conversion when `cast`.
    Value { param: String, cast: bool },
    /// Enum value, passed as its raw integer.
    Enum { param: String },
    Bool { param: String },
    /// Raw pointer parameter.
    Pointer { param: String },
    /// Address of an enum written by the native side.
    EnumStorage { param: String, by_ref: bool },
    AddressPin { ptr: String },
    Handle { handle: String },
    Buffer { buffer: String },
    /// Borrowed C string.
    Text { param: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallArg {
    pub source: ArgSource,
    /// Type the delegate expects.
    pub ffi_ty: String,
}

/// How the raw call result becomes the wrapper's return value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    Void,
    String,
    Bool,
    Enum(String),
    Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallExpr {
    pub slot: SlotId,
    pub symbol: String,
    pub args: Vec<CallArg>,
    pub shape: ReturnShape,
    /// Result is captured into a temporary instead of returned directly.
    pub capture: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignBack {
    /// `*param = handle.target()`
    HandleTarget { param: String, handle: String },
    /// `*param = *ptr`
    Deref { param: String, ptr: String },
    /// `*param = buffer.to_string_lossy()`
    Text { param: String, buffer: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    AllocTextBuffer { buffer: String, capacity: BufferCapacity },
    PinHandle { param: String, handle: String, kind: HandleKind },
    Call(CallExpr),
    AssignBack(AssignBack),
    /// Return the captured call result.
    Return,
    ReleaseHandle { handle: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    Open(Scope),
    Close(ScopeKind),
    Emit(Stmt),
}

/// Ordered body of one wrapper.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Body {
    ops: Vec<Op>,
}

impl Body {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn statements(&self) -> impl Iterator<Item = &Stmt> {
        self.ops.iter().filter_map(|op| match op {
            Op::Emit(stmt) => Some(stmt),
            _ => None,
        })
    }

    /// Every close matches the innermost open scope and nothing is left open.
    pub fn is_balanced(&self) -> bool {
        let mut stack = Vec::new();
        for op in &self.ops {
            match op {
                Op::Open(scope) => stack.push(scope.kind()),
                Op::Close(kind) => {
                    if stack.pop() != Some(*kind) {
                        return false;
                    }
                }
                Op::Emit(_) => {}
            }
        }
        stack.is_empty()
    }

    pub fn handle_pins(&self) -> usize {
        self.statements()
            .filter(|s| matches!(s, Stmt::PinHandle { .. }))
            .count()
    }

    pub fn handle_releases(&self) -> usize {
        self.statements()
            .filter(|s| matches!(s, Stmt::ReleaseHandle { .. }))
            .count()
    }

    pub fn buffer_allocations(&self) -> usize {
        self.statements()
            .filter(|s| matches!(s, Stmt::AllocTextBuffer { .. }))
            .count()
    }

    pub fn address_pins(&self) -> &[AddressPinDecl] {
        self.ops
            .iter()
            .find_map(|op| match op {
                Op::Open(Scope::AddressPins(pins)) => Some(pins.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn call(&self) -> Option<&CallExpr> {
        self.statements().find_map(|s| match s {
            Stmt::Call(call) => Some(call),
            _ => None,
        })
    }

    pub fn assign_backs(&self) -> Vec<&AssignBack> {
        self.statements()
            .filter_map(|s| match s {
                Stmt::AssignBack(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    pub fn opens(&self, kind: ScopeKind) -> bool {
        self.ops
            .iter()
            .any(|op| matches!(op, Op::Open(scope) if scope.kind() == kind))
    }
}

/// Appends ops while tracking the open scopes, so closes always come in
/// reverse order of opens.
#[derive(Default)]
struct BodyBuilder {
    ops: Vec<Op>,
    open: Vec<ScopeKind>,
}

impl BodyBuilder {
    fn open(&mut self, scope: Scope) {
        self.open.push(scope.kind());
        self.ops.push(Op::Open(scope));
    }

    fn emit(&mut self, stmt: Stmt) {
        self.ops.push(Op::Emit(stmt));
    }

    fn close(&mut self, kind: ScopeKind) {
        let top = self.open.pop();
        debug_assert_eq!(top, Some(kind), "scope closed out of order");
        self.ops.push(Op::Close(kind));
    }

    fn finish(mut self) -> Body {
        while let Some(kind) = self.open.pop() {
            self.ops.push(Op::Close(kind));
        }
        Body { ops: self.ops }
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct SynthOptions {
    /// Emit error-check scopes. Needs an error-query function in the model.
    pub error_checking: bool,
}

/// A parameter of the function-local working copy.
#[derive(Clone, Debug)]
pub struct WorkingParam {
    pub spec: ParamInfo,
    pub rust_name: String,
    pub rust_ty: String,
    pub ffi_ty: String,
    pub marshal: Marshal,
}

/// Everything the renderer needs for one wrapper.
#[derive(Clone, Debug)]
pub struct SynthesizedFunction {
    pub name: String,
    pub rust_name: String,
    pub module_name: String,
    pub generics: Vec<String>,
    pub params: Vec<WorkingParam>,
    pub return_type: Option<String>,
    pub is_unsafe: bool,
    /// Function-pointer type of the delegate.
    pub fn_type: String,
    pub slot: SlotId,
    pub body: Body,
}

impl SynthesizedFunction {
    pub fn signature(&self) -> String {
        let params: Vec<(String, String)> = self
            .params
            .iter()
            .map(|p| (p.rust_name.clone(), p.rust_ty.clone()))
            .collect();
        decl::wrapper_signature(
            &self.rust_name,
            &self.generics,
            &params,
            self.return_type.as_deref(),
            self.is_unsafe,
        )
    }
}

fn return_shape(ty: &TypeInfo, ctx: &GenContext) -> ReturnShape {
    if ty.is_void() {
        return ReturnShape::Void;
    }
    if ty.levels() > 0 {
        return ReturnShape::Value;
    }
    match type_map::kind_of(ty, &ctx.enums) {
        TypeKind::String => ReturnShape::String,
        TypeKind::Bool => ReturnShape::Bool,
        TypeKind::Enum { name, .. } => ReturnShape::Enum(name),
        _ => ReturnShape::Value,
    }
}

fn call_arg(p: &WorkingParam, ctx: &GenContext) -> CallArg {
    let param = p.rust_name.clone();
    let source = match &p.marshal {
        Marshal::HandlePin { .. } => ArgSource::Handle {
            handle: format!("{}_handle", naming::strip_raw_prefix(&param)),
        },
        Marshal::AddressPin { .. } => ArgSource::AddressPin {
            ptr: format!("{}_ptr", naming::strip_raw_prefix(&param)),
        },
        Marshal::StackStringBuffer { buffer, .. } => ArgSource::Buffer {
            buffer: buffer.clone(),
        },
        Marshal::DirectString => ArgSource::Text { param },
        Marshal::EnumAsIntStorage => ArgSource::EnumStorage {
            by_ref: p.spec.ty.levels() == 0,
            param,
        },
        Marshal::PassThrough => match type_map::kind_of(&p.spec.ty, &ctx.enums) {
            TypeKind::String if p.spec.ty.levels() == 0 => ArgSource::Text { param },
            _ if p.spec.ty.levels() > 0 => ArgSource::Pointer { param },
            TypeKind::Enum { .. } => ArgSource::Enum { param },
            TypeKind::Bool => ArgSource::Bool { param },
            _ => ArgSource::Value {
                cast: p.rust_ty != p.ffi_ty,
                param,
            },
        },
    };
    CallArg {
        source,
        ffi_ty: p.ffi_ty.clone(),
    }
}

/// Generic type parameters, in order of first appearance.
fn collect_generics(params: &[WorkingParam], ctx: &GenContext) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for p in params {
        if let TypeKind::Generic(name) = type_map::kind_of(&p.spec.ty, &ctx.enums)
            && !out.contains(&name)
        {
            out.push(name);
        }
    }
    out
}

/// Synthesize the wrapper body for one function.
pub fn synthesize(
    entry: &FuncEntry,
    ctx: &GenContext,
    table: &EntryPointTable,
    options: SynthOptions,
) -> Result<SynthesizedFunction, SynthError> {
    let func = &entry.func;
    let delegate = ctx
        .delegate_for(func)
        .ok_or_else(|| SynthError::MissingDelegate {
            function: func.name.clone(),
            delegate: func.delegate.clone(),
        })?;

    if func.params.len() != delegate.params.len() {
        return Err(SynthError::ParamCountMismatch {
            function: func.name.clone(),
            delegate: delegate.name.clone(),
            expected: delegate.params.len(),
            found: func.params.len(),
        });
    }

    let slot = table.slot_for(&delegate.name).map_err(|e| match e {
        SynthError::MissingDelegate { delegate, .. } => SynthError::MissingDelegate {
            function: func.name.clone(),
            delegate,
        },
        other => other,
    })?;
    let symbol = table
        .entry(slot)
        .map(|e| e.symbol.clone())
        .unwrap_or_default();

    // Function-local working copy; the model stays untouched.
    let mut params = Vec::with_capacity(func.params.len());
    for (p, dp) in func.params.iter().zip(&delegate.params) {
        let marshal = classify::classify(p, &func.params)?;
        if marshal == Marshal::PassThrough
            && p.ty.levels() == 0
            && matches!(type_map::kind_of(&p.ty, &ctx.enums), TypeKind::Generic(_))
        {
            // A generic value with no pinning category cannot cross by value.
            return Err(SynthError::UnknownWrapper {
                param: p.name.clone(),
                wrapper: p.wrapper,
            });
        }
        params.push(WorkingParam {
            spec: p.clone(),
            rust_name: naming::param_name(&p.name),
            rust_ty: decl::wrapper_param_type(p, &marshal, &ctx.enums),
            ffi_ty: decl::ffi_type(&dp.ty, &ctx.enums),
            marshal,
        });
    }

    // The four ordered statement lists.
    let mut buffers = Vec::new();
    let mut address_pins = Vec::new();
    let mut handle_pins = Vec::new();
    let mut releases = Vec::new();
    let mut assign_backs = Vec::new();

    for p in &params {
        let bare = naming::strip_raw_prefix(&p.rust_name).to_string();
        match &p.marshal {
            Marshal::HandlePin { kind, assign_back } => {
                let handle = format!("{bare}_handle");
                handle_pins.push(Stmt::PinHandle {
                    param: p.rust_name.clone(),
                    handle: handle.clone(),
                    kind: *kind,
                });
                if *assign_back {
                    assign_backs.push(AssignBack::HandleTarget {
                        param: p.rust_name.clone(),
                        handle: handle.clone(),
                    });
                }
                releases.push(Stmt::ReleaseHandle { handle });
            }
            Marshal::AddressPin {
                slice,
                mutable,
                assign_back,
                cast,
            } => {
                let ptr = format!("{bare}_ptr");
                address_pins.push(AddressPinDecl {
                    param: p.rust_name.clone(),
                    ptr: ptr.clone(),
                    slice: *slice,
                    mutable: *mutable,
                    cast: *cast,
                });
                if *assign_back {
                    assign_backs.push(AssignBack::Deref {
                        param: p.rust_name.clone(),
                        ptr,
                    });
                }
            }
            Marshal::StackStringBuffer { buffer, capacity } => {
                let capacity = match capacity {
                    Capacity::Sibling(name) => BufferCapacity::Param(naming::param_name(name)),
                    Capacity::Default => BufferCapacity::Fixed(DEFAULT_BUFFER_CAPACITY),
                };
                buffers.push(Stmt::AllocTextBuffer {
                    buffer: buffer.clone(),
                    capacity,
                });
                assign_backs.push(AssignBack::Text {
                    param: p.rust_name.clone(),
                    buffer: buffer.clone(),
                });
            }
            Marshal::DirectString | Marshal::EnumAsIntStorage | Marshal::PassThrough => {}
        }
    }

    let is_unsafe = func.unsafe_scope
        || params.iter().any(|p| {
            decl::takes_raw_pointer(&p.spec, &p.marshal) || decl::caller_sized(&p.marshal)
        });
    let needs_unsafe = (!address_pins.is_empty() || !buffers.is_empty()) && !is_unsafe;

    let instrumented = options.error_checking && func.error_check != ErrorCheckMode::Exempt;

    let shape = return_shape(&func.return_type, ctx);
    let capture = !assign_backs.is_empty() && shape != ReturnShape::Void;
    let call = CallExpr {
        slot,
        symbol,
        args: params.iter().map(|p| call_arg(p, ctx)).collect(),
        shape: shape.clone(),
        capture,
    };

    let mut b = BodyBuilder::default();
    if instrumented {
        b.open(Scope::ErrorCheck {
            function: func.name.clone(),
            mode: func.error_check,
        });
    }
    if needs_unsafe {
        b.open(Scope::Unsafe);
    }
    for stmt in buffers {
        b.emit(stmt);
    }
    if !address_pins.is_empty() {
        b.open(Scope::AddressPins(address_pins));
    }
    let protected = !handle_pins.is_empty();
    for stmt in handle_pins {
        b.emit(stmt);
    }
    if protected {
        b.open(Scope::Protected);
    }
    b.emit(Stmt::Call(call));
    for a in assign_backs {
        b.emit(Stmt::AssignBack(a));
    }
    if capture {
        b.emit(Stmt::Return);
    }
    if protected {
        b.close(ScopeKind::Protected);
        b.open(Scope::Finally);
        for stmt in releases {
            b.emit(stmt);
        }
        b.close(ScopeKind::Finally);
    }
    let body = b.finish();

    Ok(SynthesizedFunction {
        name: func.name.clone(),
        rust_name: entry.rust_func_name.clone(),
        module_name: entry.module_name.clone(),
        generics: collect_generics(&params, ctx),
        return_type: decl::wrapper_return_type(&func.return_type, &ctx.enums),
        is_unsafe,
        fn_type: decl::delegate_fn_type(delegate, &ctx.enums),
        slot,
        params,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SpecFile;

    const SPEC: &str = r#"{
      "functions": [
        {"name": "GetProgramInfoLog", "delegate": "GetProgramInfoLog",
         "return_type": {"name": "void"},
         "params": [
           {"name": "program", "type": {"name": "uint"}},
           {"name": "bufSize", "type": {"name": "int"}},
           {"name": "length", "type": {"name": "int", "pointer": 1}, "flow": "out",
            "wrapper": ["pointer"]},
           {"name": "infoLog", "type": {"name": "String"}, "flow": "out"}
         ]},
        {"name": "GetObjectLabel", "delegate": "GetObjectLabel",
         "return_type": {"name": "void"},
         "params": [
           {"name": "label", "type": {"name": "String"}, "flow": "out"}
         ]},
        {"name": "ShaderSource", "delegate": "ShaderSource",
         "return_type": {"name": "void"},
         "params": [
           {"name": "source", "type": {"name": "String"}}
         ]},
        {"name": "Query", "delegate": "Query",
         "return_type": {"name": "void"},
         "params": [
           {"name": "results", "type": {"name": "TypeEnum", "pointer": 1, "array": 1},
            "flow": "out", "wrapper": ["array", "pointer"]}
         ]},
        {"name": "GetBufferSubData", "delegate": "GetBufferSubData",
         "return_type": {"name": "bool"},
         "params": [
           {"name": "data", "type": {"name": "T1"}, "flow": "undefined",
            "wrapper": ["generic", "reference"], "reference": true}
         ]},
        {"name": "GetIntegerv", "delegate": "GetIntegerv",
         "return_type": {"name": "TypeEnum"},
         "params": [
           {"name": "value", "type": {"name": "int"}, "flow": "out",
            "wrapper": ["reference"], "reference": true}
         ]},
        {"name": "GetError", "delegate": "GetError", "error_check": "exempt",
         "return_type": {"name": "TypeEnum"}},
        {"name": "Uniform2f", "delegate": "Uniform2f",
         "return_type": {"name": "void"},
         "params": [{"name": "x", "type": {"name": "float"}}]},
        {"name": "Broken", "delegate": "Broken",
         "return_type": {"name": "void"},
         "params": [{"name": "p", "type": {"name": "float", "array": 1},
                     "wrapper": ["string"]}]}
      ],
      "delegates": [
        {"name": "GetProgramInfoLog", "entry_point": "GetProgramInfoLog",
         "return_type": {"name": "void"},
         "params": [{"name": "program", "type": {"name": "uint"}},
                    {"name": "bufSize", "type": {"name": "int"}},
                    {"name": "length", "type": {"name": "int", "pointer": 1}},
                    {"name": "infoLog", "type": {"name": "String"}}]},
        {"name": "GetObjectLabel", "entry_point": "GetObjectLabel",
         "return_type": {"name": "void"},
         "params": [{"name": "label", "type": {"name": "String"}}]},
        {"name": "ShaderSource", "entry_point": "ShaderSource",
         "return_type": {"name": "void"},
         "params": [{"name": "source", "type": {"name": "String"}}]},
        {"name": "Query", "entry_point": "Query",
         "return_type": {"name": "void"},
         "params": [{"name": "results", "type": {"name": "TypeEnum", "pointer": 1}}]},
        {"name": "GetBufferSubData", "entry_point": "GetBufferSubData",
         "return_type": {"name": "bool"},
         "params": [{"name": "data", "type": {"name": "void", "pointer": 1}}]},
        {"name": "GetIntegerv", "entry_point": "GetIntegerv",
         "return_type": {"name": "TypeEnum"},
         "params": [{"name": "value", "type": {"name": "int", "pointer": 1}}]},
        {"name": "GetError", "entry_point": "GetError",
         "return_type": {"name": "TypeEnum"}},
        {"name": "Uniform2f", "entry_point": "Uniform2f",
         "return_type": {"name": "void"},
         "params": [{"name": "x", "type": {"name": "float"}},
                    {"name": "y", "type": {"name": "float"}}]},
        {"name": "Broken", "entry_point": "Broken",
         "return_type": {"name": "void"},
         "params": [{"name": "p", "type": {"name": "float", "pointer": 1}}]}
      ],
      "enums": [
        {"name": "TypeEnum", "constants": [["NoError", 0], ["InvalidEnum", 1280]]}
      ]
    }"#;

    fn setup() -> (GenContext, EntryPointTable) {
        let spec: SpecFile = serde_json::from_str(SPEC).unwrap();
        let ctx = GenContext::new(spec);
        let table = EntryPointTable::build(ctx.delegates.values(), "gl");
        (ctx, table)
    }

    fn synth(name: &str, checking: bool) -> Result<SynthesizedFunction, SynthError> {
        let (ctx, table) = setup();
        let entry = ctx.functions.iter().find(|e| e.func.name == name).unwrap();
        synthesize(
            entry,
            &ctx,
            &table,
            SynthOptions {
                error_checking: checking,
            },
        )
    }

    #[test]
    fn output_string_buffer_uses_the_size_sibling() {
        let f = synth("GetProgramInfoLog", false).unwrap();
        let body = &f.body;
        assert!(body.is_balanced());
        assert_eq!(body.buffer_allocations(), 1);
        let alloc = body
            .statements()
            .find(|s| matches!(s, Stmt::AllocTextBuffer { .. }))
            .unwrap();
        assert_eq!(
            alloc,
            &Stmt::AllocTextBuffer {
                buffer: "c_info_log".into(),
                capacity: BufferCapacity::Param("buf_size".into()),
            }
        );
        assert_eq!(
            body.assign_backs(),
            vec![&AssignBack::Text {
                param: "info_log".into(),
                buffer: "c_info_log".into()
            }]
        );
        // Void return: nothing captured.
        let call = body.call().unwrap();
        assert!(!call.capture);
        assert!(!body.statements().any(|s| matches!(s, Stmt::Return)));
        assert!(body.opens(ScopeKind::Unsafe) || f.is_unsafe);
    }

    #[test]
    fn output_string_without_sibling_gets_default_capacity() {
        let f = synth("GetObjectLabel", false).unwrap();
        assert!(f.body.statements().any(|s| matches!(
            s,
            Stmt::AllocTextBuffer { capacity: BufferCapacity::Fixed(256), .. }
        )));
        assert!(f.body.opens(ScopeKind::Unsafe));
        assert!(!f.is_unsafe);
    }

    #[test]
    fn input_string_allocates_nothing() {
        let f = synth("ShaderSource", false).unwrap();
        assert_eq!(f.body.buffer_allocations(), 0);
        assert!(!f.body.opens(ScopeKind::Unsafe));
        assert_eq!(
            f.body.call().unwrap().args[0].source,
            ArgSource::Text {
                param: "source".into()
            }
        );
    }

    #[test]
    fn array_out_pins_in_place_without_assign_back() {
        let f = synth("Query", false).unwrap();
        let pins = f.body.address_pins();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].ptr, "results_ptr");
        assert!(pins[0].slice && pins[0].mutable);
        assert_eq!(pins[0].cast, PinCast::IntStorage);
        assert!(f.body.assign_backs().is_empty());
        assert_eq!(f.params[0].rust_ty, "&mut [TypeEnum]");
        // The native side decides how many elements it writes.
        assert!(f.is_unsafe);
        assert!(!f.body.opens(ScopeKind::Unsafe));
    }

    #[test]
    fn generic_reference_pins_a_handle_and_releases_it() {
        let f = synth("GetBufferSubData", false).unwrap();
        let body = &f.body;
        assert!(body.is_balanced());
        assert_eq!(body.handle_pins(), 1);
        assert_eq!(body.handle_releases(), 1);
        assert_eq!(f.generics, vec!["T1".to_string()]);
        assert!(f.is_unsafe);
        assert_eq!(
            body.assign_backs(),
            vec![&AssignBack::HandleTarget {
                param: "data".into(),
                handle: "data_handle".into()
            }]
        );
        let call = body.call().unwrap();
        assert!(call.capture);
        assert_eq!(call.shape, ReturnShape::Bool);

        // Release sits in the finally region, after the protected region closes.
        let ops = body.ops();
        let close_protected = ops
            .iter()
            .position(|op| op == &Op::Close(ScopeKind::Protected))
            .unwrap();
        let release = ops
            .iter()
            .position(|op| matches!(op, Op::Emit(Stmt::ReleaseHandle { .. })))
            .unwrap();
        let ret = ops
            .iter()
            .position(|op| op == &Op::Emit(Stmt::Return))
            .unwrap();
        assert!(ret < close_protected && close_protected < release);
    }

    #[test]
    fn reference_out_assigns_back_through_the_pin() {
        let f = synth("GetIntegerv", true).unwrap();
        assert_eq!(
            f.body.assign_backs(),
            vec![&AssignBack::Deref {
                param: "value".into(),
                ptr: "value_ptr".into()
            }]
        );
        let call = f.body.call().unwrap();
        assert_eq!(call.shape, ReturnShape::Enum("TypeEnum".into()));
        assert!(call.capture);
        assert!(matches!(
            f.body.ops().first(),
            Some(Op::Open(Scope::ErrorCheck { .. }))
        ));
        assert!(f.body.is_balanced());
        assert!(!f.is_unsafe);
    }

    #[test]
    fn error_query_is_never_instrumented() {
        let f = synth("GetError", true).unwrap();
        assert!(!f.body.opens(ScopeKind::ErrorCheck));
        assert_eq!(f.body.ops().len(), 1);
    }

    #[test]
    fn scopes_nest_in_stack_order() {
        let f = synth("GetIntegerv", true).unwrap();
        let opened: Vec<ScopeKind> = f
            .body
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Open(s) => Some(s.kind()),
                _ => None,
            })
            .collect();
        let closed: Vec<ScopeKind> = f
            .body
            .ops()
            .iter()
            .filter_map(|op| match op {
                Op::Close(k) => Some(*k),
                _ => None,
            })
            .collect();
        assert_eq!(
            opened,
            vec![ScopeKind::ErrorCheck, ScopeKind::Unsafe, ScopeKind::AddressPins]
        );
        let mut reversed = opened.clone();
        reversed.reverse();
        assert_eq!(closed, reversed);
    }

    #[test]
    fn parameter_count_mismatch_is_fatal_for_the_function() {
        let err = synth("Uniform2f", false).unwrap_err();
        assert_eq!(
            err,
            SynthError::ParamCountMismatch {
                function: "Uniform2f".into(),
                delegate: "Uniform2f".into(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn unknown_wrapper_combination_is_fatal_for_the_function() {
        assert!(matches!(
            synth("Broken", false),
            Err(SynthError::UnknownWrapper { .. })
        ));
    }

    #[test]
    fn synthesis_leaves_the_model_untouched() {
        let (ctx, table) = setup();
        let entry = ctx
            .functions
            .iter()
            .find(|e| e.func.name == "GetProgramInfoLog")
            .unwrap();
        let before = format!("{:?}", entry.func);
        let _ = synthesize(entry, &ctx, &table, SynthOptions { error_checking: true });
        assert_eq!(before, format!("{:?}", entry.func));
    }
}
