// End-to-end generation runs over a small specification.

use std::path::{Path, PathBuf};

use glbind_codegen::{GenerateReport, run_generate};

const SPEC: &str = include_str!("fixtures_spec.json");

fn write_config(dir: &Path, extra: &str) -> PathBuf {
    std::fs::write(dir.join("spec.json"), SPEC).unwrap();
    let config = format!(
        "[codegen]\n\
         function_prefix = \"gl\"\n\
         {extra}\n\
         [codegen.paths]\n\
         spec_input = \"spec.json\"\n\
         rust_out = \"generated\"\n"
    );
    let path = dir.join("glbind.config.toml");
    std::fs::write(&path, config).unwrap();
    path
}

fn generate(extra: &str) -> (tempfile::TempDir, GenerateReport) {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), extra);
    let report = run_generate(&config).unwrap();
    (dir, report)
}

fn read(dir: &tempfile::TempDir, name: &str) -> String {
    std::fs::read_to_string(dir.path().join("generated").join(name)).unwrap()
}

/// Body of the generated function `name`, up to the closing brace at column 0.
fn function<'a>(code: &'a str, signature_start: &str) -> &'a str {
    let start = code
        .find(signature_start)
        .unwrap_or_else(|| panic!("`{signature_start}` not found in:\n{code}"));
    let rest = &code[start..];
    let end = rest.find("\n}\n").map_or(rest.len(), |i| i + 3);
    &rest[..end]
}

#[test]
fn every_generated_file_parses() {
    let (dir, report) = generate("");
    for file in &report.files {
        let code = std::fs::read_to_string(file).unwrap();
        if let Err(err) = syn::parse_file(&code) {
            panic!("{} does not parse: {err}\n{code}", file.display());
        }
    }
    let names: Vec<String> = report
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["entry_points.rs", "enums.rs", "core.rs", "legacy.rs", "mod.rs"]
    );
    assert!(read(&dir, "mod.rs").contains("pub mod legacy;"));
}

#[test]
fn shared_symbol_gets_one_slot() {
    let (dir, report) = generate("");
    let entry_points = read(&dir, "entry_points.rs");
    assert_eq!(entry_points.matches("glFoo\\0").count(), 1);
    // 16 delegates, A and B share glFoo.
    assert_eq!(report.slots, 15);

    let core = read(&dir, "core.rs");
    assert!(function(&core, "pub fn foo_a()").contains("ENTRY_POINTS.require(SLOT_GL_FOO)"));
    assert!(function(&core, "pub fn foo_b()").contains("ENTRY_POINTS.require(SLOT_GL_FOO)"));
}

#[test]
fn string_output_buffer_is_sized_by_its_sibling() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    let f = function(&core, "pub unsafe fn get_shader_info_log(");
    assert!(f.contains("info_log: &mut String"));
    assert!(f.contains("let mut c_info_log = glbind_runtime::TextBuffer::with_len(buf_size);"));
    let call = f.find("ENTRY_POINTS.require").unwrap();
    let assign = f.find("*info_log = c_info_log.to_string_lossy();").unwrap();
    assert!(call < assign);
    assert!(!f.contains("retval"));
}

#[test]
fn input_string_allocates_no_buffer() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    let f = function(&core, "pub fn shader_source(");
    assert!(f.contains("source: &std::ffi::CStr"));
    assert!(!f.contains("TextBuffer"));
    assert!(f.contains("source.as_ptr() as *const std::ffi::c_char"));
}

#[test]
fn array_out_is_pinned_in_place() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    let f = function(&core, "pub unsafe fn query(");
    assert!(f.contains("results: &mut [GetPName]"));
    assert!(f.contains("let results_ptr = results.as_mut_ptr();"));
    assert!(f.contains("results_ptr as *mut i32"));
    assert!(!f.contains("*results ="));
}

#[test]
fn reference_out_is_assigned_back() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    // Overloads sharing a trimmed name are numbered in sorted order.
    let by_ref = function(&core, "pub fn get_integer_1(");
    assert!(by_ref.contains("data: &mut i32"));
    assert!(by_ref.contains("*data = *data_ptr;"));
    let by_slice = function(&core, "pub unsafe fn get_integer_2(");
    assert!(by_slice.contains("data: &mut [i32]"));
}

#[test]
fn caller_sized_arguments_make_the_wrapper_unsafe() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    for signature in [
        "pub unsafe fn query(results: &mut [GetPName])",
        "pub unsafe fn get_integer_2(pname: GetPName, data: &mut [i32])",
        "pub unsafe fn buffer_sub_data<T1: Copy>(offset: *mut std::ffi::c_void, data: &[T1])",
        "pub unsafe fn get_buffer_sub_data<T1: Copy>(data: &mut T1) -> bool",
    ] {
        let documented = format!("as implied by the other arguments.\n{signature}");
        assert!(core.contains(&documented), "{signature}");
    }
    // Single-value references and input strings stay safe.
    assert!(core.contains("pub fn get_integer_1(pname: GetPName, data: &mut i32)"));
    assert!(core.contains("pub fn shader_source("));
    assert!(core.contains("pub fn is_enabled("));
}

#[test]
fn handle_pins_are_released_on_the_normal_path() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    let f = function(&core, "pub unsafe fn get_buffer_sub_data<T1: Copy>(");
    assert_eq!(f.matches("HandlePin::boxed").count(), 1);
    assert_eq!(f.matches(".release();").count(), 1);
    let assign = f.find("*data = data_handle.target();").unwrap();
    let release = f.find("data_handle.release();").unwrap();
    assert!(assign < release);
    assert!(f.contains("glbind_runtime::bool_from_raw("));

    let slice = function(&core, "pub unsafe fn buffer_sub_data<T1: Copy>(");
    assert!(slice.contains("HandlePin::slice(data)"));
    assert_eq!(slice.matches(".release();").count(), 1);
}

#[test]
fn return_shapes() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    assert!(function(&core, "pub fn get_string(").contains("glbind_runtime::string_from_ptr("));
    assert!(function(&core, "pub fn is_enabled(").contains("-> bool"));
    assert!(
        function(&core, "pub fn get_error(")
            .contains("<ErrorCode as glbind_runtime::RawEnum>::from_raw(")
    );
    assert!(core.contains("pub unsafe fn map_buffer(target: u32) -> *mut std::ffi::c_void {"));
}

#[test]
fn error_checks_skip_the_error_query() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    assert!(!function(&core, "pub fn get_error(").contains("ErrorCheck"));
    assert!(function(&core, "pub fn is_enabled(").contains("ErrorCheck::enter(\"IsEnabled\""));
    let legacy = read(&dir, "legacy.rs");
    assert!(function(&legacy, "pub fn begin(").contains("ErrorCheck::suspend();"));
    assert!(function(&legacy, "pub fn end(").contains("ErrorCheck::resume();"));
    assert!(read(&dir, "entry_points.rs").contains("pub(crate) fn native_error_code()"));
}

#[test]
fn error_checking_can_be_disabled() {
    let (dir, _) = generate("error_checking = false");
    assert!(!read(&dir, "core.rs").contains("ErrorCheck"));
}

#[test]
fn specification_defects_skip_only_the_affected_function() {
    let (dir, report) = generate("");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "Uniform2f");
    let core = read(&dir, "core.rs");
    assert!(core.contains("// glbind: skipped Uniform2f: function `Uniform2f` has 1 parameters"));
    assert!(core.contains("pub fn is_enabled("));
}

#[test]
fn blocklisted_functions_keep_their_slot() {
    let (full_dir, full) = generate("");
    let (dir, report) = generate("[codegen.blocklist]\nfunctions = [\"GetPointerv\", \"legacy.Begin\"]");
    assert_eq!(report.wrappers, full.wrappers - 2);
    assert_eq!(report.slots, full.slots);
    assert!(!read(&dir, "core.rs").contains("pub fn get_pointerv("));
    assert!(read(&full_dir, "core.rs").contains("pub fn get_pointerv("));
    assert!(!read(&dir, "legacy.rs").contains("pub fn begin("));
    assert!(read(&dir, "entry_points.rs").contains("glGetPointerv\\0"));
}

#[test]
fn documentation_tolerates_mismatched_entries() {
    let (dir, _) = generate("");
    let core = read(&dir, "core.rs");
    let f = function(&core, "/// [requires: v2.0] Return the information log");
    assert!(f.contains("/// * `shader` - Shader object to query."));
    assert!(f.contains("/// * `info_log` - [length: bufSize]"));
    assert!(!f.contains("Misnamed"));
    assert!(f.contains("/// # Safety"));

    let (dir, _) = generate("documentation = false");
    assert!(!read(&dir, "core.rs").contains("///"));
}

#[test]
fn enums_list_their_users() {
    let (dir, _) = generate("");
    let enums = read(&dir, "enums.rs");
    assert!(enums.contains("pub struct EnableCap(pub u32);"));
    assert!(enums.contains("/// Used in `is_enabled`."));
    assert!(enums.contains("impl std::ops::BitOr for ClearBufferMask"));
}

#[test]
fn output_is_byte_identical_across_runs() {
    let (a, report_a) = generate("");
    let (b, report_b) = generate("");
    assert_eq!(report_a.files.len(), report_b.files.len());
    for file in &report_a.files {
        let name = file.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(read(&a, &name), read(&b, &name), "{name} differs");
    }
}

#[test]
fn missing_spec_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("glbind.config.toml");
    std::fs::write(
        &config,
        "[codegen.paths]\nspec_input = \"nope.json\"\nrust_out = \"out\"\n",
    )
    .unwrap();
    let err = run_generate(&config).unwrap_err();
    assert!(matches!(err, glbind_codegen::error::GenerateError::Io { .. }));
}
