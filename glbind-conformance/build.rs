// Build script: generates bindings for the codegen fixture into OUT_DIR and
// writes `bindings.rs`, which mounts them as the `gl` module.

use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());

    let config_path = manifest_dir.join("glbind.config.toml");
    let config = glbind_codegen::load_config(&config_path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {e}", config_path.display()));
    let spec_path = manifest_dir.join(&config.codegen.paths.spec_input);
    let spec = glbind_codegen::load_spec(&spec_path)
        .unwrap_or_else(|e| panic!("Failed to load {}: {e}", spec_path.display()));

    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-changed={}", spec_path.display());

    let generated = out_dir.join("gl");
    let report = glbind_codegen::generate(spec, &config.codegen, &generated)
        .unwrap_or_else(|e| panic!("Failed to generate bindings: {e}"));

    // Forward slashes work in #[path] on every platform.
    let mod_rs = generated.join("mod.rs");
    let mod_rs = mod_rs.to_str().expect("non-UTF8 path").replace('\\', "/");
    let bindings = out_dir.join("bindings.rs");
    fs::write(&bindings, format!("#[path = {mod_rs:?}]\npub mod gl;\n"))
        .unwrap_or_else(|e| panic!("Failed to write {}: {e}", bindings.display()));

    eprintln!(
        "glbind-conformance build.rs: {} wrappers, {} slots, {} skipped",
        report.wrappers,
        report.slots,
        report.skipped.len()
    );
}
