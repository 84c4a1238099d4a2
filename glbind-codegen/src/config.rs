// Configuration types for glbind-codegen, deserialized from glbind.config.toml.

use serde::Deserialize;

/// Top-level config file.
#[derive(Deserialize, Clone, Debug)]
pub struct GlbindConfig {
    pub codegen: CodegenConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CodegenConfig {
    /// Prepended to every delegate's entry point to form the native symbol.
    #[serde(default = "default_function_prefix")]
    pub function_prefix: String,
    /// Emit `ErrorCheck` instrumentation around checked calls.
    #[serde(default = "default_true")]
    pub error_checking: bool,
    #[serde(default = "default_true")]
    pub documentation: bool,
    pub paths: CodegenPaths,
    #[serde(default)]
    pub blocklist: Blocklist,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CodegenPaths {
    /// Specification JSON, relative to the config file.
    pub spec_input: String,
    /// Output directory for the generated Rust module.
    pub rust_out: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Blocklist {
    /// Function blocklist, either "Name" or "group.Name".
    #[serde(default)]
    pub functions: Vec<String>,
}

impl Blocklist {
    /// Parse function entries into (group, name) tuples; a bare name matches
    /// every group.
    pub fn function_tuples(&self) -> Vec<(Option<String>, String)> {
        self.functions
            .iter()
            .map(|entry| match entry.split_once('.') {
                Some((group, func)) => (Some(group.to_string()), func.to_string()),
                None => (None, entry.clone()),
            })
            .collect()
    }
}

fn default_function_prefix() -> String {
    "gl".to_string()
}

fn default_true() -> bool {
    true
}
