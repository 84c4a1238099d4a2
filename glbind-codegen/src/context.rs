// Build context: type lookups, enum resolution, deterministic function order.

use std::collections::BTreeMap;

use tracing::warn;

use crate::naming;
use crate::schema::{DelegateInfo, EnumInfo, ErrorCheckMode, FunctionInfo, SpecFile, TypeInfo};

/// Central build context for the codegen pipeline.
///
/// Owns the specification model for the run. Nothing downstream mutates it;
/// synthesis works on per-function copies.
pub struct GenContext {
    /// All enums by name.
    pub enums: BTreeMap<String, EnumInfo>,
    /// All delegates by name.
    pub delegates: BTreeMap<String, DelegateInfo>,
    /// Exportable functions sorted by (group, trimmed name, name).
    pub functions: Vec<FuncEntry>,
}

/// A function scheduled for wrapper generation.
#[derive(Clone, Debug)]
pub struct FuncEntry {
    /// Rust module the wrapper lands in.
    pub module_name: String,
    /// Resolved Rust function name (may carry a _1, _2 suffix for overloads).
    pub rust_func_name: String,
    pub func: FunctionInfo,
}

impl GenContext {
    pub fn new(spec: SpecFile) -> Self {
        let enums: BTreeMap<String, EnumInfo> =
            spec.enums.into_iter().map(|e| (e.name.clone(), e)).collect();

        let mut delegates = BTreeMap::new();
        for mut d in spec.delegates {
            resolve_enum(&mut d.return_type, &enums);
            for p in &mut d.params {
                resolve_enum(&mut p.ty, &enums);
            }
            if let Some(previous) = delegates.insert(d.name.clone(), d) {
                warn!(delegate = %previous.name, "duplicate delegate definition, keeping the last");
            }
        }

        let mut functions: Vec<FuncEntry> = spec
            .functions
            .into_iter()
            .map(|mut func| {
                resolve_enum(&mut func.return_type, &enums);
                for p in &mut func.params {
                    resolve_enum(&mut p.ty, &enums);
                }
                FuncEntry {
                    module_name: naming::to_module_name(&func.group),
                    rust_func_name: naming::escape_reserved(&naming::to_snake_case(
                        func.display_name(),
                    )),
                    func,
                }
            })
            .collect();

        // Sort for deterministic output regardless of input order.
        functions.sort_by(|a, b| {
            a.module_name
                .cmp(&b.module_name)
                .then_with(|| a.func.display_name().cmp(b.func.display_name()))
                .then_with(|| a.func.name.cmp(&b.func.name))
        });

        GenContext {
            enums,
            delegates,
            functions,
        }
    }

    /// The function declared as the native error query, if any.
    pub fn error_query(&self) -> Option<&FuncEntry> {
        self.functions
            .iter()
            .find(|e| e.func.error_check == ErrorCheckMode::Exempt)
    }

    pub fn delegate_for(&self, func: &FunctionInfo) -> Option<&DelegateInfo> {
        self.delegates.get(&func.delegate)
    }
}

fn resolve_enum(ty: &mut TypeInfo, enums: &BTreeMap<String, EnumInfo>) {
    if enums.contains_key(&ty.name) {
        ty.is_enum = true;
    }
}
