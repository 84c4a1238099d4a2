// Declaration formatter: Rust types and signatures for wrappers and delegates.

use std::collections::BTreeMap;

use crate::classify::{HandleKind, Marshal};
use crate::schema::{DelegateInfo, EnumInfo, ParamInfo, TypeInfo};
use crate::type_map::{self, TypeKind};

/// `levels` raw-pointer levels around `base`. The outermost level is `*const`
/// when `outer_const`, every inner level is `*mut`.
fn raw_pointer(base: &str, levels: u8, outer_const: bool) -> String {
    let mut ty = base.to_string();
    for level in 0..levels {
        let qualifier = if outer_const && level + 1 == levels { "*const" } else { "*mut" };
        ty = format!("{qualifier} {ty}");
    }
    ty
}

/// Type of `ty` at the native boundary, as it appears in the delegate's
/// function-pointer type.
pub fn ffi_type(ty: &TypeInfo, enums: &BTreeMap<String, EnumInfo>) -> String {
    let kind = type_map::kind_of(ty, enums);
    let levels = ty.levels();
    match kind {
        // A string is already one level of indirection.
        TypeKind::String => raw_pointer("*const std::ffi::c_char", levels, false),
        // Enum storage crosses as 32-bit integers.
        TypeKind::Enum { .. } if levels > 0 => raw_pointer("i32", levels, false),
        TypeKind::Generic(_) | TypeKind::Void => raw_pointer("std::ffi::c_void", levels.max(1), false),
        _ => raw_pointer(&type_map::ffi_base(&kind), levels, false),
    }
}

/// Return type at the native boundary, `None` for void.
pub fn ffi_return_type(ty: &TypeInfo, enums: &BTreeMap<String, EnumInfo>) -> Option<String> {
    if ty.is_void() {
        None
    } else {
        Some(ffi_type(ty, enums))
    }
}

/// Element type of a pinned slice: array ranks absorb pointer levels.
fn element_type(p: &ParamInfo, enums: &BTreeMap<String, EnumInfo>) -> String {
    let base = type_map::rust_base(&type_map::kind_of(&p.ty, enums));
    raw_pointer(&base, p.ty.pointer.saturating_sub(p.ty.array), false)
}

/// Type of a parameter in the wrapper signature, given its classification.
pub fn wrapper_param_type(
    p: &ParamInfo,
    marshal: &Marshal,
    enums: &BTreeMap<String, EnumInfo>,
) -> String {
    let kind = type_map::kind_of(&p.ty, enums);
    let base = type_map::rust_base(&kind);
    let writes = p.flow.writes_back();
    match marshal {
        Marshal::HandlePin { kind: HandleKind::Boxed, .. } => {
            if writes && p.reference {
                format!("&mut {base}")
            } else {
                format!("&{base}")
            }
        }
        Marshal::HandlePin { kind: HandleKind::Slice, .. } => format!("&[{base}]"),
        Marshal::HandlePin { kind: HandleKind::SliceMut, .. } => format!("&mut [{base}]"),
        Marshal::AddressPin { slice: true, mutable, .. } => {
            let elem = element_type(p, enums);
            if *mutable { format!("&mut [{elem}]") } else { format!("&[{elem}]") }
        }
        Marshal::AddressPin { slice: false, mutable, .. } => {
            let target = raw_pointer(&base, p.ty.pointer, false);
            if *mutable { format!("&mut {target}") } else { format!("&{target}") }
        }
        Marshal::StackStringBuffer { .. } => "&mut String".into(),
        Marshal::DirectString => "&std::ffi::CStr".into(),
        Marshal::EnumAsIntStorage => {
            if p.ty.levels() > 0 {
                raw_pointer(&base, p.ty.levels(), !writes)
            } else {
                format!("&mut {base}")
            }
        }
        Marshal::PassThrough => match kind {
            TypeKind::String if p.ty.levels() == 0 => "&std::ffi::CStr".into(),
            TypeKind::String => raw_pointer("*const std::ffi::c_char", p.ty.levels(), !writes),
            _ if p.ty.levels() > 0 => raw_pointer(&base, p.ty.levels(), !writes),
            _ => base,
        },
    }
}

/// True when the wrapper hands a raw pointer through to the native side, which
/// makes the wrapper itself `unsafe` to call.
pub fn takes_raw_pointer(p: &ParamInfo, marshal: &Marshal) -> bool {
    match marshal {
        Marshal::PassThrough => p.ty.levels() > 0,
        Marshal::EnumAsIntStorage => p.ty.levels() > 0,
        _ => false,
    }
}

/// True when the native side reads or writes through a pinned argument for a
/// length the wrapper cannot check: slices, whose length comes from another
/// argument, and generic handles of unknown native size.
pub fn caller_sized(marshal: &Marshal) -> bool {
    matches!(
        marshal,
        Marshal::HandlePin { .. } | Marshal::AddressPin { slice: true, .. }
    )
}

/// Wrapper return type, `None` for void.
pub fn wrapper_return_type(ty: &TypeInfo, enums: &BTreeMap<String, EnumInfo>) -> Option<String> {
    if ty.is_void() {
        return None;
    }
    let kind = type_map::kind_of(ty, enums);
    Some(match kind {
        TypeKind::String if ty.levels() == 0 => "String".into(),
        _ if ty.levels() > 0 => raw_pointer(&type_map::rust_base(&kind), ty.levels(), false),
        _ => type_map::rust_base(&kind),
    })
}

/// `unsafe extern "system" fn(u32, i32) -> u8` for a delegate.
pub fn delegate_fn_type(d: &DelegateInfo, enums: &BTreeMap<String, EnumInfo>) -> String {
    let params: Vec<String> = d.params.iter().map(|p| ffi_type(&p.ty, enums)).collect();
    let mut out = format!("unsafe extern \"system\" fn({})", params.join(", "));
    if let Some(ret) = ffi_return_type(&d.return_type, enums) {
        out.push_str(" -> ");
        out.push_str(&ret);
    }
    out
}

/// Full wrapper signature, without the body.
pub fn wrapper_signature(
    rust_name: &str,
    generics: &[String],
    params: &[(String, String)],
    return_type: Option<&str>,
    is_unsafe: bool,
) -> String {
    let mut sig = String::from("pub ");
    if is_unsafe {
        sig.push_str("unsafe ");
    }
    sig.push_str("fn ");
    sig.push_str(rust_name);
    if !generics.is_empty() {
        let bounds: Vec<String> = generics.iter().map(|g| format!("{g}: Copy")).collect();
        sig.push_str(&format!("<{}>", bounds.join(", ")));
    }
    let list: Vec<String> = params.iter().map(|(n, t)| format!("{n}: {t}")).collect();
    sig.push_str(&format!("({})", list.join(", ")));
    if let Some(ret) = return_type {
        sig.push_str(" -> ");
        sig.push_str(ret);
    }
    sig
}
