// Specification type name -> Rust type mapping.

use std::collections::BTreeMap;

use crate::schema::{EnumInfo, TypeInfo};

/// What a specification type name denotes on the Rust side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Fixed-width scalar (`i32`, `f32`, ...).
    Primitive(&'static str),
    Bool,
    Void,
    /// Opaque native pointer (`IntPtr`).
    OpaquePointer,
    String,
    /// Exported enum; carries the backing integer.
    Enum { name: String, repr: &'static str },
    /// Anything else is a generic type parameter of the wrapper.
    Generic(String),
}

/// Map a primitive type name to its Rust scalar.
pub fn primitive(name: &str) -> Option<&'static str> {
    Some(match name {
        "sbyte" | "int8" => "i8",
        "byte" | "uint8" | "char" => "u8",
        "short" | "int16" => "i16",
        "ushort" | "uint16" => "u16",
        "int" | "int32" => "i32",
        "uint" | "uint32" => "u32",
        "long" | "int64" => "i64",
        "ulong" | "uint64" => "u64",
        "float" | "single" => "f32",
        "double" => "f64",
        "nint" => "isize",
        "nuint" => "usize",
        _ => return None,
    })
}

/// Backing integer of an enum, from its declared underlying type.
pub fn enum_repr(e: &EnumInfo) -> &'static str {
    primitive(&e.underlying_type).unwrap_or("u32")
}

pub fn kind_of(ty: &TypeInfo, enums: &BTreeMap<String, EnumInfo>) -> TypeKind {
    if ty.is_enum || enums.contains_key(&ty.name) {
        let repr = enums.get(&ty.name).map(enum_repr).unwrap_or("u32");
        return TypeKind::Enum {
            name: ty.name.clone(),
            repr,
        };
    }
    match ty.name.as_str() {
        "void" => TypeKind::Void,
        "bool" => TypeKind::Bool,
        "IntPtr" | "UIntPtr" => TypeKind::OpaquePointer,
        n if n.eq_ignore_ascii_case("string") => TypeKind::String,
        n => match primitive(n) {
            Some(p) => TypeKind::Primitive(p),
            None => TypeKind::Generic(n.to_string()),
        },
    }
}

/// Rust type of one element of `ty` on the wrapper side, ignoring indirection.
pub fn rust_base(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Primitive(p) => (*p).to_string(),
        TypeKind::Bool => "bool".into(),
        TypeKind::Void => "std::ffi::c_void".into(),
        TypeKind::OpaquePointer => "*mut std::ffi::c_void".into(),
        TypeKind::String => "std::ffi::c_char".into(),
        TypeKind::Enum { name, .. } => name.clone(),
        TypeKind::Generic(name) => name.clone(),
    }
}

/// Rust type of one element of `ty` at the native boundary, ignoring
/// indirection. Enums and booleans cross as integers.
pub fn ffi_base(kind: &TypeKind) -> String {
    match kind {
        TypeKind::Primitive(p) => (*p).to_string(),
        TypeKind::Bool => "u8".into(),
        TypeKind::Void | TypeKind::Generic(_) => "std::ffi::c_void".into(),
        TypeKind::OpaquePointer => "*mut std::ffi::c_void".into(),
        TypeKind::String => "std::ffi::c_char".into(),
        TypeKind::Enum { repr, .. } => (*repr).to_string(),
    }
}
