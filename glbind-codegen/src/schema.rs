// JSON schema types for the specification model handed over by the parser.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer};

// ---------------------------------------------------------------------------
// Top-level file
// ---------------------------------------------------------------------------

#[derive(Deserialize, Clone, Default)]
pub struct SpecFile {
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub delegates: Vec<DelegateInfo>,
    #[serde(default)]
    pub enums: Vec<EnumInfo>,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Deepest pointer or array nesting a parameter may declare.
pub const MAX_INDIRECTION: u8 = 4;

/// A type reference as written in the specification.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TypeInfo {
    pub name: String,
    #[serde(default)]
    pub pointer: u8,
    #[serde(default)]
    pub array: u8,
    #[serde(default)]
    pub is_enum: bool,
}

impl TypeInfo {
    pub fn named(name: &str) -> Self {
        TypeInfo {
            name: name.to_string(),
            pointer: 0,
            array: 0,
            is_enum: false,
        }
    }

    pub fn is_void(&self) -> bool {
        self.name == "void" && self.pointer == 0 && self.array == 0
    }

    pub fn is_string(&self) -> bool {
        self.name.eq_ignore_ascii_case("string")
    }

    /// Total levels of indirection (pointers plus array ranks).
    pub fn levels(&self) -> u8 {
        self.pointer.saturating_add(self.array)
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    #[default]
    In,
    Out,
    /// In and out, or unknown.
    Undefined,
}

impl Flow {
    /// Out or Undefined: the caller may observe writes.
    pub fn writes_back(self) -> bool {
        matches!(self, Flow::Out | Flow::Undefined)
    }
}

bitflags! {
    /// Shape categories of a wrapper parameter. A parameter may carry several;
    /// `Plain` is the empty set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct WrapperTypes: u8 {
        const GENERIC      = 1 << 0;
        const POINTER      = 1 << 1;
        const ARRAY        = 1 << 2;
        const REFERENCE    = 1 << 3;
        const STRING       = 1 << 4;
        const STRING_ARRAY = 1 << 5;
    }
}

impl WrapperTypes {
    /// True only when the set equals `other`. Use `contains` for "has
    /// `other` among others".
    pub fn is_exactly(self, other: WrapperTypes) -> bool {
        self == other
    }

    pub fn is_plain(self) -> bool {
        self.is_empty()
    }

    pub fn from_category(name: &str) -> Option<WrapperTypes> {
        Some(match name {
            "plain" => WrapperTypes::empty(),
            "generic" => WrapperTypes::GENERIC,
            "pointer" => WrapperTypes::POINTER,
            "array" => WrapperTypes::ARRAY,
            "reference" => WrapperTypes::REFERENCE,
            "string" => WrapperTypes::STRING,
            "string_array" => WrapperTypes::STRING_ARRAY,
            _ => return None,
        })
    }
}

/// Where a buffer parameter's length comes from.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SizeHint {
    Count(u32),
    /// Name of a sibling parameter carrying the runtime length.
    Param(String),
    /// Computed from several parameters by the native side.
    Computed(Vec<String>),
}

#[derive(Deserialize, Clone, Debug)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeInfo,
    #[serde(default)]
    pub flow: Flow,
    #[serde(default, deserialize_with = "deser_wrapper_types")]
    pub wrapper: WrapperTypes,
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub size_hint: Option<SizeHint>,
}

impl ParamInfo {
    /// Host memory must stay put for the duration of the call: arrays,
    /// references and generic values, except strings which marshal on their own.
    pub fn needs_pin(&self) -> bool {
        (self.ty.array > 0 || self.reference || self.wrapper.contains(WrapperTypes::GENERIC))
            && !self.ty.is_string()
    }
}

// ---------------------------------------------------------------------------
// Functions
// ---------------------------------------------------------------------------

/// How the error-query instrumentation treats a function.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCheckMode {
    #[default]
    Checked,
    /// The error-query entry point itself.
    Exempt,
    /// Opens a region in which the native API forbids error queries.
    Suspend,
    /// Closes that region.
    Resume,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ParamDoc {
    pub name: String,
    #[serde(default)]
    pub doc: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct FunctionDocs {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub params: Vec<ParamDoc>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct FunctionInfo {
    pub name: String,
    /// Name without type suffixes; the wrapper is named after this.
    #[serde(default)]
    pub trimmed_name: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub version: String,
    pub delegate: String,
    pub return_type: TypeInfo,
    #[serde(default)]
    pub params: Vec<ParamInfo>,
    /// Wrapper is declared `unsafe` by the producer.
    #[serde(default)]
    pub unsafe_scope: bool,
    #[serde(default)]
    pub error_check: ErrorCheckMode,
    #[serde(default)]
    pub deprecated_version: Option<String>,
    #[serde(default)]
    pub obsolete: Option<String>,
    #[serde(default)]
    pub docs: Option<FunctionDocs>,
}

fn default_group() -> String {
    "core".to_string()
}

impl FunctionInfo {
    pub fn display_name(&self) -> &str {
        if self.trimmed_name.is_empty() {
            &self.name
        } else {
            &self.trimmed_name
        }
    }
}

// ---------------------------------------------------------------------------
// Delegates (raw native signatures)
// ---------------------------------------------------------------------------

#[derive(Deserialize, Clone, Debug)]
pub struct DelegateParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeInfo,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DelegateInfo {
    pub name: String,
    /// Native symbol without the function prefix.
    pub entry_point: String,
    pub return_type: TypeInfo,
    #[serde(default)]
    pub params: Vec<DelegateParam>,
    /// Another delegate that already holds this symbol's slot.
    #[serde(default)]
    pub alias_of: Option<String>,
}

impl DelegateInfo {
    pub fn requires_slot(&self) -> bool {
        self.alias_of.is_none()
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

#[derive(Deserialize, Clone, Debug)]
pub struct EnumInfo {
    pub name: String,
    #[serde(default = "default_underlying")]
    pub underlying_type: String,
    #[serde(default)]
    pub flags: bool,
    #[serde(default)]
    pub constants: Vec<(String, i64)>,
}

fn default_underlying() -> String {
    "uint".to_string()
}

// ---------------------------------------------------------------------------
// Serde helpers: wrapper categories arrive as a list of names.
// ---------------------------------------------------------------------------

fn deser_wrapper_types<'de, D: Deserializer<'de>>(d: D) -> Result<WrapperTypes, D::Error> {
    let names = Vec::<String>::deserialize(d)?;
    let mut set = WrapperTypes::empty();
    for name in &names {
        let flag = WrapperTypes::from_category(name).ok_or_else(|| {
            serde::de::Error::unknown_variant(
                name,
                &["plain", "generic", "pointer", "array", "reference", "string", "string_array"],
            )
        })?;
        set |= flag;
    }
    Ok(set)
}
