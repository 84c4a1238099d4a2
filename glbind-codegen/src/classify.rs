// Parameter classifier: pick the marshaling action for one parameter.
//
// Rules are tried in order and the first match wins:
//   1. pinned generic                      -> HandlePin
//   2. pinned pointer / array / reference  -> AddressPin
//   3. out string                          -> StackStringBuffer
//   4. in string (not a string array)      -> DirectString
//   5. enum that is out or a pointer       -> EnumAsIntStorage
//   6. anything else                       -> PassThrough
// A parameter that needs pinning but matches neither 1 nor 2 is an error.

use crate::error::SynthError;
use crate::naming;
use crate::schema::{Flow, MAX_INDIRECTION, ParamInfo, WrapperTypes};

/// How a handle pin holds its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleKind {
    /// Heap copy of a single value; writes are copied back explicitly.
    Boxed,
    /// Read-only slice, borrowed in place.
    Slice,
    /// Writable slice, borrowed in place.
    SliceMut,
}

/// Reinterpretation applied to a pinned address before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinCast {
    None,
    /// The pointee is itself an opaque pointer.
    OpaquePointer,
    /// Enum storage crosses as 32-bit integers.
    IntStorage,
}

/// Where an output string buffer gets its capacity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Capacity {
    /// Runtime value of this sibling parameter (specification name).
    Sibling(String),
    /// [`DEFAULT_BUFFER_CAPACITY`].
    Default,
}

/// Capacity of an output string buffer with no size sibling.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Marshal {
    HandlePin {
        kind: HandleKind,
        assign_back: bool,
    },
    AddressPin {
        /// Borrowed as a slice (array) rather than a single reference.
        slice: bool,
        mutable: bool,
        assign_back: bool,
        cast: PinCast,
    },
    StackStringBuffer {
        /// Local holding the buffer.
        buffer: String,
        capacity: Capacity,
    },
    DirectString,
    EnumAsIntStorage,
    PassThrough,
}

/// Classify `param`, whose owning function has the parameter list `siblings`
/// (which includes `param` itself).
pub fn classify(param: &ParamInfo, siblings: &[ParamInfo]) -> Result<Marshal, SynthError> {
    let depth = param.ty.pointer.max(param.ty.array);
    if depth > MAX_INDIRECTION {
        return Err(SynthError::IndirectionTooDeep {
            param: param.name.clone(),
            depth,
        });
    }

    let writes_back = param.flow.writes_back();

    if param.needs_pin() {
        // Generic alongside array/pointer/reference still takes a handle.
        if param.wrapper.contains(WrapperTypes::GENERIC) {
            let kind = match (param.ty.array > 0, writes_back) {
                (false, _) => HandleKind::Boxed,
                (true, false) => HandleKind::Slice,
                (true, true) => HandleKind::SliceMut,
            };
            return Ok(Marshal::HandlePin {
                kind,
                // Slices are written in place; only boxed copies need copying back.
                assign_back: writes_back && param.reference && kind == HandleKind::Boxed,
            });
        }

        let addressable = WrapperTypes::POINTER | WrapperTypes::ARRAY | WrapperTypes::REFERENCE;
        if param.wrapper.intersects(addressable) {
            let cast = if param.ty.name == "IntPtr" {
                PinCast::OpaquePointer
            } else if param.ty.is_enum {
                PinCast::IntStorage
            } else {
                PinCast::None
            };
            return Ok(Marshal::AddressPin {
                slice: param.ty.array > 0,
                mutable: writes_back,
                assign_back: writes_back && param.reference && param.ty.array == 0,
                cast,
            });
        }

        return Err(SynthError::UnknownWrapper {
            param: param.name.clone(),
            wrapper: param.wrapper,
        });
    }

    if param.flow == Flow::Out && param.ty.is_string() {
        let capacity = match find_buffer_size_param(siblings, &param.name) {
            Some(sibling) => Capacity::Sibling(sibling.name.clone()),
            None => Capacity::Default,
        };
        let rust_name = naming::param_name(&param.name);
        return Ok(Marshal::StackStringBuffer {
            buffer: format!("c_{}", naming::strip_raw_prefix(&rust_name)),
            capacity,
        });
    }

    if param.flow == Flow::In
        && param.ty.is_string()
        && !param.wrapper.contains(WrapperTypes::STRING_ARRAY)
    {
        return Ok(Marshal::DirectString);
    }

    if param.ty.is_enum && (param.flow == Flow::Out || param.ty.pointer > 0) {
        return Ok(Marshal::EnumAsIntStorage);
    }

    Ok(Marshal::PassThrough)
}

/// Find the sibling carrying an output buffer's size.
///
/// Two explicit steps: a parameter named `bufsize`, then one named
/// `<name>Length`, both compared case-insensitively. The parameter itself is
/// never its own size.
pub fn find_buffer_size_param<'a>(params: &'a [ParamInfo], name: &str) -> Option<&'a ParamInfo> {
    find_sibling(params, name, "bufsize")
        .or_else(|| find_sibling(params, name, &format!("{name}Length")))
}

fn find_sibling<'a>(params: &'a [ParamInfo], exclude: &str, expected: &str) -> Option<&'a ParamInfo> {
    params
        .iter()
        .find(|p| p.name != exclude && p.name.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeInfo;

    fn param(name: &str, ty: &str, flow: Flow, wrapper: WrapperTypes) -> ParamInfo {
        ParamInfo {
            name: name.into(),
            ty: TypeInfo::named(ty),
            flow,
            wrapper,
            reference: false,
            size_hint: None,
        }
    }

    fn classify_alone(p: &ParamInfo) -> Marshal {
        classify(p, std::slice::from_ref(p)).unwrap()
    }

    #[test]
    fn generic_reference_out_is_a_boxed_handle_pin_with_assign_back() {
        let mut p = param("data", "T2", Flow::Out, WrapperTypes::GENERIC | WrapperTypes::REFERENCE);
        p.reference = true;
        assert_eq!(
            classify_alone(&p),
            Marshal::HandlePin { kind: HandleKind::Boxed, assign_back: true }
        );
        p.flow = Flow::In;
        assert_eq!(
            classify_alone(&p),
            Marshal::HandlePin { kind: HandleKind::Boxed, assign_back: false }
        );
    }

    #[test]
    fn generic_array_pins_the_slice_in_place() {
        let mut p = param("data", "T2", Flow::Undefined, WrapperTypes::GENERIC | WrapperTypes::ARRAY);
        p.ty.array = 1;
        p.reference = true;
        assert_eq!(
            classify_alone(&p),
            Marshal::HandlePin { kind: HandleKind::SliceMut, assign_back: false }
        );
    }

    #[test]
    fn generic_wins_over_address_categories() {
        let mut p = param(
            "data",
            "T0",
            Flow::In,
            WrapperTypes::GENERIC | WrapperTypes::POINTER | WrapperTypes::ARRAY,
        );
        p.ty.array = 1;
        assert!(matches!(classify_alone(&p), Marshal::HandlePin { .. }));
    }

    #[test]
    fn pointer_array_out_pins_without_assign_back() {
        // Query(TypeEnum* results): contents are addressed in place.
        let mut p = param("results", "TypeEnum", Flow::Out, WrapperTypes::ARRAY | WrapperTypes::POINTER);
        p.ty.array = 1;
        p.ty.pointer = 1;
        p.ty.is_enum = true;
        assert_eq!(
            classify_alone(&p),
            Marshal::AddressPin {
                slice: true,
                mutable: true,
                assign_back: false,
                cast: PinCast::IntStorage,
            }
        );
    }

    #[test]
    fn reference_out_pins_with_assign_back() {
        let mut p = param("value", "int", Flow::Out, WrapperTypes::REFERENCE);
        p.reference = true;
        assert_eq!(
            classify_alone(&p),
            Marshal::AddressPin { slice: false, mutable: true, assign_back: true, cast: PinCast::None }
        );
    }

    #[test]
    fn opaque_pointer_pin_gets_a_pointer_cast() {
        let mut p = param("handles", "IntPtr", Flow::In, WrapperTypes::ARRAY);
        p.ty.array = 1;
        assert!(matches!(
            classify_alone(&p),
            Marshal::AddressPin { cast: PinCast::OpaquePointer, .. }
        ));
    }

    #[test]
    fn pinned_plain_parameter_is_an_error() {
        let mut p = param("x", "float", Flow::In, WrapperTypes::empty());
        p.ty.array = 1;
        assert_eq!(
            classify(&p, std::slice::from_ref(&p)),
            Err(SynthError::UnknownWrapper { param: "x".into(), wrapper: WrapperTypes::empty() })
        );
    }

    #[test]
    fn indirection_beyond_four_is_an_error() {
        let mut p = param("x", "float", Flow::In, WrapperTypes::POINTER);
        p.ty.pointer = 5;
        assert!(matches!(
            classify(&p, std::slice::from_ref(&p)),
            Err(SynthError::IndirectionTooDeep { depth: 5, .. })
        ));
    }

    #[test]
    fn out_string_uses_buf_size_sibling() {
        let params = vec![
            param("name", "String", Flow::Out, WrapperTypes::STRING),
            param("bufSize", "int", Flow::In, WrapperTypes::empty()),
        ];
        assert_eq!(
            classify(&params[0], &params).unwrap(),
            Marshal::StackStringBuffer {
                buffer: "c_name".into(),
                capacity: Capacity::Sibling("bufSize".into()),
            }
        );
    }

    #[test]
    fn out_string_falls_back_to_name_length_then_default() {
        let params = vec![
            param("infoLog", "String", Flow::Out, WrapperTypes::STRING),
            param("INFOLOGLENGTH", "int", Flow::In, WrapperTypes::empty()),
        ];
        assert!(matches!(
            classify(&params[0], &params).unwrap(),
            Marshal::StackStringBuffer { capacity: Capacity::Sibling(ref s), .. } if s == "INFOLOGLENGTH"
        ));

        let alone = param("label", "String", Flow::Out, WrapperTypes::STRING);
        assert!(matches!(
            classify_alone(&alone),
            Marshal::StackStringBuffer { capacity: Capacity::Default, .. }
        ));
    }

    #[test]
    fn buffer_name_drops_raw_identifier_prefix() {
        let p = param("ref", "String", Flow::Out, WrapperTypes::STRING);
        assert!(matches!(
            classify_alone(&p),
            Marshal::StackStringBuffer { ref buffer, .. } if buffer == "c_ref"
        ));
    }

    #[test]
    fn string_lookup_is_two_explicit_steps() {
        let params = vec![
            param("name", "String", Flow::Out, WrapperTypes::STRING),
            param("nameLength", "int", Flow::In, WrapperTypes::empty()),
            param("bufsize", "int", Flow::In, WrapperTypes::empty()),
        ];
        assert_eq!(find_buffer_size_param(&params, "name").unwrap().name, "bufsize");
        assert_eq!(find_buffer_size_param(&params[..2], "name").unwrap().name, "nameLength");
        assert!(find_buffer_size_param(&params[..1], "name").is_none());
    }

    #[test]
    fn in_string_is_direct_but_string_arrays_are_not() {
        let p = param("source", "String", Flow::In, WrapperTypes::STRING);
        assert_eq!(classify_alone(&p), Marshal::DirectString);
        let mut arr = param("sources", "String", Flow::In, WrapperTypes::STRING_ARRAY);
        arr.ty.pointer = 1;
        assert_eq!(classify_alone(&arr), Marshal::PassThrough);
    }

    #[test]
    fn enum_storage_applies_to_out_or_pointer_enums() {
        let mut p = param("pname", "GetPName", Flow::In, WrapperTypes::empty());
        p.ty.is_enum = true;
        assert_eq!(classify_alone(&p), Marshal::PassThrough);
        p.flow = Flow::Out;
        assert_eq!(classify_alone(&p), Marshal::EnumAsIntStorage);
        p.flow = Flow::In;
        p.ty.pointer = 1;
        p.wrapper = WrapperTypes::POINTER;
        assert_eq!(classify_alone(&p), Marshal::EnumAsIntStorage);
    }

    #[test]
    fn plain_values_pass_through() {
        let p = param("count", "int", Flow::In, WrapperTypes::empty());
        assert_eq!(classify_alone(&p), Marshal::PassThrough);
        let mut ptr = param("indices", "void", Flow::In, WrapperTypes::POINTER);
        ptr.ty.pointer = 1;
        assert_eq!(classify_alone(&ptr), Marshal::PassThrough);
    }
}
