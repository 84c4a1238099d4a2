//! Bindings generated by glbind from the codegen test fixture.
//!
//! `build.rs` runs the generator into `OUT_DIR`; the tests resolve the
//! entry points against in-process fakes and call the generated wrappers.

#![allow(dead_code, clippy::all)]

include!(concat!(env!("OUT_DIR"), "/bindings.rs"));
