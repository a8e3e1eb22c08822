//! Client for the `users.yaml` test fixture, regenerated on every build
//!
//! The module is whatever `skein-codegen` emits for the fixture right now,
//! so a change to the generator that produces uncompilable Rust breaks this
//! crate's build, and a codec that stops being its own inverse breaks its
//! tests.

include!(concat!(env!("OUT_DIR"), "/users_api_mod.rs"));

pub use users_api::*;
