//! Use case orchestration for posture.
//!
//! This crate provides the application layer: the policy acquisition core (`policy`) and the
//! `fetch` use case that wires it to configured sources and the cache. The CLI crate depends on
//! this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod envelope;
mod fetch;
pub mod policy;

pub use envelope::{parse_envelope, serialize_envelope, summarize};
pub use fetch::{build_cache, build_getters, run_fetch, FetchInput, FetchOutput};
pub use policy::{PolicyError, PolicyHandler, ScanKind};
