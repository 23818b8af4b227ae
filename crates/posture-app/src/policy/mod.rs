//! Policy acquisition core.
//!
//! Resolve the scan kind, fetch every requested artifact in order (failing fast), cache each one,
//! then attach the optional overlays on a best-effort basis.

mod aggregate;
mod error;
mod handler;
mod kind;
mod overlay;

pub use aggregate::aggregate;
pub use error::PolicyError;
pub use handler::PolicyHandler;
pub use kind::{scan_kind, ScanKind};
pub use overlay::{load_overlays, Overlays};

#[cfg(test)]
mod tests;
