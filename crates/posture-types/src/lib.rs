//! Stable DTOs and IDs used across the posture workspace.
//!
//! This crate is intentionally boring:
//! - policy request types (kinds, identifiers, notifications)
//! - opaque policy artifacts (frameworks, controls, exceptions, controls-inputs)
//! - the scan session object and the envelope it is written in
//! - stable string IDs and file names

#![forbid(unsafe_code)]

pub mod artifact;
pub mod envelope;
pub mod ids;
pub mod request;
pub mod session;

pub use artifact::{Control, ControlsInputs, Exception, Framework};
pub use envelope::{PolicySetEnvelope, ToolMeta, SCHEMA_POLICY_SET_V1};
pub use request::{ParseKindError, PolicyIdentifier, PolicyKind, PolicyNotification};
pub use session::ScanPolicySet;
