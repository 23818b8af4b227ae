//! Policy source adapters.
//!
//! A policy source answers four questions: give me framework `X`, give me control `Y`, give me
//! the exceptions for scope `S`, give me the controls-inputs for scope `S`. The acquisition core
//! only sees the traits below; backends are free to do network or filesystem IO.
//!
//! `Ok(None)` from a framework/control fetch means "the source has no such artifact" and is not
//! an error.

#![forbid(unsafe_code)]

mod error;
mod file;
mod http;
mod local;
mod memory;

use posture_types::{Control, ControlsInputs, Exception, Framework, ids};
use std::sync::Arc;

pub use error::SourceError;
pub use file::{FileControlsInputs, FileExceptions};
pub use http::{HttpSource, DEFAULT_TIMEOUT};
pub use local::LocalSource;
pub use memory::{MemorySource, SourceCall};

pub trait PolicyGetter {
    fn get_framework(&self, name: &str) -> Result<Option<Framework>, SourceError>;
    fn get_control(&self, name: &str) -> Result<Option<Control>, SourceError>;
}

pub trait ExceptionsGetter {
    fn get_exceptions(&self, scope: &str) -> Result<Vec<Exception>, SourceError>;
}

pub trait ControlsInputsGetter {
    fn get_controls_inputs(&self, scope: &str) -> Result<ControlsInputs, SourceError>;
}

impl<T: PolicyGetter + ?Sized> PolicyGetter for Arc<T> {
    fn get_framework(&self, name: &str) -> Result<Option<Framework>, SourceError> {
        (**self).get_framework(name)
    }

    fn get_control(&self, name: &str) -> Result<Option<Control>, SourceError> {
        (**self).get_control(name)
    }
}

impl<T: ExceptionsGetter + ?Sized> ExceptionsGetter for Arc<T> {
    fn get_exceptions(&self, scope: &str) -> Result<Vec<Exception>, SourceError> {
        (**self).get_exceptions(scope)
    }
}

impl<T: ControlsInputsGetter + ?Sized> ControlsInputsGetter for Arc<T> {
    fn get_controls_inputs(&self, scope: &str) -> Result<ControlsInputs, SourceError> {
        (**self).get_controls_inputs(scope)
    }
}

/// The full capability set handed to the policy handler.
///
/// Overlays may come from a different backend than the policies themselves (for example
/// frameworks from the remote API but exceptions from a local file).
pub struct Getters {
    pub policy: Box<dyn PolicyGetter>,
    pub exceptions: Box<dyn ExceptionsGetter>,
    pub controls_inputs: Box<dyn ControlsInputsGetter>,
}

impl Getters {
    /// Use one backend for all three capabilities.
    pub fn uniform<S>(source: Arc<S>) -> Self
    where
        S: PolicyGetter + ExceptionsGetter + ControlsInputsGetter + 'static,
    {
        Self {
            policy: Box::new(Arc::clone(&source)),
            exceptions: Box::new(Arc::clone(&source)),
            controls_inputs: Box::new(source),
        }
    }

    pub fn with_exceptions(mut self, getter: impl ExceptionsGetter + 'static) -> Self {
        self.exceptions = Box::new(getter);
        self
    }

    pub fn with_controls_inputs(mut self, getter: impl ControlsInputsGetter + 'static) -> Self {
        self.controls_inputs = Box::new(getter);
        self
    }
}

/// Reject names that cannot safely become a file name or URL path segment.
pub(crate) fn validate_name(name: &str) -> Result<(), SourceError> {
    if !ids::is_safe_artifact_name(name) {
        return Err(SourceError::InvalidName(name.to_string()));
    }
    Ok(())
}
