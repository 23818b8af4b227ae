use crate::{ControlsInputsGetter, ExceptionsGetter, PolicyGetter, SourceError};
use posture_types::{Control, ControlsInputs, Exception, Framework};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

/// One recorded call against a [`MemorySource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceCall {
    Framework(String),
    Control(String),
    Exceptions(String),
    ControlsInputs(String),
}

/// In-memory source for embedding and tests.
///
/// Every call is recorded in order. Names registered with [`MemorySource::fail_on`] return
/// [`SourceError::Unavailable`]; unknown names return `Ok(None)`. Overlays that were never
/// configured return an error, like a backend that has nothing for the scope.
#[derive(Debug, Default)]
pub struct MemorySource {
    frameworks: BTreeMap<String, Framework>,
    controls: BTreeMap<String, Control>,
    exceptions: Option<Vec<Exception>>,
    controls_inputs: Option<ControlsInputs>,
    failing: BTreeSet<String>,
    fail_overlays: bool,
    calls: Mutex<Vec<SourceCall>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `framework` under its own name.
    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.frameworks.insert(framework.name.clone(), framework);
        self
    }

    /// Serve `control` under `name`.
    pub fn with_control(mut self, name: impl Into<String>, control: Control) -> Self {
        self.controls.insert(name.into(), control);
        self
    }

    pub fn with_exceptions(mut self, exceptions: Vec<Exception>) -> Self {
        self.exceptions = Some(exceptions);
        self
    }

    pub fn with_controls_inputs(mut self, inputs: ControlsInputs) -> Self {
        self.controls_inputs = Some(inputs);
        self
    }

    /// Make framework and control fetches for `name` fail.
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Make both overlay fetches fail even when configured.
    pub fn fail_overlays(mut self) -> Self {
        self.fail_overlays = true;
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: SourceCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn check_failing(&self, name: &str) -> Result<(), SourceError> {
        if self.failing.contains(name) {
            return Err(SourceError::Unavailable(format!("injected failure for {name}")));
        }
        Ok(())
    }
}

impl PolicyGetter for MemorySource {
    fn get_framework(&self, name: &str) -> Result<Option<Framework>, SourceError> {
        self.record(SourceCall::Framework(name.to_string()));
        self.check_failing(name)?;
        Ok(self.frameworks.get(name).cloned())
    }

    fn get_control(&self, name: &str) -> Result<Option<Control>, SourceError> {
        self.record(SourceCall::Control(name.to_string()));
        self.check_failing(name)?;
        Ok(self.controls.get(name).cloned())
    }
}

impl ExceptionsGetter for MemorySource {
    fn get_exceptions(&self, scope: &str) -> Result<Vec<Exception>, SourceError> {
        self.record(SourceCall::Exceptions(scope.to_string()));
        match &self.exceptions {
            Some(exceptions) if !self.fail_overlays => Ok(exceptions.clone()),
            _ => Err(SourceError::Unavailable(format!("no exceptions for {scope:?}"))),
        }
    }
}

impl ControlsInputsGetter for MemorySource {
    fn get_controls_inputs(&self, scope: &str) -> Result<ControlsInputs, SourceError> {
        self.record(SourceCall::ControlsInputs(scope.to_string()));
        match &self.controls_inputs {
            Some(inputs) if !self.fail_overlays => Ok(inputs.clone()),
            _ => Err(SourceError::Unavailable(format!(
                "no controls-inputs for {scope:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_are_not_errors() {
        let source = MemorySource::new();
        assert!(source.get_framework("nsa").expect("fetch").is_none());
        assert!(source.get_control("C-0001").expect("fetch").is_none());
    }

    #[test]
    fn injected_failures_and_call_log() {
        let source = MemorySource::new()
            .with_framework(Framework::new("nsa", Vec::new()))
            .fail_on("mitre");

        assert!(source.get_framework("nsa").expect("fetch").is_some());
        assert!(source.get_framework("mitre").is_err());
        assert_eq!(
            source.calls(),
            vec![
                SourceCall::Framework("nsa".to_string()),
                SourceCall::Framework("mitre".to_string()),
            ]
        );
    }

    #[test]
    fn overlays_fail_when_unconfigured_or_forced() {
        let source = MemorySource::new();
        assert!(source.get_exceptions("prod").is_err());
        assert!(source.get_controls_inputs("prod").is_err());

        let forced = MemorySource::new()
            .with_exceptions(Vec::new())
            .with_controls_inputs(ControlsInputs::default())
            .fail_overlays();
        assert!(forced.get_exceptions("prod").is_err());
        assert!(forced.get_controls_inputs("prod").is_err());
    }
}
