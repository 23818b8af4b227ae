//! Single-file overlay getters and the JSON file helpers shared with [`crate::LocalSource`].

use crate::{ControlsInputsGetter, ExceptionsGetter, SourceError};
use camino::{Utf8Path, Utf8PathBuf};
use posture_types::{ControlsInputs, Exception};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Exceptions loaded from one JSON file (a list of exceptions). Scope is ignored.
#[derive(Clone, Debug)]
pub struct FileExceptions {
    path: Utf8PathBuf,
}

impl FileExceptions {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ExceptionsGetter for FileExceptions {
    fn get_exceptions(&self, _scope: &str) -> Result<Vec<Exception>, SourceError> {
        read_json(&self.path)
    }
}

/// Controls-inputs loaded from one JSON file. Scope is ignored.
///
/// Accepts either a plain key/value object or an account configuration document of the shape
/// `{"settings": {"postureControlInputs": {...}}}`.
#[derive(Clone, Debug)]
pub struct FileControlsInputs {
    path: Utf8PathBuf,
}

impl FileControlsInputs {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ControlsInputsGetter for FileControlsInputs {
    fn get_controls_inputs(&self, _scope: &str) -> Result<ControlsInputs, SourceError> {
        read_controls_inputs(&self.path)
    }
}

#[derive(Deserialize)]
struct AccountConfig {
    settings: AccountSettings,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountSettings {
    posture_control_inputs: ControlsInputs,
}

pub(crate) fn read_controls_inputs(path: &Utf8Path) -> Result<ControlsInputs, SourceError> {
    let value: serde_json::Value = read_json(path)?;
    let is_account_config = value
        .get("settings")
        .is_some_and(|s| s.get("postureControlInputs").is_some());
    if is_account_config {
        let cfg: AccountConfig =
            serde_json::from_value(value).map_err(|source| parse_error(path, source))?;
        return Ok(cfg.settings.posture_control_inputs);
    }
    serde_json::from_value(value).map_err(|source| parse_error(path, source))
}

/// Read and parse `path`; a missing file is an error.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Result<T, SourceError> {
    let text = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| parse_error(path, source))
}

/// Read and parse `path`; a missing file is `Ok(None)`.
pub(crate) fn read_optional_json<T: DeserializeOwned>(
    path: &Utf8Path,
) -> Result<Option<T>, SourceError> {
    match read_json(path) {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

pub(crate) fn parse_error(path: &Utf8Path, source: serde_json::Error) -> SourceError {
    SourceError::Parse {
        what: path.to_string(),
        source,
    }
}
