use crate::file::{parse_error, read_controls_inputs, read_json, read_optional_json};
use crate::{ControlsInputsGetter, ExceptionsGetter, PolicyGetter, SourceError, validate_name};
use camino::{Utf8Path, Utf8PathBuf};
use posture_types::{Control, ControlsInputs, Exception, Framework, ids};
use serde_json::Value;

/// Policies loaded from a local directory.
///
/// The layout matches the cache (`<name>.json` per artifact), so a previously populated cache
/// directory works as an offline source. Overlays live in `exceptions.json` and
/// `controls-inputs.json`; the scope argument is ignored.
#[derive(Clone, Debug)]
pub struct LocalSource {
    dir: Utf8PathBuf,
}

impl LocalSource {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn artifact_path(&self, name: &str) -> Utf8PathBuf {
        self.dir.join(ids::cache_file_name(name))
    }

    /// Search every framework file in the directory for a control with `control_id`.
    ///
    /// Files are visited in lexicographic order; files that are not frameworks are skipped.
    fn find_control_in_frameworks(&self, control_id: &str) -> Result<Option<Control>, SourceError> {
        let entries = self.dir.read_dir_utf8().map_err(|source| SourceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut paths: Vec<Utf8PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path().to_path_buf())
            .filter(|p| p.extension() == Some(ids::CACHE_EXTENSION))
            .filter(|p| {
                !matches!(
                    p.file_name(),
                    Some(ids::EXCEPTIONS_FILE) | Some(ids::CONTROLS_INPUTS_FILE)
                )
            })
            .collect();
        paths.sort();

        for path in paths {
            let framework: Framework = match read_json(&path) {
                Ok(fw) => fw,
                Err(err) => {
                    tracing::debug!(file = %path, error = %err, "skipping non-framework file");
                    continue;
                }
            };
            if let Some(control) = framework.find_control(control_id) {
                return Ok(Some(control.clone()));
            }
        }
        Ok(None)
    }
}

impl PolicyGetter for LocalSource {
    fn get_framework(&self, name: &str) -> Result<Option<Framework>, SourceError> {
        validate_name(name)?;
        let path = self.artifact_path(name);
        let Some(value) = read_optional_json::<Value>(&path)? else {
            return Ok(None);
        };
        if is_control_document(&value) {
            tracing::debug!(file = %path, "file holds a control, not a framework");
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| parse_error(&path, source))
    }

    fn get_control(&self, name: &str) -> Result<Option<Control>, SourceError> {
        validate_name(name)?;
        let path = self.artifact_path(name);
        if let Some(value) = read_optional_json::<Value>(&path)? {
            if is_control_document(&value) {
                return serde_json::from_value(value)
                    .map(Some)
                    .map_err(|source| parse_error(&path, source));
            }
            tracing::debug!(file = %path, "file is not a control, searching frameworks");
        }
        if !self.dir.is_dir() {
            return Ok(None);
        }
        self.find_control_in_frameworks(name)
    }
}

/// A control carries a string `controlID` and no `controls` list of its own.
fn is_control_document(value: &Value) -> bool {
    value.get("controlID").is_some_and(Value::is_string)
        && !value.get("controls").is_some_and(Value::is_array)
}

impl ExceptionsGetter for LocalSource {
    fn get_exceptions(&self, _scope: &str) -> Result<Vec<Exception>, SourceError> {
        read_json(&self.dir.join(ids::EXCEPTIONS_FILE))
    }
}

impl ControlsInputsGetter for LocalSource {
    fn get_controls_inputs(&self, _scope: &str) -> Result<ControlsInputs, SourceError> {
        read_controls_inputs(&self.dir.join(ids::CONTROLS_INPUTS_FILE))
    }
}
