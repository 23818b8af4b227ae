//! Shared test utilities for the posture workspace.
//!
//! Fixture builders are needed by tests in several crates, so a `#[cfg(test)]` module in one
//! crate would not suffice. Fixtures are plain `serde_json::Value`s to keep this crate free of
//! workspace dependencies.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use tempfile::TempDir;

/// UTF-8 path of a temporary directory.
pub fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("temp dir path should be UTF-8")
}

/// Control ID in the `C-NNNN` form used by fixtures.
pub fn control_id(n: usize) -> String {
    format!("C-{n:04}")
}

/// A control document with a single placeholder rule.
pub fn control_json(id: &str) -> Value {
    json!({
        "controlID": id,
        "name": format!("control {id}"),
        "baseScore": 5,
        "rules": [{"name": format!("rule-{}", id.to_ascii_lowercase())}]
    })
}

/// A framework document holding controls `C-0001..=C-<count>`.
pub fn framework_json(name: &str, count: usize) -> Value {
    let controls: Vec<Value> = (1..=count).map(|n| control_json(&control_id(n))).collect();
    json!({
        "name": name,
        "description": format!("{name} fixture framework"),
        "controls": controls
    })
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn write_json(path: &Utf8Path, value: &Value) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    let text = serde_json::to_string_pretty(value).expect("serialize fixture");
    std::fs::write(path, text).expect("write fixture");
}

/// Populate `dir` with one `<name>.json` file per framework, each with `controls_each` controls.
pub fn write_policy_dir(dir: &Utf8Path, frameworks: &[&str], controls_each: usize) {
    for name in frameworks {
        write_json(
            &dir.join(format!("{name}.json")),
            &framework_json(name, controls_each),
        );
    }
}

/// Replace `fetched_at` and `tool.version` with placeholders for stable comparisons.
pub fn normalize_envelope(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        if obj.contains_key("fetched_at") {
            obj.insert(
                "fetched_at".to_string(),
                Value::String("__TIMESTAMP__".to_string()),
            );
        }
        if let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
            && tool.contains_key("version")
        {
            tool.insert(
                "version".to_string(),
                Value::String("__VERSION__".to_string()),
            );
        }
    }
    value
}
