//! Policy artifacts.
//!
//! The acquisition layer never interprets artifact contents beyond the identifying fields below;
//! everything else is carried through verbatim so the evaluator sees exactly what the source sent.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A named collection of controls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Framework {
    /// Empty for the synthetic framework built around individually fetched controls.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub controls: Vec<Control>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Framework {
    pub fn new(name: impl Into<String>, controls: Vec<Control>) -> Self {
        Self {
            name: name.into(),
            controls,
            extra: Map::new(),
        }
    }

    /// Container for controls requested one by one. Has no canonical name and is never cached.
    pub fn synthetic(controls: Vec<Control>) -> Self {
        Self::new(String::new(), controls)
    }

    pub fn is_synthetic(&self) -> bool {
        self.name.is_empty()
    }

    pub fn find_control(&self, control_id: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|c| c.control_id.eq_ignore_ascii_case(control_id))
    }
}

/// A single checkable requirement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Control {
    #[serde(rename = "controlID", default)]
    pub control_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Control {
    pub fn new(control_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            control_id: control_id.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// The identifier used for lookups: `controlID`, falling back to `name`.
    pub fn id(&self) -> &str {
        if self.control_id.is_empty() {
            &self.name
        } else {
            &self.control_id
        }
    }
}

/// An override that suppresses or alters findings of specific controls.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Exception {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

/// Account/cluster-scoped values that parameterize control evaluation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ControlsInputs(pub BTreeMap<String, JsonValue>);

impl ControlsInputs {
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
