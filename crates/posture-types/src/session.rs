use crate::{ControlsInputs, Exception, Framework};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scan session object: everything the evaluator needs from policy acquisition.
///
/// Owned by the caller. Acquisition only sets fields on it; it never builds or replaces the whole
/// value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanPolicySet {
    #[serde(default)]
    pub policies: Vec<Framework>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<Vec<Exception>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls_inputs: Option<ControlsInputs>,
}

impl ScanPolicySet {
    pub fn control_count(&self) -> usize {
        self.policies.iter().map(|f| f.controls.len()).sum()
    }
}
