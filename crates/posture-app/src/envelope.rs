//! JSON artifact format for acquired policy sets.

use anyhow::Context;
use posture_types::{PolicySetEnvelope, SCHEMA_POLICY_SET_V1};

/// Pretty JSON with a trailing newline.
pub fn serialize_envelope(envelope: &PolicySetEnvelope) -> anyhow::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(envelope).context("serialize policy set")?;
    bytes.push(b'\n');
    Ok(bytes)
}

pub fn parse_envelope(text: &str) -> anyhow::Result<PolicySetEnvelope> {
    let envelope: PolicySetEnvelope =
        serde_json::from_str(text).context("parse policy set JSON")?;
    if envelope.schema != SCHEMA_POLICY_SET_V1 {
        anyhow::bail!(
            "unsupported policy set schema: {} (expected {SCHEMA_POLICY_SET_V1})",
            envelope.schema
        );
    }
    Ok(envelope)
}

/// Human-readable multi-line summary of an envelope.
///
/// The synthetic framework produced by a control scan is shown as `(controls)`.
pub fn summarize(envelope: &PolicySetEnvelope) -> String {
    let set = &envelope.policy_set;
    let mut out = String::new();

    out.push_str(&format!(
        "{} framework(s), {} control(s)\n",
        set.policies.len(),
        set.control_count()
    ));
    for framework in &set.policies {
        let label = if framework.is_synthetic() {
            "(controls)"
        } else {
            framework.name.as_str()
        };
        out.push_str(&format!(
            "  {label}: {} control(s)\n",
            framework.controls.len()
        ));
    }

    match &set.exceptions {
        Some(exceptions) => out.push_str(&format!("exceptions: {} loaded\n", exceptions.len())),
        None => out.push_str("exceptions: none\n"),
    }
    match &set.controls_inputs {
        Some(inputs) => out.push_str(&format!("controls-inputs: {} key(s)", inputs.len())),
        None => out.push_str("controls-inputs: none"),
    }
    out
}
