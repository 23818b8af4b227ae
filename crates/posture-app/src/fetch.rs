//! The `fetch` use case: acquire policies from the configured source and wrap them in an envelope.

use anyhow::Context;
use posture_cache::CacheStore;
use posture_settings::{Overrides, ResolvedConfig, SourceSelection};
use posture_source::{FileControlsInputs, FileExceptions, Getters, HttpSource, LocalSource};
use posture_types::{
    PolicyKind, PolicyNotification, PolicySetEnvelope, SCHEMA_POLICY_SET_V1, ScanPolicySet,
    ToolMeta,
};
use std::sync::Arc;
use time::OffsetDateTime;

use crate::policy::PolicyHandler;

/// Input for the fetch use case.
#[derive(Clone, Debug)]
pub struct FetchInput<'a> {
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    pub kind: PolicyKind,
    /// Framework names or control IDs, in the order they should be fetched.
    pub names: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct FetchOutput {
    pub envelope: PolicySetEnvelope,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the fetch use case: parse config, build sources, acquire policies, produce the envelope.
pub fn run_fetch(input: FetchInput<'_>) -> anyhow::Result<FetchOutput> {
    let cfg = if input.config_text.trim().is_empty() {
        posture_settings::PostureConfigV1::default()
    } else {
        posture_settings::parse_config_toml(input.config_text).context("parse config")?
    };
    let resolved =
        posture_settings::resolve_config(cfg, input.overrides).context("resolve config")?;

    let getters = build_getters(&resolved)?;
    let handler = PolicyHandler::new(getters, build_cache(&resolved)).with_scope(&resolved.scope);

    let request = PolicyNotification::of_kind(input.kind, input.names);
    let mut policy_set = ScanPolicySet::default();
    handler.get_policies(&request, &mut policy_set)?;

    let envelope = PolicySetEnvelope {
        schema: SCHEMA_POLICY_SET_V1.to_string(),
        tool: ToolMeta {
            name: "posture".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        fetched_at: OffsetDateTime::now_utc(),
        request,
        policy_set,
    };

    Ok(FetchOutput {
        envelope,
        resolved_config: resolved,
    })
}

/// Build the policy and overlay getters for `resolved`.
///
/// Overlay files, when configured, replace the policy source for that overlay only.
pub fn build_getters(resolved: &ResolvedConfig) -> anyhow::Result<Getters> {
    let mut getters = match &resolved.source {
        SourceSelection::Local { dir } => {
            tracing::debug!(dir = %dir, "loading policies from local directory");
            Getters::uniform(Arc::new(LocalSource::new(dir.clone())))
        }
        SourceSelection::Remote { base_url } => {
            tracing::debug!(base_url = %base_url, "downloading policies from remote source");
            let source = HttpSource::new(base_url, resolved.timeout)
                .with_context(|| format!("create http source for {base_url}"))?;
            Getters::uniform(Arc::new(source))
        }
    };

    if let Some(path) = &resolved.exceptions_file {
        getters = getters.with_exceptions(FileExceptions::new(path.clone()));
    }
    if let Some(path) = &resolved.controls_inputs_file {
        getters = getters.with_controls_inputs(FileControlsInputs::new(path.clone()));
    }
    Ok(getters)
}

pub fn build_cache(resolved: &ResolvedConfig) -> CacheStore {
    if !resolved.cache_enabled {
        return CacheStore::disabled();
    }
    match &resolved.cache_dir {
        Some(dir) => CacheStore::new(dir.clone()),
        None => CacheStore::at_default_location(),
    }
}
