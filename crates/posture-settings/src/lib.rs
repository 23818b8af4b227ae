//! Config parsing and source/cache resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod resolve;

pub use model::PostureConfigV1;
pub use resolve::{Overrides, ResolvedConfig, SourceSelection};

/// Parse `posture.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<PostureConfigV1> {
    let cfg: PostureConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config (file values, then CLI overrides, then defaults).
pub fn resolve_config(
    cfg: PostureConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
