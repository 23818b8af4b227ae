use crate::model::PostureConfigV1;
use camino::Utf8PathBuf;
use posture_types::ids::SCHEMA_CONFIG_V1;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    /// Load policies from this directory instead of the remote source.
    pub use_from: Option<Utf8PathBuf>,
    pub cache_dir: Option<Utf8PathBuf>,
    pub no_cache: bool,
    pub scope: Option<String>,
    pub exceptions_file: Option<Utf8PathBuf>,
    pub controls_inputs_file: Option<Utf8PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSelection {
    Remote { base_url: String },
    Local { dir: Utf8PathBuf },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub source: SourceSelection,
    pub cache_enabled: bool,
    /// `None` means the platform default location.
    pub cache_dir: Option<Utf8PathBuf>,
    pub scope: String,
    pub timeout: Duration,
    pub exceptions_file: Option<Utf8PathBuf>,
    pub controls_inputs_file: Option<Utf8PathBuf>,
}

pub fn resolve_config(
    cfg: PostureConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let source = resolve_source(&cfg, &overrides)?;

    let timeout_secs = cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be greater than zero");
    }

    Ok(ResolvedConfig {
        source,
        cache_enabled: !overrides.no_cache && cfg.cache.unwrap_or(true),
        cache_dir: overrides.cache_dir.or(cfg.cache_dir),
        scope: overrides.scope.or(cfg.scope).unwrap_or_default(),
        timeout: Duration::from_secs(timeout_secs),
        exceptions_file: overrides.exceptions_file.or(cfg.exceptions_file),
        controls_inputs_file: overrides.controls_inputs_file.or(cfg.controls_inputs_file),
    })
}

fn resolve_source(
    cfg: &PostureConfigV1,
    overrides: &Overrides,
) -> anyhow::Result<SourceSelection> {
    if let Some(dir) = &overrides.use_from {
        return Ok(SourceSelection::Local { dir: dir.clone() });
    }
    if let Some(base_url) = &overrides.base_url {
        return Ok(SourceSelection::Remote {
            base_url: base_url.clone(),
        });
    }

    match cfg.source.as_deref() {
        Some("local") => {
            let dir = cfg
                .policy_dir
                .clone()
                .ok_or_else(|| anyhow::anyhow!("source = \"local\" requires policy_dir"))?;
            Ok(SourceSelection::Local { dir })
        }
        Some("remote") => {
            let base_url = cfg
                .base_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("source = \"remote\" requires base_url"))?;
            Ok(SourceSelection::Remote { base_url })
        }
        Some(other) => anyhow::bail!("unknown source: {other} (expected 'remote' or 'local')"),
        None => match (&cfg.policy_dir, &cfg.base_url) {
            (Some(dir), _) => Ok(SourceSelection::Local { dir: dir.clone() }),
            (None, Some(base_url)) => Ok(SourceSelection::Remote {
                base_url: base_url.clone(),
            }),
            (None, None) => anyhow::bail!(
                "no policy source configured: pass --base-url or --use-from, \
                 or set base_url or policy_dir in posture.toml"
            ),
        },
    }
}
