use crate::{ControlsInputsGetter, ExceptionsGetter, PolicyGetter, SourceError, validate_name};
use posture_types::{Control, ControlsInputs, Exception, Framework};
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Policies served by a remote policy API.
///
/// Endpoints, relative to the base URL:
/// - `frameworks/<name>.json`
/// - `controls/<id>.json`
/// - `exceptions?scope=<scope>`
/// - `controls-inputs?scope=<scope>`
///
/// A 404 on a framework or control is "not found" (`Ok(None)`); a 404 on an overlay is an error.
#[derive(Clone, Debug)]
pub struct HttpSource {
    base_url: Url,
    client: Client,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let base_url = parse_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("posture/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| SourceError::Http {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self { base_url, client })
    }

    /// Use a preconfigured client (proxies, TLS roots, headers).
    pub fn with_client(base_url: &str, client: Client) -> Result<Self, SourceError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn artifact_url(&self, collection: &str, name: &str) -> Result<Url, SourceError> {
        validate_name(name)?;
        self.join(&format!("{collection}/{name}.json"))
    }

    pub(crate) fn overlay_url(&self, endpoint: &str, scope: &str) -> Result<Url, SourceError> {
        let mut url = self.join(endpoint)?;
        if !scope.is_empty() {
            url.query_pairs_mut().append_pair("scope", scope);
        }
        Ok(url)
    }

    fn join(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|err| SourceError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }

    fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, SourceError> {
        tracing::debug!(url = %url, "fetching policy artifact");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| SourceError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| SourceError::Http {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|source| SourceError::Parse {
                what: url.to_string(),
                source,
            })
    }

    fn fetch_required<T: DeserializeOwned>(&self, url: Url) -> Result<T, SourceError> {
        let location = url.to_string();
        self.fetch(url)?.ok_or(SourceError::Status {
            url: location,
            status: StatusCode::NOT_FOUND.as_u16(),
        })
    }
}

/// Parse `base_url`, forcing a trailing slash so relative joins keep its path.
fn parse_base_url(base_url: &str) -> Result<Url, SourceError> {
    let mut normalized = base_url.trim_end_matches('/').to_string();
    normalized.push('/');
    Url::parse(&normalized).map_err(|err| SourceError::InvalidUrl {
        url: base_url.to_string(),
        reason: err.to_string(),
    })
}

impl PolicyGetter for HttpSource {
    fn get_framework(&self, name: &str) -> Result<Option<Framework>, SourceError> {
        self.fetch(self.artifact_url("frameworks", name)?)
    }

    fn get_control(&self, name: &str) -> Result<Option<Control>, SourceError> {
        self.fetch(self.artifact_url("controls", name)?)
    }
}

impl ExceptionsGetter for HttpSource {
    fn get_exceptions(&self, scope: &str) -> Result<Vec<Exception>, SourceError> {
        self.fetch_required(self.overlay_url("exceptions", scope)?)
    }
}

impl ControlsInputsGetter for HttpSource {
    fn get_controls_inputs(&self, scope: &str) -> Result<ControlsInputs, SourceError> {
        self.fetch_required(self.overlay_url("controls-inputs", scope)?)
    }
}
