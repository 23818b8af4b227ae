use posture_source::SourceError;
use posture_types::{PolicyIdentifier, PolicyKind};
use thiserror::Error;

/// Fatal outcomes of policy acquisition.
///
/// Cache write failures and overlay fetch failures are not represented here: they never leave the
/// step that produced them.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The request's scan kind could not be resolved.
    #[error("unknown policy kind: {}", describe_kind(.kind))]
    UnknownKind { kind: Option<PolicyKind> },

    /// A required framework or control fetch failed.
    #[error("failed to download policies: {source}")]
    Download {
        #[source]
        source: SourceError,
    },

    /// Nothing could be fetched. Lists every requested identifier.
    #[error(
        "failed to download policies: '{}'. Make sure the policy exists and is spelled correctly",
        join_identifiers(.requested)
    )]
    EmptyResult { requested: Vec<PolicyIdentifier> },
}

impl PolicyError {
    pub(crate) fn download(source: SourceError) -> Self {
        PolicyError::Download { source }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PolicyError::UnknownKind { .. })
    }
}

fn describe_kind(kind: &Option<PolicyKind>) -> String {
    match kind {
        Some(kind) => kind.to_string(),
        None => "none (no policies requested)".to_string(),
    }
}

/// `<Kind>: <name>` for each identifier, joined by `", "`.
fn join_identifiers(requested: &[PolicyIdentifier]) -> String {
    requested
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
