use crate::policy::{aggregate, load_overlays, scan_kind, PolicyError};
use posture_cache::CacheStore;
use posture_source::Getters;
use posture_types::{PolicyNotification, ScanPolicySet};

/// Orchestrates policy acquisition into a caller-owned session.
pub struct PolicyHandler {
    getters: Getters,
    cache: CacheStore,
    scope: String,
}

impl PolicyHandler {
    pub fn new(getters: Getters, cache: CacheStore) -> Self {
        Self {
            getters,
            cache,
            scope: String::new(),
        }
    }

    /// Cluster or account name the overlays are fetched for.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Acquire the policies named in `notification` into `session`.
    ///
    /// On error `session` is left exactly as it was. On success `policies` is replaced and each
    /// overlay that could be fetched is set; overlays that could not are left untouched.
    pub fn get_policies(
        &self,
        notification: &PolicyNotification,
        session: &mut ScanPolicySet,
    ) -> Result<(), PolicyError> {
        tracing::info!("Downloading/Loading policy definitions");

        let kind = scan_kind(notification);
        let policies = aggregate(
            kind,
            &notification.rules,
            self.getters.policy.as_ref(),
            &self.cache,
        )?;
        if policies.is_empty() {
            return Err(PolicyError::EmptyResult {
                requested: notification.rules.clone(),
            });
        }

        session.policies = policies;

        let overlays = load_overlays(
            self.getters.exceptions.as_ref(),
            self.getters.controls_inputs.as_ref(),
            &self.scope,
        );
        if let Some(exceptions) = overlays.exceptions {
            session.exceptions = Some(exceptions);
        }
        if let Some(inputs) = overlays.controls_inputs {
            session.controls_inputs = Some(inputs);
        }

        tracing::info!(
            frameworks = session.policies.len(),
            controls = session.control_count(),
            "Downloaded/Loaded policy"
        );
        Ok(())
    }
}
