use posture_types::{PolicyKind, PolicyNotification};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    Framework,
    Control,
    /// Carries the offending kind, or `None` for an empty request.
    Unrecognized(Option<PolicyKind>),
}

/// The first identifier's kind governs the whole request.
pub fn scan_kind(notification: &PolicyNotification) -> ScanKind {
    match notification.rules.first().map(|rule| rule.kind) {
        Some(PolicyKind::Framework) => ScanKind::Framework,
        Some(PolicyKind::Control) => ScanKind::Control,
        other => ScanKind::Unrecognized(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posture_types::PolicyIdentifier;

    #[test]
    fn resolves_from_first_rule() {
        let frameworks = PolicyNotification::of_kind(PolicyKind::Framework, ["nsa", "mitre"]);
        assert_eq!(scan_kind(&frameworks), ScanKind::Framework);

        let controls = PolicyNotification::of_kind(PolicyKind::Control, ["C-0001"]);
        assert_eq!(scan_kind(&controls), ScanKind::Control);

        let mixed = PolicyNotification {
            rules: vec![
                PolicyIdentifier::control("C-0001"),
                PolicyIdentifier::framework("nsa"),
            ],
        };
        assert_eq!(scan_kind(&mixed), ScanKind::Control);
    }

    #[test]
    fn rules_and_empty_requests_are_unrecognized() {
        let rules = PolicyNotification::of_kind(PolicyKind::Rule, ["deny-privileged"]);
        assert_eq!(
            scan_kind(&rules),
            ScanKind::Unrecognized(Some(PolicyKind::Rule))
        );
        assert_eq!(
            scan_kind(&PolicyNotification::default()),
            ScanKind::Unrecognized(None)
        );
    }
}
