use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a policy identifier names.
///
/// Only `Framework` and `Control` can be scanned; `Rule` is part of the wire vocabulary but is
/// never fetched on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PolicyKind {
    Framework,
    Control,
    Rule,
}

impl PolicyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Framework => "Framework",
            PolicyKind::Control => "Control",
            PolicyKind::Rule => "Rule",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseKindError(pub String);

impl fmt::Display for ParseKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown policy kind: {} (expected framework|control|rule)",
            self.0
        )
    }
}

impl std::error::Error for ParseKindError {}

impl FromStr for PolicyKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "framework" | "frameworks" => Ok(PolicyKind::Framework),
            "control" | "controls" => Ok(PolicyKind::Control),
            "rule" | "rules" => Ok(PolicyKind::Rule),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct PolicyIdentifier {
    pub kind: PolicyKind,
    pub name: String,
}

impl PolicyIdentifier {
    pub fn new(kind: PolicyKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn framework(name: impl Into<String>) -> Self {
        Self::new(PolicyKind::Framework, name)
    }

    pub fn control(name: impl Into<String>) -> Self {
        Self::new(PolicyKind::Control, name)
    }
}

/// Rendered as `<Kind>: <name>`, the form used in user-facing messages.
impl fmt::Display for PolicyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.name)
    }
}

/// One scan request: the ordered list of policies to acquire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PolicyNotification {
    #[serde(default)]
    pub rules: Vec<PolicyIdentifier>,
}

impl PolicyNotification {
    /// Build a request where every name shares one kind.
    pub fn of_kind<I, S>(kind: PolicyKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rules: names
                .into_iter()
                .map(|n| PolicyIdentifier::new(kind, n))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
