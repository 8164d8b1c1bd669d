//! Domain models for parsed specifications and playlist names.

use std::fmt;

use serde::Serialize;

/// One parsed `.feature` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecDocument {
    pub title: String,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub title: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Whether any step's text contains `needle` verbatim.
    pub fn mentions(&self, needle: &str) -> bool {
        self.steps.iter().any(|step| step.text.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: String,
    pub text: String,
}

/// Dotted identifier the test runner uses to address a single scenario.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct FullyQualifiedName(String);

impl FullyQualifiedName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        Self(segments.into_iter().collect::<Vec<_>>().join("."))
    }
}

impl fmt::Display for FullyQualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FullyQualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
