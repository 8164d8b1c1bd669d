//! Fully-qualified scenario names.
//!
//! A name is `<folder namespace>.<feature title>Feature.<scenario>`, where the
//! folder namespace is the feature file's directory relative to the root folder
//! with separators turned into dots. Path handling is purely lexical.

use std::path::{Component, Path, PathBuf};

use crate::domain::errors::PipelineError;
use crate::domain::model::FullyQualifiedName;

const FEATURE_SUFFIX: &str = "Feature";

/// Builds names for scenarios found beneath a single root folder.
#[derive(Debug, Clone)]
pub struct NameBuilder {
    root: PathBuf,
    namespace: Option<String>,
}

impl NameBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
            namespace: None,
        }
    }

    /// Prefix every name with `namespace`. Blank values are ignored.
    pub fn with_namespace(mut self, namespace: Option<&str>) -> Self {
        self.namespace = namespace
            .map(strip_whitespace)
            .filter(|value| !value.is_empty());
        self
    }

    pub fn build(
        &self,
        folder: &Path,
        document_title: &str,
        scenario_title: &str,
    ) -> Result<FullyQualifiedName, PipelineError> {
        let relative = self.relative_namespace(folder)?;
        let feature = format!("{document_title}{FEATURE_SUFFIX}");
        let scenario = sanitize_scenario_title(scenario_title);

        let mut segments: Vec<&str> = Vec::with_capacity(4);
        if let Some(namespace) = &self.namespace {
            segments.push(namespace.as_str());
        }
        if !relative.is_empty() {
            segments.push(relative.as_str());
        }
        segments.push(&feature);
        segments.push(&scenario);
        Ok(FullyQualifiedName::from_segments(segments))
    }

    /// Dotted form of `folder` relative to the root, empty when they coincide.
    pub fn relative_namespace(&self, folder: &Path) -> Result<String, PipelineError> {
        let folder = normalize(folder);
        let relative = folder
            .strip_prefix(&self.root)
            .map_err(|_| PipelineError::InvalidPath {
                root: self.root.clone(),
                folder: folder.clone(),
            })?;

        let segments: Vec<String> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(strip_whitespace(&part.to_string_lossy())),
                _ => None,
            })
            .filter(|segment| !segment.is_empty())
            .collect();
        Ok(segments.join("."))
    }
}

/// Build a name without a namespace prefix.
pub fn build(
    root: &Path,
    folder: &Path,
    document_title: &str,
    scenario_title: &str,
) -> Result<FullyQualifiedName, PipelineError> {
    NameBuilder::new(root).build(folder, document_title, scenario_title)
}

/// Delete everything outside `[A-Za-z0-9]`, whitespace included.
pub fn sanitize_scenario_title(title: &str) -> String {
    title.chars().filter(char::is_ascii_alphanumeric).collect()
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is still `/`.
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
