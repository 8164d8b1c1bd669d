//! Gherkin parsing into [`SpecDocument`]s.

use std::path::Path;

use gherkin::GherkinEnv;

use crate::domain::errors::PipelineError;
use crate::domain::model::{Scenario, SpecDocument, Step};
use crate::infra::config::Selection;

/// Knobs controlling which scenarios and steps end up in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub include_rules: bool,
    pub include_background: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            include_rules: true,
            include_background: false,
        }
    }
}

impl From<&Selection> for ParseOptions {
    fn from(selection: &Selection) -> Self {
        Self {
            include_rules: selection.include_rules(),
            include_background: selection.include_background(),
        }
    }
}

/// Parse one file's contents. `path` only labels errors.
///
/// # Errors
///
/// [`PipelineError::NoDocument`] when the text holds nothing but blank lines and comments, or
/// the feature has no title; [`PipelineError::ParseFailure`] when the Gherkin is malformed.
/// Feature keywords are recognised in every language the grammar knows (`# language: fr`).
pub fn parse(
    path: &Path,
    contents: &str,
    options: ParseOptions,
) -> Result<SpecDocument, PipelineError> {
    if is_blank(contents) {
        return Err(PipelineError::NoDocument);
    }

    let mut text = contents.to_owned();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let feature = gherkin::Feature::parse(text.as_str(), GherkinEnv::default()).map_err(|err| {
        PipelineError::ParseFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })?;

    let title = feature.name.trim();
    if title.is_empty() {
        return Err(PipelineError::NoDocument);
    }

    let feature_background = background_steps(feature.background.as_ref(), options);

    let mut positioned: Vec<(usize, Scenario)> = feature
        .scenarios
        .iter()
        .map(|scenario| {
            (
                scenario.span.start,
                convert_scenario(scenario, &feature_background, &[]),
            )
        })
        .collect();

    if options.include_rules {
        for rule in &feature.rules {
            let rule_background = background_steps(rule.background.as_ref(), options);
            positioned.extend(rule.scenarios.iter().map(|scenario| {
                (
                    scenario.span.start,
                    convert_scenario(scenario, &feature_background, &rule_background),
                )
            }));
        }
    }

    positioned.sort_by_key(|(start, _)| *start);

    Ok(SpecDocument {
        title: title.to_owned(),
        scenarios: positioned
            .into_iter()
            .map(|(_, scenario)| scenario)
            .collect(),
    })
}

/// Only whitespace and `#` comments, which includes a bare `# language:` header.
fn is_blank(contents: &str) -> bool {
    contents
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with('#'))
}

fn background_steps(background: Option<&gherkin::Background>, options: ParseOptions) -> Vec<Step> {
    match background {
        Some(background) if options.include_background => convert_steps(&background.steps),
        _ => Vec::new(),
    }
}

fn convert_scenario(
    scenario: &gherkin::Scenario,
    feature_background: &[Step],
    rule_background: &[Step],
) -> Scenario {
    let mut steps = Vec::with_capacity(
        feature_background.len() + rule_background.len() + scenario.steps.len(),
    );
    steps.extend_from_slice(feature_background);
    steps.extend_from_slice(rule_background);
    steps.extend(convert_steps(&scenario.steps));

    Scenario {
        title: scenario.name.trim().to_owned(),
        steps,
    }
}

fn convert_steps(steps: &[gherkin::Step]) -> Vec<Step> {
    steps
        .iter()
        .map(|step| Step {
            keyword: step.keyword.trim().to_owned(),
            text: step.value.clone(),
        })
        .collect()
}
