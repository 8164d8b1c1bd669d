//! Scenario selection by step text.

use crate::domain::model::{Scenario, SpecDocument};

/// Scenarios with at least one step containing `step_text`, in document order.
///
/// Matching is a case-sensitive substring test with no trimming, so an empty
/// `step_text` selects every scenario that has at least one step.
pub fn select<'a>(document: &'a SpecDocument, step_text: &str) -> Vec<&'a Scenario> {
    document
        .scenarios
        .iter()
        .filter(|scenario| scenario.mentions(step_text))
        .collect()
}
