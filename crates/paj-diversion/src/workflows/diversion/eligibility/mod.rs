mod config;
mod policy;
mod rules;

pub use config::{EligibilityRules, OffenceClassification, RuleTableError};
pub use policy::{EligibilityVerdict, IneligibilityReason};

use super::domain::{EligibilityInput, VulnerabilityType, VulnerabilityTypeView};

/// Stateless evaluator applying the exclusion table to a candidate's declared facts.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    rules: EligibilityRules,
}

impl EligibilityEvaluator {
    pub fn new(rules: EligibilityRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &EligibilityRules {
        &self.rules
    }

    /// Evaluate every check and report all failures; never short-circuits.
    pub fn evaluate(&self, input: &EligibilityInput) -> EligibilityVerdict {
        EligibilityVerdict::from_failures(rules::collect_failures(input, &self.rules))
    }

    pub fn exclusion_categories(&self) -> Vec<String> {
        self.rules.exclusion_categories()
    }

    pub fn vulnerability_types(&self) -> Vec<VulnerabilityTypeView> {
        VulnerabilityType::ordered()
            .into_iter()
            .map(VulnerabilityTypeView::from)
            .collect()
    }
}
