use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Offence categories that can never enter the program.
const STANDARD_ABSOLUTE_EXCLUSIONS: [&str; 7] = [
    "homicide",
    "attempted_murder",
    "sexual_assault",
    "sexual_offence_against_minor",
    "terrorism",
    "criminal_organization",
    "impaired_driving_causing_death",
];

/// Offence categories admitted only under summary prosecution with the victim's consent.
const STANDARD_SUMMARY_ELIGIBLE_EXCEPTIONS: [&str; 3] = [
    "domestic_violence",
    "criminal_harassment",
    "uttering_threats_to_partner",
];

/// Bucket an offence category falls into under the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffenceClassification {
    AbsolutelyExcluded,
    ConditionallyExcluded,
    Unrestricted,
}

/// Static exclusion table consulted by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRules {
    absolute_exclusions: Vec<String>,
    summary_eligible_exceptions: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("offence category '{0}' appears in both exclusion lists")]
    Overlap(String),
    #[error("offence category '{0}' is listed more than once")]
    Duplicate(String),
    #[error("exclusion lists may not contain blank categories")]
    BlankCategory,
}

impl EligibilityRules {
    /// Build a table from explicit lists, normalizing keys and rejecting overlaps.
    pub fn new<A, C>(absolute: A, summary_eligible: C) -> Result<Self, RuleTableError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let mut seen = BTreeSet::new();
        let absolute_exclusions = normalize_all(absolute, &mut seen)?;
        let mut conditional_seen = BTreeSet::new();
        let summary_eligible_exceptions = normalize_all(summary_eligible, &mut conditional_seen)?;

        if let Some(shared) = conditional_seen.intersection(&seen).next() {
            return Err(RuleTableError::Overlap(shared.clone()));
        }

        Ok(Self {
            absolute_exclusions,
            summary_eligible_exceptions,
        })
    }

    pub fn standard() -> Self {
        Self {
            absolute_exclusions: STANDARD_ABSOLUTE_EXCLUSIONS
                .iter()
                .map(|category| category.to_string())
                .collect(),
            summary_eligible_exceptions: STANDARD_SUMMARY_ELIGIBLE_EXCEPTIONS
                .iter()
                .map(|category| category.to_string())
                .collect(),
        }
    }

    pub fn classify(&self, offence_category: &str) -> OffenceClassification {
        let key = normalize(offence_category);
        if self.absolute_exclusions.contains(&key) {
            OffenceClassification::AbsolutelyExcluded
        } else if self.summary_eligible_exceptions.contains(&key) {
            OffenceClassification::ConditionallyExcluded
        } else {
            OffenceClassification::Unrestricted
        }
    }

    pub fn absolute_exclusions(&self) -> &[String] {
        &self.absolute_exclusions
    }

    pub fn summary_eligible_exceptions(&self) -> &[String] {
        &self.summary_eligible_exceptions
    }

    /// Every excluded category, absolute ones first, each list in table order.
    pub fn exclusion_categories(&self) -> Vec<String> {
        self.absolute_exclusions
            .iter()
            .chain(self.summary_eligible_exceptions.iter())
            .cloned()
            .collect()
    }
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize(category: &str) -> String {
    category.trim().to_ascii_lowercase()
}

fn normalize_all<I>(
    categories: I,
    seen: &mut BTreeSet<String>,
) -> Result<Vec<String>, RuleTableError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized = Vec::new();
    for category in categories {
        let key = normalize(category.as_ref());
        if key.is_empty() {
            return Err(RuleTableError::BlankCategory);
        }
        if !seen.insert(key.clone()) {
            return Err(RuleTableError::Duplicate(key));
        }
        normalized.push(key);
    }
    Ok(normalized)
}
