use serde::{Deserialize, Serialize};

use super::super::domain::ProsecutionMode;

/// Independent reasons a candidate fails intake. Each variant maps to one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IneligibilityReason {
    NoRecognisedVulnerability,
    AbsolutelyExcludedOffence { category: String },
    RequiresSummaryProsecution { category: String },
    RequiresVictimConsent { category: String },
    ResponsibilityNotAccepted,
    ParticipationNotVoluntary,
    DelayRightsNotWaived,
    NotCriminallyFit,
}

impl IneligibilityReason {
    pub fn summary(&self) -> String {
        match self {
            IneligibilityReason::NoRecognisedVulnerability => {
                "at least one recognised vulnerability is required".to_string()
            }
            IneligibilityReason::AbsolutelyExcludedOffence { category } => {
                format!("offence category '{category}' is excluded from the program")
            }
            IneligibilityReason::RequiresSummaryProsecution { category } => format!(
                "offence category '{category}' is only eligible under {} prosecution mode",
                ProsecutionMode::Summary.label()
            ),
            IneligibilityReason::RequiresVictimConsent { category } => {
                format!("offence category '{category}' requires the victim's consent")
            }
            IneligibilityReason::ResponsibilityNotAccepted => {
                "candidate must accept responsibility for the offence".to_string()
            }
            IneligibilityReason::ParticipationNotVoluntary => {
                "participation must be voluntary".to_string()
            }
            IneligibilityReason::DelayRightsNotWaived => {
                "candidate must waive delay rights for the duration of the program".to_string()
            }
            IneligibilityReason::NotCriminallyFit => {
                "candidate must be criminally fit and responsible".to_string()
            }
        }
    }
}

/// Outcome of an eligibility evaluation.
///
/// `eligible` is true exactly when `reasons` is empty; the constructor is the only way to build
/// one so the two fields cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub eligible: bool,
    pub reasons: Vec<String>,
    #[serde(skip)]
    failures: Vec<IneligibilityReason>,
}

impl EligibilityVerdict {
    pub(crate) fn from_failures(failures: Vec<IneligibilityReason>) -> Self {
        Self {
            eligible: failures.is_empty(),
            reasons: failures.iter().map(IneligibilityReason::summary).collect(),
            failures,
        }
    }

    pub fn failures(&self) -> &[IneligibilityReason] {
        &self.failures
    }
}
