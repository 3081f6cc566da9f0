use super::super::domain::{EligibilityInput, ProsecutionMode, VulnerabilityType};
use super::config::{EligibilityRules, OffenceClassification};
use super::policy::IneligibilityReason;

/// Run every check in order, collecting all failures.
pub(crate) fn collect_failures(
    input: &EligibilityInput,
    rules: &EligibilityRules,
) -> Vec<IneligibilityReason> {
    let mut failures = Vec::new();

    check_vulnerabilities(input, &mut failures);
    check_offence(input, rules, &mut failures);
    check_attestations(input, &mut failures);

    failures
}

fn check_vulnerabilities(input: &EligibilityInput, failures: &mut Vec<IneligibilityReason>) {
    let recognised = input
        .vulnerabilities
        .iter()
        .any(|declared| VulnerabilityType::from_key(declared).is_some());
    if !recognised {
        failures.push(IneligibilityReason::NoRecognisedVulnerability);
    }
}

fn check_offence(
    input: &EligibilityInput,
    rules: &EligibilityRules,
    failures: &mut Vec<IneligibilityReason>,
) {
    let category = input.offence_category.trim().to_string();

    match rules.classify(&category) {
        OffenceClassification::AbsolutelyExcluded => {
            failures.push(IneligibilityReason::AbsolutelyExcludedOffence { category });
        }
        OffenceClassification::ConditionallyExcluded => {
            if input.prosecution_mode != Some(ProsecutionMode::Summary) {
                failures.push(IneligibilityReason::RequiresSummaryProsecution {
                    category: category.clone(),
                });
            }
            if input.victim_consent != Some(true) {
                failures.push(IneligibilityReason::RequiresVictimConsent { category });
            }
        }
        OffenceClassification::Unrestricted => {}
    }
}

fn check_attestations(input: &EligibilityInput, failures: &mut Vec<IneligibilityReason>) {
    let attestations = [
        (
            input.accepts_responsibility,
            IneligibilityReason::ResponsibilityNotAccepted,
        ),
        (
            input.is_voluntary,
            IneligibilityReason::ParticipationNotVoluntary,
        ),
        (input.waives_delay, IneligibilityReason::DelayRightsNotWaived),
        (input.criminally_fit, IneligibilityReason::NotCriminallyFit),
    ];

    failures.extend(
        attestations
            .into_iter()
            .filter(|(attested, _)| !attested)
            .map(|(_, reason)| reason),
    );
}
