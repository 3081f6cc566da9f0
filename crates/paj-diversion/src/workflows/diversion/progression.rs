//! Stage progression for enrolled participants.
//!
//! Every operation takes the current participant snapshot and returns either the next record or
//! a tagged error. Preconditions are checked before anything is copied, so a failed call leaves
//! nothing half-applied. Persisting the result is the caller's concern.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    EnrollmentRequest, FollowUp, FollowUpDetails, FollowUpId, InterventionPlan, Participant,
    ParticipantId, PlanDetails, PlanId, ProgramOutcome, Stage,
};
use super::eligibility::EligibilityEvaluator;

/// Enrollment rejected by the eligibility evaluator. Always carries the complete reason list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("candidate is not eligible: {}", reasons.join("; "))]
pub struct ValidationError {
    pub reasons: Vec<String>,
}

/// Illegal operation against a participant's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("participant {0} not found")]
    NotFound(String),
    #[error("participant {participant} already has a final outcome ({outcome})")]
    FinalOutcomeRecorded {
        participant: String,
        outcome: &'static str,
    },
    #[error("participant {participant} cannot advance beyond final stage ({stage})")]
    FinalStageReached {
        participant: String,
        stage: &'static str,
    },
    #[error("{operation} requires stage {required}, participant {participant} is at {actual}")]
    WrongStage {
        participant: String,
        operation: &'static str,
        required: &'static str,
        actual: &'static str,
    },
}

/// Admit a candidate at the first stage, or report every failing check.
///
/// `allocate_id` only runs once the candidate is found eligible.
pub fn enroll<F>(
    evaluator: &EligibilityEvaluator,
    allocate_id: F,
    request: EnrollmentRequest,
    at: DateTime<Utc>,
) -> Result<Participant, ValidationError>
where
    F: FnOnce() -> ParticipantId,
{
    let verdict = evaluator.evaluate(&request.eligibility);
    if !verdict.eligible {
        return Err(ValidationError {
            reasons: verdict.reasons,
        });
    }

    Ok(Participant {
        id: allocate_id(),
        name: request.name,
        district: request.district,
        referral_id: request.referral_id,
        eligibility: request.eligibility,
        stage: Stage::Referral,
        enrolled_at: None,
        completed_at: None,
        outcome: None,
        withdrawal_reason: None,
        created_at: at,
    })
}

/// Move to the next stage in the sequence, applying entry side effects.
pub fn advance_stage(
    participant: &Participant,
    at: DateTime<Utc>,
) -> Result<Participant, DomainError> {
    let next = participant
        .stage
        .next()
        .ok_or_else(|| DomainError::FinalStageReached {
            participant: participant.id.0.clone(),
            stage: participant.stage.key(),
        })?;
    ensure_open(participant)?;

    let mut advanced = participant.clone();
    advanced.stage = next;
    match next {
        Stage::ProsecutorEvaluation => {
            if advanced.enrolled_at.is_none() {
                advanced.enrolled_at = Some(at);
            }
        }
        Stage::ProgramOutcome => {
            advanced.completed_at = Some(at);
            advanced.outcome = Some(ProgramOutcome::Completed);
        }
        _ => {}
    }

    Ok(advanced)
}

/// Exit the program early. The stage is left where it was.
pub fn withdraw(
    participant: &Participant,
    reason: &str,
    at: DateTime<Utc>,
) -> Result<Participant, DomainError> {
    ensure_open(participant)?;

    let mut withdrawn = participant.clone();
    withdrawn.outcome = Some(ProgramOutcome::Withdrawn);
    withdrawn.completed_at = Some(at);
    let reason = reason.trim();
    withdrawn.withdrawal_reason = (!reason.is_empty()).then(|| reason.to_string());

    Ok(withdrawn)
}

/// Record that the victim withdrew consent and return the case to court.
///
/// Applies to every open participant, including those whose offence never required consent;
/// eligibility is not re-evaluated.
pub fn revoke_victim_consent(
    participant: &Participant,
    at: DateTime<Utc>,
) -> Result<Participant, DomainError> {
    ensure_open(participant)?;

    let mut returned = participant.clone();
    returned.eligibility.victim_consent = Some(false);
    returned.outcome = Some(ProgramOutcome::ReturnedToCourt);
    returned.completed_at = Some(at);

    Ok(returned)
}

pub fn create_intervention_plan<F>(
    participant: &Participant,
    allocate_id: F,
    details: PlanDetails,
    at: DateTime<Utc>,
) -> Result<InterventionPlan, DomainError>
where
    F: FnOnce() -> PlanId,
{
    ensure_stage(participant, Stage::InterventionPlan, "intervention plan creation")?;

    Ok(InterventionPlan {
        id: allocate_id(),
        participant_id: participant.id.clone(),
        details,
        created_at: at,
    })
}

pub fn add_follow_up<F>(
    participant: &Participant,
    allocate_id: F,
    details: FollowUpDetails,
    at: DateTime<Utc>,
) -> Result<FollowUp, DomainError>
where
    F: FnOnce() -> FollowUpId,
{
    ensure_stage(participant, Stage::HearingFollowups, "hearing follow-up")?;

    Ok(FollowUp {
        id: allocate_id(),
        participant_id: participant.id.clone(),
        details,
        created_at: at,
    })
}

fn ensure_open(participant: &Participant) -> Result<(), DomainError> {
    match participant.outcome {
        Some(outcome) => Err(DomainError::FinalOutcomeRecorded {
            participant: participant.id.0.clone(),
            outcome: outcome.label(),
        }),
        None => Ok(()),
    }
}

fn ensure_stage(
    participant: &Participant,
    required: Stage,
    operation: &'static str,
) -> Result<(), DomainError> {
    if participant.stage == required {
        Ok(())
    } else {
        Err(DomainError::WrongStage {
            participant: participant.id.0.clone(),
            operation,
            required: required.key(),
            actual: participant.stage.key(),
        })
    }
}
