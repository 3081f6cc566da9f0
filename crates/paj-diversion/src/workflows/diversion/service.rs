use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    EligibilityInput, EnrollmentRequest, FollowUp, FollowUpDetails, FollowUpId,
    InterventionPlan, Participant, ParticipantId, PlanDetails, PlanId, VulnerabilityTypeView,
};
use super::eligibility::{EligibilityEvaluator, EligibilityRules, EligibilityVerdict};
use super::progression::{self, DomainError, ValidationError};
use super::repository::{ParticipantRecord, ParticipantRepository, RepositoryError};

/// Per-service counters behind the `ptc-`, `plan-` and `fu-` identifiers.
#[derive(Debug, Default)]
struct IdSequences {
    participants: AtomicU64,
    plans: AtomicU64,
    follow_ups: AtomicU64,
}

impl IdSequences {
    fn next(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn participant(&self) -> ParticipantId {
        ParticipantId(format!("ptc-{:06}", Self::next(&self.participants)))
    }

    fn plan(&self) -> PlanId {
        PlanId(format!("plan-{:06}", Self::next(&self.plans)))
    }

    fn follow_up(&self) -> FollowUpId {
        FollowUpId(format!("fu-{:06}", Self::next(&self.follow_ups)))
    }
}

/// Service composing the eligibility evaluator, progression engine, and participant storage.
pub struct DiversionService<R> {
    evaluator: Arc<EligibilityEvaluator>,
    repository: Arc<R>,
    ids: IdSequences,
}

impl<R> DiversionService<R>
where
    R: ParticipantRepository + 'static,
{
    pub fn new(repository: Arc<R>, rules: EligibilityRules) -> Self {
        Self {
            evaluator: Arc::new(EligibilityEvaluator::new(rules)),
            repository,
            ids: IdSequences::default(),
        }
    }

    pub fn evaluate(&self, input: &EligibilityInput) -> EligibilityVerdict {
        self.evaluator.evaluate(input)
    }

    pub fn exclusion_categories(&self) -> Vec<String> {
        self.evaluator.exclusion_categories()
    }

    pub fn vulnerability_types(&self) -> Vec<VulnerabilityTypeView> {
        self.evaluator.vulnerability_types()
    }

    /// Evaluate and, when eligible, store a new participant at the referral stage.
    pub fn enroll(
        &self,
        request: EnrollmentRequest,
    ) -> Result<ParticipantRecord, DiversionServiceError> {
        let allocate_id = || self.ids.participant();
        let participant =
            match progression::enroll(&self.evaluator, allocate_id, request, Utc::now()) {
                Ok(participant) => participant,
                Err(err) => {
                    info!(reasons = err.reasons.len(), "enrollment rejected");
                    return Err(err.into());
                }
            };

        let record = self.repository.insert(participant)?;
        info!(
            participant = %record.participant.id.0,
            district = %record.participant.district,
            "participant enrolled"
        );
        Ok(record)
    }

    pub fn get(&self, id: &ParticipantId) -> Result<ParticipantRecord, DiversionServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| DomainError::NotFound(id.0.clone()).into())
    }

    pub fn active(&self, limit: usize) -> Result<Vec<ParticipantRecord>, DiversionServiceError> {
        Ok(self.repository.active(limit)?)
    }

    pub fn advance_stage(
        &self,
        id: &ParticipantId,
    ) -> Result<ParticipantRecord, DiversionServiceError> {
        let record = self.transition(id, |participant| {
            progression::advance_stage(participant, Utc::now())
        })?;
        info!(
            participant = %id.0,
            stage = record.participant.stage.key(),
            "participant advanced"
        );
        Ok(record)
    }

    pub fn withdraw(
        &self,
        id: &ParticipantId,
        reason: &str,
    ) -> Result<ParticipantRecord, DiversionServiceError> {
        let record = self.transition(id, |participant| {
            progression::withdraw(participant, reason, Utc::now())
        })?;
        info!(participant = %id.0, "participant withdrew from program");
        Ok(record)
    }

    pub fn revoke_victim_consent(
        &self,
        id: &ParticipantId,
    ) -> Result<ParticipantRecord, DiversionServiceError> {
        let record = self.transition(id, |participant| {
            progression::revoke_victim_consent(participant, Utc::now())
        })?;
        info!(participant = %id.0, "victim consent revoked, case returned to court");
        Ok(record)
    }

    pub fn create_intervention_plan(
        &self,
        id: &ParticipantId,
        details: PlanDetails,
    ) -> Result<InterventionPlan, DiversionServiceError> {
        let record = self.get(id)?;
        let plan = progression::create_intervention_plan(
            &record.participant,
            || self.ids.plan(),
            details,
            Utc::now(),
        )?;
        self.repository.insert_plan(plan.clone(), record.version)?;
        debug!(participant = %id.0, plan = %plan.id.0, "intervention plan recorded");
        Ok(plan)
    }

    pub fn intervention_plans(
        &self,
        id: &ParticipantId,
    ) -> Result<Vec<InterventionPlan>, DiversionServiceError> {
        self.get(id)?;
        Ok(self.repository.plans(id)?)
    }

    pub fn add_follow_up(
        &self,
        id: &ParticipantId,
        details: FollowUpDetails,
    ) -> Result<FollowUp, DiversionServiceError> {
        let record = self.get(id)?;
        let follow_up = progression::add_follow_up(
            &record.participant,
            || self.ids.follow_up(),
            details,
            Utc::now(),
        )?;
        self.repository
            .insert_follow_up(follow_up.clone(), record.version)?;
        debug!(
            participant = %id.0,
            follow_up = %follow_up.id.0,
            "hearing follow-up recorded"
        );
        Ok(follow_up)
    }

    pub fn follow_ups(&self, id: &ParticipantId) -> Result<Vec<FollowUp>, DiversionServiceError> {
        self.get(id)?;
        Ok(self.repository.follow_ups(id)?)
    }

    /// Load one snapshot, apply the engine operation, and commit against the loaded version.
    fn transition<F>(
        &self,
        id: &ParticipantId,
        operation: F,
    ) -> Result<ParticipantRecord, DiversionServiceError>
    where
        F: FnOnce(&Participant) -> Result<Participant, DomainError>,
    {
        let record = self.get(id)?;
        let next = operation(&record.participant).map_err(|err| {
            warn!(participant = %id.0, error = %err, "transition refused");
            err
        })?;

        self.repository
            .commit(next, record.version)
            .map_err(|err| {
                if let RepositoryError::StaleVersion { expected, found } = &err {
                    warn!(participant = %id.0, expected, found, "stale participant snapshot");
                }
                err.into()
            })
    }
}

/// Error raised by the diversion service.
#[derive(Debug, thiserror::Error)]
pub enum DiversionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
