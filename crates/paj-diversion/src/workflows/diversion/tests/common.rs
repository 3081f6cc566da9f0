use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::diversion::domain::{
    EligibilityInput, EnrollmentRequest, FollowUp, FollowUpDetails, InterventionPlan,
    Participant, ParticipantId, PlanCompliance, PlanDetails, ProsecutionMode, Stage,
};
use crate::workflows::diversion::eligibility::{EligibilityEvaluator, EligibilityRules};
use crate::workflows::diversion::progression;
use crate::workflows::diversion::repository::{
    ParticipantRecord, ParticipantRepository, RepositoryError,
};
use crate::workflows::diversion::{diversion_router, DiversionService};

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn evaluator() -> EligibilityEvaluator {
    EligibilityEvaluator::new(EligibilityRules::standard())
}

/// Candidate charged with an unrestricted offence who satisfies every check.
pub(super) fn eligible_input() -> EligibilityInput {
    EligibilityInput {
        vulnerabilities: vec!["mental_health_disorder".to_string()],
        offence_category: "mischief".to_string(),
        prosecution_mode: Some(ProsecutionMode::Summary),
        victim_consent: None,
        accepts_responsibility: true,
        is_voluntary: true,
        waives_delay: true,
        criminally_fit: true,
    }
}

pub(super) fn domestic_violence_input() -> EligibilityInput {
    EligibilityInput {
        offence_category: "domestic_violence".to_string(),
        victim_consent: Some(true),
        ..eligible_input()
    }
}

pub(super) fn maximally_failing_input() -> EligibilityInput {
    EligibilityInput {
        vulnerabilities: Vec::new(),
        offence_category: "homicide".to_string(),
        prosecution_mode: Some(ProsecutionMode::Indictment),
        victim_consent: None,
        accepts_responsibility: false,
        is_voluntary: false,
        waives_delay: false,
        criminally_fit: false,
    }
}

pub(super) fn enrollment(eligibility: EligibilityInput) -> EnrollmentRequest {
    EnrollmentRequest {
        name: "Jordan Tremblay".to_string(),
        district: "Montréal".to_string(),
        referral_id: Some("ref-2025-0042".to_string()),
        eligibility,
    }
}

pub(super) fn enrolled_participant() -> Participant {
    progression::enroll(
        &evaluator(),
        || ParticipantId("ptc-test".to_string()),
        enrollment(eligible_input()),
        at(8),
    )
    .expect("eligible candidate enrolls")
}

pub(super) fn participant_at(stage: Stage) -> Participant {
    let mut participant = enrolled_participant();
    let mut hour = 9;
    while participant.stage != stage {
        participant = progression::advance_stage(&participant, at(hour)).expect("can advance");
        hour += 1;
    }
    participant
}

pub(super) fn plan_details() -> PlanDetails {
    PlanDetails {
        clinician: "Dr. Gagnon".to_string(),
        objectives: vec!["Weekly psychiatric follow-up".to_string()],
        services: vec!["CLSC outreach".to_string()],
        review_on: NaiveDate::from_ymd_opt(2025, 6, 1),
    }
}

pub(super) fn follow_up_details() -> FollowUpDetails {
    FollowUpDetails {
        hearing_on: NaiveDate::from_ymd_opt(2025, 5, 20).expect("valid date"),
        compliance: PlanCompliance::Compliant,
        notes: "Attending all appointments".to_string(),
        next_hearing_on: NaiveDate::from_ymd_opt(2025, 7, 15),
    }
}

#[derive(Default)]
struct Store {
    participants: HashMap<ParticipantId, ParticipantRecord>,
    plans: Vec<InterventionPlan>,
    follow_ups: Vec<FollowUp>,
}

impl Store {
    fn ensure_version(&self, id: &ParticipantId, expected: u64) -> Result<(), RepositoryError> {
        let stored = self
            .participants
            .get(id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected {
            return Err(RepositoryError::StaleVersion {
                expected,
                found: stored.version,
            });
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    store: Arc<Mutex<Store>>,
}

impl ParticipantRepository for MemoryRepository {
    fn insert(&self, participant: Participant) -> Result<ParticipantRecord, RepositoryError> {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        if guard.participants.contains_key(&participant.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = ParticipantRecord {
            participant,
            version: 1,
        };
        guard
            .participants
            .insert(record.participant.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ParticipantId) -> Result<Option<ParticipantRecord>, RepositoryError> {
        let guard = self.store.lock().expect("repository mutex poisoned");
        Ok(guard.participants.get(id).cloned())
    }

    fn commit(
        &self,
        participant: Participant,
        expected_version: u64,
    ) -> Result<ParticipantRecord, RepositoryError> {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        let stored = guard
            .participants
            .get_mut(&participant.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != expected_version {
            return Err(RepositoryError::StaleVersion {
                expected: expected_version,
                found: stored.version,
            });
        }
        stored.participant = participant;
        stored.version += 1;
        Ok(stored.clone())
    }

    fn active(&self, limit: usize) -> Result<Vec<ParticipantRecord>, RepositoryError> {
        let guard = self.store.lock().expect("repository mutex poisoned");
        Ok(guard
            .participants
            .values()
            .filter(|record| !record.participant.is_closed())
            .take(limit)
            .cloned()
            .collect())
    }

    fn insert_plan(
        &self,
        plan: InterventionPlan,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        guard.ensure_version(&plan.participant_id, expected_version)?;
        guard.plans.push(plan);
        Ok(())
    }

    fn plans(&self, id: &ParticipantId) -> Result<Vec<InterventionPlan>, RepositoryError> {
        let guard = self.store.lock().expect("repository mutex poisoned");
        Ok(guard
            .plans
            .iter()
            .filter(|plan| &plan.participant_id == id)
            .cloned()
            .collect())
    }

    fn insert_follow_up(
        &self,
        follow_up: FollowUp,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        guard.ensure_version(&follow_up.participant_id, expected_version)?;
        guard.follow_ups.push(follow_up);
        Ok(())
    }

    fn follow_ups(&self, id: &ParticipantId) -> Result<Vec<FollowUp>, RepositoryError> {
        let guard = self.store.lock().expect("repository mutex poisoned");
        Ok(guard
            .follow_ups
            .iter()
            .filter(|follow_up| &follow_up.participant_id == id)
            .cloned()
            .collect())
    }
}

impl MemoryRepository {
    /// Simulate a concurrent writer bumping the stored version.
    pub(super) fn bump_version(&self, id: &ParticipantId) {
        let mut guard = self.store.lock().expect("repository mutex poisoned");
        if let Some(record) = guard.participants.get_mut(id) {
            record.version += 1;
        }
    }

    pub(super) fn len(&self) -> usize {
        self.store
            .lock()
            .expect("repository mutex poisoned")
            .participants
            .len()
    }
}

pub(super) struct UnavailableRepository;

impl ParticipantRepository for UnavailableRepository {
    fn insert(&self, _participant: Participant) -> Result<ParticipantRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ParticipantId) -> Result<Option<ParticipantRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(
        &self,
        _participant: Participant,
        _expected_version: u64,
    ) -> Result<ParticipantRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active(&self, _limit: usize) -> Result<Vec<ParticipantRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_plan(
        &self,
        _plan: InterventionPlan,
        _expected_version: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn plans(&self, _id: &ParticipantId) -> Result<Vec<InterventionPlan>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_follow_up(
        &self,
        _follow_up: FollowUp,
        _expected_version: u64,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn follow_ups(&self, _id: &ParticipantId) -> Result<Vec<FollowUp>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (DiversionService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = DiversionService::new(repository.clone(), EligibilityRules::standard());
    (service, repository)
}

pub(super) fn router_with_service(service: DiversionService<MemoryRepository>) -> axum::Router {
    diversion_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
