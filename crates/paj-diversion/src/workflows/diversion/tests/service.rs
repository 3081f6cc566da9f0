use std::sync::Arc;

use super::common::*;
use crate::workflows::diversion::domain::{
    FollowUp, InterventionPlan, Participant, ParticipantId, ProgramOutcome, Stage,
};
use crate::workflows::diversion::eligibility::EligibilityRules;
use crate::workflows::diversion::progression::DomainError;
use crate::workflows::diversion::repository::{
    ParticipantRecord, ParticipantRepository, RepositoryError,
};
use crate::workflows::diversion::{DiversionService, DiversionServiceError};

#[test]
fn enroll_persists_eligible_participants() {
    let (service, repository) = build_service();

    let record = service
        .enroll(enrollment(eligible_input()))
        .expect("eligible candidate enrolls");

    assert!(record.participant.id.0.starts_with("ptc-"));
    assert_eq!(record.participant.stage, Stage::Referral);
    let stored = repository
        .fetch(&record.participant.id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.participant, record.participant);
}

#[test]
fn enroll_never_stores_ineligible_candidates() {
    let (service, repository) = build_service();

    match service.enroll(enrollment(maximally_failing_input())) {
        Err(DiversionServiceError::Validation(err)) => assert!(err.reasons.len() >= 5),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(repository.len(), 0);
}

#[test]
fn get_reports_not_found() {
    let (service, _) = build_service();

    match service.get(&ParticipantId("missing".to_string())) {
        Err(DiversionServiceError::Domain(DomainError::NotFound(id))) => assert_eq!(id, "missing"),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn advancing_through_the_service_bumps_versions_and_completes() {
    let (service, _) = build_service();
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;

    let mut last = None;
    for _ in 0..5 {
        last = Some(service.advance_stage(&id).expect("advance succeeds"));
    }
    let record = last.expect("advanced at least once");

    assert_eq!(record.version, 6);
    assert_eq!(record.participant.stage, Stage::ProgramOutcome);
    assert_eq!(record.participant.outcome, Some(ProgramOutcome::Completed));
    assert!(record.participant.completed_at.is_some());

    match service.advance_stage(&id) {
        Err(DiversionServiceError::Domain(DomainError::FinalStageReached { .. })) => {}
        other => panic!("expected final stage error, got {other:?}"),
    }
}

#[test]
fn withdraw_then_advance_is_refused() {
    let (service, repository) = build_service();
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;

    let withdrawn = service
        .withdraw(&id, "relocated")
        .expect("withdraw succeeds");
    assert_eq!(withdrawn.participant.outcome, Some(ProgramOutcome::Withdrawn));

    match service.advance_stage(&id) {
        Err(DiversionServiceError::Domain(DomainError::FinalOutcomeRecorded { .. })) => {}
        other => panic!("expected final outcome error, got {other:?}"),
    }
    let stored = repository.fetch(&id).expect("fetch").expect("present");
    assert_eq!(stored.participant.stage, Stage::Referral);
    assert_eq!(stored.version, 2);
}

#[test]
fn stale_snapshots_are_rejected_on_commit() {
    let (service, repository) = build_service();
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;
    let snapshot = repository.fetch(&id).expect("fetch").expect("present");

    service.advance_stage(&id).expect("first writer wins");

    match repository.commit(snapshot.participant, snapshot.version) {
        Err(RepositoryError::StaleVersion { expected, found }) => {
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected stale version, got {other:?}"),
    }
}

#[test]
fn transition_fails_when_version_moves_underneath() {
    let repository = Arc::new(ConcurrentWriterRepository::default());
    let service = DiversionService::new(repository.clone(), EligibilityRules::standard());
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;

    match service.withdraw(&id, "racing writer") {
        Err(DiversionServiceError::Repository(RepositoryError::StaleVersion { .. })) => {}
        other => panic!("expected stale version, got {other:?}"),
    }
    let stored = repository.inner.fetch(&id).expect("fetch").expect("present");
    assert!(stored.participant.outcome.is_none());
}

#[test]
fn revoke_consent_closes_the_case() {
    let (service, _) = build_service();
    let mut request = enrollment(domestic_violence_input());
    request.name = "Alexis Roy".to_string();
    let id = service.enroll(request).expect("enrolls").participant.id;
    service.advance_stage(&id).expect("advance");

    let record = service.revoke_victim_consent(&id).expect("revocation");

    assert_eq!(
        record.participant.outcome,
        Some(ProgramOutcome::ReturnedToCourt)
    );
    assert_eq!(record.participant.eligibility.victim_consent, Some(false));
    assert_eq!(record.participant.stage, Stage::ProsecutorEvaluation);
    assert!(service.active(10).expect("active").is_empty());
}

#[test]
fn plans_and_follow_ups_are_stage_gated_and_listed() {
    let (service, _) = build_service();
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;

    match service.create_intervention_plan(&id, plan_details()) {
        Err(DiversionServiceError::Domain(DomainError::WrongStage { .. })) => {}
        other => panic!("expected wrong stage, got {other:?}"),
    }

    for _ in 0..3 {
        service.advance_stage(&id).expect("advance");
    }
    let plan = service
        .create_intervention_plan(&id, plan_details())
        .expect("plan created");
    assert!(plan.id.0.starts_with("plan-"));
    assert!(service.add_follow_up(&id, follow_up_details()).is_err());

    service.advance_stage(&id).expect("advance to hearings");
    let follow_up = service
        .add_follow_up(&id, follow_up_details())
        .expect("follow-up recorded");

    let plans = service.intervention_plans(&id).expect("plans");
    let follow_ups = service.follow_ups(&id).expect("follow-ups");
    assert_eq!(plans, vec![plan]);
    assert_eq!(follow_ups, vec![follow_up]);

    let record = service.get(&id).expect("participant");
    assert_eq!(record.participant.stage, Stage::HearingFollowups);
    assert_eq!(record.version, 5);
}

#[test]
fn listing_sub_records_for_unknown_participants_is_not_found() {
    let (service, _) = build_service();
    let missing = ParticipantId("ptc-missing".to_string());

    assert!(matches!(
        service.intervention_plans(&missing),
        Err(DiversionServiceError::Domain(DomainError::NotFound(_)))
    ));
    assert!(matches!(
        service.follow_ups(&missing),
        Err(DiversionServiceError::Domain(DomainError::NotFound(_)))
    ));
}

#[test]
fn rejected_enrollments_do_not_consume_participant_ids() {
    let (service, _) = build_service();

    assert!(service.enroll(enrollment(maximally_failing_input())).is_err());
    assert!(service.enroll(enrollment(maximally_failing_input())).is_err());
    let first = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls");
    let second = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls");

    assert_eq!(first.participant.id.0, "ptc-000001");
    assert_eq!(second.participant.id.0, "ptc-000002");
}

#[test]
fn wrong_stage_requests_do_not_consume_plan_ids() {
    let (service, _) = build_service();
    let id = service
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;

    assert!(service.create_intervention_plan(&id, plan_details()).is_err());
    for _ in 0..3 {
        service.advance_stage(&id).expect("advance");
    }
    let plan = service
        .create_intervention_plan(&id, plan_details())
        .expect("plan created");

    assert_eq!(plan.id.0, "plan-000001");
}

#[test]
fn plan_is_refused_when_the_participant_moved_after_the_stage_check() {
    let memory = MemoryRepository::default();
    let steady = DiversionService::new(Arc::new(memory.clone()), EligibilityRules::standard());
    let id = steady
        .enroll(enrollment(eligible_input()))
        .expect("enrolls")
        .participant
        .id;
    for _ in 0..3 {
        steady.advance_stage(&id).expect("advance");
    }

    let racing = DiversionService::new(
        Arc::new(ConcurrentWriterRepository {
            inner: memory.clone(),
        }),
        EligibilityRules::standard(),
    );

    match racing.create_intervention_plan(&id, plan_details()) {
        Err(DiversionServiceError::Repository(RepositoryError::StaleVersion { .. })) => {}
        other => panic!("expected stale version, got {other:?}"),
    }
    match racing.add_follow_up(&id, follow_up_details()) {
        Err(DiversionServiceError::Domain(DomainError::WrongStage { .. })) => {}
        other => panic!("expected wrong stage, got {other:?}"),
    }
    assert!(memory.plans(&id).expect("plans").is_empty());
}

#[test]
fn repository_outages_propagate() {
    let service = DiversionService::new(
        Arc::new(UnavailableRepository),
        EligibilityRules::standard(),
    );

    match service.enroll(enrollment(eligible_input())) {
        Err(DiversionServiceError::Repository(RepositoryError::Unavailable(_))) => {}
        other => panic!("expected repository outage, got {other:?}"),
    }
}

/// Repository whose stored version moves between every fetch and commit.
#[derive(Default)]
struct ConcurrentWriterRepository {
    inner: MemoryRepository,
}

impl ParticipantRepository for ConcurrentWriterRepository {
    fn insert(
        &self,
        participant: Participant,
    ) -> Result<ParticipantRecord, RepositoryError> {
        self.inner.insert(participant)
    }

    fn fetch(
        &self,
        id: &ParticipantId,
    ) -> Result<Option<ParticipantRecord>, RepositoryError> {
        let record = self.inner.fetch(id)?;
        self.inner.bump_version(id);
        Ok(record)
    }

    fn commit(
        &self,
        participant: Participant,
        expected_version: u64,
    ) -> Result<ParticipantRecord, RepositoryError> {
        self.inner.commit(participant, expected_version)
    }

    fn active(
        &self,
        limit: usize,
    ) -> Result<Vec<ParticipantRecord>, RepositoryError> {
        self.inner.active(limit)
    }

    fn insert_plan(
        &self,
        plan: InterventionPlan,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.insert_plan(plan, expected_version)
    }

    fn plans(
        &self,
        id: &ParticipantId,
    ) -> Result<Vec<InterventionPlan>, RepositoryError> {
        self.inner.plans(id)
    }

    fn insert_follow_up(
        &self,
        follow_up: FollowUp,
        expected_version: u64,
    ) -> Result<(), RepositoryError> {
        self.inner.insert_follow_up(follow_up, expected_version)
    }

    fn follow_ups(
        &self,
        id: &ParticipantId,
    ) -> Result<Vec<FollowUp>, RepositoryError> {
        self.inner.follow_ups(id)
    }
}
