use serde::{Deserialize, Serialize};

use super::domain::{FollowUp, InterventionPlan, Participant, ParticipantId};

/// Stored participant plus the version used for optimistic commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub participant: Participant,
    pub version: u64,
}

/// Storage abstraction so the service can be exercised in isolation.
///
/// `commit`, `insert_plan` and `insert_follow_up` must reject a write whose `expected_version`
/// no longer matches the stored participant. That check keeps two concurrent transitions from
/// both succeeding, and keeps a stage-gated record from landing after the participant moved on.
pub trait ParticipantRepository: Send + Sync {
    fn insert(&self, participant: Participant) -> Result<ParticipantRecord, RepositoryError>;
    fn fetch(&self, id: &ParticipantId) -> Result<Option<ParticipantRecord>, RepositoryError>;
    fn commit(
        &self,
        participant: Participant,
        expected_version: u64,
    ) -> Result<ParticipantRecord, RepositoryError>;
    fn active(&self, limit: usize) -> Result<Vec<ParticipantRecord>, RepositoryError>;
    fn insert_plan(
        &self,
        plan: InterventionPlan,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn plans(&self, id: &ParticipantId) -> Result<Vec<InterventionPlan>, RepositoryError>;
    fn insert_follow_up(
        &self,
        follow_up: FollowUp,
        expected_version: u64,
    ) -> Result<(), RepositoryError>;
    fn follow_ups(&self, id: &ParticipantId) -> Result<Vec<FollowUp>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record was modified concurrently (expected version {expected}, found {found})")]
    StaleVersion { expected: u64, found: u64 },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
