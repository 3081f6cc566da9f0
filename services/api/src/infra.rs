use metrics_exporter_prometheus::PrometheusHandle;
use paj_diversion::workflows::diversion::{
    FollowUp, InterventionPlan, Participant, ParticipantId, ParticipantRecord,
    ParticipantRepository, ProsecutionMode, RepositoryError,
};
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Tables {
    participants: BTreeMap<ParticipantId, ParticipantRecord>,
    plans: Vec<InterventionPlan>,
    follow_ups: Vec<FollowUp>,
}

impl Tables {
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

/// Process-local participant store. One lock guards every table so commits stay atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryParticipantRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryParticipantRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("participant store poisoned".to_string()))
    }
}

impl ParticipantRepository for InMemoryParticipantRepository {
    fn insert(&self, participant: Participant) -> Result<ParticipantRecord, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.participants.contains_key(&participant.id) {
            return Err(RepositoryError::Conflict);
        }
        let record = ParticipantRecord {
            participant,
            version: 1,
        };
        tables
            .participants
            .insert(record.participant.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &ParticipantId) -> Result<Option<ParticipantRecord>, RepositoryError> {
        Ok(self.lock()?.participants.get(id).cloned())
    }

    fn commit(
        &self,
        participant: Participant,
        expected_version: u64,
    ) -> Result<ParticipantRecord, RepositoryError> {
        let mut tables = self.lock()?;
        let stored = tables
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
        Ok(self
            .lock()?
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
        let mut tables = self.lock()?;
        tables.ensure_version(&plan.participant_id, expected_version)?;
        tables.plans.push(plan);
        Ok(())
    }

    fn plans(&self, id: &ParticipantId) -> Result<Vec<InterventionPlan>, RepositoryError> {
        Ok(self
            .lock()?
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
        let mut tables = self.lock()?;
        tables.ensure_version(&follow_up.participant_id, expected_version)?;
        tables.follow_ups.push(follow_up);
        Ok(())
    }

    fn follow_ups(&self, id: &ParticipantId) -> Result<Vec<FollowUp>, RepositoryError> {
        Ok(self
            .lock()?
            .follow_ups
            .iter()
            .filter(|follow_up| &follow_up.participant_id == id)
            .cloned()
            .collect())
    }
}

pub(crate) fn parse_prosecution_mode(raw: &str) -> Result<ProsecutionMode, String> {
    ProsecutionMode::from_key(raw).ok_or_else(|| {
        format!(
            "unknown prosecution mode '{}': expected summary or indictment",
            raw.trim()
        )
    })
}
