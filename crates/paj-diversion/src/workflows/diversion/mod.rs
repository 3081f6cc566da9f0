//! PAJ-SM+ diversion program core: intake eligibility and stage progression.
//!
//! The eligibility evaluator and progression engine are pure; the service layers storage on
//! top through [`ParticipantRepository`], and the router exposes the service over HTTP.

pub mod domain;
pub mod eligibility;
pub mod progression;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    EligibilityInput, EnrollmentRequest, FollowUp, FollowUpDetails, FollowUpId,
    InterventionPlan, Participant, ParticipantId, ParticipantStatusView, PlanCompliance,
    PlanDetails, PlanId, ProgramOutcome, ProsecutionMode, Stage, VulnerabilityType,
    VulnerabilityTypeView,
};
pub use eligibility::{
    EligibilityEvaluator, EligibilityRules, EligibilityVerdict, IneligibilityReason,
    OffenceClassification, RuleTableError,
};
pub use progression::{DomainError, ValidationError};
pub use repository::{ParticipantRecord, ParticipantRepository, RepositoryError};
pub use router::diversion_router;
pub use service::{DiversionService, DiversionServiceError};
