use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    EligibilityInput, EnrollmentRequest, FollowUpDetails, ParticipantId, PlanDetails,
};
use super::progression::DomainError;
use super::repository::{ParticipantRepository, RepositoryError};
use super::service::{DiversionService, DiversionServiceError};

/// Listing size when the caller gives no `limit`.
pub const DEFAULT_ACTIVE_LIMIT: usize = 50;
/// Upper bound on a caller-supplied `limit`.
pub const MAX_ACTIVE_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActiveListingQuery {
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WithdrawalRequest {
    #[serde(default)]
    pub(crate) reason: String,
}

/// Router builder exposing eligibility and participant endpoints.
pub fn diversion_router<R>(service: Arc<DiversionService<R>>) -> Router
where
    R: ParticipantRepository + 'static,
{
    Router::new()
        .route("/api/v1/eligibility/evaluate", post(evaluate_handler::<R>))
        .route("/api/v1/eligibility/exclusions", get(exclusions_handler::<R>))
        .route(
            "/api/v1/eligibility/vulnerabilities",
            get(vulnerabilities_handler::<R>),
        )
        .route(
            "/api/v1/participants",
            get(active_participants_handler::<R>).post(enroll_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id",
            get(participant_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id/advance",
            post(advance_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id/withdraw",
            post(withdraw_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id/revoke-consent",
            post(revoke_consent_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id/intervention-plans",
            get(list_plans_handler::<R>).post(create_plan_handler::<R>),
        )
        .route(
            "/api/v1/participants/:participant_id/follow-ups",
            get(list_follow_ups_handler::<R>).post(add_follow_up_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Json(input): Json<EligibilityInput>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    let verdict = service.evaluate(&input);
    (StatusCode::OK, Json(verdict)).into_response()
}

pub(crate) async fn exclusions_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    let categories = service.exclusion_categories();
    (StatusCode::OK, Json(json!({ "categories": categories }))).into_response()
}

pub(crate) async fn vulnerabilities_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    let types = service.vulnerability_types();
    (StatusCode::OK, Json(json!({ "vulnerability_types": types }))).into_response()
}

pub(crate) async fn enroll_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Json(request): Json<EnrollmentRequest>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.enroll(request) {
        Ok(record) => (StatusCode::CREATED, Json(record.participant.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn active_participants_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Query(query): Query<ActiveListingQuery>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVE_LIMIT)
        .min(MAX_ACTIVE_LIMIT);
    match service.active(limit) {
        Ok(records) => {
            let views: Vec<_> = records
                .iter()
                .map(|record| record.participant.status_view())
                .collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn participant_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.get(&ParticipantId(participant_id)) {
        Ok(record) => (StatusCode::OK, Json(record.participant)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn advance_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.advance_stage(&ParticipantId(participant_id)) {
        Ok(record) => (StatusCode::OK, Json(record.participant.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn withdraw_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
    Json(request): Json<WithdrawalRequest>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.withdraw(&ParticipantId(participant_id), &request.reason) {
        Ok(record) => (StatusCode::OK, Json(record.participant.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn revoke_consent_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.revoke_victim_consent(&ParticipantId(participant_id)) {
        Ok(record) => (StatusCode::OK, Json(record.participant.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_plan_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
    Json(details): Json<PlanDetails>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.create_intervention_plan(&ParticipantId(participant_id), details) {
        Ok(plan) => (StatusCode::CREATED, Json(plan)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_plans_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.intervention_plans(&ParticipantId(participant_id)) {
        Ok(plans) => (StatusCode::OK, Json(plans)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_follow_up_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
    Json(details): Json<FollowUpDetails>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.add_follow_up(&ParticipantId(participant_id), details) {
        Ok(follow_up) => (StatusCode::CREATED, Json(follow_up)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_follow_ups_handler<R>(
    State(service): State<Arc<DiversionService<R>>>,
    Path(participant_id): Path<String>,
) -> Response
where
    R: ParticipantRepository + 'static,
{
    match service.follow_ups(&ParticipantId(participant_id)) {
        Ok(follow_ups) => (StatusCode::OK, Json(follow_ups)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: DiversionServiceError) -> Response {
    let (status, payload) = match &err {
        DiversionServiceError::Validation(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({
                "error": "candidate is not eligible",
                "reasons": validation.reasons,
            }),
        ),
        DiversionServiceError::Domain(DomainError::NotFound(_))
        | DiversionServiceError::Repository(RepositoryError::NotFound) => {
            (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
        }
        DiversionServiceError::Domain(_)
        | DiversionServiceError::Repository(RepositoryError::Conflict)
        | DiversionServiceError::Repository(RepositoryError::StaleVersion { .. }) => {
            (StatusCode::CONFLICT, json!({ "error": err.to_string() }))
        }
        DiversionServiceError::Repository(RepositoryError::Unavailable(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": err.to_string() }),
        ),
    };

    (status, Json(payload)).into_response()
}
