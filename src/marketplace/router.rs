use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::{JobCatalog, JobDraft, JobId, JobUpdate};
use super::filter::SearchQuery;
use super::ledger::{ApplicationStore, UserId};
use super::seed::CatalogSeeder;
use super::service::{ApplyOutcome, MarketplaceError, MarketplaceService};

/// Router builder exposing the marketplace over HTTP.
pub fn marketplace_router<C, L>(service: Arc<MarketplaceService<C, L>>) -> Router
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(list_jobs_handler::<C, L>).post(create_job_handler::<C, L>),
        )
        .route("/api/v1/jobs/search", get(search_handler::<C, L>))
        .route(
            "/api/v1/jobs/:job_id",
            get(get_job_handler::<C, L>)
                .patch(update_job_handler::<C, L>)
                .delete(delete_job_handler::<C, L>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            get(job_applications_handler::<C, L>).post(apply_handler::<C, L>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications/:user_id",
            delete(cancel_handler::<C, L>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications/:user_id/advance",
            post(advance_handler::<C, L>),
        )
        .route(
            "/api/v1/users/:user_id/applications",
            get(user_applications_handler::<C, L>),
        )
        .route("/api/v1/catalog/seed", post(seed_handler::<C, L>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub target_stage: usize,
}

#[derive(Debug, Deserialize)]
pub struct SeedRequest {
    pub csv: String,
}

pub(crate) async fn list_jobs_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    match service.list_jobs() {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn search_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Query(query): Query<SearchQuery>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    match service.search(query) {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn create_job_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    match service.create_job(draft) {
        Ok(job) => (StatusCode::CREATED, axum::Json(job)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn get_job_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    match service.get_job(&id) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(MarketplaceError::JobNotFound) => job_not_found(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn update_job_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(job_id): Path<String>,
    axum::Json(patch): axum::Json<JobUpdate>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    match service.update_job(&id, patch) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(MarketplaceError::JobNotFound) => job_not_found(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn delete_job_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    match service.delete_job(&id) {
        Ok(job) => {
            let payload = json!({
                "deleted": job.id.0,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(MarketplaceError::JobNotFound) => job_not_found(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn apply_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(job_id): Path<String>,
    axum::Json(request): axum::Json<ApplyRequest>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    let user = UserId(request.user_id);
    match service.apply(&id, &user) {
        Ok(ApplyOutcome::Submitted(application)) => {
            (StatusCode::CREATED, axum::Json(application.to_view())).into_response()
        }
        Ok(ApplyOutcome::AlreadyApplied) => {
            let payload = json!({
                "status": "already_applied",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(ApplyOutcome::JobUnavailable) => {
            let payload = json!({
                "error": "job unavailable",
                "job_id": id.0,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn cancel_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path((job_id, user_id)): Path<(String, String)>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    let user = UserId(user_id);
    match service.cancel(&id, &user) {
        Ok(Some(application)) => {
            (StatusCode::OK, axum::Json(application.to_view())).into_response()
        }
        Ok(None) => {
            let payload = json!({
                "error": "application not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn advance_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path((job_id, user_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<AdvanceRequest>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    let user = UserId(user_id);
    match service.advance_stage(&id, &user, request.target_stage) {
        Ok(application) => (StatusCode::OK, axum::Json(application.to_view())).into_response(),
        Err(MarketplaceError::ApplicationNotFound { .. }) => {
            let payload = json!({
                "error": "application not found",
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(MarketplaceError::InvalidTransition(rejected)) => {
            let payload = json!({
                "error": rejected.to_string(),
                "current": rejected.current,
                "target": rejected.target,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn job_applications_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(job_id): Path<String>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let id = JobId(job_id);
    match service.applications_for_job(&id) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(MarketplaceError::JobNotFound) => job_not_found(&id),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn user_applications_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    Path(user_id): Path<String>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    let user = UserId(user_id);
    match service.applications_for_user(&user) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(other) => internal_error(other),
    }
}

pub(crate) async fn seed_handler<C, L>(
    State(service): State<Arc<MarketplaceService<C, L>>>,
    axum::Json(request): axum::Json<SeedRequest>,
) -> Response
where
    C: JobCatalog + 'static,
    L: ApplicationStore + 'static,
{
    match CatalogSeeder::from_reader(service.as_ref(), request.csv.as_bytes()) {
        Ok(summary) => {
            let payload = json!({
                "created": summary.created,
                "skipped": summary.skipped,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
        }
    }
}

fn job_not_found(id: &JobId) -> Response {
    let payload = json!({
        "error": "job not found",
        "job_id": id.0,
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn internal_error(error: MarketplaceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
