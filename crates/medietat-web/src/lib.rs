//! JSON API for Medietat: offer listing with role and status filters, single
//! offer lookup, an admin refresh trigger, and a health probe.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use medietat_core::{MedicalRole, OfferId, OfferStatus};
use medietat_refresh::RefreshPipeline;
use medietat_store::{OfferFilter, OfferStore, StoreError};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::error;

pub const CRATE_NAME: &str = "medietat-web";

const DEFAULT_PAGE_LIMIT: usize = 100;
const MAX_PAGE_LIMIT: usize = 500;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OfferStore>,
    pub refresh: Arc<RefreshPipeline>,
}

impl AppState {
    pub fn new(store: Arc<dyn OfferStore>, refresh: Arc<RefreshPipeline>) -> Self {
        Self { store, refresh }
    }
}

#[derive(Debug, Deserialize, Default)]
struct JobsQuery {
    role: Option<String>,
    status: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Debug, Serialize)]
struct JobsPage {
    total: usize,
    limit: usize,
    offset: usize,
    results: Vec<medietat_core::JobOffer>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(list_jobs_handler))
        .route("/api/jobs/{id}", get(get_job_handler))
        .route("/api/admin/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn list_jobs_handler(
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Response {
    let role = match query.role.as_deref() {
        None => None,
        Some(raw) => match MedicalRole::parse(raw) {
            Some(role) => Some(role),
            None => return bad_request(format!("unknown role: {raw}")),
        },
    };
    // Active offers by default; `status=all` lifts the filter.
    let status = match query.status.as_deref() {
        None => Some(OfferStatus::Active),
        Some("all") => None,
        Some(raw) => match OfferStatus::parse(raw) {
            Some(status) => Some(status),
            None => return bad_request(format!("unknown status: {raw}")),
        },
    };
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);

    let filter = OfferFilter {
        role,
        status,
        limit,
        offset,
    };
    match state.store.list_offers(&filter).await {
        Ok(page) => Json(JobsPage {
            total: page.total,
            limit,
            offset,
            results: page.results,
        })
        .into_response(),
        Err(err) => server_error(err),
    }
}

async fn get_job_handler(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<OfferId>,
) -> Response {
    match state.store.get_offer(id).await {
        Ok(Some(offer)) => Json(offer).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: format!("no offer with id {id}"),
            }),
        )
            .into_response(),
        Err(err) => server_error(err),
    }
}

/// Runs a refresh inline and returns the full run report, whatever its
/// status; a report full of failed sources is still a 200.
async fn refresh_handler(State(state): State<AppState>) -> Response {
    let report = state.refresh.run_once(state.store.as_ref()).await;
    Json(report).into_response()
}

async fn health_handler() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiError { error: message })).into_response()
}

fn server_error(err: StoreError) -> Response {
    error!(error = %err, "store query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            error: "internal error".to_string(),
        }),
    )
        .into_response()
}
