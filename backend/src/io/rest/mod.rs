//! REST API: axum routers, caller identity extraction and the mapping
//! from domain errors to HTTP statuses.
//!
//! Authentication happens upstream; by the time a request lands here
//! the trusted `x-user-id` header identifies the caller, and the
//! access policy decides what that caller may do.

pub mod chore_apis;
pub mod kid_apis;
pub mod points_apis;
pub mod rewards_apis;

use std::sync::Arc;

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::domain::{
    AccessPolicy, ChoreService, DomainError, KidService, PointAwarder, PointsService,
    RewardsService,
};
use crate::storage::{PhotoStore, SqliteConnection};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub kid_service: KidService<SqliteConnection>,
    pub chore_service: ChoreService<SqliteConnection>,
    pub points_service: PointsService<SqliteConnection>,
    pub rewards_service: RewardsService<SqliteConnection>,
}

impl AppState {
    /// Wire the full service graph over one storage connection. The
    /// points service doubles as the chore service's point awarder.
    pub fn new(connection: Arc<SqliteConnection>, photo_store: Arc<dyn PhotoStore>) -> Self {
        let policy = AccessPolicy::new(connection.clone());
        let points_service = PointsService::new(connection.clone(), policy.clone());
        let awarder: Arc<dyn PointAwarder> = Arc::new(points_service.clone());
        let chore_service =
            ChoreService::new(connection.clone(), policy.clone(), photo_store, awarder);
        let rewards_service = RewardsService::new(connection.clone(), policy.clone());
        let kid_service = KidService::new(connection, policy);

        Self {
            kid_service,
            chore_service,
            points_service,
            rewards_service,
        }
    }
}

pub fn api_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api/kids", kid_apis::routes())
        .nest("/api/chores", chore_apis::routes())
        .nest("/api/points", points_apis::routes())
        .nest("/api/rewards", rewards_apis::routes())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = match &self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::InvalidTransition(_) => StatusCode::CONFLICT,
            DomainError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            DomainError::InsufficientPoints { .. } => StatusCode::BAD_REQUEST,
            DomainError::AlreadyClaimed(_) => StatusCode::CONFLICT,
            DomainError::NothingToClaim => StatusCode::CONFLICT,
            DomainError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// The caller id the upstream auth layer attached to the request.
pub(crate) fn caller_id(headers: &HeaderMap) -> Result<String, DomainError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DomainError::Forbidden("missing x-user-id header".into()))
}
