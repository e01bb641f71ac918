use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use shared::ClaimPointsRequest;
use tracing::info;

use super::{caller_id, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/available", get(available_points))
        .route("/history", get(points_history))
        .route("/kid/:kid_id", get(kid_points))
        .route("/claim", post(claim_points))
        .route("/claim-all", post(claim_all_points))
}

async fn available_points(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.points_service.available_points(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn points_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.points_service.points_history(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn kid_points(
    State(state): State<AppState>,
    Path(kid_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.points_service.kid_points(&kid_id, &caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn claim_points(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ClaimPointsRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/points/claim - {} entries", request.entry_ids.len());

    match state.points_service.claim_points(request, &caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn claim_all_points(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/points/claim-all");

    match state.points_service.claim_all_points(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}
