use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use shared::{CreateKidRequest, UpdateKidRequest};
use tracing::info;

use super::{caller_id, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_kids).post(create_kid))
        .route("/me/profile", get(my_profile))
        .route("/:id", get(get_kid).patch(update_kid).delete(delete_kid))
}

async fn create_kid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateKidRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/kids - name: {}", request.name);

    match state.kid_service.create_kid(request, &caller).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_kids(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.kid_service.list_kids(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn my_profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.kid_service.my_profile(&caller).await {
        Ok(kid) => Json(kid).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_kid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.kid_service.get_kid(&id, &caller).await {
        Ok(kid) => Json(kid).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_kid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateKidRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("PATCH /api/kids/{}", id);

    match state.kid_service.update_kid(&id, request, &caller).await {
        Ok(kid) => Json(kid).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_kid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("DELETE /api/kids/{}", id);

    match state.kid_service.delete_kid(&id, &caller).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
