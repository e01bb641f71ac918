use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use shared::{AssignKidsRequest, ChangeChoreStatusRequest, CreateChoreRequest, UpdateChoreRequest};
use tracing::info;

use super::{caller_id, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_chores).post(create_chore))
        .route("/:id", get(get_chore).patch(update_chore).delete(delete_chore))
        .route("/:id/status", put(change_status))
        .route("/:id/photo", put(upload_photo))
        .route("/:id/assign", put(assign_kids))
        .route("/:id/assign/:kid_id", delete(unassign_kid))
}

async fn create_chore(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateChoreRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/chores - title: {}", request.title);

    match state.chore_service.create_chore(request, &caller).await {
        Ok(chore) => (StatusCode::CREATED, Json(chore)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_chores(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.chore_service.list_chores(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_chore(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.chore_service.get_chore(&id, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_chore(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateChoreRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("PATCH /api/chores/{}", id);

    match state.chore_service.update_chore(&id, request, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChangeChoreStatusRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("PUT /api/chores/{}/status -> {}", id, request.status.as_str());

    match state.chore_service.change_status(&id, request, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn upload_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("PUT /api/chores/{}/photo ({} bytes)", id, body.len());

    match state.chore_service.upload_photo(&id, &body, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn assign_kids(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<AssignKidsRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.chore_service.assign_kids(&id, request, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn unassign_kid(
    State(state): State<AppState>,
    Path((id, kid_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.chore_service.unassign_kid(&id, &kid_id, &caller).await {
        Ok(chore) => Json(chore).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_chore(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("DELETE /api/chores/{}", id);

    match state.chore_service.delete_chore(&id, &caller).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
