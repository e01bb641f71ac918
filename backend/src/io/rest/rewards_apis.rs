use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use shared::{CreateRewardRequest, RedeemRewardRequest, UpdateRewardRequest};
use tracing::info;

use super::{caller_id, AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rewards).post(create_reward))
        .route("/active", get(list_active_rewards))
        .route("/redeem", post(redeem_reward))
        .route("/history/my", get(redemption_history))
        .route("/history/kid/:kid_id", get(kid_redemption_history))
        .route("/:id", put(update_reward).get(get_reward).delete(delete_reward))
}

async fn create_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateRewardRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/rewards - title: {}", request.title);

    match state.rewards_service.create_reward(request, &caller).await {
        Ok(reward) => (StatusCode::CREATED, Json(reward)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_rewards(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.rewards_service.list_rewards(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_active_rewards(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.rewards_service.list_active_rewards(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_reward(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.rewards_service.get_reward(&id, &caller).await {
        Ok(reward) => Json(reward).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_reward(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdateRewardRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("PUT /api/rewards/{}", id);

    match state.rewards_service.update_reward(&id, request, &caller).await {
        Ok(reward) => Json(reward).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_reward(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("DELETE /api/rewards/{}", id);

    match state.rewards_service.delete_reward(&id, &caller).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn redeem_reward(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RedeemRewardRequest>,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };
    info!("POST /api/rewards/redeem - reward: {}", request.reward_id);

    match state.rewards_service.redeem_reward(request, &caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn redemption_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state.rewards_service.redemption_history(&caller).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn kid_redemption_history(
    State(state): State<AppState>,
    Path(kid_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = match caller_id(&headers) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state
        .rewards_service
        .kid_redemption_history(&kid_id, &caller)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}
