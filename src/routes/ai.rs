use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::ai::{ChatRequest, ChatResponse, ForecastResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::ai_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat-public", post(chat_public))
        .route("/forecast", get(forecast))
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply, degraded when the provider is unavailable", body = ApiResponse<ChatResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn chat(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    let resp = ai_service::chat(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/ai/chat-public",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply for anonymous visitors", body = ApiResponse<ChatResponse>)
    ),
    tag = "AI"
)]
pub async fn chat_public(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> AppResult<Json<ApiResponse<ChatResponse>>> {
    let resp = ai_service::chat(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/ai/forecast",
    responses(
        (status = 200, description = "Seven day order projection or a diagnostic", body = ApiResponse<ForecastResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn forecast(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ForecastResponse>>> {
    let resp = ai_service::demand_forecast(&state, &user).await?;
    Ok(Json(resp))
}
