use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{
    dto::field_data::{CreateFieldDataRequest, FieldDataList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::FieldData,
    response::ApiResponse,
    services::field_data_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_field_data).post(create_field_data))
}

#[utoipa::path(
    post,
    path = "/api/v1/field-data",
    request_body = CreateFieldDataRequest,
    responses(
        (status = 201, description = "Record stored for the calling agent", body = ApiResponse<FieldData>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Field data"
)]
pub async fn create_field_data(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateFieldDataRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<FieldData>>)> {
    let resp = field_data_service::create_field_data(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/field-data",
    responses(
        (status = 200, description = "Own records for agents, all records for admins", body = ApiResponse<FieldDataList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Field data"
)]
pub async fn list_field_data(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FieldDataList>>> {
    let resp = field_data_service::list_field_data(&state, &user).await?;
    Ok(Json(resp))
}
