use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    authz::{Access, Operation, authorize},
    dto::field_data::{CreateFieldDataRequest, FieldDataList},
    entity::field_data::{ActiveModel, Column, Entity as FieldDataEntity},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::FieldData,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_field_data(
    state: &AppState,
    user: &AuthUser,
    payload: CreateFieldDataRequest,
) -> AppResult<ApiResponse<FieldData>> {
    authorize(user, Operation::CreateFieldData)?;

    if payload.location.trim().is_empty() {
        return Err(AppError::BadRequest("Location is required".into()));
    }
    if payload.area_hectares <= 0.0 {
        return Err(AppError::BadRequest("Area must be positive".into()));
    }
    if payload.expected_harvest_kg < 0 {
        return Err(AppError::BadRequest("Expected harvest cannot be negative".into()));
    }

    let record = ActiveModel {
        id: Set(Uuid::new_v4()),
        location: Set(payload.location.trim().to_string()),
        area_hectares: Set(payload.area_hectares),
        season: Set(payload.season),
        soil_type: Set(payload.soil_type),
        planting_date: Set(payload.planting_date),
        expected_harvest_kg: Set(payload.expected_harvest_kg),
        agent_id: Set(user.user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(field_data_id = %record.id, agent_id = %user.user_id, "field data recorded");

    Ok(ApiResponse::success(
        "Field data recorded",
        record.into(),
        Some(Meta::empty()),
    ))
}

/// Agents only see what they collected; admins see everything.
pub async fn list_field_data(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<FieldDataList>> {
    let mut finder = FieldDataEntity::find().order_by_desc(Column::CreatedAt);
    if authorize(user, Operation::ListFieldData)? == Access::Own {
        finder = finder.filter(Column::AgentId.eq(user.user_id));
    }

    let items = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(FieldData::from)
        .collect();

    Ok(ApiResponse::success(
        "Field data",
        FieldDataList { items },
        Some(Meta::empty()),
    ))
}
