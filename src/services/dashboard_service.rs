use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    dto::dashboard::DashboardSummary,
    entity::{
        field_data::{Column as FieldCol, Entity as FieldDataEntity},
        orders::{Column as OrderCol, Entity as Orders, OrderStatus},
        products::{Column as ProdCol, Entity as Products},
        users::{Column as UserCol, Entity as Users, Role},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    state::AppState,
};

/// Role-specific counters. Managers see the same figures as admins.
pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardSummary>> {
    let db = &state.orm;
    let mut stats = DashboardSummary::default();

    match user.role {
        Role::Admin | Role::Manager => {
            stats.total_users = Some(Users::find().count(db).await?);
            stats.unapproved_users = Some(
                Users::find()
                    .filter(UserCol::IsApproved.eq(false))
                    .count(db)
                    .await?,
            );
            stats.total_products = Some(Products::find().count(db).await?);
            stats.total_orders = Some(Orders::find().count(db).await?);
            stats.pending_orders = Some(
                Orders::find()
                    .filter(OrderCol::Status.eq(OrderStatus::Pending))
                    .count(db)
                    .await?,
            );
        }
        Role::Producer => {
            stats.my_products = Some(
                Products::find()
                    .filter(ProdCol::ProducerId.eq(user.user_id))
                    .count(db)
                    .await?,
            );
        }
        Role::FieldAgent => {
            stats.my_field_data_count = Some(
                FieldDataEntity::find()
                    .filter(FieldCol::AgentId.eq(user.user_id))
                    .count(db)
                    .await?,
            );
        }
        Role::Client => {
            stats.my_orders_count = Some(
                Orders::find()
                    .filter(OrderCol::ClientId.eq(user.user_id))
                    .count(db)
                    .await?,
            );
        }
        Role::DeliveryPerson => {
            let mine = Orders::find().filter(OrderCol::LivreurId.eq(user.user_id));
            stats.assigned_orders = Some(mine.clone().count(db).await?);
            stats.in_transit_orders = Some(
                mine.filter(OrderCol::Status.eq(OrderStatus::InTransit))
                    .count(db)
                    .await?,
            );
        }
    }

    Ok(ApiResponse::success("Dashboard summary", stats, None))
}
