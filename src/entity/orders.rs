use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub client_name: String,
    pub phone: String,
    pub delivery_address: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub client_id: Option<Uuid>,
    pub livreur_id: Option<Uuid>,
    pub delivery_notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ClientId",
        to = "super::users::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::LivreurId",
        to = "super::users::Column::Id"
    )]
    DeliveryPerson,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle: `Pending -> Validated -> InTransit -> Delivered`, with
/// `Rejected` reachable from the first two. Status-to-status moves are not
/// guarded; only the caller's role and assignment are.
#[derive(
    Copy,
    Clone,
    Debug,
    EnumIter,
    DeriveActiveEnum,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl OrderStatus {
    /// Orders in these states still wait for a delivery person.
    pub const AWAITING_ASSIGNMENT: [OrderStatus; 2] =
        [OrderStatus::Pending, OrderStatus::Validated];

    /// Status after a delivery person is assigned: assignment accepts a
    /// pending order into preparation and leaves every other state alone.
    pub fn after_assignment(self) -> Self {
        match self {
            OrderStatus::Pending => OrderStatus::Validated,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_only_advances_pending_orders() {
        assert_eq!(
            OrderStatus::Pending.after_assignment(),
            OrderStatus::Validated
        );
        for status in [
            OrderStatus::Validated,
            OrderStatus::InTransit,
            OrderStatus::Delivered,
            OrderStatus::Rejected,
        ] {
            assert_eq!(status.after_assignment(), status);
        }
    }

    #[test]
    fn status_wire_format_is_snake_case() {
        let json = serde_json::to_string(&OrderStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
        let parsed: OrderStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, OrderStatus::Rejected);
    }
}
