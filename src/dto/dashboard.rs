use serde::Serialize;
use utoipa::ToSchema;

/// Counters shown on the dashboard; only the ones relevant to the caller's
/// role are filled in.
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unapproved_users: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_products: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_products: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_field_data_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_orders_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_orders: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_transit_orders: Option<u64>,
}
