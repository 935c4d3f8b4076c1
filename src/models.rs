use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    field_data::Model as FieldDataModel,
    order_items::Model as OrderItemModel,
    orders::{Model as OrderModel, OrderStatus},
    products::Model as ProductModel,
    users::{Model as UserModel, Role},
};

/// Public view of an account; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub is_approved: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
    pub producer_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub client_name: String,
    pub phone: String,
    pub delivery_address: String,
    pub total_price: i64,
    pub status: OrderStatus,
    pub client_id: Option<Uuid>,
    pub livreur_id: Option<Uuid>,
    pub delivery_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldData {
    pub id: Uuid,
    pub location: String,
    pub area_hectares: f64,
    pub season: String,
    pub soil_type: String,
    pub planting_date: NaiveDate,
    pub expected_harvest_kg: i32,
    pub agent_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            role: model.role,
            is_active: model.is_active,
            is_approved: model.is_approved,
            first_name: model.first_name,
            last_name: model.last_name,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<ProductModel> for Product {
    fn from(model: ProductModel) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            stock_quantity: model.stock_quantity,
            image_url: model.image_url,
            producer_id: model.producer_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderModel> for Order {
    fn from(model: OrderModel) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            client_name: model.client_name,
            phone: model.phone,
            delivery_address: model.delivery_address,
            total_price: model.total_price,
            status: model.status,
            client_id: model.client_id,
            livreur_id: model.livreur_id,
            delivery_notes: model.delivery_notes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<OrderItemModel> for OrderItem {
    fn from(model: OrderItemModel) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            unit_price: model.unit_price,
        }
    }
}

impl From<FieldDataModel> for FieldData {
    fn from(model: FieldDataModel) -> Self {
        Self {
            id: model.id,
            location: model.location,
            area_hectares: model.area_hectares,
            season: model.season,
            soil_type: model.soil_type,
            planting_date: model.planting_date,
            expected_harvest_kg: model.expected_harvest_kg,
            agent_id: model.agent_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
