use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::FieldData;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFieldDataRequest {
    pub location: String,
    pub area_hectares: f64,
    pub season: String,
    pub soil_type: String,
    pub planting_date: NaiveDate,
    pub expected_harvest_kg: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldDataList {
    pub items: Vec<FieldData>,
}
