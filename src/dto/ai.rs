use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ai::{forecast::Forecast, gateway::ChatTurn};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    pub forecast: Forecast,
}
