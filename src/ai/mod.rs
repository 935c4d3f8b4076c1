//! Assistant chat and demand forecasting.

pub mod fallback;
pub mod forecast;
pub mod gateway;
pub mod provider;

pub use gateway::AiGateway;
