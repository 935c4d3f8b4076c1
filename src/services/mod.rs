pub mod ai_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod field_data_service;
pub mod order_service;
pub mod product_service;
pub mod user_service;
