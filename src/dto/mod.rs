pub mod ai;
pub mod auth;
pub mod dashboard;
pub mod field_data;
pub mod orders;
pub mod products;
pub mod users;
