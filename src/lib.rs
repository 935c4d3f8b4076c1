pub mod ai;
pub mod authz;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod notify;
pub mod response;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;
pub mod storage;
