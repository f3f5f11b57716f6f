//! Multi-tenant partner community platform served as a JSON API.

pub mod app_config;
pub mod db;
pub mod middleware;
pub mod notifications;
pub mod orm;
pub mod pagination;
pub mod partner;
pub mod session;
pub mod storage;
pub mod tenant;
pub mod upload;
pub mod user;
pub mod web;
