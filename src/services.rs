pub mod auth;
pub mod rbac_service;
pub mod remote;
pub mod store;
pub mod sync_service;
