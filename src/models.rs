pub mod auth;
pub mod contracts;
pub mod crm;
pub mod memberships;
pub mod pagination;
pub mod rbac;
