// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};

use crate::{
    common::error::AppError,
    config::AppState,
    handlers,
    middleware::{
        auth::session_guard,
        rbac::{
            validate_requirement, PermClientsRead, PermClientsWrite, PermContractsDelete,
            PermContractsRead, PermContractsWrite, PermMembershipsRead, PermMembershipsWrite,
        },
    },
};

/// Requisito malformado é erro de configuração: falha na montagem, nunca vira
/// um Deny em runtime.
pub fn validate_requirements() -> Result<(), AppError> {
    validate_requirement::<PermClientsRead>()?;
    validate_requirement::<PermClientsWrite>()?;
    validate_requirement::<PermContractsRead>()?;
    validate_requirement::<PermContractsWrite>()?;
    validate_requirement::<PermContractsDelete>()?;
    validate_requirement::<PermMembershipsRead>()?;
    validate_requirement::<PermMembershipsWrite>()?;
    Ok(())
}

pub fn build_router(app_state: AppState) -> Result<Router, AppError> {
    validate_requirements()?;

    let client_routes = Router::new()
        .route(
            "/",
            get(handlers::crm::list_clients).post(handlers::crm::create_client),
        )
        .route(
            "/{id}",
            get(handlers::crm::get_client).patch(handlers::crm::update_client),
        )
        .route("/{id}/beneficiaries", get(handlers::crm::list_beneficiaries))
        .route("/{id}/contracts", get(handlers::crm::list_client_contracts));

    let contract_routes = Router::new()
        .route(
            "/",
            get(handlers::contracts::list_contracts).post(handlers::contracts::create_contract),
        )
        .route(
            "/{id}",
            patch(handlers::contracts::update_contract).delete(handlers::contracts::delete_contract),
        );

    let membership_routes = Router::new()
        .route(
            "/",
            get(handlers::memberships::list_memberships)
                .post(handlers::memberships::create_membership),
        )
        .route(
            "/{id}",
            patch(handlers::memberships::update_membership)
                .delete(handlers::memberships::delete_membership),
        );

    // Combina tudo no router principal; a sessão é resolvida antes de qualquer rota
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/me", get(handlers::auth::get_me))
        .route("/api/access/check", post(handlers::rbac::check_access))
        .nest("/api/clients", client_routes)
        .nest("/api/contracts", contract_routes)
        .nest("/api/memberships", membership_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            session_guard,
        ))
        .with_state(app_state);

    Ok(app)
}
