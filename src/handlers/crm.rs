// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermClientsRead, PermClientsWrite, PermContractsRead, RequirePermission},
    models::{
        crm::{Client, ClientPatch, ClientStatus, NewClient},
        pagination::{Paginated, PaginationParams},
    },
};

#[derive(Debug, Deserialize)]
pub struct ClientListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ClientStatus>,
}

// GET /api/clients
pub async fn list_clients(
    _perm: RequirePermission<PermClientsRead>,
    State(app_state): State<AppState>,
    Query(query): Query<ClientListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let params = PaginationParams { page: query.page.unwrap_or(1), limit: query.limit };

    let store = app_state.sync.read().await;
    let clients: Vec<Client> = store
        .clients()
        .into_iter()
        .filter(|c| query.status.is_none_or(|s| c.status == s))
        .cloned()
        .collect();

    let mut page = Paginated::from_items(
        clients,
        params.page,
        params.effective_limit(app_state.settings.page_limit),
    );
    if page.pagination.total == 0 {
        page = page.with_message("Nenhum cliente encontrado");
    }
    Ok(Json(page))
}

// POST /api/clients
pub async fn create_client(
    _perm: RequirePermission<PermClientsWrite>,
    State(app_state): State<AppState>,
    Json(payload): Json<NewClient>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.sync.add_client(payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/{id}
pub async fn get_client(
    _perm: RequirePermission<PermClientsRead>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.sync.read().await.client_view(id)?;
    Ok(Json(view))
}

// PATCH /api/clients/{id}
pub async fn update_client(
    _perm: RequirePermission<PermClientsWrite>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPatch>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.sync.update_client(id, payload).await?;
    Ok(Json(client))
}

// GET /api/clients/{id}/beneficiaries
pub async fn list_beneficiaries(
    _perm: RequirePermission<PermClientsRead>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.sync.read().await.client_view(id)?;
    Ok(Json(view.beneficiarios))
}

// GET /api/clients/{id}/contracts
pub async fn list_client_contracts(
    _perm: RequirePermission<PermContractsRead>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let store = app_state.sync.read().await;
    if store.client(id).is_none() {
        return Err(AppError::not_found("Cliente", id));
    }
    let contracts: Vec<_> = store.contracts_of(id).into_iter().cloned().collect();
    Ok(Json(contracts))
}
