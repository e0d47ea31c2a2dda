// src/handlers/contracts.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermContractsDelete, PermContractsRead, PermContractsWrite, RequirePermission},
    models::{
        contracts::{Contract, ContractPatch, NewContract},
        pagination::{Paginated, PaginationParams},
    },
};

// GET /api/contracts
pub async fn list_contracts(
    _perm: RequirePermission<PermContractsRead>,
    State(app_state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let contracts: Vec<Contract> = app_state
        .sync
        .read()
        .await
        .contracts()
        .into_iter()
        .cloned()
        .collect();

    let mut page = Paginated::from_items(
        contracts,
        params.page,
        params.effective_limit(app_state.settings.page_limit),
    );
    if page.pagination.total == 0 {
        page = page.with_message("Nenhum contrato encontrado");
    }
    Ok(Json(page))
}

// POST /api/contracts
pub async fn create_contract(
    _perm: RequirePermission<PermContractsWrite>,
    State(app_state): State<AppState>,
    Json(payload): Json<NewContract>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state.sync.add_contract(payload).await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

// PATCH /api/contracts/{id}
pub async fn update_contract(
    _perm: RequirePermission<PermContractsWrite>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContractPatch>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state.sync.update_contract(id, payload).await?;
    Ok(Json(contract))
}

// DELETE /api/contracts/{id}
// Apagamento lógico: devolve o contrato com status DELETED.
pub async fn delete_contract(
    _perm: RequirePermission<PermContractsDelete>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state.sync.delete_contract(id).await?;
    Ok(Json(contract))
}
