// src/handlers/memberships.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermMembershipsRead, PermMembershipsWrite, RequirePermission},
    models::{
        memberships::{Membership, MembershipPatch, NewMembership},
        pagination::{Paginated, PaginationParams},
        rbac::AllowPath,
    },
};

// Membresia + quantos contratos vivos a usam
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipListItem {
    #[serde(flatten)]
    pub membership: Membership,
    pub contracts_in_use: usize,
}

// GET /api/memberships
pub async fn list_memberships(
    RequirePermission(path, _): RequirePermission<PermMembershipsRead>,
    State(app_state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, AppError> {
    let store = app_state.sync.read().await;
    let items: Vec<MembershipListItem> = store
        .memberships()
        .into_iter()
        .map(|m| MembershipListItem {
            membership: m.clone(),
            contracts_in_use: store.membership_usage(m.id),
        })
        .collect();

    let mut page = Paginated::from_items(
        items,
        params.page,
        params.effective_limit(app_state.settings.page_limit),
    );
    if path == AllowPath::EmergencyBypass {
        page = page.with_message("Catálogo liberado por bypass de emergência");
    }
    Ok(Json(page))
}

// POST /api/memberships
pub async fn create_membership(
    _perm: RequirePermission<PermMembershipsWrite>,
    State(app_state): State<AppState>,
    Json(payload): Json<NewMembership>,
) -> Result<impl IntoResponse, AppError> {
    let membership = app_state.sync.add_membership(payload).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

// PATCH /api/memberships/{id}
pub async fn update_membership(
    _perm: RequirePermission<PermMembershipsWrite>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MembershipPatch>,
) -> Result<impl IntoResponse, AppError> {
    let membership = app_state.sync.update_membership(id, payload).await?;
    Ok(Json(membership))
}

// DELETE /api/memberships/{id}
pub async fn delete_membership(
    _perm: RequirePermission<PermMembershipsWrite>,
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.sync.delete_membership(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
