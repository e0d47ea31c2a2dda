// src/handlers/rbac.rs

use axum::{response::IntoResponse, Json};
use serde_json::json;

use crate::{
    middleware::{auth::CurrentSession, gate::GateState},
    models::rbac::PermissionRequirement,
    services::rbac_service,
};

// POST /api/access/check
// Para o frontend saber qual "tela" mostrar numa rota sem chamar o recurso.
pub async fn check_access(
    CurrentSession(session): CurrentSession,
    Json(requirement): Json<PermissionRequirement>,
) -> impl IntoResponse {
    let verdict = rbac_service::evaluate(&session, &requirement);
    let state = GateState::derive(&session, &verdict);

    Json(json!({
        "module": requirement.module(),
        "verdict": verdict,
        "state": state,
    }))
}
