// src/handlers/auth.rs

use axum::{response::IntoResponse, Json};

use crate::middleware::auth::CurrentSession;

// GET /api/me
// Não passa pelo portão: devolve a sessão como está (inclusive anônima).
pub async fn get_me(CurrentSession(session): CurrentSession) -> impl IntoResponse {
    Json(session)
}
