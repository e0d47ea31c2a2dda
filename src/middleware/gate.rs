// src/middleware/gate.rs

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    models::{
        auth::Session,
        rbac::{AllowPath, DenyReason, PermissionRequirement, Verdict},
    },
    services::rbac_service,
};

/// Estado do portão. Sempre derivado de (sessão, requisito); o portão não
/// guarda estado próprio, então uma revogação de privilégio vale já na
/// próxima avaliação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateState {
    Loading,
    Unauthenticated,
    Denied,
    Allowed(AllowPath),
}

impl GateState {
    pub fn derive(session: &Session, verdict: &Verdict) -> Self {
        match verdict {
            // Sessão carregando nunca mostra conteúdo, nem com bypass
            _ if session.is_loading => GateState::Loading,
            Verdict::Pending => GateState::Loading,
            Verdict::Deny(DenyReason::Unauthenticated) => GateState::Unauthenticated,
            Verdict::Deny(DenyReason::InsufficientPrivilege) => GateState::Denied,
            Verdict::Allow(path) => GateState::Allowed(*path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateAction {
    GoBack,
}

/// O que o portão "renderiza" no lugar do conteúdo protegido.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface<T> {
    Loading,
    SignIn,
    Denied { actions: Vec<GateAction> },
    Content(T),
}

impl<T> Surface<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Surface::Content(value) => Some(value),
            _ => None,
        }
    }
}

pub struct AccessGate<'a> {
    requirement: &'a PermissionRequirement,
}

impl<'a> AccessGate<'a> {
    pub fn new(requirement: &'a PermissionRequirement) -> Self {
        Self { requirement }
    }

    pub fn state(&self, session: &Session) -> GateState {
        let verdict = rbac_service::evaluate(session, self.requirement);
        GateState::derive(session, &verdict)
    }

    /// `content` só é chamado no estado Allowed; em qualquer outro estado o
    /// conteúdo protegido (e seus efeitos) nunca é montado.
    pub fn render<T, F>(&self, session: &Session, content: F) -> Surface<T>
    where
        F: FnOnce() -> T,
    {
        match self.state(session) {
            GateState::Loading => Surface::Loading,
            GateState::Unauthenticated => Surface::SignIn,
            GateState::Denied => Surface::Denied { actions: vec![GateAction::GoBack] },
            GateState::Allowed(_) => Surface::Content(content()),
        }
    }
}

/// Rejeição HTTP do portão: cada estado não-Allowed vira a sua "tela".
#[derive(Debug)]
pub struct GateRejection {
    pub state: GateState,
    pub module: String,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self.state {
            GateState::Loading => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, "1")],
                Json(json!({
                    "state": "loading",
                    "error": "Sessão ainda carregando.",
                })),
            )
                .into_response(),
            GateState::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "state": "unauthenticated",
                    "surface": "sign-in",
                    "error": "Usuário não autenticado",
                })),
            )
                .into_response(),
            GateState::Denied => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "state": "denied",
                    "actions": [GateAction::GoBack],
                    "error": format!("Você não tem acesso ao módulo '{}'.", self.module),
                })),
            )
                .into_response(),
            // Allowed nunca vira rejeição; se chegar aqui é bug de quem chamou
            GateState::Allowed(_) => {
                tracing::error!("GateRejection construída para um estado Allowed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
