// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::models::contracts::ContractStatus;

pub type AppResult<T> = Result<T, AppError>;

// Taxonomia de erros do núcleo. Negar acesso NÃO é erro: é um Verdict.
#[derive(Debug, Error)]
pub enum AppError {
    // Requisito de permissão malformado. Fatal, detectado na montagem das rotas.
    #[error("Erro de configuração: {0}")]
    Configuration(String),

    // Violação de invariante do domínio (nenhuma mutação parcial é aplicada)
    #[error("Erro de validação: {0}")]
    ValidationError(String),

    // Payload que não passou no `validator`
    #[error("Erro de validação")]
    InvalidPayload(#[from] validator::ValidationErrors),

    #[error("{entity} {id} não encontrado")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Transição de status inválida: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ContractStatus,
        to: ContractStatus,
    },

    // A API remota rejeitou a chamada; quem chamou deve reverter o otimista
    #[error("Falha na API remota: {0}")]
    NetworkFailure(String),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        AppError::NotFound { entity, id }
    }
}

// Achata os erros aninhados em caminhos como `emergency_contacts[0].phone`
fn collect_details(prefix: &str, errors: &ValidationErrors, out: &mut HashMap<String, Vec<String>>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                out.insert(path, messages);
            }
            ValidationErrorsKind::Struct(inner) => collect_details(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_details(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            // Retorna todos os detalhes da validação por campo.
            AppError::InvalidPayload(errors) => {
                let mut details = HashMap::new();
                collect_details("", errors, &mut details);
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::NetworkFailure(_) => {
                tracing::warn!("Falha remota propagada ao cliente: {}", self);
                (StatusCode::BAD_GATEWAY, "A API remota rejeitou a operação.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),

            // Configuration e Internal viram 500; o tracing guarda o detalhe.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let id = Uuid::new_v4();
        assert_eq!(
            AppError::not_found("Cliente", id).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidTransition {
                from: ContractStatus::Deleted,
                to: ContractStatus::Active,
            }
            .into_response()
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NetworkFailure("timeout".into()).into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn nested_contact_errors_keep_their_path() {
        use crate::models::crm::{ClientPatch, EmergencyContact};
        use validator::Validate;

        let patch = ClientPatch {
            emergency_contacts: Some(vec![EmergencyContact {
                name: "Ana".into(),
                phone: String::new(),
                relationship: None,
            }]),
            ..Default::default()
        };
        let mut details = HashMap::new();
        collect_details("", &patch.validate().unwrap_err(), &mut details);

        assert_eq!(details["emergency_contacts[0].phone"], vec!["required".to_string()]);
    }

    #[test]
    fn configuration_error_is_internal() {
        let resp = AppError::Configuration("módulo vazio".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
