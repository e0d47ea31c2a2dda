// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{common::error::AppError, config::AppState, models::auth::Session};

// Fonte de sessão: transforma o Bearer token (emitido fora daqui) em Session
// e a coloca nos "extensions" da requisição. Sem header, a sessão é anônima;
// quem decide se isso basta é o portão de cada rota.
pub async fn session_guard(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = match bearer {
        Some(TypedHeader(Authorization(bearer))) => {
            let identity = app_state.session_service.identity_from_token(bearer.token())?;
            Session::authenticated(identity)
        }
        None => Session::anonymous(),
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// Extrator para ler a sessão atual diretamente nos handlers
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(
            parts
                .extensions
                .get::<Session>()
                .cloned()
                .unwrap_or_else(Session::anonymous),
        ))
    }
}
