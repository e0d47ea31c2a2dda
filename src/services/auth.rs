// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{Claims, Identity},
};

/// Lê a sessão a partir do token. A emissão dos tokens é externa; aqui só
/// validamos a assinatura e extraímos a identidade.
#[derive(Clone)]
pub struct SessionService {
    jwt_secret: String,
}

impl SessionService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn identity_from_token(&self, token: &str) -> Result<Identity, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Token rejeitado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{PermissionSet, Role};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn token(secret: &str, role: Role, permissions: Option<PermissionSet>) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role,
            permissions,
            exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn decodes_role_and_permissions() {
        let service = SessionService::new("segredo".into());
        let mut perms = PermissionSet::new();
        perms
            .entry("CONTRATOS".into())
            .or_default()
            .insert("CONTRACT_READ".into());

        let identity = service
            .identity_from_token(&token("segredo", Role::Admin, Some(perms)))
            .unwrap();

        assert_eq!(identity.role, Role::Admin);
        assert!(identity.has_privilege("CONTRATOS", "CONTRACT_READ"));
    }

    #[test]
    fn wrong_secret_is_invalid_token() {
        let service = SessionService::new("segredo".into());
        let result = service.identity_from_token(&token("outro", Role::Client, None));
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }
}
