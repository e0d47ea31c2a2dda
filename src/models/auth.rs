// src/models/auth.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Papéis discretos do sistema (o caminho "legado" de autorização)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Trainer,
    Client,
}

/// Módulo -> privilégios concedidos nele. Ex: { "CONTRATOS": {"CONTRACT_READ"} }
pub type PermissionSet = BTreeMap<String, BTreeSet<String>>;

/// Identidade autenticada. Imutável durante a sessão; só um novo login
/// (ou refresh da sessão) produz outra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    // Ausente enquanto os privilégios do banco não existirem para o usuário
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role, permissions: None }
    }

    pub fn with_privilege(mut self, module: &str, privilege: &str) -> Self {
        self.permissions
            .get_or_insert_with(PermissionSet::new)
            .entry(module.to_string())
            .or_default()
            .insert(privilege.to_string());
        self
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.contains_key(module))
    }

    pub fn has_privilege(&self, module: &str, privilege: &str) -> bool {
        self.permissions
            .as_ref()
            .and_then(|perms| perms.get(module))
            .is_some_and(|privs| privs.contains(privilege))
    }
}

/// Contexto de sessão. Quem escreve é a fonte de sessão; o núcleo só lê.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub is_loading: bool,
    pub is_authenticated: bool,
    pub identity: Option<Identity>,
}

impl Session {
    pub fn loading() -> Self {
        Self { is_loading: true, is_authenticated: false, identity: None }
    }

    pub fn anonymous() -> Self {
        Self { is_loading: false, is_authenticated: false, identity: None }
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self { is_loading: false, is_authenticated: true, identity: Some(identity) }
    }
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor externo
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub role: Role,
    #[serde(default)]
    pub permissions: Option<PermissionSet>,
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.sub,
            role: claims.role,
            permissions: claims.permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privilege_lookup_requires_module_and_privilege() {
        let identity = Identity::new(Uuid::new_v4(), Role::Admin)
            .with_privilege("CONTRATOS", "CONTRACT_READ");

        assert!(identity.has_module("CONTRATOS"));
        assert!(identity.has_privilege("CONTRATOS", "CONTRACT_READ"));
        assert!(!identity.has_privilege("CONTRATOS", "CONTRACT_DELETE"));
        assert!(!identity.has_module("SISTEMA"));
    }

    #[test]
    fn role_uses_uppercase_wire_name() {
        assert_eq!(serde_json::to_string(&Role::Trainer).unwrap(), "\"TRAINER\"");
        let role: Role = serde_json::from_str("\"CLIENT\"").unwrap();
        assert_eq!(role, Role::Client);
    }
}
