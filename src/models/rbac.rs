// src/models/rbac.rs

use serde::{Deserialize, Serialize};

use crate::common::error::AppError;
use crate::models::auth::Role;

// ---
// MÓDULOS E PRIVILÉGIOS CONHECIDOS
// ---

pub mod modules {
    pub const CLIENTES: &str = "CLIENTES";
    pub const CONTRATOS: &str = "CONTRATOS";
    pub const MEMBRESIAS: &str = "MEMBRESIAS";
    pub const SISTEMA: &str = "SISTEMA";
}

pub mod privileges {
    pub const CLIENT_READ: &str = "CLIENT_READ";
    pub const CLIENT_WRITE: &str = "CLIENT_WRITE";
    pub const CONTRACT_READ: &str = "CONTRACT_READ";
    pub const CONTRACT_WRITE: &str = "CONTRACT_WRITE";
    pub const CONTRACT_DELETE: &str = "CONTRACT_DELETE";
    pub const MEMBERSHIP_READ: &str = "MEMBERSHIP_READ";
    pub const MEMBERSHIP_WRITE: &str = "MEMBERSHIP_WRITE";
}

/// O que uma rota exige. Definido na configuração e nunca alterado em runtime.
///
/// Os campos são privados: a única forma de obter um valor é via `new` (ou
/// desserialização), que rejeita módulo vazio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRequirement")]
pub struct PermissionRequirement {
    module: String,
    privilege: Option<String>,
    fallback_roles: Vec<Role>,
    emergency_bypass: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequirement {
    module: String,
    #[serde(default)]
    privilege: Option<String>,
    #[serde(default)]
    fallback_roles: Vec<Role>,
    #[serde(default)]
    emergency_bypass: bool,
}

impl TryFrom<RawRequirement> for PermissionRequirement {
    type Error = AppError;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        let mut req = PermissionRequirement::new(&raw.module)?;
        req.privilege = raw.privilege;
        req.fallback_roles = raw.fallback_roles;
        req.emergency_bypass = raw.emergency_bypass;
        Ok(req)
    }
}

impl PermissionRequirement {
    pub fn new(module: &str) -> Result<Self, AppError> {
        if module.trim().is_empty() {
            return Err(AppError::Configuration(
                "PermissionRequirement sem nome de módulo".into(),
            ));
        }
        Ok(Self {
            module: module.to_string(),
            privilege: None,
            fallback_roles: Vec::new(),
            emergency_bypass: false,
        })
    }

    pub fn privilege(mut self, privilege: &str) -> Self {
        self.privilege = Some(privilege.to_string());
        self
    }

    pub fn fallback_roles(mut self, roles: &[Role]) -> Self {
        self.fallback_roles = roles.to_vec();
        self
    }

    /// Válvula de escape temporária enquanto os privilégios do banco estão
    /// incompletos. Remover quando todos os módulos tiverem privilégios.
    pub fn emergency_bypass(mut self, enabled: bool) -> Self {
        self.emergency_bypass = enabled;
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn required_privilege(&self) -> Option<&str> {
        self.privilege.as_deref()
    }

    pub fn fallback(&self) -> &[Role] {
        &self.fallback_roles
    }

    pub fn is_bypass(&self) -> bool {
        self.emergency_bypass
    }
}

// ---
// VEREDITO
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllowPath {
    Privilege,
    FallbackRole,
    // Distinto de um Allow normal para fins de auditoria
    EmergencyBypass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DenyReason {
    Unauthenticated,
    InsufficientPrivilege,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "camelCase")]
pub enum Verdict {
    Pending,
    Allow(AllowPath),
    Deny(DenyReason),
}

impl Verdict {
    pub fn is_allow(&self) -> bool {
        matches!(self, Verdict::Allow(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_module_is_a_configuration_error() {
        assert!(matches!(
            PermissionRequirement::new("  "),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn deserialization_goes_through_validation() {
        let ok: PermissionRequirement = serde_json::from_str(
            r#"{"module":"CONTRATOS","privilege":"CONTRACT_READ","fallbackRoles":["ADMIN"]}"#,
        )
        .unwrap();
        assert_eq!(ok.module(), "CONTRATOS");
        assert_eq!(ok.required_privilege(), Some("CONTRACT_READ"));
        assert_eq!(ok.fallback(), &[Role::Admin]);
        assert!(!ok.is_bypass());

        let bad = serde_json::from_str::<PermissionRequirement>(r#"{"module":""}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn verdict_wire_format() {
        let json = serde_json::to_value(Verdict::Deny(DenyReason::InsufficientPrivilege)).unwrap();
        assert_eq!(json["verdict"], "deny");
        assert_eq!(json["detail"], "insufficient-privilege");
    }
}
