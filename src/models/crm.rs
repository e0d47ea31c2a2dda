// src/models/crm.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

// --- PERFIL E CONTATOS ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub full_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub document_number: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,

    #[validate(length(min = 1, message = "required"))]
    pub phone: String,

    pub relationship: Option<String>,
}

// --- CLIENTE ---

/// Cliente da academia. `titular_id` aponta para o cliente principal quando
/// este é um beneficiário; a hierarquia tem exatamente um nível.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub code: String,
    pub titular_id: Option<Uuid>,
    pub status: ClientStatus,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

impl Client {
    pub fn is_beneficiary(&self) -> bool {
        self.titular_id.is_some()
    }
}

/// Visão de leitura: o cliente com a lista derivada de beneficiários.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    #[serde(flatten)]
    pub client: Client,
    pub beneficiarios: Vec<Client>,
}

// --- PAYLOADS ---

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    #[validate(length(min = 1, message = "O código não pode ser vazio"))]
    pub code: Option<String>,

    pub titular_id: Option<Uuid>,

    pub status: Option<ClientStatus>,

    #[validate(nested)]
    pub profile: Option<UserProfile>,

    #[serde(default)]
    #[validate(nested)]
    pub emergency_contacts: Vec<EmergencyContact>,
}

/// Atualização parcial. `titular_id: Some(None)` remove o titular; ausente
/// mantém o atual.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[validate(length(min = 1, message = "O código não pode ser vazio"))]
    pub code: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub titular_id: Option<Option<Uuid>>,

    pub status: Option<ClientStatus>,

    #[validate(nested)]
    pub profile: Option<UserProfile>,

    #[validate(nested)]
    pub emergency_contacts: Option<Vec<EmergencyContact>>,
}

impl ClientPatch {
    pub fn touches_titular(&self) -> bool {
        self.titular_id.is_some()
    }
}

// Distingue `"titularId": null` (limpar) de campo ausente (manter)
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_null_from_missing_titular() {
        let cleared: ClientPatch = serde_json::from_str(r#"{"titularId":null}"#).unwrap();
        assert_eq!(cleared.titular_id, Some(None));
        assert!(cleared.touches_titular());

        let untouched: ClientPatch = serde_json::from_str(r#"{"status":"INACTIVE"}"#).unwrap();
        assert_eq!(untouched.titular_id, None);
        assert!(!untouched.touches_titular());
    }

    #[test]
    fn nested_profile_is_validated() {
        let payload = NewClient {
            profile: Some(UserProfile {
                full_name: "A".into(),
                email: Some("not-an-email".into()),
                phone: None,
                document_number: None,
                birth_date: None,
            }),
            ..Default::default()
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn patch_contact_errors_keep_the_field_path() {
        let patch = ClientPatch {
            emergency_contacts: Some(vec![EmergencyContact {
                name: "Ana".into(),
                phone: String::new(),
                relationship: None,
            }]),
            ..Default::default()
        };

        let errors = patch.validate().unwrap_err();
        assert!(errors.errors().contains_key("emergency_contacts"));
    }
}
