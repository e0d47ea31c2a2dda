// src/models/contracts.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status só avança: Active -> Inactive -> Deleted. Um contrato Deleted nunca
/// volta; cria-se outro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractStatus {
    Active,
    Inactive,
    Deleted,
}

impl ContractStatus {
    pub fn can_transition_to(self, next: ContractStatus) -> bool {
        next >= self
    }

    pub fn is_deleted(self) -> bool {
        self == ContractStatus::Deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: Uuid,
    pub client_id: Uuid,
    pub membership_id: Uuid,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub client_id: Uuid,
    pub membership_id: Uuid,
    // Padrão: hoje
    pub start_date: Option<NaiveDate>,
    // Padrão: start_date + validity_days da membresia
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractPatch {
    pub membership_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ContractPatch {
    pub fn status(status: ContractStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    // Só muda (ou reafirma) o status, sem tocar nos outros campos
    pub(crate) fn is_status_only(&self) -> bool {
        self.membership_id.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }
}
