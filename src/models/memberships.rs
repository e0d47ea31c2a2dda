// src/models/memberships.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Plano de membresia. Compartilhado entre contratos; apagar um contrato
/// nunca apaga a membresia.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub access_days: u32,
    pub validity_days: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMembership {
    #[validate(length(min = 1, message = "O código não pode ser vazio"))]
    pub code: Option<String>,

    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub name: String,

    #[validate(custom(function = "non_negative_price"))]
    pub price: Decimal,

    #[validate(range(min = 1, message = "Dias de acesso devem ser positivos"))]
    pub access_days: u32,

    #[validate(range(min = 1, message = "Dias de validade devem ser positivos"))]
    pub validity_days: u32,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPatch {
    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres"))]
    pub name: Option<String>,

    #[validate(custom(function = "non_negative_price"))]
    pub price: Option<Decimal>,

    #[validate(range(min = 1, message = "Dias de acesso devem ser positivos"))]
    pub access_days: Option<u32>,

    #[validate(range(min = 1, message = "Dias de validade devem ser positivos"))]
    pub validity_days: Option<u32>,

    pub is_active: Option<bool>,
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("negative_price");
        err.message = Some("O preço não pode ser negativo".into());
        return Err(err);
    }
    Ok(())
}
