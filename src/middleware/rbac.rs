// src/middleware/rbac.rs

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    middleware::gate::{AccessGate, GateRejection, GateState},
    models::{
        auth::{Role, Session},
        rbac::{modules, privileges, AllowPath, PermissionRequirement},
    },
};

/// 1. O Trait que define o requisito de uma rota (só dados, nunca lógica)
pub trait PermissionDef: Send + Sync + 'static {
    const MODULE: &'static str;
    const PRIVILEGE: Option<&'static str> = None;
    const FALLBACK_ROLES: &'static [Role] = &[];
    const EMERGENCY_BYPASS: bool = false;

    fn requirement() -> Result<PermissionRequirement, AppError> {
        let mut req = PermissionRequirement::new(Self::MODULE)?
            .fallback_roles(Self::FALLBACK_ROLES)
            .emergency_bypass(Self::EMERGENCY_BYPASS);
        if let Some(privilege) = Self::PRIVILEGE {
            req = req.privilege(privilege);
        }
        Ok(req)
    }
}

/// 2. O Extractor (Guardião). Guarda por qual caminho o acesso foi liberado.
pub struct RequirePermission<T>(pub AllowPath, pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // A. Sessão posta pelo session_guard; sem ela, anônimo
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .unwrap_or_else(Session::anonymous);

        // B. Requisito (já validado na montagem das rotas)
        let requirement = T::requirement().map_err(IntoResponse::into_response)?;

        // C. Decide
        match AccessGate::new(&requirement).state(&session) {
            GateState::Allowed(path) => Ok(RequirePermission(path, PhantomData)),
            state => Err(GateRejection {
                state,
                module: requirement.module().to_string(),
            }
            .into_response()),
        }
    }
}

/// Falha rápido se o requisito de uma rota estiver malformado.
pub fn validate_requirement<T: PermissionDef>() -> Result<(), AppError> {
    T::requirement().map(|_| ())
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermClientsRead;
impl PermissionDef for PermClientsRead {
    const MODULE: &'static str = modules::CLIENTES;
    const PRIVILEGE: Option<&'static str> = Some(privileges::CLIENT_READ);
    const FALLBACK_ROLES: &'static [Role] = &[Role::Admin, Role::Trainer];
}

pub struct PermClientsWrite;
impl PermissionDef for PermClientsWrite {
    const MODULE: &'static str = modules::CLIENTES;
    const PRIVILEGE: Option<&'static str> = Some(privileges::CLIENT_WRITE);
    const FALLBACK_ROLES: &'static [Role] = &[Role::Admin];
}

pub struct PermContractsRead;
impl PermissionDef for PermContractsRead {
    const MODULE: &'static str = modules::CONTRATOS;
    const PRIVILEGE: Option<&'static str> = Some(privileges::CONTRACT_READ);
    const FALLBACK_ROLES: &'static [Role] = &[Role::Admin];
}

pub struct PermContractsWrite;
impl PermissionDef for PermContractsWrite {
    const MODULE: &'static str = modules::CONTRATOS;
    const PRIVILEGE: Option<&'static str> = Some(privileges::CONTRACT_WRITE);
    const FALLBACK_ROLES: &'static [Role] = &[Role::Admin];
}

// Apagar contrato exige o privilégio fino, sem fallback por papel
pub struct PermContractsDelete;
impl PermissionDef for PermContractsDelete {
    const MODULE: &'static str = modules::CONTRATOS;
    const PRIVILEGE: Option<&'static str> = Some(privileges::CONTRACT_DELETE);
}

// TODO: remover o bypass quando MEMBERSHIP_READ estiver cadastrado para todos os papéis
pub struct PermMembershipsRead;
impl PermissionDef for PermMembershipsRead {
    const MODULE: &'static str = modules::MEMBRESIAS;
    const PRIVILEGE: Option<&'static str> = Some(privileges::MEMBERSHIP_READ);
    const EMERGENCY_BYPASS: bool = true;
}

pub struct PermMembershipsWrite;
impl PermissionDef for PermMembershipsWrite {
    const MODULE: &'static str = modules::MEMBRESIAS;
    const PRIVILEGE: Option<&'static str> = Some(privileges::MEMBERSHIP_WRITE);
    const FALLBACK_ROLES: &'static [Role] = &[Role::Admin];
}
