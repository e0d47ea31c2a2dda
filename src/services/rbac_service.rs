// src/services/rbac_service.rs

use crate::models::{
    auth::Session,
    rbac::{AllowPath, DenyReason, PermissionRequirement, Verdict},
};

/// Decide o acesso de uma sessão a um requisito.
///
/// Função pura: o único efeito colateral é o log de auditoria. Mesma entrada,
/// mesmo veredito.
///
/// Ordem de avaliação:
/// 1. `emergency_bypass` libera sempre (e fica registrado como bypass);
/// 2. sessão carregando -> `Pending`;
/// 3. sem identidade -> `Deny(Unauthenticated)`;
/// 4. módulo (e privilégio, se exigido) no conjunto de permissões -> `Allow(Privilege)`;
/// 5. papel na lista de fallback -> `Allow(FallbackRole)`;
/// 6. senão -> `Deny(InsufficientPrivilege)`.
pub fn evaluate(session: &Session, requirement: &PermissionRequirement) -> Verdict {
    if requirement.is_bypass() {
        tracing::warn!(
            target: "audit",
            module = requirement.module(),
            privilege = requirement.required_privilege(),
            user_id = ?session.identity.as_ref().map(|i| i.user_id),
            "acesso liberado por emergency bypass"
        );
        return Verdict::Allow(AllowPath::EmergencyBypass);
    }

    // Autenticado mas a identidade ainda não chegou também é "carregando"
    if session.is_loading || (session.is_authenticated && session.identity.is_none()) {
        return Verdict::Pending;
    }

    let Some(identity) = session.identity.as_ref() else {
        return Verdict::Deny(DenyReason::Unauthenticated);
    };

    let module = requirement.module();
    let granted = match requirement.required_privilege() {
        None => identity.has_module(module),
        Some(privilege) => identity.has_privilege(module, privilege),
    };
    if granted {
        return Verdict::Allow(AllowPath::Privilege);
    }

    // Caminho legado: rotas ainda não migradas para privilégios finos
    if requirement.fallback().contains(&identity.role) {
        tracing::info!(
            target: "audit",
            module,
            role = ?identity.role,
            user_id = %identity.user_id,
            "acesso liberado pelo papel (fallback)"
        );
        return Verdict::Allow(AllowPath::FallbackRole);
    }

    tracing::debug!(
        module,
        privilege = requirement.required_privilege(),
        user_id = %identity.user_id,
        "acesso negado"
    );
    Verdict::Deny(DenyReason::InsufficientPrivilege)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Identity, Role};
    use crate::models::rbac::{modules, privileges};
    use uuid::Uuid;

    fn requirement(module: &str) -> PermissionRequirement {
        PermissionRequirement::new(module).unwrap()
    }

    #[test]
    fn admin_with_contract_read_is_allowed() {
        let session = Session::authenticated(
            Identity::new(Uuid::new_v4(), Role::Admin)
                .with_privilege(modules::CONTRATOS, privileges::CONTRACT_READ),
        );
        let req = requirement(modules::CONTRATOS).privilege(privileges::CONTRACT_READ);

        assert_eq!(evaluate(&session, &req), Verdict::Allow(AllowPath::Privilege));
    }

    #[test]
    fn client_without_system_module_is_denied() {
        let session = Session::authenticated(Identity::new(Uuid::new_v4(), Role::Client));
        let req = requirement(modules::SISTEMA);

        assert_eq!(
            evaluate(&session, &req),
            Verdict::Deny(DenyReason::InsufficientPrivilege)
        );
    }

    #[test]
    fn fallback_role_allows_when_privilege_is_missing() {
        let session = Session::authenticated(Identity::new(Uuid::new_v4(), Role::Trainer));
        let req = requirement(modules::CLIENTES)
            .privilege(privileges::CLIENT_READ)
            .fallback_roles(&[Role::Admin, Role::Trainer]);

        assert_eq!(evaluate(&session, &req), Verdict::Allow(AllowPath::FallbackRole));
    }

    #[test]
    fn module_present_but_privilege_missing_is_denied() {
        let session = Session::authenticated(
            Identity::new(Uuid::new_v4(), Role::Trainer)
                .with_privilege(modules::CONTRATOS, privileges::CONTRACT_READ),
        );
        let req = requirement(modules::CONTRATOS).privilege(privileges::CONTRACT_DELETE);

        assert_eq!(
            evaluate(&session, &req),
            Verdict::Deny(DenyReason::InsufficientPrivilege)
        );
    }

    #[test]
    fn module_only_requirement_needs_just_the_module() {
        let session = Session::authenticated(
            Identity::new(Uuid::new_v4(), Role::Client)
                .with_privilege(modules::MEMBRESIAS, privileges::MEMBERSHIP_READ),
        );
        assert!(evaluate(&session, &requirement(modules::MEMBRESIAS)).is_allow());
    }

    #[test]
    fn loading_and_anonymous_sessions() {
        let req = requirement(modules::CLIENTES).fallback_roles(&[Role::Admin]);

        assert_eq!(evaluate(&Session::loading(), &req), Verdict::Pending);
        assert_eq!(
            evaluate(&Session::anonymous(), &req),
            Verdict::Deny(DenyReason::Unauthenticated)
        );

        let half_resolved = Session { is_loading: false, is_authenticated: true, identity: None };
        assert_eq!(evaluate(&half_resolved, &req), Verdict::Pending);
    }

    #[test]
    fn bypass_allows_regardless_of_session() {
        let req = requirement(modules::SISTEMA).emergency_bypass(true);
        let expected = Verdict::Allow(AllowPath::EmergencyBypass);

        assert_eq!(evaluate(&Session::loading(), &req), expected);
        assert_eq!(evaluate(&Session::anonymous(), &req), expected);
        assert_eq!(
            evaluate(&Session::authenticated(Identity::new(Uuid::new_v4(), Role::Client)), &req),
            expected
        );
    }

    #[test]
    fn evaluation_is_deterministic() {
        let session = Session::authenticated(
            Identity::new(Uuid::new_v4(), Role::Trainer)
                .with_privilege(modules::CLIENTES, privileges::CLIENT_READ),
        );
        let reqs = [
            requirement(modules::CLIENTES).privilege(privileges::CLIENT_READ),
            requirement(modules::CLIENTES).privilege(privileges::CLIENT_WRITE),
            requirement(modules::SISTEMA).fallback_roles(&[Role::Trainer]),
        ];

        for req in &reqs {
            let first = evaluate(&session, req);
            for _ in 0..5 {
                assert_eq!(evaluate(&session, req), first);
            }
        }
    }
}
