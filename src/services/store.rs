// src/services/store.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, AppResult},
    models::{
        contracts::{Contract, ContractPatch, ContractStatus, NewContract},
        crm::{Client, ClientPatch, ClientView, NewClient},
        memberships::{Membership, MembershipPatch, NewMembership},
    },
};

// =========================================================================
//  TIPOS AUXILIARES
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Client,
    Contract,
    Membership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: Uuid,
}

impl EntityKey {
    pub fn client(id: Uuid) -> Self {
        Self { kind: EntityKind::Client, id }
    }

    pub fn contract(id: Uuid) -> Self {
        Self { kind: EntityKind::Contract, id }
    }

    pub fn membership(id: Uuid) -> Self {
        Self { kind: EntityKind::Membership, id }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "camelCase")]
pub enum Record {
    Client(Client),
    Contract(Contract),
    Membership(Membership),
}

impl Record {
    pub fn key(&self) -> EntityKey {
        match self {
            Record::Client(c) => EntityKey::client(c.id),
            Record::Contract(c) => EntityKey::contract(c.id),
            Record::Membership(m) => EntityKey::membership(m.id),
        }
    }
}

/// Estado anterior de uma entidade, capturado antes de uma mutação.
/// `previous: None` significa que a entidade não existia.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub key: EntityKey,
    pub previous: Option<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    Create,
    Update,
    Delete,
}

/// Uma mutação pedida ao store. As variantes de criação já trazem o id, para
/// que quem orquestra possa ordenar as operações por entidade antes de aplicar.
#[derive(Debug, Clone)]
pub enum Mutation {
    AddClient { id: Uuid, data: NewClient },
    UpdateClient { id: Uuid, patch: ClientPatch },
    AddContract { id: Uuid, data: NewContract },
    UpdateContract { id: Uuid, patch: ContractPatch },
    DeleteContract { id: Uuid },
    AddMembership { id: Uuid, data: NewMembership },
    UpdateMembership { id: Uuid, patch: MembershipPatch },
    DeleteMembership { id: Uuid },
}

impl Mutation {
    pub fn key(&self) -> EntityKey {
        match self {
            Mutation::AddClient { id, .. } | Mutation::UpdateClient { id, .. } => {
                EntityKey::client(*id)
            }
            Mutation::AddContract { id, .. }
            | Mutation::UpdateContract { id, .. }
            | Mutation::DeleteContract { id } => EntityKey::contract(*id),
            Mutation::AddMembership { id, .. }
            | Mutation::UpdateMembership { id, .. }
            | Mutation::DeleteMembership { id } => EntityKey::membership(*id),
        }
    }

    pub fn remote_op(&self) -> RemoteOp {
        match self {
            Mutation::AddClient { .. }
            | Mutation::AddContract { .. }
            | Mutation::AddMembership { .. } => RemoteOp::Create,
            Mutation::UpdateClient { .. }
            | Mutation::UpdateContract { .. }
            | Mutation::UpdateMembership { .. } => RemoteOp::Update,
            Mutation::DeleteContract { .. } | Mutation::DeleteMembership { .. } => RemoteOp::Delete,
        }
    }
}

/// Resultado de `apply`: o registro como ficou (None se foi removido) e o
/// snapshot para reverter.
#[derive(Debug, Clone)]
pub struct Applied {
    pub record: Option<Record>,
    pub snapshot: Snapshot,
}

// =========================================================================
//  STORE
// =========================================================================

/// Cache relacional em memória de clientes, contratos e membresias.
///
/// Único escritor das três coleções. Toda mutação é tudo-ou-nada: se retorna
/// erro, nada mudou. As visões derivadas (beneficiários) são recalculadas
/// antes de a mutação retornar.
pub struct DomainStore {
    clients: HashMap<Uuid, Client>,
    contracts: HashMap<Uuid, Contract>,
    memberships: HashMap<Uuid, Membership>,

    // Inverso de `titular_id`. Derivado; só `reindex` escreve aqui.
    beneficiaries: HashMap<Uuid, BTreeSet<Uuid>>,

    pending: HashMap<EntityKey, usize>,
    // Criações aplicadas localmente que o remoto ainda não confirmou
    unconfirmed: HashSet<EntityKey>,
    client_seq: u32,
    membership_seq: u32,
    revision: watch::Sender<u64>,
}

impl Default for DomainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            clients: HashMap::new(),
            contracts: HashMap::new(),
            memberships: HashMap::new(),
            beneficiaries: HashMap::new(),
            pending: HashMap::new(),
            unconfirmed: HashSet::new(),
            client_seq: 0,
            membership_seq: 0,
            revision,
        }
    }

    // ---------------------------------------------------------------------
    //  Leitura
    // ---------------------------------------------------------------------

    pub fn clients(&self) -> Vec<&Client> {
        let mut list: Vec<&Client> = self.clients.values().collect();
        list.sort_by(|a, b| a.code.cmp(&b.code));
        list
    }

    pub fn client(&self, id: Uuid) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn beneficiaries(&self, titular_id: Uuid) -> Vec<&Client> {
        self.beneficiaries
            .get(&titular_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.clients.get(id))
            .collect()
    }

    pub fn client_view(&self, id: Uuid) -> AppResult<ClientView> {
        let client = self
            .clients
            .get(&id)
            .ok_or(AppError::not_found("Cliente", id))?;
        Ok(ClientView {
            client: client.clone(),
            beneficiarios: self.beneficiaries(id).into_iter().cloned().collect(),
        })
    }

    pub fn contracts(&self) -> Vec<&Contract> {
        let mut list: Vec<&Contract> = self.contracts.values().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }

    pub fn contract(&self, id: Uuid) -> Option<&Contract> {
        self.contracts.get(&id)
    }

    pub fn contracts_of(&self, client_id: Uuid) -> Vec<&Contract> {
        self.contracts()
            .into_iter()
            .filter(|c| c.client_id == client_id)
            .collect()
    }

    pub fn memberships(&self) -> Vec<&Membership> {
        let mut list: Vec<&Membership> = self.memberships.values().collect();
        list.sort_by(|a, b| a.code.cmp(&b.code));
        list
    }

    pub fn membership(&self, id: Uuid) -> Option<&Membership> {
        self.memberships.get(&id)
    }

    /// Quantos contratos não apagados usam a membresia.
    pub fn membership_usage(&self, membership_id: Uuid) -> usize {
        self.contracts
            .values()
            .filter(|c| c.membership_id == membership_id && !c.status.is_deleted())
            .count()
    }

    pub fn record(&self, key: EntityKey) -> Option<Record> {
        match key.kind {
            EntityKind::Client => self.clients.get(&key.id).cloned().map(Record::Client),
            EntityKind::Contract => self.contracts.get(&key.id).cloned().map(Record::Contract),
            EntityKind::Membership => {
                self.memberships.get(&key.id).cloned().map(Record::Membership)
            }
        }
    }

    pub fn is_pending(&self, key: EntityKey) -> bool {
        self.pending.contains_key(&key)
    }

    /// A entidade foi criada localmente e a criação ainda aguarda o remoto.
    pub fn is_unconfirmed(&self, key: EntityKey) -> bool {
        self.unconfirmed.contains(&key)
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Assinatura de mudanças. Um receiver descartado (consumidor desmontado)
    /// simplesmente deixa de ser notificado.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ---------------------------------------------------------------------
    //  Clientes
    // ---------------------------------------------------------------------

    pub fn add_client(&mut self, data: NewClient) -> AppResult<Client> {
        self.insert_client(Uuid::new_v4(), data)
    }

    pub(crate) fn insert_client(&mut self, id: Uuid, data: NewClient) -> AppResult<Client> {
        data.validate()?;
        if self.clients.contains_key(&id) {
            return Err(AppError::ValidationError(format!("Cliente {} já existe", id)));
        }
        if let Some(titular_id) = data.titular_id {
            self.check_titular(id, titular_id)?;
        }

        let code = match data.code {
            Some(code) => {
                self.ensure_client_code_free(&code, None)?;
                code
            }
            None => self.next_client_code(),
        };

        let now = Utc::now();
        let client = Client {
            id,
            code,
            titular_id: data.titular_id,
            status: data.status.unwrap_or_default(),
            registered_at: now,
            updated_at: now,
            profile: data.profile,
            emergency_contacts: data.emergency_contacts,
        };

        self.clients.insert(id, client.clone());
        self.reindex();
        self.bump();

        tracing::info!(client_id = %id, code = %client.code, "cliente criado");
        Ok(client)
    }

    pub fn update_client(&mut self, id: Uuid, patch: ClientPatch) -> AppResult<Client> {
        patch.validate()?;
        let current = self
            .clients
            .get(&id)
            .ok_or(AppError::not_found("Cliente", id))?;

        let relinks = patch.touches_titular();
        if let Some(Some(titular_id)) = patch.titular_id {
            if current.titular_id != Some(titular_id) {
                self.check_titular(id, titular_id)?;
            }
        }
        if let Some(code) = patch.code.as_deref() {
            self.ensure_client_code_free(code, Some(id))?;
        }

        let mut updated = current.clone();
        if let Some(code) = patch.code {
            updated.code = code;
        }
        if let Some(titular_id) = patch.titular_id {
            updated.titular_id = titular_id;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if let Some(profile) = patch.profile {
            updated.profile = Some(profile);
        }
        if let Some(contacts) = patch.emergency_contacts {
            updated.emergency_contacts = contacts;
        }
        updated.updated_at = Utc::now();

        self.clients.insert(id, updated.clone());
        if relinks {
            self.reindex();
        }
        self.bump();

        tracing::info!(client_id = %id, "cliente atualizado");
        Ok(updated)
    }

    // Hierarquia de um nível só: o titular não pode ser beneficiário, o
    // cliente não pode ser o próprio titular, e quem já tem beneficiários
    // não pode virar beneficiário (isso criaria dois níveis ou um ciclo).
    fn check_titular(&self, client_id: Uuid, titular_id: Uuid) -> AppResult<()> {
        if titular_id == client_id {
            return Err(AppError::ValidationError(
                "Um cliente não pode ser titular de si mesmo".into(),
            ));
        }
        let titular = self
            .clients
            .get(&titular_id)
            .ok_or(AppError::not_found("Cliente titular", titular_id))?;
        if titular.is_beneficiary() {
            return Err(AppError::ValidationError(format!(
                "O cliente {} já é beneficiário e não pode ser titular",
                titular.code
            )));
        }
        if self.beneficiaries.get(&client_id).is_some_and(|b| !b.is_empty()) {
            return Err(AppError::ValidationError(
                "Um titular com beneficiários não pode virar beneficiário".into(),
            ));
        }
        Ok(())
    }

    fn ensure_client_code_free(&self, code: &str, except: Option<Uuid>) -> AppResult<()> {
        let taken = self
            .clients
            .values()
            .any(|c| c.code == code && Some(c.id) != except);
        if taken {
            return Err(AppError::ValidationError(format!("O código '{}' já existe", code)));
        }
        Ok(())
    }

    fn next_client_code(&mut self) -> String {
        loop {
            self.client_seq += 1;
            let code = format!("CLI-{:04}", self.client_seq);
            if !self.clients.values().any(|c| c.code == code) {
                return code;
            }
        }
    }

    // ---------------------------------------------------------------------
    //  Contratos
    // ---------------------------------------------------------------------

    pub fn add_contract(&mut self, data: NewContract) -> AppResult<Contract> {
        self.insert_contract(Uuid::new_v4(), data)
    }

    pub(crate) fn insert_contract(&mut self, id: Uuid, data: NewContract) -> AppResult<Contract> {
        if self.contracts.contains_key(&id) {
            return Err(AppError::ValidationError(format!("Contrato {} já existe", id)));
        }
        if !self.clients.contains_key(&data.client_id) {
            return Err(AppError::not_found("Cliente", data.client_id));
        }
        self.ensure_confirmed(EntityKey::client(data.client_id), "cliente")?;
        let membership = self.usable_membership(data.membership_id)?;

        let start_date = data.start_date.unwrap_or_else(|| Utc::now().date_naive());
        let end_date = match data.end_date {
            Some(end) => end,
            None => add_days(start_date, membership.validity_days)?,
        };
        check_dates(start_date, end_date)?;

        let now = Utc::now();
        let contract = Contract {
            id,
            client_id: data.client_id,
            membership_id: data.membership_id,
            status: ContractStatus::Active,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        };

        self.contracts.insert(id, contract.clone());
        self.bump();

        tracing::info!(contract_id = %id, client_id = %contract.client_id, "contrato criado");
        Ok(contract)
    }

    pub fn update_contract(&mut self, id: Uuid, patch: ContractPatch) -> AppResult<Contract> {
        let current = self
            .contracts
            .get(&id)
            .ok_or(AppError::not_found("Contrato", id))?;

        if let Some(next) = patch.status {
            if !current.status.can_transition_to(next) {
                return Err(AppError::InvalidTransition { from: current.status, to: next });
            }
        }
        // Apagado é terminal: só reafirmar o status é aceito
        if current.status.is_deleted() && !patch.is_status_only() {
            return Err(AppError::InvalidTransition {
                from: ContractStatus::Deleted,
                to: patch.status.unwrap_or(ContractStatus::Deleted),
            });
        }
        if let Some(membership_id) = patch.membership_id {
            if membership_id != current.membership_id {
                self.usable_membership(membership_id)?;
            }
        }

        let mut updated = current.clone();
        if let Some(membership_id) = patch.membership_id {
            updated.membership_id = membership_id;
        }
        if let Some(start) = patch.start_date {
            updated.start_date = start;
        }
        if let Some(end) = patch.end_date {
            updated.end_date = end;
        }
        check_dates(updated.start_date, updated.end_date)?;

        let previous_status = updated.status;
        if let Some(status) = patch.status {
            updated.status = status;
        }
        if updated == *current {
            // Nada mudou (ex: apagar um contrato já apagado)
            return Ok(updated);
        }
        updated.updated_at = Utc::now();

        self.contracts.insert(id, updated.clone());
        self.bump();

        if previous_status != updated.status {
            tracing::info!(
                contract_id = %id,
                from = ?previous_status,
                to = ?updated.status,
                "status do contrato alterado"
            );
        }
        Ok(updated)
    }

    /// Apagamento lógico: o registro fica, com status Deleted. A membresia
    /// referenciada nunca é apagada junto.
    pub fn delete_contract(&mut self, id: Uuid) -> AppResult<Contract> {
        self.update_contract(id, ContractPatch::status(ContractStatus::Deleted))
    }

    fn usable_membership(&self, membership_id: Uuid) -> AppResult<&Membership> {
        let membership = self
            .memberships
            .get(&membership_id)
            .ok_or(AppError::not_found("Membresia", membership_id))?;
        self.ensure_confirmed(EntityKey::membership(membership_id), "membresia")?;
        if !membership.is_active {
            return Err(AppError::ValidationError(format!(
                "A membresia {} está inativa",
                membership.code
            )));
        }
        Ok(membership)
    }

    // Um contrato não pode apontar para algo que um rollback ainda pode apagar
    fn ensure_confirmed(&self, key: EntityKey, label: &str) -> AppResult<()> {
        if self.unconfirmed.contains(&key) {
            return Err(AppError::ValidationError(format!(
                "O {} {} ainda aguarda confirmação do servidor",
                label, key.id
            )));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    //  Membresias
    // ---------------------------------------------------------------------

    pub fn add_membership(&mut self, data: NewMembership) -> AppResult<Membership> {
        self.insert_membership(Uuid::new_v4(), data)
    }

    pub(crate) fn insert_membership(
        &mut self,
        id: Uuid,
        data: NewMembership,
    ) -> AppResult<Membership> {
        data.validate()?;
        if self.memberships.contains_key(&id) {
            return Err(AppError::ValidationError(format!("Membresia {} já existe", id)));
        }

        let code = match data.code {
            Some(code) => {
                if self.memberships.values().any(|m| m.code == code) {
                    return Err(AppError::ValidationError(format!(
                        "O código '{}' já existe",
                        code
                    )));
                }
                code
            }
            None => self.next_membership_code(),
        };

        let membership = Membership {
            id,
            code,
            name: data.name,
            price: data.price,
            access_days: data.access_days,
            validity_days: data.validity_days,
            is_active: data.is_active.unwrap_or(true),
            created_at: Utc::now(),
        };

        self.memberships.insert(id, membership.clone());
        self.bump();

        tracing::info!(membership_id = %id, code = %membership.code, "membresia criada");
        Ok(membership)
    }

    pub fn update_membership(&mut self, id: Uuid, patch: MembershipPatch) -> AppResult<Membership> {
        patch.validate()?;
        let mut updated = self
            .memberships
            .get(&id)
            .ok_or(AppError::not_found("Membresia", id))?
            .clone();

        if let Some(name) = patch.name {
            updated.name = name;
        }
        if let Some(price) = patch.price {
            updated.price = price;
        }
        if let Some(days) = patch.access_days {
            updated.access_days = days;
        }
        if let Some(days) = patch.validity_days {
            updated.validity_days = days;
        }
        if let Some(active) = patch.is_active {
            updated.is_active = active;
        }

        self.memberships.insert(id, updated.clone());
        self.bump();
        Ok(updated)
    }

    /// Remove a membresia. Falha se algum contrato não apagado ainda a usa.
    pub fn delete_membership(&mut self, id: Uuid) -> AppResult<Membership> {
        if !self.memberships.contains_key(&id) {
            return Err(AppError::not_found("Membresia", id));
        }
        let in_use = self.membership_usage(id);
        if in_use > 0 {
            return Err(AppError::ValidationError(format!(
                "A membresia ainda é usada por {} contrato(s)",
                in_use
            )));
        }

        let removed = self
            .memberships
            .remove(&id)
            .ok_or(AppError::not_found("Membresia", id))?;
        self.bump();

        tracing::info!(membership_id = %id, "membresia removida");
        Ok(removed)
    }

    fn next_membership_code(&mut self) -> String {
        loop {
            self.membership_seq += 1;
            let code = format!("MEM-{:04}", self.membership_seq);
            if !self.memberships.values().any(|m| m.code == code) {
                return code;
            }
        }
    }

    // ---------------------------------------------------------------------
    //  Protocolo otimista
    // ---------------------------------------------------------------------

    pub fn snapshot(&self, key: EntityKey) -> Snapshot {
        Snapshot { key, previous: self.record(key) }
    }

    /// Aplica uma mutação e devolve o snapshot anterior para um eventual
    /// rollback.
    pub fn apply(&mut self, mutation: Mutation) -> AppResult<Applied> {
        let key = mutation.key();
        let creates = mutation.remote_op() == RemoteOp::Create;
        let snapshot = self.snapshot(key);

        let record = match mutation {
            Mutation::AddClient { id, data } => Some(Record::Client(self.insert_client(id, data)?)),
            Mutation::UpdateClient { id, patch } => {
                Some(Record::Client(self.update_client(id, patch)?))
            }
            Mutation::AddContract { id, data } => {
                Some(Record::Contract(self.insert_contract(id, data)?))
            }
            Mutation::UpdateContract { id, patch } => {
                Some(Record::Contract(self.update_contract(id, patch)?))
            }
            Mutation::DeleteContract { id } => Some(Record::Contract(self.delete_contract(id)?)),
            Mutation::AddMembership { id, data } => {
                Some(Record::Membership(self.insert_membership(id, data)?))
            }
            Mutation::UpdateMembership { id, patch } => {
                Some(Record::Membership(self.update_membership(id, patch)?))
            }
            Mutation::DeleteMembership { id } => {
                self.delete_membership(id)?;
                None
            }
        };

        if creates {
            self.unconfirmed.insert(key);
        }
        Ok(Applied { record, snapshot })
    }

    pub fn mark_pending(&mut self, key: EntityKey) {
        *self.pending.entry(key).or_default() += 1;
        self.bump();
    }

    fn settle(&mut self, key: EntityKey) {
        if let Some(count) = self.pending.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&key);
            }
        }
    }

    /// Confirma uma mutação pendente adotando a versão do servidor.
    pub fn commit(&mut self, key: EntityKey, confirmed: Option<Record>) {
        self.settle(key);
        self.unconfirmed.remove(&key);
        if let Some(record) = confirmed {
            if record.key() == key {
                self.put(record);
            } else {
                tracing::warn!(?key, "registro confirmado não corresponde à mutação; ignorado");
            }
        }
        self.bump();
    }

    /// Reverte uma mutação pendente para o estado do snapshot.
    pub fn rollback(&mut self, snapshot: Snapshot) {
        self.settle(snapshot.key);
        self.restore(snapshot);
    }

    /// Volta a entidade ao estado do snapshot. Se o retorno quebraria a
    /// hierarquia titular/beneficiário (por causa de mudanças feitas depois),
    /// o vínculo de titular é desfeito e o conflito é registrado.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.unconfirmed.remove(&snapshot.key);
        match snapshot.previous {
            Some(record) => self.put(record),
            None => self.remove(snapshot.key),
        }
        self.bump();
        tracing::info!(key = ?snapshot.key, "mutação revertida");
    }

    fn put(&mut self, record: Record) {
        match record {
            Record::Client(mut client) => {
                if let Some(titular_id) = client.titular_id {
                    let titular_ok = self
                        .clients
                        .get(&titular_id)
                        .is_some_and(|t| t.titular_id.is_none() && t.id != client.id);
                    let has_beneficiaries = self.clients.values().any(|c| c.titular_id == Some(client.id));
                    if !titular_ok || has_beneficiaries {
                        tracing::warn!(
                            client_id = %client.id,
                            %titular_id,
                            "conflito na hierarquia; vínculo de titular removido"
                        );
                        client.titular_id = None;
                    }
                }
                self.clients.insert(client.id, client);
                self.reindex();
            }
            Record::Contract(contract) => {
                self.contracts.insert(contract.id, contract);
            }
            Record::Membership(membership) => {
                self.memberships.insert(membership.id, membership);
            }
        }
    }

    fn remove(&mut self, key: EntityKey) {
        match key.kind {
            EntityKind::Client => {
                self.clients.remove(&key.id);
                // Beneficiários de um titular que deixou de existir ficam soltos
                for client in self.clients.values_mut() {
                    if client.titular_id == Some(key.id) {
                        tracing::warn!(client_id = %client.id, "titular removido; vínculo desfeito");
                        client.titular_id = None;
                    }
                }
                let orphans = self.contracts.values().filter(|c| c.client_id == key.id).count();
                if orphans > 0 {
                    tracing::warn!(client_id = %key.id, orphans, "contratos apontam para cliente removido");
                }
                self.reindex();
            }
            EntityKind::Contract => {
                self.contracts.remove(&key.id);
            }
            EntityKind::Membership => {
                self.memberships.remove(&key.id);
            }
        }
    }

    // ---------------------------------------------------------------------
    //  Ciclo de vida
    // ---------------------------------------------------------------------

    /// Substitui as coleções inteiras (carga inicial vinda da API remota).
    pub fn replace_all(
        &mut self,
        clients: Vec<Client>,
        contracts: Vec<Contract>,
        memberships: Vec<Membership>,
    ) {
        self.clients = clients.into_iter().map(|c| (c.id, c)).collect();
        self.contracts = contracts.into_iter().map(|c| (c.id, c)).collect();
        self.memberships = memberships.into_iter().map(|m| (m.id, m)).collect();
        self.pending.clear();
        self.unconfirmed.clear();

        // Dados remotos que violem a hierarquia são corrigidos como no rollback
        let ids: Vec<Uuid> = self.clients.keys().copied().collect();
        for id in ids {
            if let Some(client) = self.clients.get(&id).cloned() {
                self.put(Record::Client(client));
            }
        }
        self.reindex();
        self.bump();
    }

    /// Descarta tudo (logout).
    pub fn clear(&mut self) {
        self.replace_all(Vec::new(), Vec::new(), Vec::new());
        self.client_seq = 0;
        self.membership_seq = 0;
    }

    fn reindex(&mut self) {
        let mut index: HashMap<Uuid, BTreeSet<Uuid>> = HashMap::new();
        for client in self.clients.values() {
            if let Some(titular_id) = client.titular_id {
                index.entry(titular_id).or_default().insert(client.id);
            }
        }
        self.beneficiaries = index;
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

fn add_days(start: NaiveDate, days: u32) -> AppResult<NaiveDate> {
    start
        .checked_add_days(Days::new(days as u64))
        .ok_or_else(|| AppError::ValidationError("Data final fora do intervalo".into()))
}

fn check_dates(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if end < start {
        return Err(AppError::ValidationError(
            "A data final não pode ser anterior à data inicial".into(),
        ));
    }
    Ok(())
}
