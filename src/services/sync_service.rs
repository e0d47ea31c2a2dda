// src/services/sync_service.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{watch, Mutex, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::{
    common::error::{AppError, AppResult},
    models::{
        contracts::{Contract, ContractPatch, NewContract},
        crm::{Client, ClientPatch, NewClient},
        memberships::{Membership, MembershipPatch, NewMembership},
    },
    services::{
        remote::RemoteApi,
        store::{DomainStore, EntityKey, EntityKind, Mutation, Record, RemoteOp},
    },
};

// Tamanho de página usado na carga inicial
const HYDRATE_PAGE_LIMIT: u32 = 100;

/// Dono do DomainStore durante a sessão. Toda escrita passa por aqui, no
/// protocolo otimista em duas fases:
///
/// 1. aplica no store local e marca a entidade como pendente;
/// 2. envia à API remota; confirma adotando a versão do servidor ou reverte
///    para o snapshot capturado antes da aplicação.
///
/// Mutações sobre a mesma entidade passam por uma fila FIFO própria, então são
/// aplicadas e resolvidas na ordem em que foram emitidas. A fase remota roda em
/// uma task separada: se quem chamou desistir, a mutação ainda é confirmada ou
/// revertida, só o resultado deixa de ser entregue.
#[derive(Clone)]
pub struct SyncService {
    store: Arc<RwLock<DomainStore>>,
    remote: Arc<dyn RemoteApi>,
    lanes: Arc<Mutex<HashMap<EntityKey, Arc<Mutex<()>>>>>,
}

impl SyncService {
    pub fn new(remote: Arc<dyn RemoteApi>) -> Self {
        Self {
            store: Arc::new(RwLock::new(DomainStore::new())),
            remote,
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Visão somente-leitura do store.
    pub async fn read(&self) -> RwLockReadGuard<'_, DomainStore> {
        self.store.read().await
    }

    pub async fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.read().await.subscribe()
    }

    // =========================================================================
    //  MUTAÇÕES
    // =========================================================================

    pub async fn submit(&self, mutation: Mutation) -> AppResult<Option<Record>> {
        let key = mutation.key();
        let op = mutation.remote_op();

        let lane = self.lane(key).await;
        let guard = lane.lock_owned().await;

        // 1. Aplica local (erro aqui = nada mudou, nada vai ao remoto)
        let applied = {
            let mut store = self.store.write().await;
            match store.apply(mutation) {
                Ok(applied) => {
                    store.mark_pending(key);
                    applied
                }
                Err(e) => {
                    drop(store);
                    drop(guard);
                    self.release_lane(key).await;
                    return Err(e);
                }
            }
        };
        tracing::debug!(?key, ?op, "mutação aplicada localmente; aguardando remoto");

        // 2. Fase remota desacoplada de quem chamou
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let outcome = this.push_remote(op, key, applied.record.clone()).await;

            {
                let mut store = this.store.write().await;
                match &outcome {
                    Ok(confirmed) => store.commit(key, confirmed.clone()),
                    Err(e) => {
                        tracing::warn!(?key, error = %e, "remoto rejeitou a mutação; revertendo");
                        store.rollback(applied.snapshot);
                    }
                }
            }

            drop(guard);
            this.release_lane(key).await;

            outcome.map(|confirmed| confirmed.or(applied.record))
        });

        handle
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Falha na task de sincronização: {}", e)))?
    }

    async fn push_remote(
        &self,
        op: RemoteOp,
        key: EntityKey,
        record: Option<Record>,
    ) -> AppResult<Option<Record>> {
        match (op, record) {
            (RemoteOp::Create, Some(record)) => self.remote.create(record).await.map(Some),
            (RemoteOp::Update, Some(record)) => self.remote.update(record).await.map(Some),
            (RemoteOp::Delete, _) => self.remote.delete(key).await.map(|_| None),
            (op, None) => Err(AppError::Internal(anyhow::anyhow!(
                "mutação {:?} sem registro para enviar ({:?})",
                op,
                key
            ))),
        }
    }

    async fn lane(&self, key: EntityKey) -> Arc<Mutex<()>> {
        self.lanes.lock().await.entry(key).or_default().clone()
    }

    async fn release_lane(&self, key: EntityKey) {
        let mut lanes = self.lanes.lock().await;
        if lanes.get(&key).is_some_and(|lane| Arc::strong_count(lane) == 1) {
            lanes.remove(&key);
        }
    }

    // --- Clientes ---

    pub async fn add_client(&self, data: NewClient) -> AppResult<Client> {
        let record = self.submit(Mutation::AddClient { id: Uuid::new_v4(), data }).await?;
        into_client(record)
    }

    pub async fn update_client(&self, id: Uuid, patch: ClientPatch) -> AppResult<Client> {
        let record = self.submit(Mutation::UpdateClient { id, patch }).await?;
        into_client(record)
    }

    // --- Contratos ---

    pub async fn add_contract(&self, data: NewContract) -> AppResult<Contract> {
        let record = self.submit(Mutation::AddContract { id: Uuid::new_v4(), data }).await?;
        into_contract(record)
    }

    pub async fn update_contract(&self, id: Uuid, patch: ContractPatch) -> AppResult<Contract> {
        let record = self.submit(Mutation::UpdateContract { id, patch }).await?;
        into_contract(record)
    }

    pub async fn delete_contract(&self, id: Uuid) -> AppResult<Contract> {
        let record = self.submit(Mutation::DeleteContract { id }).await?;
        into_contract(record)
    }

    // --- Membresias ---

    pub async fn add_membership(&self, data: NewMembership) -> AppResult<Membership> {
        let record = self.submit(Mutation::AddMembership { id: Uuid::new_v4(), data }).await?;
        into_membership(record)
    }

    pub async fn update_membership(&self, id: Uuid, patch: MembershipPatch) -> AppResult<Membership> {
        let record = self.submit(Mutation::UpdateMembership { id, patch }).await?;
        into_membership(record)
    }

    pub async fn delete_membership(&self, id: Uuid) -> AppResult<()> {
        self.submit(Mutation::DeleteMembership { id }).await.map(|_| ())
    }

    // =========================================================================
    //  CICLO DE VIDA
    // =========================================================================

    /// Carrega as três coleções da API remota e substitui o cache.
    pub async fn hydrate(&self) -> AppResult<()> {
        let mut clients = Vec::new();
        let mut contracts = Vec::new();
        let mut memberships = Vec::new();

        for kind in [EntityKind::Client, EntityKind::Contract, EntityKind::Membership] {
            let mut page = 1;
            loop {
                let batch = self.remote.list(kind, page, HYDRATE_PAGE_LIMIT).await?;
                let has_next = batch.has_next();
                for record in batch.data {
                    match record {
                        Record::Client(c) if kind == EntityKind::Client => clients.push(c),
                        Record::Contract(c) if kind == EntityKind::Contract => contracts.push(c),
                        Record::Membership(m) if kind == EntityKind::Membership => {
                            memberships.push(m)
                        }
                        other => {
                            tracing::warn!(key = ?other.key(), ?kind, "registro fora da coleção pedida; ignorado")
                        }
                    }
                }
                if !has_next {
                    break;
                }
                page += 1;
            }
        }

        tracing::info!(
            clients = clients.len(),
            contracts = contracts.len(),
            memberships = memberships.len(),
            "cache carregado da API remota"
        );
        self.store.write().await.replace_all(clients, contracts, memberships);
        Ok(())
    }

    /// Logout: descarta o cache.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

fn unexpected(record: Option<Record>) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "registro inesperado após a mutação: {:?}",
        record.map(|r| r.key())
    ))
}

fn into_client(record: Option<Record>) -> AppResult<Client> {
    match record {
        Some(Record::Client(client)) => Ok(client),
        other => Err(unexpected(other)),
    }
}

fn into_contract(record: Option<Record>) -> AppResult<Contract> {
    match record {
        Some(Record::Contract(contract)) => Ok(contract),
        other => Err(unexpected(other)),
    }
}

fn into_membership(record: Option<Record>) -> AppResult<Membership> {
    match record {
        Some(Record::Membership(membership)) => Ok(membership),
        other => Err(unexpected(other)),
    }
}
