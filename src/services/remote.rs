// src/services/remote.rs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    common::error::{AppError, AppResult},
    models::{contracts::ContractStatus, pagination::Paginated},
    services::store::{EntityKey, EntityKind, Record},
};

/// Fronteira com a API remota (fonte da verdade). Resolve com o registro
/// criado/atualizado ou rejeita com erro; o formato HTTP fica fora daqui.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create(&self, record: Record) -> AppResult<Record>;

    async fn update(&self, record: Record) -> AppResult<Record>;

    async fn delete(&self, key: EntityKey) -> AppResult<()>;

    async fn list(&self, kind: EntityKind, page: u32, limit: u32) -> AppResult<Paginated<Record>>;
}

/// API remota em memória. Usada em desenvolvimento e nos testes: guarda o
/// que recebe e devolve como veio.
#[derive(Default)]
pub struct LoopbackRemote {
    records: Mutex<HashMap<EntityKey, Record>>,
}

impl LoopbackRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.key(), r)).collect()),
        }
    }

    pub async fn get(&self, key: EntityKey) -> Option<Record> {
        self.records.lock().await.get(&key).cloned()
    }
}

#[async_trait]
impl RemoteApi for LoopbackRemote {
    async fn create(&self, record: Record) -> AppResult<Record> {
        let mut records = self.records.lock().await;
        let key = record.key();
        if records.contains_key(&key) {
            return Err(AppError::NetworkFailure(format!("{:?} já existe no remoto", key)));
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn update(&self, record: Record) -> AppResult<Record> {
        let mut records = self.records.lock().await;
        let key = record.key();
        if !records.contains_key(&key) {
            return Err(AppError::NetworkFailure(format!("{:?} não existe no remoto", key)));
        }
        records.insert(key, record.clone());
        Ok(record)
    }

    async fn delete(&self, key: EntityKey) -> AppResult<()> {
        let mut records = self.records.lock().await;
        match records.get_mut(&key) {
            // Contratos também são apagados logicamente do lado remoto
            Some(Record::Contract(contract)) => {
                contract.status = ContractStatus::Deleted;
                Ok(())
            }
            Some(_) => {
                records.remove(&key);
                Ok(())
            }
            None => Err(AppError::NetworkFailure(format!("{:?} não existe no remoto", key))),
        }
    }

    async fn list(&self, kind: EntityKind, page: u32, limit: u32) -> AppResult<Paginated<Record>> {
        let records = self.records.lock().await;
        let mut items: Vec<Record> = records
            .values()
            .filter(|r| r.key().kind == kind)
            .cloned()
            .collect();
        items.sort_by_key(|r| r.key().id);
        Ok(Paginated::from_items(items, page, limit))
    }
}
