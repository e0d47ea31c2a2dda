// src/config.rs

use std::{env, sync::Arc};

use anyhow::Context;

use crate::{
    models::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT},
    services::{
        auth::SessionService,
        remote::{LoopbackRemote, RemoteApi},
        sync_service::SyncService,
    },
};

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub page_limit: u32,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;
        let page_limit = match env::var("PAGE_LIMIT") {
            Ok(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("PAGE_LIMIT inválido: {}", raw))?,
            Err(_) => DEFAULT_PAGE_LIMIT,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            page_limit: page_limit.clamp(1, MAX_PAGE_LIMIT),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub session_service: SessionService,
    // Dono único do cache de clientes/contratos/membresias
    pub sync: SyncService,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        let settings = Settings::from_env()?;

        // TODO: trocar pelo cliente HTTP da API de persistência quando o contrato do endpoint estiver publicado
        let remote: Arc<dyn RemoteApi> = Arc::new(LoopbackRemote::new());
        tracing::warn!("⚠️ API remota em memória (LoopbackRemote): o cache começa vazio e nada é persistido");

        let state = Self::with_remote(settings, remote);
        state
            .sync
            .hydrate()
            .await
            .context("Falha ao carregar o cache inicial")?;

        tracing::info!("✅ Cache de domínio carregado com sucesso!");
        Ok(state)
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_remote(settings: Settings, remote: Arc<dyn RemoteApi>) -> Self {
        let session_service = SessionService::new(settings.jwt_secret.clone());
        Self {
            settings: Arc::new(settings),
            session_service,
            sync: SyncService::new(remote),
        }
    }
}
