// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{AllocationRepository, LeaveRepository, MemberRepository, PgWorkloadSource, SettingsRepository},
    events::{self, EventBus},
    services::{
        aggregate_cache::AggregateCache, allocation_service::AllocationService,
        workload_service::WorkloadService,
    },
};

// ---
// Config: tudo que vem do ambiente (.env incluso)
// ---
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub aggregate_stale: Duration,
    pub event_bus_capacity: usize,
}

fn env_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} inválida: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        Ok(Self {
            database_url,
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:3000".to_string())?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            aggregate_stale: Duration::from_secs(env_or("AGGREGATE_STALE_SECS", 30)?),
            event_bus_capacity: env_or("EVENT_BUS_CAPACITY", events::DEFAULT_CAPACITY)?,
        })
    }
}

// ---
// AppState: o gráfico de dependências compartilhado pelos handlers
// ---
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings_repo: SettingsRepository,
    pub member_repo: MemberRepository,
    pub workload_service: WorkloadService,
    pub allocation_service: AllocationService,
    pub event_bus: Arc<EventBus>,
    pub aggregate_cache: Arc<AggregateCache>,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta os repositórios e serviços sobre uma pool já aberta.
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let allocation_repo = AllocationRepository::new(db_pool.clone());
        let leave_repo = LeaveRepository::new(db_pool.clone());

        let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
        let aggregate_cache = Arc::new(AggregateCache::new(config.aggregate_stale));

        let source = Arc::new(PgWorkloadSource::new(allocation_repo.clone(), leave_repo));
        let workload_service = WorkloadService::new(source, aggregate_cache.clone());
        let allocation_service = AllocationService::new(
            Arc::new(allocation_repo),
            event_bus.clone(),
            aggregate_cache.clone(),
        );

        Self {
            settings_repo: SettingsRepository::new(db_pool.clone()),
            member_repo: MemberRepository::new(db_pool.clone()),
            db_pool,
            workload_service,
            allocation_service,
            event_bus,
            aggregate_cache,
        }
    }
}
