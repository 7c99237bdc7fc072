// src/services/aggregate_cache.rs

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::{
    sync::{RwLock, broadcast::error::RecvError},
    task::JoinHandle,
};

use crate::{
    events::{EventBus, QueryKey},
    models::workload::{Aggregate, WindowQuery},
    services::workload_service::WorkloadView,
};

// Janela + membros + itemização
type CacheKey = (WindowQuery, bool);

struct CacheEntry {
    aggregate: Arc<Aggregate>,
    stored_at: Instant,
}

/// Agregados recentes por janela. Uma entrada vale por `ttl` ou até um
/// evento do barramento tocar a empresa/membro dela.
///
/// Toda invalidação avança a geração; uma passada que começou antes dela
/// não grava o resultado.
pub struct AggregateCache {
    ttl: Duration,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    view: WorkloadView,
}

impl AggregateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            view: WorkloadView::default(),
        }
    }

    /// Geração a guardar antes de buscar as fontes.
    pub fn generation(&self) -> u64 {
        self.view.current()
    }

    pub async fn get(&self, query: &WindowQuery, itemize: bool) -> Option<Arc<Aggregate>> {
        let entries = self.entries.read().await;
        let entry = entries.get(&(query.clone(), itemize))?;

        // TTL zero desliga o cache
        if entry.stored_at.elapsed() >= self.ttl {
            return None;
        }
        Some(Arc::clone(&entry.aggregate))
    }

    /// Grava o agregado se nenhuma invalidação aconteceu desde `generation`.
    pub async fn insert(&self, query: WindowQuery, itemize: bool, aggregate: Arc<Aggregate>, generation: u64) -> bool {
        let mut entries = self.entries.write().await;
        if !self.view.is_current(generation) {
            tracing::debug!(generation, company_id = %query.company_id, "Passada velha; agregado fora do cache");
            return false;
        }

        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            (query, itemize),
            CacheEntry {
                aggregate,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Remove as entradas afetadas pela chave. Devolve quantas saíram.
    pub async fn invalidate(&self, key: &QueryKey) -> usize {
        let mut entries = self.entries.write().await;
        self.view.cancel();
        let before = entries.len();
        entries.retain(|(query, _), _| !key.affects(query.company_id, &query.member_ids));
        before - entries.len()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        self.view.cancel();
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Tarefa que escuta o barramento e invalida as entradas tocadas.
    pub fn spawn_invalidation(self: &Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        let removed = cache.invalidate(&event.query_key()).await;
                        tracing::debug!(event = event.name(), removed, "Cache de agregados invalidado");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Eventos perdidos: não dá para saber o que ficou velho
                        tracing::warn!(skipped, "Listener do cache atrasado; limpando tudo");
                        cache.clear().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::dates::{Granularity, WeekStart},
        events::WorkloadEvent,
        services::aggregation::initialize,
    };
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn query(company: Uuid, members: &[Uuid]) -> WindowQuery {
        WindowQuery::new(
            company,
            members.iter().copied(),
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            1,
            Granularity::Week,
            WeekStart::Monday,
        )
    }

    fn empty(company: Uuid) -> Arc<Aggregate> {
        Arc::new(initialize(company, &[], NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), 1, Granularity::Week, WeekStart::Monday, false))
    }

    #[tokio::test]
    async fn hit_until_member_is_invalidated() {
        let cache = AggregateCache::new(Duration::from_secs(60));
        let company = Uuid::from_u128(9);
        let (m1, m2) = (Uuid::from_u128(1), Uuid::from_u128(2));

        cache.insert(query(company, &[m1]), false, empty(company), cache.generation()).await;
        cache.insert(query(company, &[m2]), false, empty(company), cache.generation()).await;
        assert!(cache.get(&query(company, &[m1]), false).await.is_some());
        assert!(cache.get(&query(company, &[m1]), true).await.is_none());

        let key = QueryKey { company_id: company, member_id: Some(m1) };
        assert_eq!(cache.invalidate(&key).await, 1);
        assert!(cache.get(&query(company, &[m1]), false).await.is_none());
        assert!(cache.get(&query(company, &[m2]), false).await.is_some());
    }

    #[tokio::test]
    async fn insert_after_invalidation_is_refused() {
        let cache = AggregateCache::new(Duration::from_secs(60));
        let company = Uuid::from_u128(9);
        let m1 = Uuid::from_u128(1);

        let started = cache.generation();
        cache.invalidate(&QueryKey { company_id: company, member_id: Some(m1) }).await;

        assert!(!cache.insert(query(company, &[m1]), false, empty(company), started).await);
        assert_eq!(cache.len().await, 0);

        assert!(cache.insert(query(company, &[m1]), false, empty(company), cache.generation()).await);
        assert_eq!(cache.len().await, 1);

        let started = cache.generation();
        cache.clear().await;
        assert!(!cache.insert(query(company, &[m1]), false, empty(company), started).await);
    }

    #[tokio::test]
    async fn zero_ttl_never_hits() {
        let cache = AggregateCache::new(Duration::ZERO);
        let company = Uuid::from_u128(9);
        cache.insert(query(company, &[]), false, empty(company), cache.generation()).await;
        assert!(cache.get(&query(company, &[]), false).await.is_none());
    }

    #[tokio::test]
    async fn bus_events_evict_company_entries() {
        let cache = Arc::new(AggregateCache::new(Duration::from_secs(60)));
        let bus = EventBus::default();
        let company = Uuid::from_u128(9);
        let other = Uuid::from_u128(8);

        cache.insert(query(company, &[Uuid::from_u128(1)]), false, empty(company), cache.generation()).await;
        cache.insert(query(other, &[Uuid::from_u128(1)]), false, empty(other), cache.generation()).await;

        let handle = cache.spawn_invalidation(&bus);
        bus.publish(WorkloadEvent::SettingsUpdated { company_id: company });

        // dá tempo para o listener processar
        for _ in 0..50 {
            if cache.len().await == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&query(other, &[Uuid::from_u128(1)]), false).await.is_some());

        drop(bus);
        handle.await.unwrap();
    }
}
