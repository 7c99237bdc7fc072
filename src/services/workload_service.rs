// src/services/workload_service.rs

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{
        dates::{BucketKey, Granularity},
        error::AppError,
    },
    models::{
        allocation::AllocationRow,
        leave::{AnnualLeave, OfficeHoliday, OtherLeave},
        members::Member,
        settings::WorkloadSettings,
        workload::{Aggregate, SourceKind, WindowQuery},
    },
    services::{
        aggregate_cache::AggregateCache,
        aggregation::{initialize, recompute_totals},
        allocation_input::bucket_capacity,
        processors::{self, ProcessingContext},
        utilization::{Utilization, classify},
    },
};

// ---
// As quatro fontes, atrás de um trait (Postgres em produção, fakes nos testes)
// ---
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    async fn fetch_allocations(&self, query: &WindowQuery) -> Result<Vec<AllocationRow>, AppError>;
    async fn fetch_annual_leave(&self, query: &WindowQuery) -> Result<Vec<AnnualLeave>, AppError>;
    async fn fetch_office_holidays(&self, query: &WindowQuery) -> Result<Vec<OfficeHoliday>, AppError>;
    async fn fetch_other_leave(&self, query: &WindowQuery) -> Result<Vec<OtherLeave>, AppError>;
}

// Fonte que falhou entra vazia; o resto da agregação segue
fn degrade<T>(result: Result<Vec<T>, AppError>, kind: SourceKind, failed: &mut Vec<SourceKind>) -> Vec<T> {
    match result {
        Ok(rows) => rows,
        Err(e) => {
            let failure = AppError::FetchFailure {
                source_kind: kind,
                reason: e.to_string(),
            };
            tracing::warn!(source = %kind, error = %failure, detail = ?e, "Fonte indisponível; seguindo sem ela");
            failed.push(kind);
            Vec::new()
        }
    }
}

/// Uma passada completa: busca concorrente, processadores, totais.
///
/// Nunca falha: fontes com erro são registradas em
/// `diagnostics.failed_sources` e contribuem com zero.
pub async fn aggregate(
    source: &dyn WorkloadSource,
    query: &WindowQuery,
    members: &[Member],
    settings: &WorkloadSettings,
    itemize: bool,
) -> Aggregate {
    let (allocations, annual_leave, holidays, other_leave) = tokio::join!(
        source.fetch_allocations(query),
        source.fetch_annual_leave(query),
        source.fetch_office_holidays(query),
        source.fetch_other_leave(query),
    );

    let mut failed = Vec::new();
    let allocations = degrade(allocations, SourceKind::ProjectAllocations, &mut failed);
    let annual_leave = degrade(annual_leave, SourceKind::AnnualLeave, &mut failed);
    let holidays = degrade(holidays, SourceKind::OfficeHolidays, &mut failed);
    let other_leave = degrade(other_leave, SourceKind::OtherLeave, &mut failed);

    let mut result = initialize(
        query.company_id,
        members,
        query.start,
        query.bucket_count,
        query.granularity,
        query.week_start,
        itemize,
    );
    for kind in failed {
        result.record_failure(kind);
    }

    let ctx = ProcessingContext::new(settings, members);
    processors::process_allocations(&ctx, &allocations, &mut result);
    processors::process_annual_leave(&ctx, &annual_leave, &mut result);
    processors::process_office_holidays(&ctx, &holidays, &mut result);
    processors::process_other_leave(&ctx, &other_leave, &mut result);

    recompute_totals(&mut result);
    result
}

/// Utilização de cada membro x bucket, contra a capacidade do bucket.
pub fn utilization_grid(
    aggregate: &Aggregate,
    members: &[Member],
    settings: &WorkloadSettings,
) -> BTreeMap<Uuid, BTreeMap<BucketKey, Utilization>> {
    members
        .iter()
        .filter_map(|member| {
            let buckets = aggregate.members.get(&member.id)?;
            let capacity = bucket_capacity(member.capacity(settings), aggregate.granularity, settings);
            let row = buckets
                .iter()
                .map(|(key, breakdown)| (*key, classify(breakdown.total(), capacity)))
                .collect();
            Some((member.id, row))
        })
        .collect()
}

// ---
// Serviço (com cache)
// ---
#[derive(Clone)]
pub struct WorkloadService {
    source: Arc<dyn WorkloadSource>,
    cache: Arc<AggregateCache>,
}

impl WorkloadService {
    pub fn new(source: Arc<dyn WorkloadSource>, cache: Arc<AggregateCache>) -> Self {
        Self { source, cache }
    }

    /// Ponto de entrada das grades: o agregado da janela para os membros.
    #[allow(clippy::too_many_arguments)]
    pub async fn compute_aggregate(
        &self,
        company_id: Uuid,
        members: &[Member],
        start: NaiveDate,
        bucket_count: u32,
        granularity: Granularity,
        itemize: bool,
        settings: &WorkloadSettings,
    ) -> Arc<Aggregate> {
        let query = WindowQuery::new(
            company_id,
            members.iter().map(|m| m.id),
            start,
            bucket_count,
            granularity,
            settings.week_start_day,
        );

        if let Some(hit) = self.cache.get(&query, itemize).await {
            tracing::debug!(%company_id, buckets = bucket_count, "Agregado servido do cache");
            return hit;
        }

        // Geração tomada antes das buscas: invalidação no meio derruba a gravação
        let generation = self.cache.generation();
        let result = Arc::new(aggregate(self.source.as_ref(), &query, members, settings, itemize).await);

        // Agregado parcial não vai para o cache
        if result.diagnostics.failed_sources.is_empty() {
            self.cache.insert(query, itemize, Arc::clone(&result), generation).await;
        }
        result
    }
}

// ---
// Guarda contra respostas fora de ordem
// ---

/// Geração monotônica de uma visão. Uma carga guarda a geração em que
/// começou; se ela não é mais a vigente quando a resposta chega, a resposta
/// é velha e não pode sobrescrever nada.
#[derive(Debug, Default)]
pub struct WorkloadView {
    generation: AtomicU64,
}

impl WorkloadView {
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }

    /// Derruba as cargas em voo e devolve a nova geração.
    pub fn cancel(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
