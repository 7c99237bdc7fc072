// src/services/allocation_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    common::{
        dates::{self, Granularity},
        error::AppError,
        hours::Hours,
    },
    events::{EventBus, WorkloadEvent},
    models::{
        allocation::{AllocationKey, SaveAllocationPayload, SaveOutcome},
        settings::WorkloadSettings,
    },
    services::{aggregate_cache::AggregateCache, processors::distribute},
};

/// Onde as alocações moram. Upsert e delete pela chave composta.
#[async_trait]
pub trait AllocationStore: Send + Sync {
    async fn upsert(&self, company_id: Uuid, key: &AllocationKey, hours: Hours) -> Result<(), AppError>;

    /// Devolve `true` se havia linha para remover.
    async fn delete(&self, company_id: Uuid, key: &AllocationKey) -> Result<bool, AppError>;

    /// Troca, numa transação só, todas as linhas de `[key.allocation_date, until)`
    /// do recurso/projeto por `rows`. Devolve quantas linhas saíram.
    async fn replace_range(
        &self,
        company_id: Uuid,
        key: &AllocationKey,
        until: NaiveDate,
        rows: &[(NaiveDate, Hours)],
    ) -> Result<u64, AppError>;
}

/// Parcelas diárias de um valor semanal: os dias úteis da semana recebem
/// `distribute(horas, n)`. Semana sem dia útil fica toda no primeiro dia.
pub fn weekly_rows(week_start: NaiveDate, hours: Hours, settings: &WorkloadSettings) -> Vec<(NaiveDate, Hours)> {
    if !hours.is_positive() {
        return Vec::new();
    }

    let mut days = dates::working_days_of_week(week_start, &settings.working_days);
    if days.is_empty() {
        days.push(week_start);
    }

    let shares = distribute(hours, days.len());
    days.into_iter()
        .zip(shares)
        .filter(|(_, share)| share.is_positive())
        .collect()
}

#[derive(Clone)]
pub struct AllocationService {
    store: Arc<dyn AllocationStore>,
    bus: Arc<EventBus>,
    cache: Arc<AggregateCache>,
}

impl AllocationService {
    pub fn new(store: Arc<dyn AllocationStore>, bus: Arc<EventBus>, cache: Arc<AggregateCache>) -> Self {
        Self { store, bus, cache }
    }

    /// Única via de escrita de alocações.
    ///
    /// Horas zero ou negativas limpam a célula (a linha é removida); acima
    /// disso, upsert idempotente pela chave. Célula semanal substitui todas
    /// as linhas da semana, espalhando o valor pelos dias úteis. Com sucesso,
    /// o agregado do membro é invalidado e o evento vai para o barramento.
    pub async fn save_allocation(
        &self,
        company_id: Uuid,
        payload: SaveAllocationPayload,
        settings: &WorkloadSettings,
    ) -> Result<SaveOutcome, AppError> {
        let parsed = dates::parse_date(&payload.bucket_date)?;
        let allocation_date = dates::bucket_key(parsed, payload.granularity, settings.week_start_day).date();

        let key = AllocationKey {
            resource_id: payload.resource_id,
            resource_type: payload.resource_type,
            project_id: payload.project_id,
            allocation_date,
        };

        match payload.granularity {
            Granularity::Day if payload.hours.is_positive() => {
                self.store.upsert(company_id, &key, payload.hours).await?;
            }
            Granularity::Day => {
                let removed = self.store.delete(company_id, &key).await?;
                tracing::debug!(removed, "Célula limpa");
            }
            Granularity::Week => {
                let until = allocation_date + Duration::days(Granularity::Week.span_days());
                let rows = weekly_rows(allocation_date, payload.hours, settings);
                let removed = self.store.replace_range(company_id, &key, until, &rows).await?;
                tracing::debug!(removed, written = rows.len(), "Semana substituída");
            }
        }

        let (outcome, event) = if payload.hours.is_positive() {
            (
                SaveOutcome::Saved { hours: payload.hours },
                WorkloadEvent::AllocationSaved {
                    company_id,
                    resource_id: key.resource_id,
                    resource_type: key.resource_type,
                    project_id: key.project_id,
                    bucket_date: key.allocation_date,
                    hours: payload.hours,
                },
            )
        } else {
            (
                SaveOutcome::Cleared,
                WorkloadEvent::AllocationCleared {
                    company_id,
                    resource_id: key.resource_id,
                    resource_type: key.resource_type,
                    project_id: key.project_id,
                    bucket_date: key.allocation_date,
                },
            )
        };

        tracing::info!(
            %company_id,
            resource_id = %key.resource_id,
            project_id = %key.project_id,
            date = %key.allocation_date,
            granularity = ?payload.granularity,
            ?outcome,
            "Alocação gravada"
        );

        self.cache.invalidate(&event.query_key()).await;
        self.bus.publish(event);

        Ok(outcome)
    }
}
