// src/models/allocation.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{dates::Granularity, hours::Hours},
    models::members::ResourceType,
};

// ---
// 1. Allocation (a linha persistida)
// ---
// Única por (resource_id, resource_type, project_id, allocation_date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    #[schema(ignore)]
    pub company_id: Uuid,
    pub project_id: Uuid,
    pub resource_id: Uuid,
    pub resource_type: ResourceType,
    pub allocation_date: NaiveDate,
    #[schema(value_type = f64, example = 4)]
    pub hours: Hours,
    pub updated_at: Option<DateTime<Utc>>,
}

// ---
// 2. AllocationRow (o que o fetcher devolve, já com os dados do projeto)
// ---
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct AllocationRow {
    pub project_id: Uuid,
    pub resource_id: Uuid,
    pub resource_type: ResourceType,
    pub allocation_date: NaiveDate,
    pub hours: Hours,
    pub project_name: Option<String>,
    pub project_code: Option<String>,
}

// A chave composta da unicidade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationKey {
    pub resource_id: Uuid,
    pub resource_type: ResourceType,
    pub project_id: Uuid,
    pub allocation_date: NaiveDate,
}

// ---
// 3. Payload de gravação (a única via sancionada de escrita)
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveAllocationPayload {
    pub resource_id: Uuid,
    pub resource_type: ResourceType,
    pub project_id: Uuid,

    // "YYYY-MM-DD" ou RFC 3339; normalizado no serviço
    #[validate(length(min = 10, max = 40, message = "Data do bucket inválida."))]
    #[schema(example = "2025-01-06")]
    pub bucket_date: String,

    // Zero ou negativo limpa a célula (apaga a linha)
    #[validate(custom(function = "validate_allocation_hours", message = "As horas devem ser no máximo 9999.9."))]
    #[schema(value_type = f64, example = 8)]
    pub hours: Hours,

    /// Grade de origem da célula. Na semanal, o valor substitui a semana inteira.
    #[serde(default = "day_granularity")]
    pub granularity: Granularity,
}

fn day_granularity() -> Granularity {
    Granularity::Day
}

fn validate_allocation_hours(hours: &Hours) -> Result<(), ValidationError> {
    if *hours > Hours::LIMIT {
        return Err(ValidationError::new("hours"));
    }
    Ok(())
}

/// Resultado de uma gravação: a linha ficou com este valor ou foi removida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved {
        #[schema(value_type = f64)]
        hours: Hours,
    },
    Cleared,
}
