// src/models/members.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{common::hours::Hours, models::settings::WorkloadSettings};

// --- Enums ---
// 'active' = perfil registrado; 'pre_registered' = convite ainda pendente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "resource_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Active,
    PreRegistered,
}

// ---
// Member: uma pessoa (ou convite) que pode receber alocações
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub resource_type: ResourceType,

    #[schema(example = "Ana Souza")]
    pub name: Option<String>,

    // Sem valor, vale a jornada padrão da empresa
    #[schema(value_type = Option<f64>, example = 40)]
    pub weekly_capacity: Option<Hours>,

    #[schema(example = "São Paulo")]
    pub location: Option<String>,
}

impl Member {
    pub fn new(id: Uuid, resource_type: ResourceType) -> Self {
        Self {
            id,
            resource_type,
            name: None,
            weekly_capacity: None,
            location: None,
        }
    }

    pub fn with_capacity(mut self, hours: Hours) -> Self {
        self.weekly_capacity = Some(hours);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn capacity(&self, settings: &WorkloadSettings) -> Hours {
        self.weekly_capacity.unwrap_or(settings.work_week_hours)
    }
}
