// src/events.rs

//! Barramento de eventos em processo (`tokio::sync::broadcast`).
//!
//! Toda gravação que muda a carga de trabalho publica um [`WorkloadEvent`];
//! o cache de agregados e o stream SSE das outras telas escutam aqui.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{common::hours::Hours, models::members::ResourceType};

// ---
// Eventos
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkloadEvent {
    #[serde(rename_all = "camelCase")]
    AllocationSaved {
        company_id: Uuid,
        resource_id: Uuid,
        resource_type: ResourceType,
        project_id: Uuid,
        bucket_date: NaiveDate,
        hours: Hours,
    },
    #[serde(rename_all = "camelCase")]
    AllocationCleared {
        company_id: Uuid,
        resource_id: Uuid,
        resource_type: ResourceType,
        project_id: Uuid,
        bucket_date: NaiveDate,
    },
    // Semana, jornada ou dias úteis mudaram: tudo da empresa fica velho
    #[serde(rename_all = "camelCase")]
    SettingsUpdated {
        company_id: Uuid,
    },
}

/// Chave de invalidação: a empresa e, quando o evento é de um membro, o membro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryKey {
    pub company_id: Uuid,
    pub member_id: Option<Uuid>,
}

impl QueryKey {
    /// Uma consulta sobre `member_ids` fica velha com esta chave?
    pub fn affects(&self, company_id: Uuid, member_ids: &[Uuid]) -> bool {
        if self.company_id != company_id {
            return false;
        }
        match self.member_id {
            None => true,
            Some(member) => member_ids.binary_search(&member).is_ok(),
        }
    }
}

impl WorkloadEvent {
    pub fn company_id(&self) -> Uuid {
        match self {
            WorkloadEvent::AllocationSaved { company_id, .. }
            | WorkloadEvent::AllocationCleared { company_id, .. }
            | WorkloadEvent::SettingsUpdated { company_id } => *company_id,
        }
    }

    pub fn query_key(&self) -> QueryKey {
        let member_id = match self {
            WorkloadEvent::AllocationSaved { resource_id, .. }
            | WorkloadEvent::AllocationCleared { resource_id, .. } => Some(*resource_id),
            WorkloadEvent::SettingsUpdated { .. } => None,
        };
        QueryKey {
            company_id: self.company_id(),
            member_id,
        }
    }

    // Nome do evento no stream SSE
    pub fn name(&self) -> &'static str {
        match self {
            WorkloadEvent::AllocationSaved { .. } => "allocation.saved",
            WorkloadEvent::AllocationCleared { .. } => "allocation.cleared",
            WorkloadEvent::SettingsUpdated { .. } => "settings.updated",
        }
    }
}

// ---
// EventBus
// ---

/// Capacidade padrão do canal.
pub const DEFAULT_CAPACITY: usize = 1024;

pub struct EventBus {
    sender: broadcast::Sender<WorkloadEvent>,
}

impl EventBus {
    /// Com o buffer cheio, as mensagens mais antigas caem e o receptor
    /// lento vê `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: WorkloadEvent) {
        tracing::debug!(event = event.name(), company_id = %event.company_id(), "Evento publicado");
        // SendError só significa que não há ninguém ouvindo
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkloadEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
