// src/handlers/events.rs

use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use uuid::Uuid;

use crate::{config::AppState, events::WorkloadEvent, middleware::company::CompanyContext};

fn to_sse(event: &WorkloadEvent) -> Option<Event> {
    match Event::default().event(event.name()).json_data(event) {
        Ok(sse) => Some(sse),
        Err(e) => {
            tracing::error!("Falha ao serializar evento: {:?}", e);
            None
        }
    }
}

// Só os eventos da empresa; atrasos do canal são pulados
fn company_stream(
    rx: tokio::sync::broadcast::Receiver<WorkloadEvent>,
    company_id: Uuid,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(move |received| match received {
        Ok(event) if event.company_id() == company_id => to_sse(&event).map(Ok),
        Ok(_) => None,
        Err(lagged) => {
            tracing::warn!("Stream SSE atrasado: {}", lagged);
            None
        }
    })
}

// GET /api/events
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "Events",
    params(
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Stream SSE de eventos de carga (allocation.saved, allocation.cleared, settings.updated)", content_type = "text/event-stream")
    )
)]
pub async fn stream_events(
    State(app_state): State<AppState>,
    company: CompanyContext,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(company_id = %company.0, "Cliente SSE conectado");

    Sse::new(company_stream(app_state.event_bus.subscribe(), company.0)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;

    #[tokio::test]
    async fn stream_only_carries_own_company_events() {
        let bus = EventBus::default();
        let company = Uuid::from_u128(9);
        let mut stream = Box::pin(company_stream(bus.subscribe(), company));

        bus.publish(WorkloadEvent::SettingsUpdated { company_id: Uuid::from_u128(8) });
        bus.publish(WorkloadEvent::SettingsUpdated { company_id: company });
        drop(bus);

        let mut received = 0;
        while let Some(item) = stream.next().await {
            assert!(item.is_ok());
            received += 1;
        }
        assert_eq!(received, 1);
    }
}
