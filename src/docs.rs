// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};

use crate::{common, handlers, models, services};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Workload ---
        handlers::workload::get_workload,
        handlers::workload::classify_utilization,

        // --- Allocations ---
        handlers::allocations::save_allocation,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Members ---
        handlers::members::list_members,

        // --- Events ---
        handlers::events::stream_events,
    ),
    components(
        schemas(
            // --- Calendário ---
            common::dates::WeekStart,
            common::dates::Granularity,
            common::error::ApiError,

            // --- Settings ---
            models::settings::DisplayUnit,
            models::settings::WorkloadSettings,
            models::settings::UpdateSettingsRequest,

            // --- Members ---
            models::members::ResourceType,
            models::members::Member,

            // --- Allocations ---
            models::allocation::Allocation,
            models::allocation::SaveAllocationPayload,
            models::allocation::SaveOutcome,

            // --- Workload ---
            models::workload::SourceKind,
            models::workload::ProjectHours,
            models::workload::WorkloadBreakdown,
            models::workload::AggregationDiagnostics,
            models::workload::Aggregate,
            services::utilization::UtilizationStatus,
            services::utilization::Utilization,
            handlers::workload::WorkloadResponse,
        )
    ),
    tags(
        (name = "Workload", description = "Carga de trabalho agregada e utilização"),
        (name = "Allocations", description = "Gravação de células de alocação"),
        (name = "Settings", description = "Calendário e jornada da empresa"),
        (name = "Members", description = "Diretório de membros"),
        (name = "Events", description = "Notificações para as outras telas abertas")
    ),
    modifiers(&CompanyHeaderAddon)
)]
pub struct ApiDoc;

struct CompanyHeaderAddon;

impl utoipa::Modify for CompanyHeaderAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "company_header",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-company-id"))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/api/workload", "/api/utilization", "/api/allocations", "/api/settings", "/api/members", "/api/events"] {
            assert!(doc.paths.paths.contains_key(path), "{path} ausente");
        }
    }
}
