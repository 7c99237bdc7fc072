// src/handlers/settings.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    events::WorkloadEvent,
    middleware::company::CompanyContext,
    models::settings::{UpdateSettingsRequest, WorkloadSettings},
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    params(
        ("x-company-id" = uuid::Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Configuração de carga da empresa (padrões se nunca gravada)", body = WorkloadSettings)
    )
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let settings = app_state
        .settings_repo
        .get_settings(app_state.settings_repo.pool(), company.0)
        .await?;

    Ok((StatusCode::OK, Json(settings)))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    params(
        ("x-company-id" = uuid::Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Configuração atualizada", body = WorkloadSettings),
        (status = 400, description = "Campos inválidos", body = ApiError)
    )
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state
        .settings_repo
        .update_settings(company.0, payload)
        .await?;

    // Semana/jornada mudaram: todo agregado da empresa ficou velho
    let event = WorkloadEvent::SettingsUpdated { company_id: company.0 };
    app_state.aggregate_cache.invalidate(&event.query_key()).await;
    app_state.event_bus.publish(event);

    tracing::info!(company_id = %company.0, "Configuração de carga atualizada");

    Ok((StatusCode::OK, Json(updated)))
}
