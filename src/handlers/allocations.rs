// src/handlers/allocations.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::company::CompanyContext,
    models::allocation::{SaveAllocationPayload, SaveOutcome},
};

// PUT /api/allocations
#[utoipa::path(
    put,
    path = "/api/allocations",
    tag = "Allocations",
    request_body = SaveAllocationPayload,
    params(
        ("x-company-id" = uuid::Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Célula gravada (ou limpa, com horas <= 0); célula semanal substitui a semana", body = SaveOutcome),
        (status = 400, description = "Payload ou data inválidos", body = ApiError),
        (status = 409, description = "Gravação rejeitada por restrição do banco", body = ApiError)
    )
)]
pub async fn save_allocation(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Json(payload): Json<SaveAllocationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::ValidationError)?;

    // Semana e dias úteis decidem onde uma célula semanal cai
    let settings = app_state
        .settings_repo
        .get_settings(app_state.settings_repo.pool(), company.0)
        .await?;

    let outcome = app_state
        .allocation_service
        .save_allocation(company.0, payload, &settings)
        .await?;

    Ok((StatusCode::OK, Json(outcome)))
}
