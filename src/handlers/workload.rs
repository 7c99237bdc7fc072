// src/handlers/workload.rs

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    common::{
        dates::{self, BucketKey, Granularity},
        error::{ApiError, AppError},
        hours::Hours,
    },
    config::AppState,
    middleware::company::CompanyContext,
    models::{settings::DisplayUnit, workload::Aggregate},
    services::{
        utilization::{self, Utilization},
        workload_service::utilization_grid,
    },
};

fn default_buckets() -> u32 {
    4
}

// ---
// GET /api/workload
// ---
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WorkloadParams {
    /// Primeiro dia da janela (`YYYY-MM-DD` ou RFC 3339)
    pub start: String,

    #[serde(default = "default_buckets")]
    #[validate(range(min = 1, max = 366, message = "Informe de 1 a 366 buckets."))]
    pub buckets: u32,

    #[serde(default)]
    pub granularity: Granularity,

    /// Ids separados por vírgula; vazio = todos os membros
    pub member_ids: Option<String>,

    #[serde(default)]
    pub itemize: bool,
}

fn parse_member_ids(raw: Option<&str>) -> Result<Option<Vec<Uuid>>, ValidationErrors> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    raw.split(',')
        .map(|part| Uuid::parse_str(part.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
        .map_err(|_| {
            let mut errors = ValidationErrors::new();
            let mut error = ValidationError::new("uuid");
            error.message = Some("memberIds deve conter UUIDs separados por vírgula.".into());
            errors.add("memberIds", error);
            errors
        })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadResponse {
    pub display_unit: DisplayUnit,
    pub aggregate: Aggregate,
    // member_id -> bucket -> utilização
    #[schema(value_type = Object)]
    pub utilization: BTreeMap<Uuid, BTreeMap<BucketKey, Utilization>>,
}

#[utoipa::path(
    get,
    path = "/api/workload",
    tag = "Workload",
    params(
        WorkloadParams,
        ("x-company-id" = Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Carga por membro e bucket, com utilização", body = WorkloadResponse),
        (status = 400, description = "Parâmetros inválidos", body = ApiError)
    )
)]
pub async fn get_workload(
    State(app_state): State<AppState>,
    company: CompanyContext,
    Query(params): Query<WorkloadParams>,
) -> Result<impl IntoResponse, ApiError> {
    params.validate().map_err(AppError::ValidationError)?;

    let start = dates::parse_date(&params.start)?;
    let member_ids = parse_member_ids(params.member_ids.as_deref()).map_err(AppError::ValidationError)?;

    let settings = app_state
        .settings_repo
        .get_settings(app_state.settings_repo.pool(), company.0)
        .await?;

    let members = app_state
        .member_repo
        .list_members(company.0, member_ids.as_deref())
        .await?;

    let aggregate = app_state
        .workload_service
        .compute_aggregate(
            company.0,
            &members,
            start,
            params.buckets,
            params.granularity,
            params.itemize,
            &settings,
        )
        .await;

    let utilization = utilization_grid(&aggregate, &members, &settings);

    Ok((
        StatusCode::OK,
        Json(WorkloadResponse {
            display_unit: settings.display_unit,
            aggregate: (*aggregate).clone(),
            utilization,
        }),
    ))
}

// ---
// GET /api/utilization
// ---
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UtilizationParams {
    #[param(example = 28)]
    pub hours: f64,
    #[param(example = 40)]
    pub capacity: f64,
}

fn hours_param(name: &str, value: f64) -> Result<Hours, ApiError> {
    Decimal::try_from(value)
        .ok()
        .and_then(Hours::from_decimal)
        .ok_or_else(|| ApiError::bad_request(format!("Parâmetro '{name}' inválido.")))
}

#[utoipa::path(
    get,
    path = "/api/utilization",
    tag = "Workload",
    params(UtilizationParams),
    responses(
        (status = 200, description = "Percentual e faixa de utilização", body = Utilization),
        (status = 400, description = "Parâmetros inválidos", body = ApiError)
    )
)]
pub async fn classify_utilization(
    Query(params): Query<UtilizationParams>,
) -> Result<impl IntoResponse, ApiError> {
    let hours = hours_param("hours", params.hours)?;
    let capacity = hours_param("capacity", params.capacity)?;

    Ok((StatusCode::OK, Json(utilization::classify(hours, capacity))))
}
