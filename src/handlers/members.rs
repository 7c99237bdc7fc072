// src/handlers/members.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::company::CompanyContext,
    models::members::Member,
};

// GET /api/members
#[utoipa::path(
    get,
    path = "/api/members",
    tag = "Members",
    params(
        ("x-company-id" = uuid::Uuid, Header, description = "ID da empresa")
    ),
    responses(
        (status = 200, description = "Membros e convites da empresa", body = Vec<Member>)
    )
)]
pub async fn list_members(
    State(app_state): State<AppState>,
    company: CompanyContext,
) -> Result<impl IntoResponse, ApiError> {
    let members = app_state.member_repo.list_members(company.0, None).await?;

    Ok((StatusCode::OK, Json(members)))
}
