// src/middleware/company.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::ApiError;

// Cabeçalho que identifica a empresa da requisição
pub const COMPANY_ID_HEADER: &str = "x-company-id";

#[derive(Debug, Clone, Copy)]
pub struct CompanyContext(pub Uuid);

impl<S> FromRequestParts<S> for CompanyContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(COMPANY_ID_HEADER)
            .ok_or_else(|| ApiError::bad_request("O cabeçalho X-Company-ID é obrigatório."))?;

        let value_str = value
            .to_str()
            .map_err(|_| ApiError::bad_request("Cabeçalho X-Company-ID contém caracteres inválidos."))?;

        let company_id = Uuid::parse_str(value_str.trim())
            .map_err(|_| ApiError::bad_request("Cabeçalho X-Company-ID inválido (não é um UUID)."))?;

        Ok(CompanyContext(company_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(header: Option<&str>) -> Result<CompanyContext, ApiError> {
        let mut builder = Request::builder().uri("/api/workload");
        if let Some(value) = header {
            builder = builder.header(COMPANY_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        CompanyContext::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_company_from_header() {
        let id = Uuid::from_u128(9);
        let ctx = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(ctx.0, id);
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_bad_request() {
        assert_eq!(extract(None).await.unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(extract(Some("empresa-1")).await.unwrap_err().status, StatusCode::BAD_REQUEST);
    }
}
