use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::workload::SourceKind;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Entrada malformada para o normalizador de datas: falha rápido, nunca "adivinha".
    #[error("Data inválida: '{0}'")]
    InvalidDate(String),

    // Uma fonte indisponível. O orquestrador degrada para vazio e segue agregando.
    #[error("Falha ao buscar {source_kind}: {reason}")]
    FetchFailure { source_kind: SourceKind, reason: String },

    // Escrita rejeitada por restrição do banco. Só a célula de origem vê este erro.
    #[error("Conflito ao gravar alocação: {0}")]
    WriteConflict(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            AppError::WriteConflict(_) => StatusCode::CONFLICT,
            AppError::FetchFailure { .. } => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Converte o erro de domínio na resposta do cliente, logando o que for interno.
impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = err.status();

        let (error_message, details) = match &err {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ("Um ou mais campos são inválidos.".to_string(), Some(json!(details)))
            }
            AppError::InvalidDate(_) | AppError::WriteConflict(_) | AppError::FetchFailure { .. } => {
                tracing::warn!("Requisição rejeitada: {}", err);
                (err.to_string(), None)
            }
            // O `tracing` loga a mensagem detalhada; o cliente recebe uma genérica.
            AppError::DatabaseError(e) => {
                tracing::error!("Erro Interno do Servidor: {}: {:?}", err, e);
                ("Ocorreu um erro inesperado.".to_string(), None)
            }
            AppError::InternalServerError(e) => {
                tracing::error!("Erro Interno do Servidor: {:#}", e);
                ("Ocorreu um erro inesperado.".to_string(), None)
            }
        };

        ApiError {
            status,
            error: error_message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

// ---
// ApiError: a resposta de erro que vai para o cliente
// ---
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    #[schema(example = "Data inválida: '06/01/2025'")]
    pub error: String,
    #[schema(value_type = Option<Object>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(AppError::InvalidDate("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::WriteConflict("dup".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn fetch_failure_names_the_source() {
        let err = AppError::FetchFailure {
            source_kind: SourceKind::OfficeHolidays,
            reason: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Falha ao buscar office_holidays: timeout");
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let api: ApiError = AppError::InternalServerError(anyhow::anyhow!("senha=123")).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("senha"));

        let conflict: ApiError = AppError::WriteConflict("chave duplicada".into()).into();
        assert_eq!(conflict.error, "Conflito ao gravar alocação: chave duplicada");
    }
}
