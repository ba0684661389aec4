// src/common/error.rs

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo JSON ausente, malformado ou com campo de tipo errado
    #[error("Corpo da requisição inválido: {0}")]
    MalformedBody(String),

    #[error("Referência inválida: {0}")]
    InvalidReference(String),

    #[error("Regra de negócio violada: {0}")]
    BusinessRule(String),

    #[error("Cabeçalho de empresa inválido")]
    InvalidTenantHeader,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    // Bloqueio fitossanitário: nunca é rebaixado para outro tipo de erro
    #[error("Produto proibido: {chemical}")]
    ChemicalBlocked {
        chemical: String,
        banned_markets: String,
    },

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MalformedBody(_)
            | AppError::InvalidReference(_)
            | AppError::BusinessRule(_)
            | AppError::InvalidTenantHeader => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::ChemicalBlocked { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::ChemicalBlocked { chemical, banned_markets } => json!({
                "error": "ALERTA CRÍTICA: Tentativa de aplicar produto proibido",
                "details": format!("Produto {} proibido em: {}", chemical, banned_markets),
                "chemical": chemical,
                "bannedMarkets": banned_markets,
                "status": "BLOCKED",
            }),
            AppError::MalformedBody(detail) => json!({
                "error": "Um ou mais campos são inválidos.",
                "details": detail,
            }),
            AppError::InvalidReference(msg) => json!({ "error": msg }),
            AppError::BusinessRule(msg) => json!({ "error": msg }),
            AppError::InvalidTenantHeader => {
                json!({ "error": "Identificador de empresa inválido (não é um UUID)." })
            }
            AppError::InvalidToken => {
                json!({ "error": "Token de autenticação inválido ou ausente." })
            }
            AppError::Forbidden(msg) => json!({ "error": msg }),
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::UniqueConstraintViolation(msg) => json!({ "error": msg }),

            // Erros internos: o detalhe vai só para o log, nunca para o cliente.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_driver_messages() {
        let driver_message = sqlx::Error::PoolTimedOut.to_string();
        let (status, body) = body_of(AppError::DatabaseError(sqlx::Error::PoolTimedOut)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Ocorreu um erro inesperado." }));
        assert!(!body.to_string().contains(&driver_message));

        let (status, body) =
            body_of(AppError::InternalServerError(anyhow::anyhow!("senha=segredo"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("segredo"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_bad_request() {
        let (status, body) = body_of(AppError::MalformedBody("missing field `name`".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"], "missing field `name`");
    }

    #[test]
    fn blocked_chemical_maps_to_forbidden() {
        let err = AppError::ChemicalBlocked {
            chemical: "ParaXYZ".into(),
            banned_markets: "EU,USA".into(),
        };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
