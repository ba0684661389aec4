// src/common/db_utils.rs

use crate::common::error::AppError;

/// Converte uma violação de chave única num erro amigável (409).
/// Qualquer outro erro segue como `AppError::DatabaseError`.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(message.into());
        }
    }
    e.into()
}

/// Converte uma violação de chave estrangeira em "referência inválida" (400).
pub(crate) fn map_foreign_key_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return AppError::InvalidReference(message.into());
        }
    }
    e.into()
}
