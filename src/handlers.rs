// src/handlers.rs

use axum::Json;
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use validator::ValidationError;

use crate::common::error::AppError;

pub mod compliance;
pub mod dashboard;
pub mod finance;
pub mod land;
pub mod logistics;
pub mod public;
pub mod team;
pub mod tenancy;
pub mod traceability;

// Corpo JSON cuja rejeição vira `AppError` (400 em JSON, não o 422 em texto do axum)
pub type JsonBody<T> = WithRejection<Json<T>, AppError>;

// ---
// Validação customizada compartilhada pelos payloads
// ---
pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}
