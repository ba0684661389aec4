// src/handlers/public.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{common::error::AppError, config::AppState, models::traceability::Passport};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "online")]
    pub status: String,
    #[schema(example = "AgriTrust Backend")]
    pub system: String,
}

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Public",
    responses(
        (status = 200, description = "Servidor no ar", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online".into(),
        system: "AgriTrust Backend".into(),
    })
}

// GET /api/public/passport/{qr_code}
#[utoipa::path(
    get,
    path = "/api/public/passport/{qr_code}",
    tag = "Public",
    responses(
        (status = 200, description = "Passaporte digital do produto", body = Passport),
        (status = 404, description = "Código desconhecido")
    ),
    params(
        ("qr_code" = String, Path, description = "Código QR da caixa")
    )
)]
pub async fn get_passport(
    State(app_state): State<AppState>,
    Path(qr_code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let passport = app_state.traceability_service.passport(&qr_code).await?;
    Ok(Json(passport))
}
