// src/handlers/dashboard.rs

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    // Importamos os models para referenciar no Swagger
    models::dashboard::DashboardStats,
};

// GET /api/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Colheita de hoje, lotes do dia e tendência de 7 dias", body = DashboardStats),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Requer administrador")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let stats = app_state.dashboard_service.stats(tenant.0, today).await?;
    Ok(Json(stats))
}
