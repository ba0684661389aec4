// src/handlers/traceability.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::traceability::{Bin, BinFilter, BinStatus, Crop, CropStatus, HarvestBatch, NewCrop},
    services::traceability_service::BatchRequest,
};

// =============================================================================
//  1. CULTIVOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCropPayload {
    pub farm_id: Uuid,

    #[validate(length(min = 1, message = "O nome do cultivo é obrigatório."))]
    #[schema(example = "Tomate")]
    pub name: String,

    #[schema(example = "Saladette")]
    pub variety: Option<String>,

    #[schema(value_type = Option<String>, format = Date)]
    pub planting_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: CropStatus,
}

// GET /api/crops
#[utoipa::path(
    get,
    path = "/api/crops",
    tag = "Traceability",
    responses(
        (status = 200, description = "Cultivos da empresa", body = Vec<Crop>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_crops(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let crops = app_state.traceability_service.list_crops(tenant.0).await?;
    Ok(Json(crops))
}

// POST /api/crops
#[utoipa::path(
    post,
    path = "/api/crops",
    tag = "Traceability",
    request_body = CreateCropPayload,
    responses(
        (status = 201, description = "Cultivo criado", body = Crop),
        (status = 400, description = "Rancho de outra empresa")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_crop(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateCropPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let crop = app_state
        .traceability_service
        .create_crop(
            tenant.0,
            NewCrop {
                farm_id: payload.farm_id,
                name: payload.name,
                variety: payload.variety,
                planting_date: payload.planting_date,
                status: payload.status,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(crop)))
}

// =============================================================================
//  2. LOTES DE COLHEITA
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchPayload {
    pub crop_id: Uuid,

    // Sem código = LOTE-<timestamp>
    #[schema(example = "LOT-20251025-A")]
    pub batch_code: Option<String>,

    #[validate(range(min = 0, message = "O total de caixas não pode ser negativo."))]
    #[serde(default)]
    pub total_bins: i32,
}

// GET /api/harvest-batches
#[utoipa::path(
    get,
    path = "/api/harvest-batches",
    tag = "Traceability",
    responses(
        (status = 200, description = "Lotes de colheita", body = Vec<HarvestBatch>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_batches(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let batches = app_state.traceability_service.list_batches(tenant.0).await?;
    Ok(Json(batches))
}

// POST /api/harvest-batches
#[utoipa::path(
    post,
    path = "/api/harvest-batches",
    tag = "Traceability",
    request_body = CreateBatchPayload,
    responses(
        (status = 201, description = "Lote aberto; rancho herdado do cultivo", body = HarvestBatch),
        (status = 409, description = "Código de lote já usado")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_batch(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let batch = app_state
        .traceability_service
        .create_batch(
            tenant.0,
            BatchRequest {
                crop_id: payload.crop_id,
                batch_code: payload.batch_code,
                total_bins: payload.total_bins,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(batch)))
}

// =============================================================================
//  3. CAIXAS (BINS)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanBinPayload {
    #[validate(length(min = 1, message = "O código QR é obrigatório."))]
    #[schema(example = "BIN-000123")]
    pub qr_code: String,

    pub harvest_batch_id: Uuid,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "22.5")]
    pub weight_kg: Decimal,

    // Apps móveis mandam a empresa no corpo
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BinListQuery {
    pub status: Option<BinStatus>,
    pub harvest_batch_id: Option<Uuid>,
}

// POST /api/bins/scan
#[utoipa::path(
    post,
    path = "/api/bins/scan",
    tag = "Traceability",
    request_body = ScanBinPayload,
    responses(
        (status = 200, description = "Caixa vinculada ao lote (idempotente)", body = Bin),
        (status = 400, description = "Lote de outra empresa ou peso inválido")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn scan_bin(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    WithRejection(Json(mut payload), _): JsonBody<ScanBinPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.qr_code = payload.qr_code.trim().to_string();
    payload.validate()?;

    let tenant_id = tenant
        .or_body_tenant(&app_state, &user.0, payload.tenant_id)
        .await?;

    let bin = app_state
        .traceability_service
        .scan_bin(
            tenant_id,
            &payload.qr_code,
            payload.harvest_batch_id,
            payload.weight_kg,
        )
        .await?;

    Ok(Json(bin))
}

// GET /api/bins
#[utoipa::path(
    get,
    path = "/api/bins",
    tag = "Traceability",
    responses(
        (status = 200, description = "Caixas mais recentes primeiro (máx. 1000)", body = Vec<Bin>)
    ),
    params(
        BinListQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_bins(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<BinListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bins = app_state
        .traceability_service
        .list_bins(
            tenant.0,
            BinFilter {
                status: query.status,
                harvest_batch_id: query.harvest_batch_id,
            },
        )
        .await?;
    Ok(Json(bins))
}
