// src/handlers/land.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::tenancy::TenantContext,
    models::farm::{
        Farm, LeaseContract, LeaseStatus, NewFarm, NewLeaseContract, OwnershipType, PaymentFrequency,
    },
};

// =============================================================================
//  1. RANCHOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFarmPayload {
    #[validate(length(min = 1, message = "O nome do rancho é obrigatório."))]
    #[schema(example = "Rancho El Sauz")]
    pub name: String,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "120.5")]
    pub total_area: Decimal,

    pub location: Option<String>,

    #[serde(default)]
    pub ownership_type: OwnershipType,
}

// GET /api/farms
#[utoipa::path(
    get,
    path = "/api/farms",
    tag = "Farms",
    responses(
        (status = 200, description = "Ranchos da empresa", body = Vec<Farm>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_farms(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let farms = app_state.land_service.list_farms(tenant.0).await?;
    Ok(Json(farms))
}

// POST /api/farms
#[utoipa::path(
    post,
    path = "/api/farms",
    tag = "Farms",
    request_body = CreateFarmPayload,
    responses(
        (status = 201, description = "Rancho criado", body = Farm)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_farm(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateFarmPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let farm = app_state
        .land_service
        .create_farm(
            tenant.0,
            NewFarm {
                name: payload.name,
                total_area: payload.total_area,
                location: payload.location,
                ownership_type: payload.ownership_type,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(farm)))
}

// =============================================================================
//  2. CONTRATOS DE ARRENDAMENTO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractPayload {
    pub farm_id: Uuid,

    #[validate(length(min = 1, message = "O nome do proprietário é obrigatório."))]
    #[schema(example = "Juan Pérez")]
    pub landowner_name: String,

    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2027-12-31")]
    pub end_date: NaiveDate,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "15000.00")]
    pub payment_amount: Decimal,

    #[serde(default)]
    pub payment_freq: PaymentFrequency,

    pub contract_doc_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractStatusPayload {
    pub status: LeaseStatus,
}

// POST /api/land/contracts
#[utoipa::path(
    post,
    path = "/api/land/contracts",
    tag = "Land",
    request_body = CreateContractPayload,
    responses(
        (status = 201, description = "Contrato criado; o rancho passa a arrendado", body = LeaseContract),
        (status = 400, description = "Datas inválidas ou rancho de outra empresa")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_contract(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateContractPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let contract = app_state
        .land_service
        .create_contract(
            tenant.0,
            NewLeaseContract {
                farm_id: payload.farm_id,
                landowner_name: payload.landowner_name,
                start_date: payload.start_date,
                end_date: payload.end_date,
                payment_amount: payload.payment_amount,
                payment_freq: payload.payment_freq,
                contract_doc_url: payload.contract_doc_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(contract)))
}

// GET /api/land/contracts
#[utoipa::path(
    get,
    path = "/api/land/contracts",
    tag = "Land",
    responses(
        (status = 200, description = "Contratos, do vencimento mais próximo ao mais distante", body = Vec<LeaseContract>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_contracts(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let contracts = app_state.land_service.list_contracts(tenant.0).await?;
    Ok(Json(contracts))
}

// GET /api/land/contracts/{id}
#[utoipa::path(
    get,
    path = "/api/land/contracts/{id}",
    tag = "Land",
    responses(
        (status = 200, description = "Contrato", body = LeaseContract),
        (status = 404, description = "Contrato não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Contrato"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_contract(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state.land_service.get_contract(tenant.0, id).await?;
    Ok(Json(contract))
}

// PATCH /api/land/contracts/{id}
#[utoipa::path(
    patch,
    path = "/api/land/contracts/{id}",
    tag = "Land",
    request_body = UpdateContractStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = LeaseContract),
        (status = 404, description = "Contrato não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Contrato"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_contract_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateContractStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let contract = app_state
        .land_service
        .update_contract_status(tenant.0, id, payload.status)
        .await?;
    Ok(Json(contract))
}

// DELETE /api/land/contracts/{id}
#[utoipa::path(
    delete,
    path = "/api/land/contracts/{id}",
    tag = "Land",
    responses(
        (status = 204, description = "Contrato removido"),
        (status = 404, description = "Contrato não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Contrato"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_contract(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.land_service.delete_contract(tenant.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/land/alerts
#[utoipa::path(
    get,
    path = "/api/land/alerts",
    tag = "Land",
    responses(
        (status = 200, description = "Contratos ativos que vencem nos próximos 60 dias", body = Vec<LeaseContract>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn lease_alerts(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let today = Utc::now().date_naive();
    let expiring = app_state.land_service.expiring_contracts(tenant.0, today).await?;
    Ok(Json(expiring))
}
