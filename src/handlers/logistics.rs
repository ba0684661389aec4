// src/handlers/logistics.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::tenancy::TenantContext,
    models::logistics::{Claim, ClaimStatus, NewClaim, Shipment, ShipmentStatus},
};

// =============================================================================
//  1. EMBARQUES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentPayload {
    #[validate(length(min = 1, message = "O cliente é obrigatório."))]
    #[schema(example = "Whole Foods Market")]
    pub customer_name: String,

    #[schema(example = "McAllen, TX")]
    pub destination: Option<String>,

    #[schema(example = "ABC-123-X")]
    pub truck_plate: Option<String>,

    #[validate(length(min = 1, message = "Informe ao menos uma caixa."))]
    pub bin_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShipmentStatusPayload {
    pub status: ShipmentStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShipmentListQuery {
    pub status: Option<ShipmentStatus>,
}

// POST /api/shipments
#[utoipa::path(
    post,
    path = "/api/shipments",
    tag = "Logistics",
    request_body = CreateShipmentPayload,
    responses(
        (status = 201, description = "Embarque criado com todas as caixas", body = Shipment),
        (status = 400, description = "Alguma caixa inexistente, de outra empresa ou já embarcada; nada é gravado")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shipment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateShipmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let shipment = app_state
        .logistics_service
        .create_shipment(
            tenant.0,
            payload.customer_name,
            payload.destination,
            payload.truck_plate,
            &payload.bin_ids,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(shipment)))
}

// GET /api/shipments
#[utoipa::path(
    get,
    path = "/api/shipments",
    tag = "Logistics",
    responses(
        (status = 200, description = "Embarques, mais recentes primeiro", body = Vec<Shipment>)
    ),
    params(
        ShipmentListQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_shipments(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ShipmentListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shipments = app_state
        .logistics_service
        .list_shipments(tenant.0, query.status)
        .await?;
    Ok(Json(shipments))
}

// GET /api/shipments/{id}
#[utoipa::path(
    get,
    path = "/api/shipments/{id}",
    tag = "Logistics",
    responses(
        (status = 200, description = "Embarque", body = Shipment),
        (status = 404, description = "Embarque não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Embarque"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_shipment(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shipment = app_state.logistics_service.get_shipment(tenant.0, id).await?;
    Ok(Json(shipment))
}

// PATCH /api/shipments/{id}
#[utoipa::path(
    patch,
    path = "/api/shipments/{id}",
    tag = "Logistics",
    request_body = UpdateShipmentStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Shipment),
        (status = 404, description = "Embarque não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Embarque"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_shipment_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateShipmentStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let shipment = app_state
        .logistics_service
        .update_shipment_status(tenant.0, id, payload.status)
        .await?;
    Ok(Json(shipment))
}

// =============================================================================
//  2. RECLAMAÇÕES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimPayload {
    pub shipment_id: Uuid,

    // Sem data = agora
    pub claim_date: Option<DateTime<Utc>>,

    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    #[schema(example = "Decay")]
    pub reason: String,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "1250.00")]
    pub amount_usd: Decimal,

    pub evidence_url: Option<String>,
    pub internal_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimStatusPayload {
    pub status: ClaimStatus,
}

// POST /api/claims
#[utoipa::path(
    post,
    path = "/api/claims",
    tag = "Logistics",
    request_body = CreateClaimPayload,
    responses(
        (status = 201, description = "Reclamação aberta; embarque em disputa", body = Claim),
        (status = 400, description = "Embarque de outra empresa")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_claim(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateClaimPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let claim = app_state
        .logistics_service
        .create_claim(
            tenant.0,
            NewClaim {
                shipment_id: payload.shipment_id,
                claim_date: payload.claim_date.unwrap_or_else(Utc::now),
                reason: payload.reason,
                amount_usd: payload.amount_usd,
                evidence_url: payload.evidence_url,
                internal_notes: payload.internal_notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(claim)))
}

// GET /api/claims
#[utoipa::path(
    get,
    path = "/api/claims",
    tag = "Logistics",
    responses(
        (status = 200, description = "Reclamações, mais recentes primeiro", body = Vec<Claim>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_claims(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let claims = app_state.logistics_service.list_claims(tenant.0).await?;
    Ok(Json(claims))
}

// PATCH /api/claims/{id}
#[utoipa::path(
    patch,
    path = "/api/claims/{id}",
    tag = "Logistics",
    request_body = UpdateClaimStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Claim),
        (status = 404, description = "Reclamação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Reclamação"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_claim_status(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateClaimStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let claim = app_state
        .logistics_service
        .update_claim_status(tenant.0, id, payload.status)
        .await?;
    Ok(Json(claim))
}
