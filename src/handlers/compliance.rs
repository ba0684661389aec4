// src/handlers/compliance.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::compliance::{ApplicationRecord, Chemical, NewApplication, NewChemical},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChemicalPayload {
    #[validate(length(min = 1, message = "O nome do químico é obrigatório."))]
    #[schema(example = "Paraquat")]
    pub name: String,

    pub active_ingredient: Option<String>,

    #[serde(default)]
    pub is_banned: bool,

    #[schema(example = "EU,USA")]
    pub banned_markets: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicationPayload {
    pub farm_id: Uuid,
    pub chemical_id: Uuid,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "2.5")]
    pub dosage: Decimal,

    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    #[schema(example = "L")]
    pub unit: String,

    pub notes: Option<String>,

    // Apps móveis mandam a empresa no corpo
    pub tenant_id: Option<Uuid>,
}

// GET /api/chemicals
#[utoipa::path(
    get,
    path = "/api/chemicals",
    tag = "Compliance",
    responses(
        (status = 200, description = "Químicos globais e da empresa", body = Vec<Chemical>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_chemicals(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let chemicals = app_state.compliance_service.list_chemicals(tenant.0).await?;
    Ok(Json(chemicals))
}

// POST /api/chemicals
#[utoipa::path(
    post,
    path = "/api/chemicals",
    tag = "Compliance",
    request_body = CreateChemicalPayload,
    responses(
        (status = 201, description = "Químico cadastrado para a empresa", body = Chemical)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_chemical(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateChemicalPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let chemical = app_state
        .compliance_service
        .create_chemical(
            tenant.0,
            NewChemical {
                name: payload.name,
                active_ingredient: payload.active_ingredient,
                is_banned: payload.is_banned,
                banned_markets: payload.banned_markets,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(chemical)))
}

// POST /api/applications
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "Compliance",
    request_body = CreateApplicationPayload,
    responses(
        (status = 201, description = "Aplicação aprovada e registrada", body = ApplicationRecord),
        (status = 400, description = "Químico ou rancho inexistente"),
        (status = 403, description = "Produto proibido: aplicação bloqueada e alerta enviado")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_application(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateApplicationPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tenant_id = tenant
        .or_body_tenant(&app_state, &user.0, payload.tenant_id)
        .await?;

    let record = app_state
        .compliance_service
        .record_application(
            tenant_id,
            &user.0,
            NewApplication {
                farm_id: payload.farm_id,
                chemical_id: payload.chemical_id,
                dosage: payload.dosage,
                unit: payload.unit,
                notes: payload.notes,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

// GET /api/applications
#[utoipa::path(
    get,
    path = "/api/applications",
    tag = "Compliance",
    responses(
        (status = 200, description = "Histórico de aplicações", body = Vec<ApplicationRecord>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_applications(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let records = app_state.compliance_service.list_applications(tenant.0).await?;
    Ok(Json(records))
}
