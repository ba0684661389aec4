// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::tenancy::{NewTenant, SubscriptionPlan, Tenant, TenantUpdate},
};

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    #[schema(example = "Agrícola San Miguel")]
    pub name: String,

    #[schema(example = "ASM010101AB1")]
    pub tax_id: Option<String>,

    // Sem plano informado = basic
    #[serde(default)]
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantPayload {
    #[validate(length(min = 1, message = "O nome da empresa é obrigatório."))]
    pub name: String,
    pub tax_id: Option<String>,
}

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenants",
    responses(
        (status = 200, description = "Empresas do usuário (dono ou membro)", body = Vec<Tenant>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_tenants(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let tenants = app_state.tenant_service.list_for_identity(&user.0.subject).await?;
    Ok(Json(tenants))
}

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenants",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Empresa criada; o chamador vira dono", body = Tenant),
        (status = 409, description = "Tax ID já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(payload), _): JsonBody<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let tenant = app_state
        .tenant_service
        .create_tenant_with_owner(
            &user.0.subject,
            NewTenant {
                name: payload.name,
                tax_id: payload.tax_id,
                plan: payload.plan,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

// PUT /api/tenants
#[utoipa::path(
    put,
    path = "/api/tenants",
    tag = "Tenants",
    request_body = UpdateTenantPayload,
    responses(
        (status = 200, description = "Empresa atualizada", body = Tenant)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_tenant(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<UpdateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let updated = app_state
        .tenant_service
        .update_tenant(
            tenant.0,
            TenantUpdate {
                name: payload.name,
                tax_id: payload.tax_id,
            },
        )
        .await?;

    Ok(Json(updated))
}
