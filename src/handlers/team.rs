// src/handlers/team.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        auth::UserRole,
        tenancy::{Invitation, TeamOverview},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitePayload {
    #[validate(email(message = "E-mail inválido."))]
    #[schema(example = "capataz@rancho.mx")]
    pub email: String,

    // Padrão: operator
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    #[schema(example = "¡Bienvenido al equipo!")]
    pub message: String,
    pub tenant_id: Uuid,
    pub role: UserRole,
}

// POST /api/team/invite
#[utoipa::path(
    post,
    path = "/api/team/invite",
    tag = "Team",
    request_body = InvitePayload,
    responses(
        (status = 201, description = "Convite criado e e-mail enfileirado", body = Invitation)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn invite_member(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<InvitePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invitation = app_state
        .team_service
        .invite(tenant.0, payload.email.trim(), payload.role)
        .await?;

    Ok((StatusCode::CREATED, Json(invitation)))
}

// GET /api/team
#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    responses(
        (status = 200, description = "Membros e convites pendentes", body = TeamOverview)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_team(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.team_service.overview(tenant.0).await?;
    Ok(Json(overview))
}

// POST /api/team/join
#[utoipa::path(
    post,
    path = "/api/team/join",
    tag = "Team",
    request_body = JoinPayload,
    responses(
        (status = 200, description = "Convite aceito", body = JoinResponse),
        (status = 404, description = "Convite inválido ou já utilizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn join_team(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    WithRejection(Json(payload), _): JsonBody<JoinPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let member = app_state
        .team_service
        .join(payload.token.trim(), &user.0.subject)
        .await?;

    Ok(Json(JoinResponse {
        message: "¡Bienvenido al equipo!".into(),
        tenant_id: member.tenant_id,
        role: member.role,
    }))
}
