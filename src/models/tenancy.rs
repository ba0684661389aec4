// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::auth::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_plan", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
}

// ---
// 1. Tenant (A "Agrícola", cliente do SaaS)
// ---
// Raiz do isolamento: todo o resto pertence a exatamente um tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Agrícola San Miguel")]
    pub name: String,
    #[schema(example = "ASM010101AB1")]
    pub tax_id: Option<String>,
    pub plan: SubscriptionPlan,
    pub active: bool,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub tax_id: Option<String>,
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Clone)]
pub struct TenantUpdate {
    pub name: String,
    pub tax_id: Option<String>,
}

// ---
// 2. TeamMember (Quem trabalha onde)
// ---
// Um único papel por (tenant, identidade).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: String,
    pub role: UserRole,
    pub joined_at: DateTime<Utc>,
}

// ---
// 3. Invitation (Convite pendente por e-mail)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: UserRole,
    // O token só viaja no e-mail
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub token: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
}

// Resposta do GET /team
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverview {
    pub members: Vec<TeamMember>,
    pub invites: Vec<Invitation>,
}
