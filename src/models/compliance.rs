// src/models/compliance.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

// Catálogo de agroquímicos. Sem tenant = químico global do sistema.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    #[schema(example = "Paraquat")]
    pub name: String,
    pub active_ingredient: Option<String>,
    pub is_banned: bool,
    // Texto livre, ex: "EU, USA, JAPAN"
    #[schema(example = "EU,USA")]
    pub banned_markets: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChemical {
    pub name: String,
    pub active_ingredient: Option<String>,
    pub is_banned: bool,
    pub banned_markets: Option<String>,
}

// Registro de aplicação fitossanitária
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub farm_id: Uuid,
    pub chemical_id: Uuid,
    #[schema(example = "2.5")]
    pub dosage: Decimal,
    #[schema(example = "L")]
    pub unit: String,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub farm_id: Uuid,
    pub chemical_id: Uuid,
    pub dosage: Decimal,
    pub unit: String,
    pub notes: Option<String>,
}
