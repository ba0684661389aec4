// src/models/farm.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ownership_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OwnershipType {
    #[default]
    Own,
    Rented,
    Litigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "lease_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Active,
    Expired,
    Negotiation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    Yearly,
    HarvestEnd,
}

// --- Structs ---

// Todo rancho pertence a uma empresa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Rancho El Sauz")]
    pub name: String,
    // Hectares
    #[schema(example = "120.5")]
    pub total_area: Decimal,
    pub location: Option<String>,
    pub ownership_type: OwnershipType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFarm {
    pub name: String,
    pub total_area: Decimal,
    pub location: Option<String>,
    pub ownership_type: OwnershipType,
}

// Contrato de arrendamento com o dono da terra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaseContract {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub farm_id: Uuid,
    #[schema(example = "Juan Pérez")]
    pub landowner_name: String,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2027-12-31")]
    pub end_date: NaiveDate,
    pub payment_amount: Decimal,
    pub payment_freq: PaymentFrequency,
    pub contract_doc_url: Option<String>,
    pub status: LeaseStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLeaseContract {
    pub farm_id: Uuid,
    pub landowner_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_amount: Decimal,
    pub payment_freq: PaymentFrequency,
    pub contract_doc_url: Option<String>,
}
