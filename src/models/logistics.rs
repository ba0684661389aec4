// src/models/logistics.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "shipment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Shipped,
    Delivered,
    Disputed,
    Rejected,
    PartiallyRejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "claim_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Open,
    Disputed,
    Accepted,
}

// O caminhão que sai para o cliente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "Whole Foods Market")]
    pub customer_name: String,
    #[schema(example = "McAllen, TX")]
    pub destination: Option<String>,
    pub departure_time: DateTime<Utc>,
    pub truck_plate: Option<String>,
    pub status: ShipmentStatus,
}

#[derive(Debug, Clone)]
pub struct NewShipment {
    pub customer_name: String,
    pub destination: Option<String>,
    pub truck_plate: Option<String>,
    pub departure_time: DateTime<Utc>,
}

// Reclamação do cliente contra um embarque
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub shipment_id: Uuid,
    pub claim_date: DateTime<Utc>,
    #[schema(example = "Decay")]
    pub reason: String,
    #[schema(example = "1250.00")]
    pub amount_usd: Decimal,
    pub evidence_url: Option<String>,
    pub internal_notes: Option<String>,
    pub status: ClaimStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClaim {
    pub shipment_id: Uuid,
    pub claim_date: DateTime<Utc>,
    pub reason: String,
    pub amount_usd: Decimal,
    pub evidence_url: Option<String>,
    pub internal_notes: Option<String>,
}
