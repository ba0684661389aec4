// src/models/traceability.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "crop_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CropStatus {
    #[default]
    Growing,
    Harvesting,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "bin_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BinStatus {
    Empty,
    FullInField,
    ReceivedInPacking,
    Shipped,
}

// ---
// 1. Crop (O que está plantado no rancho)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub farm_id: Uuid,
    #[schema(example = "Tomate Saladette")]
    pub name: String,
    pub variety: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub planting_date: Option<NaiveDate>,
    pub status: CropStatus,
}

#[derive(Debug, Clone)]
pub struct NewCrop {
    pub farm_id: Uuid,
    pub name: String,
    pub variety: Option<String>,
    pub planting_date: Option<NaiveDate>,
    pub status: CropStatus,
}

// ---
// 2. HarvestBatch (Um dia de corte num rancho)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HarvestBatch {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    #[schema(example = "LOT-20251025-A")]
    pub batch_code: String,
    pub harvest_date: DateTime<Utc>,
    pub total_bins: i32,
}

#[derive(Debug, Clone)]
pub struct NewHarvestBatch {
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    pub batch_code: String,
    pub harvest_date: DateTime<Utc>,
    pub total_bins: i32,
}

// ---
// 3. Bin (A caixa física com QR)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[schema(example = "BIN-000123")]
    pub qr_code: String,
    pub harvest_batch_id: Option<Uuid>,
    pub weight_kg: Decimal,
    pub status: BinStatus,
    pub updated_at: DateTime<Utc>,
    pub shipment_id: Option<Uuid>,
}

// Leitura de QR feita no campo
#[derive(Debug, Clone)]
pub struct BinScan {
    pub qr_code: String,
    pub harvest_batch_id: Uuid,
    pub weight_kg: Decimal,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct BinFilter {
    pub status: Option<BinStatus>,
    pub harvest_batch_id: Option<Uuid>,
}

// ---
// 4. Passaporte Digital (visão pública)
// ---

// Linha "achatada" com tudo o que o passaporte precisa (caixa -> lote -> cultivo -> rancho -> empresa)
#[derive(Debug, Clone, FromRow)]
pub struct PassportRecord {
    pub qr_code: String,
    pub bin_updated_at: DateTime<Utc>,
    pub product_name: Option<String>,
    pub variety: Option<String>,
    pub origin: Option<String>,
    pub location: Option<String>,
    pub producer: Option<String>,
    pub harvest_date: Option<DateTime<Utc>>,
    pub departure_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JourneyStage {
    #[schema(example = "Colheita")]
    pub stage: String,
    pub date: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Passport {
    pub qr_code: String,
    pub product_name: Option<String>,
    pub variety: Option<String>,
    pub origin: Option<String>,
    pub producer: Option<String>,
    pub harvest_date: Option<DateTime<Utc>>,
    pub freshness_hours: Option<i64>,
    pub location: Option<String>,
    pub certifications: Vec<String>,
    pub journey: Vec<JourneyStage>,
}
