// src/services/traceability_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FarmRepository, TraceabilityRepository},
    models::traceability::{
        Bin, BinFilter, BinScan, Crop, HarvestBatch, JourneyStage, NewCrop, NewHarvestBatch,
        Passport, PassportRecord,
    },
};

/// Máximo de caixas devolvidas na listagem.
pub const BIN_LIST_LIMIT: i64 = 1000;

const CERTIFICATIONS: [&str; 2] = ["AgriTrust Certified Safety", "No Banned Chemicals"];

/// Dados para abrir um lote de colheita. Código ausente = `LOTE-<unix>`.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub crop_id: Uuid,
    pub batch_code: Option<String>,
    pub total_bins: i32,
}

#[derive(Clone)]
pub struct TraceabilityService {
    trace_repo: Arc<dyn TraceabilityRepository>,
    farm_repo: Arc<dyn FarmRepository>,
}

impl TraceabilityService {
    pub fn new(trace_repo: Arc<dyn TraceabilityRepository>, farm_repo: Arc<dyn FarmRepository>) -> Self {
        Self { trace_repo, farm_repo }
    }

    // --- Cultivos ---

    pub async fn list_crops(&self, tenant_id: Uuid) -> Result<Vec<Crop>, AppError> {
        self.trace_repo.list_crops(tenant_id).await
    }

    pub async fn create_crop(&self, tenant_id: Uuid, new: NewCrop) -> Result<Crop, AppError> {
        if self.farm_repo.find_farm(tenant_id, new.farm_id).await?.is_none() {
            return Err(AppError::InvalidReference("Rancho não encontrado.".into()));
        }
        self.trace_repo.create_crop(tenant_id, new).await
    }

    // --- Lotes ---

    pub async fn list_batches(&self, tenant_id: Uuid) -> Result<Vec<HarvestBatch>, AppError> {
        self.trace_repo.list_batches(tenant_id).await
    }

    /// O rancho vem do cultivo; a data de colheita é "agora".
    pub async fn create_batch(&self, tenant_id: Uuid, req: BatchRequest) -> Result<HarvestBatch, AppError> {
        let crop = self
            .trace_repo
            .find_crop(tenant_id, req.crop_id)
            .await?
            .ok_or_else(|| AppError::InvalidReference("Cultivo não encontrado.".into()))?;

        let now = Utc::now();
        let batch_code = req
            .batch_code
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| default_batch_code(now));

        self.trace_repo
            .create_batch(
                tenant_id,
                NewHarvestBatch {
                    farm_id: crop.farm_id,
                    crop_id: crop.id,
                    batch_code,
                    harvest_date: now,
                    total_bins: req.total_bins,
                },
            )
            .await
    }

    // --- Caixas ---

    /// Leitura de QR no campo. Repetir a mesma leitura é idempotente.
    pub async fn scan_bin(
        &self,
        tenant_id: Uuid,
        qr_code: &str,
        harvest_batch_id: Uuid,
        weight_kg: Decimal,
    ) -> Result<Bin, AppError> {
        let qr_code = qr_code.trim();
        if qr_code.is_empty() {
            return Err(AppError::BusinessRule("O código QR é obrigatório.".into()));
        }

        if weight_kg.is_sign_negative() {
            return Err(AppError::BusinessRule("O peso não pode ser negativo.".into()));
        }

        if self.trace_repo.find_batch(tenant_id, harvest_batch_id).await?.is_none() {
            return Err(AppError::InvalidReference("Lote de colheita não encontrado.".into()));
        }

        let bin = self
            .trace_repo
            .upsert_bin(
                tenant_id,
                BinScan {
                    qr_code: qr_code.to_string(),
                    harvest_batch_id,
                    weight_kg,
                    scanned_at: Utc::now(),
                },
            )
            .await?;

        tracing::info!(%tenant_id, qr_code, bin_id = %bin.id, "Caixa registrada");
        Ok(bin)
    }

    pub async fn list_bins(&self, tenant_id: Uuid, filter: BinFilter) -> Result<Vec<Bin>, AppError> {
        self.trace_repo.list_bins(tenant_id, filter, BIN_LIST_LIMIT).await
    }

    // --- Passaporte Digital ---

    /// Consulta pública pelo QR. Sem empresa: qualquer consumidor pode ver.
    pub async fn passport(&self, qr_code: &str) -> Result<Passport, AppError> {
        let record = self
            .trace_repo
            .passport_record(qr_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado. Verifique o código.".into()))?;

        Ok(build_passport(record, Utc::now()))
    }
}

fn default_batch_code(now: DateTime<Utc>) -> String {
    format!("LOTE-{}", now.timestamp())
}

/// Monta a "história" da caixa para o consumidor.
fn build_passport(record: PassportRecord, now: DateTime<Utc>) -> Passport {
    let mut journey = Vec::with_capacity(3);

    if let Some(harvest_date) = record.harvest_date {
        journey.push(JourneyStage {
            stage: "Cosecha".into(),
            date: harvest_date,
            description: "Recolección manual en campo".into(),
        });
    }

    journey.push(JourneyStage {
        stage: "Empaque".into(),
        date: record.bin_updated_at,
        description: "Inspección de calidad y enfriamiento".into(),
    });

    // Só aparece quando a caixa foi embarcada
    if let Some(departure) = record.departure_time {
        journey.push(JourneyStage {
            stage: "Envío".into(),
            date: departure,
            description: "En ruta al centro de distribución".into(),
        });
    }

    Passport {
        qr_code: record.qr_code,
        product_name: record.product_name,
        variety: record.variety,
        origin: record.origin,
        producer: record.producer,
        harvest_date: record.harvest_date,
        freshness_hours: record.harvest_date.map(|h| (now - h).num_hours()),
        location: record.location,
        certifications: CERTIFICATIONS.iter().map(|c| c.to_string()).collect(),
        journey,
    }
}
