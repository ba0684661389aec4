// src/db/traceability_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{map_foreign_key_violation, map_unique_violation},
        error::AppError,
    },
    models::traceability::{
        Bin, BinFilter, BinScan, Crop, HarvestBatch, NewCrop, NewHarvestBatch, PassportRecord,
    },
};

/// Cultivos, lotes de colheita e caixas (bins).
#[async_trait]
pub trait TraceabilityRepository: Send + Sync {
    async fn list_crops(&self, tenant_id: Uuid) -> Result<Vec<Crop>, AppError>;
    async fn create_crop(&self, tenant_id: Uuid, new: NewCrop) -> Result<Crop, AppError>;
    async fn find_crop(&self, tenant_id: Uuid, crop_id: Uuid) -> Result<Option<Crop>, AppError>;

    async fn list_batches(&self, tenant_id: Uuid) -> Result<Vec<HarvestBatch>, AppError>;
    /// Código duplicado na empresa -> `UniqueConstraintViolation`.
    async fn create_batch(&self, tenant_id: Uuid, new: NewHarvestBatch) -> Result<HarvestBatch, AppError>;
    async fn find_batch(&self, tenant_id: Uuid, batch_id: Uuid) -> Result<Option<HarvestBatch>, AppError>;

    /// Cria a caixa (full_in_field) ou atualiza a existente com o mesmo QR.
    async fn upsert_bin(&self, tenant_id: Uuid, scan: BinScan) -> Result<Bin, AppError>;
    async fn list_bins(&self, tenant_id: Uuid, filter: BinFilter, limit: i64) -> Result<Vec<Bin>, AppError>;

    /// Consulta pública: não é filtrada por empresa.
    async fn passport_record(&self, qr_code: &str) -> Result<Option<PassportRecord>, AppError>;
}

#[derive(Clone)]
pub struct PostgresTraceabilityRepository {
    pool: PgPool,
}

impl PostgresTraceabilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TraceabilityRepository for PostgresTraceabilityRepository {
    async fn list_crops(&self, tenant_id: Uuid) -> Result<Vec<Crop>, AppError> {
        let crops = sqlx::query_as::<_, Crop>(
            "SELECT * FROM crops WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(crops)
    }

    async fn create_crop(&self, tenant_id: Uuid, new: NewCrop) -> Result<Crop, AppError> {
        sqlx::query_as::<_, Crop>(
            r#"
            INSERT INTO crops (tenant_id, farm_id, name, variety, planting_date, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.farm_id)
        .bind(&new.name)
        .bind(&new.variety)
        .bind(new.planting_date)
        .bind(new.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, "Rancho não encontrado."))
    }

    async fn find_crop(&self, tenant_id: Uuid, crop_id: Uuid) -> Result<Option<Crop>, AppError> {
        let crop = sqlx::query_as::<_, Crop>("SELECT * FROM crops WHERE id = $1 AND tenant_id = $2")
            .bind(crop_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(crop)
    }

    async fn list_batches(&self, tenant_id: Uuid) -> Result<Vec<HarvestBatch>, AppError> {
        let batches = sqlx::query_as::<_, HarvestBatch>(
            "SELECT * FROM harvest_batches WHERE tenant_id = $1 ORDER BY harvest_date DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    async fn create_batch(&self, tenant_id: Uuid, new: NewHarvestBatch) -> Result<HarvestBatch, AppError> {
        let batch_code = new.batch_code.clone();

        sqlx::query_as::<_, HarvestBatch>(
            r#"
            INSERT INTO harvest_batches (tenant_id, farm_id, crop_id, batch_code, harvest_date, total_bins)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.farm_id)
        .bind(new.crop_id)
        .bind(&new.batch_code)
        .bind(new.harvest_date)
        .bind(new.total_bins)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("O lote '{}' já existe.", batch_code)))
    }

    async fn find_batch(&self, tenant_id: Uuid, batch_id: Uuid) -> Result<Option<HarvestBatch>, AppError> {
        let batch = sqlx::query_as::<_, HarvestBatch>(
            "SELECT * FROM harvest_batches WHERE id = $1 AND tenant_id = $2",
        )
        .bind(batch_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    async fn upsert_bin(&self, tenant_id: Uuid, scan: BinScan) -> Result<Bin, AppError> {
        // Um único statement sobre o índice único (tenant_id, qr_code): idempotente em retry.
        let bin = sqlx::query_as::<_, Bin>(
            r#"
            INSERT INTO bins (tenant_id, qr_code, harvest_batch_id, weight_kg, status, updated_at)
            VALUES ($1, $2, $3, $4, 'full_in_field', $5)
            ON CONFLICT (tenant_id, qr_code) DO UPDATE
            SET harvest_batch_id = EXCLUDED.harvest_batch_id,
                weight_kg        = EXCLUDED.weight_kg,
                status           = EXCLUDED.status,
                updated_at       = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&scan.qr_code)
        .bind(scan.harvest_batch_id)
        .bind(scan.weight_kg)
        .bind(scan.scanned_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(bin)
    }

    async fn list_bins(&self, tenant_id: Uuid, filter: BinFilter, limit: i64) -> Result<Vec<Bin>, AppError> {
        let bins = sqlx::query_as::<_, Bin>(
            r#"
            SELECT * FROM bins
            WHERE tenant_id = $1
              AND ($2::bin_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR harvest_batch_id = $3)
            ORDER BY updated_at DESC
            LIMIT $4
            "#,
        )
        .bind(tenant_id)
        .bind(filter.status)
        .bind(filter.harvest_batch_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(bins)
    }

    async fn passport_record(&self, qr_code: &str) -> Result<Option<PassportRecord>, AppError> {
        // Caixa -> Lote -> Cultivo -> Rancho -> Empresa (+ embarque, se houver)
        let record = sqlx::query_as::<_, PassportRecord>(
            r#"
            SELECT
                b.qr_code,
                b.updated_at     AS bin_updated_at,
                c.name           AS product_name,
                c.variety        AS variety,
                f.name           AS origin,
                f.location       AS location,
                t.name           AS producer,
                hb.harvest_date  AS harvest_date,
                s.departure_time AS departure_time
            FROM bins b
            LEFT JOIN harvest_batches hb ON hb.id = b.harvest_batch_id
            LEFT JOIN crops c            ON c.id = hb.crop_id
            LEFT JOIN farms f            ON f.id = hb.farm_id
            LEFT JOIN tenants t          ON t.id = b.tenant_id
            LEFT JOIN shipments s        ON s.id = b.shipment_id
            WHERE b.qr_code = $1
            ORDER BY b.updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
