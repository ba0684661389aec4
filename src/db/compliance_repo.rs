// src/db/compliance_repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_foreign_key_violation, error::AppError},
    models::compliance::{ApplicationRecord, ApplicationStatus, Chemical, NewApplication, NewChemical},
};

#[async_trait]
pub trait ComplianceRepository: Send + Sync {
    /// Catálogo global + químicos próprios da empresa.
    async fn list_chemicals(&self, tenant_id: Uuid) -> Result<Vec<Chemical>, AppError>;
    async fn create_chemical(&self, tenant_id: Uuid, new: NewChemical) -> Result<Chemical, AppError>;
    /// Busca um químico visível para a empresa (global ou próprio).
    async fn find_chemical(&self, tenant_id: Uuid, chemical_id: Uuid) -> Result<Option<Chemical>, AppError>;

    async fn create_application(
        &self,
        tenant_id: Uuid,
        new: NewApplication,
        status: ApplicationStatus,
        applied_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, AppError>;
    async fn list_applications(&self, tenant_id: Uuid) -> Result<Vec<ApplicationRecord>, AppError>;
}

#[derive(Clone)]
pub struct PostgresComplianceRepository {
    pool: PgPool,
}

impl PostgresComplianceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComplianceRepository for PostgresComplianceRepository {
    async fn list_chemicals(&self, tenant_id: Uuid) -> Result<Vec<Chemical>, AppError> {
        let chemicals = sqlx::query_as::<_, Chemical>(
            r#"
            SELECT * FROM chemicals
            WHERE tenant_id IS NULL OR tenant_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(chemicals)
    }

    async fn create_chemical(&self, tenant_id: Uuid, new: NewChemical) -> Result<Chemical, AppError> {
        let chemical = sqlx::query_as::<_, Chemical>(
            r#"
            INSERT INTO chemicals (tenant_id, name, active_ingredient, is_banned, banned_markets)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&new.name)
        .bind(&new.active_ingredient)
        .bind(new.is_banned)
        .bind(&new.banned_markets)
        .fetch_one(&self.pool)
        .await?;

        Ok(chemical)
    }

    async fn find_chemical(&self, tenant_id: Uuid, chemical_id: Uuid) -> Result<Option<Chemical>, AppError> {
        let chemical = sqlx::query_as::<_, Chemical>(
            r#"
            SELECT * FROM chemicals
            WHERE id = $1 AND (tenant_id IS NULL OR tenant_id = $2)
            "#,
        )
        .bind(chemical_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(chemical)
    }

    async fn create_application(
        &self,
        tenant_id: Uuid,
        new: NewApplication,
        status: ApplicationStatus,
        applied_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, AppError> {
        sqlx::query_as::<_, ApplicationRecord>(
            r#"
            INSERT INTO application_records
                (tenant_id, farm_id, chemical_id, dosage, unit, applied_at, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.farm_id)
        .bind(new.chemical_id)
        .bind(new.dosage)
        .bind(&new.unit)
        .bind(applied_at)
        .bind(status)
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, "Rancho ou químico inexistente."))
    }

    async fn list_applications(&self, tenant_id: Uuid) -> Result<Vec<ApplicationRecord>, AppError> {
        let records = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            SELECT * FROM application_records
            WHERE tenant_id = $1
            ORDER BY applied_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
