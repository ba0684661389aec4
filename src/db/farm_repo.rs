// src/db/farm_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::farm::{Farm, LeaseContract, LeaseStatus, NewFarm, NewLeaseContract},
};

/// Ranchos e contratos de arrendamento.
#[async_trait]
pub trait FarmRepository: Send + Sync {
    async fn list_farms(&self, tenant_id: Uuid) -> Result<Vec<Farm>, AppError>;
    async fn create_farm(&self, tenant_id: Uuid, new: NewFarm) -> Result<Farm, AppError>;
    async fn find_farm(&self, tenant_id: Uuid, farm_id: Uuid) -> Result<Option<Farm>, AppError>;

    /// Marca o rancho como arrendado e grava o contrato (ativo) na mesma transação.
    /// Rancho fora da empresa -> `InvalidReference`, nada é escrito.
    async fn create_lease(
        &self,
        tenant_id: Uuid,
        new: NewLeaseContract,
    ) -> Result<LeaseContract, AppError>;

    /// Ordenados pelo vencimento mais próximo.
    async fn list_leases(&self, tenant_id: Uuid) -> Result<Vec<LeaseContract>, AppError>;
    async fn find_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<Option<LeaseContract>, AppError>;
    async fn update_lease_status(
        &self,
        tenant_id: Uuid,
        lease_id: Uuid,
        status: LeaseStatus,
    ) -> Result<Option<LeaseContract>, AppError>;
    async fn delete_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<bool, AppError>;

    /// Contratos ativos cujo vencimento cai em [from, to].
    async fn expiring_leases(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaseContract>, AppError>;
}

#[derive(Clone)]
pub struct PostgresFarmRepository {
    pool: PgPool,
}

impl PostgresFarmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FarmRepository for PostgresFarmRepository {
    async fn list_farms(&self, tenant_id: Uuid) -> Result<Vec<Farm>, AppError> {
        let farms = sqlx::query_as::<_, Farm>(
            "SELECT * FROM farms WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(farms)
    }

    async fn create_farm(&self, tenant_id: Uuid, new: NewFarm) -> Result<Farm, AppError> {
        let farm = sqlx::query_as::<_, Farm>(
            r#"
            INSERT INTO farms (tenant_id, name, total_area, location, ownership_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&new.name)
        .bind(new.total_area)
        .bind(&new.location)
        .bind(new.ownership_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(farm)
    }

    async fn find_farm(&self, tenant_id: Uuid, farm_id: Uuid) -> Result<Option<Farm>, AppError> {
        let farm = sqlx::query_as::<_, Farm>(
            "SELECT * FROM farms WHERE id = $1 AND tenant_id = $2",
        )
        .bind(farm_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(farm)
    }

    async fn create_lease(
        &self,
        tenant_id: Uuid,
        new: NewLeaseContract,
    ) -> Result<LeaseContract, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. O rancho passa a ser arrendado (e confirmamos que é da empresa)
        let updated = sqlx::query(
            r#"
            UPDATE farms SET ownership_type = 'rented', updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(new.farm_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Drop do tx = rollback
            return Err(AppError::InvalidReference("Rancho não encontrado.".into()));
        }

        // 2. Grava o contrato
        let lease = sqlx::query_as::<_, LeaseContract>(
            r#"
            INSERT INTO lease_contracts
                (tenant_id, farm_id, landowner_name, start_date, end_date,
                 payment_amount, payment_freq, contract_doc_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.farm_id)
        .bind(&new.landowner_name)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.payment_amount)
        .bind(new.payment_freq)
        .bind(&new.contract_doc_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(lease)
    }

    async fn list_leases(&self, tenant_id: Uuid) -> Result<Vec<LeaseContract>, AppError> {
        let leases = sqlx::query_as::<_, LeaseContract>(
            "SELECT * FROM lease_contracts WHERE tenant_id = $1 ORDER BY end_date ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(leases)
    }

    async fn find_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<Option<LeaseContract>, AppError> {
        let lease = sqlx::query_as::<_, LeaseContract>(
            "SELECT * FROM lease_contracts WHERE id = $1 AND tenant_id = $2",
        )
        .bind(lease_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lease)
    }

    async fn update_lease_status(
        &self,
        tenant_id: Uuid,
        lease_id: Uuid,
        status: LeaseStatus,
    ) -> Result<Option<LeaseContract>, AppError> {
        let lease = sqlx::query_as::<_, LeaseContract>(
            r#"
            UPDATE lease_contracts SET status = $3, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(lease_id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lease)
    }

    async fn delete_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM lease_contracts WHERE id = $1 AND tenant_id = $2")
            .bind(lease_id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn expiring_leases(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaseContract>, AppError> {
        let leases = sqlx::query_as::<_, LeaseContract>(
            r#"
            SELECT * FROM lease_contracts
            WHERE tenant_id = $1
              AND status = 'active'
              AND end_date BETWEEN $2 AND $3
            ORDER BY end_date ASC
            "#,
        )
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(leases)
    }
}
