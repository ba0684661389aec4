// src/db/logistics_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::logistics::{Claim, ClaimStatus, NewClaim, NewShipment, Shipment, ShipmentStatus},
};

/// Embarques e reclamações de clientes.
#[async_trait]
pub trait LogisticsRepository: Send + Sync {
    /// Tudo ou nada: cria o embarque e vincula todas as caixas, ou não escreve nada.
    /// Caixa inexistente, de outra empresa ou já embarcada -> `InvalidReference`.
    /// `bin_ids` já chega sem duplicatas.
    async fn create_shipment(
        &self,
        tenant_id: Uuid,
        new: NewShipment,
        bin_ids: &[Uuid],
    ) -> Result<Shipment, AppError>;
    async fn list_shipments(
        &self,
        tenant_id: Uuid,
        status: Option<ShipmentStatus>,
    ) -> Result<Vec<Shipment>, AppError>;
    async fn find_shipment(&self, tenant_id: Uuid, shipment_id: Uuid) -> Result<Option<Shipment>, AppError>;
    async fn update_shipment_status(
        &self,
        tenant_id: Uuid,
        shipment_id: Uuid,
        status: ShipmentStatus,
    ) -> Result<Option<Shipment>, AppError>;

    /// Marca o embarque como disputado e abre a reclamação, na mesma transação.
    async fn create_claim(&self, tenant_id: Uuid, new: NewClaim) -> Result<Claim, AppError>;
    async fn list_claims(&self, tenant_id: Uuid) -> Result<Vec<Claim>, AppError>;
    async fn update_claim_status(
        &self,
        tenant_id: Uuid,
        claim_id: Uuid,
        status: ClaimStatus,
    ) -> Result<Option<Claim>, AppError>;
}

#[derive(Clone)]
pub struct PostgresLogisticsRepository {
    pool: PgPool,
}

impl PostgresLogisticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LogisticsRepository for PostgresLogisticsRepository {
    async fn create_shipment(
        &self,
        tenant_id: Uuid,
        new: NewShipment,
        bin_ids: &[Uuid],
    ) -> Result<Shipment, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cabeçalho do embarque
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            INSERT INTO shipments (tenant_id, customer_name, destination, truck_plate, departure_time, status)
            VALUES ($1, $2, $3, $4, $5, 'shipped')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&new.customer_name)
        .bind(&new.destination)
        .bind(&new.truck_plate)
        .bind(new.departure_time)
        .fetch_one(&mut *tx)
        .await?;

        // 3. Vincula as caixas. Só entram as da empresa que ainda não foram embarcadas.
        let attached = sqlx::query(
            r#"
            UPDATE bins
            SET shipment_id = $1, status = 'shipped', updated_at = NOW()
            WHERE id = ANY($2) AND tenant_id = $3 AND shipment_id IS NULL
            "#,
        )
        .bind(shipment.id)
        .bind(bin_ids)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if attached.rows_affected() != bin_ids.len() as u64 {
            // Drop do tx = rollback: nem embarque nem caixas alteradas
            tracing::warn!(
                "Embarque abortado: {} de {} caixas válidas",
                attached.rows_affected(),
                bin_ids.len()
            );
            return Err(AppError::InvalidReference(
                "Uma ou mais caixas não existem, são de outra empresa ou já foram embarcadas.".into(),
            ));
        }

        // 4. Commit
        tx.commit().await?;

        Ok(shipment)
    }

    async fn list_shipments(
        &self,
        tenant_id: Uuid,
        status: Option<ShipmentStatus>,
    ) -> Result<Vec<Shipment>, AppError> {
        let shipments = sqlx::query_as::<_, Shipment>(
            r#"
            SELECT * FROM shipments
            WHERE tenant_id = $1
              AND ($2::shipment_status IS NULL OR status = $2)
            ORDER BY departure_time DESC
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(shipments)
    }

    async fn find_shipment(&self, tenant_id: Uuid, shipment_id: Uuid) -> Result<Option<Shipment>, AppError> {
        let shipment = sqlx::query_as::<_, Shipment>(
            "SELECT * FROM shipments WHERE id = $1 AND tenant_id = $2",
        )
        .bind(shipment_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shipment)
    }

    async fn update_shipment_status(
        &self,
        tenant_id: Uuid,
        shipment_id: Uuid,
        status: ShipmentStatus,
    ) -> Result<Option<Shipment>, AppError> {
        let shipment = sqlx::query_as::<_, Shipment>(
            r#"
            UPDATE shipments SET status = $3
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(shipment_id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shipment)
    }

    async fn create_claim(&self, tenant_id: Uuid, new: NewClaim) -> Result<Claim, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. O embarque entra em disputa (e confirmamos que é da empresa)
        let disputed = sqlx::query(
            "UPDATE shipments SET status = 'disputed' WHERE id = $1 AND tenant_id = $2",
        )
        .bind(new.shipment_id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

        if disputed.rows_affected() == 0 {
            return Err(AppError::InvalidReference("Embarque não encontrado.".into()));
        }

        // 2. Abre a reclamação
        let claim = sqlx::query_as::<_, Claim>(
            r#"
            INSERT INTO claims
                (tenant_id, shipment_id, claim_date, reason, amount_usd, evidence_url, internal_notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'open')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.shipment_id)
        .bind(new.claim_date)
        .bind(&new.reason)
        .bind(new.amount_usd)
        .bind(&new.evidence_url)
        .bind(&new.internal_notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(claim)
    }

    async fn list_claims(&self, tenant_id: Uuid) -> Result<Vec<Claim>, AppError> {
        let claims = sqlx::query_as::<_, Claim>(
            "SELECT * FROM claims WHERE tenant_id = $1 ORDER BY created_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(claims)
    }

    async fn update_claim_status(
        &self,
        tenant_id: Uuid,
        claim_id: Uuid,
        status: ClaimStatus,
    ) -> Result<Option<Claim>, AppError> {
        let claim = sqlx::query_as::<_, Claim>(
            r#"
            UPDATE claims SET status = $3
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(claim_id)
        .bind(tenant_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?;

        Ok(claim)
    }
}
