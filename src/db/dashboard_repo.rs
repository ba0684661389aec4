// src/db/dashboard_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::dashboard::ChartPoint};

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Soma do peso das caixas atualizadas no dia.
    async fn harvest_weight_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<Decimal, AppError>;
    /// Quantos lotes foram colhidos no dia.
    async fn batches_harvested_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<i64, AppError>;
    /// Peso diário desde `since` (inclusive), em ordem crescente de data.
    async fn daily_weight_since(&self, tenant_id: Uuid, since: NaiveDate) -> Result<Vec<ChartPoint>, AppError>;
}

#[derive(Clone)]
pub struct PostgresDashboardRepository {
    pool: PgPool,
}

impl PostgresDashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DashboardRepository for PostgresDashboardRepository {
    async fn harvest_weight_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<Decimal, AppError> {
        // COALESCE garante 0 em vez de NULL quando não há caixas
        let total: Decimal = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(weight_kg), 0)
            FROM bins
            WHERE tenant_id = $1 AND updated_at::date = $2
            "#,
        )
        .bind(tenant_id)
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn batches_harvested_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM harvest_batches
            WHERE tenant_id = $1 AND harvest_date::date = $2
            "#,
        )
        .bind(tenant_id)
        .bind(day)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn daily_weight_since(&self, tenant_id: Uuid, since: NaiveDate) -> Result<Vec<ChartPoint>, AppError> {
        let points = sqlx::query_as::<_, ChartPoint>(
            r#"
            SELECT
                TO_CHAR(updated_at, 'YYYY-MM-DD') AS date,
                COALESCE(SUM(weight_kg), 0)       AS value
            FROM bins
            WHERE tenant_id = $1 AND updated_at::date >= $2
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(tenant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(points)
    }
}
