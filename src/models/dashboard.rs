// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

// Os cards do topo + gráfico semanal
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_harvest_today: Decimal, // Kg colhidos hoje
    pub active_batches: i64,          // Lotes cortados hoje
    pub weekly_trend: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    #[schema(example = "2025-10-25")]
    pub date: String, // YYYY-MM-DD
    pub value: Decimal,
}
