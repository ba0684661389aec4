// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{common::error::AppError, db::DashboardRepository, models::dashboard::DashboardStats};

/// Dias do gráfico de tendência (hoje incluído).
const TREND_DAYS: u64 = 7;

#[derive(Clone)]
pub struct DashboardService {
    repo: Arc<dyn DashboardRepository>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn DashboardRepository>) -> Self {
        Self { repo }
    }

    pub async fn stats(&self, tenant_id: Uuid, today: NaiveDate) -> Result<DashboardStats, AppError> {
        let since = today.checked_sub_days(Days::new(TREND_DAYS)).unwrap_or(NaiveDate::MIN);

        let (total_harvest_today, active_batches, weekly_trend) = tokio::try_join!(
            self.repo.harvest_weight_on(tenant_id, today),
            self.repo.batches_harvested_on(tenant_id, today),
            self.repo.daily_weight_since(tenant_id, since),
        )?;

        Ok(DashboardStats {
            total_harvest_today,
            active_batches,
            weekly_trend,
        })
    }
}
