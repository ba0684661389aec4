// src/db.rs

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::Config;

pub mod compliance_repo;
pub use compliance_repo::{ComplianceRepository, PostgresComplianceRepository};
pub mod dashboard_repo;
pub use dashboard_repo::{DashboardRepository, PostgresDashboardRepository};
pub mod farm_repo;
pub use farm_repo::{FarmRepository, PostgresFarmRepository};
pub mod finance_repo;
pub use finance_repo::{FinanceRepository, PostgresFinanceRepository};
pub mod logistics_repo;
pub use logistics_repo::{LogisticsRepository, PostgresLogisticsRepository};
pub mod tenancy_repo;
pub use tenancy_repo::{PostgresTenantRepository, TenantRepository};
pub mod traceability_repo;
pub use traceability_repo::{PostgresTraceabilityRepository, TraceabilityRepository};

pub mod memory;
pub use memory::InMemoryStore;

/// Abre o pool de conexões com o Postgres.
pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .context("Falha ao conectar no banco de dados")?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(pool)
}

/// Todos os repositórios, prontos para injetar nos serviços.
#[derive(Clone)]
pub struct Repositories {
    pub tenants: Arc<dyn TenantRepository>,
    pub farms: Arc<dyn FarmRepository>,
    pub compliance: Arc<dyn ComplianceRepository>,
    pub traceability: Arc<dyn TraceabilityRepository>,
    pub dashboard: Arc<dyn DashboardRepository>,
    pub logistics: Arc<dyn LogisticsRepository>,
    pub finance: Arc<dyn FinanceRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            tenants: Arc::new(PostgresTenantRepository::new(pool.clone())),
            farms: Arc::new(PostgresFarmRepository::new(pool.clone())),
            compliance: Arc::new(PostgresComplianceRepository::new(pool.clone())),
            traceability: Arc::new(PostgresTraceabilityRepository::new(pool.clone())),
            dashboard: Arc::new(PostgresDashboardRepository::new(pool.clone())),
            logistics: Arc::new(PostgresLogisticsRepository::new(pool.clone())),
            finance: Arc::new(PostgresFinanceRepository::new(pool)),
        }
    }

    /// Todos os repositórios compartilham o mesmo store em memória.
    pub fn in_memory(store: InMemoryStore) -> Self {
        Self {
            tenants: Arc::new(store.clone()),
            farms: Arc::new(store.clone()),
            compliance: Arc::new(store.clone()),
            traceability: Arc::new(store.clone()),
            dashboard: Arc::new(store.clone()),
            logistics: Arc::new(store.clone()),
            finance: Arc::new(store),
        }
    }
}
