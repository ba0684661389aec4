// src/config.rs

use std::env;

use anyhow::Context;

use crate::{
    db::Repositories,
    services::{
        auth::TokenVerifier, compliance_service::ComplianceService,
        dashboard_service::DashboardService, finance_service::FinanceService,
        land_service::LandService, logistics_service::LogisticsService,
        notification_service::NotificationDispatcher, team_service::TeamService,
        tenancy_service::TenantService, traceability_service::TraceabilityService,
    },
};

const DEFAULT_MAIL_FROM: &str = "AgriTrust <notificaciones@kinetis.org>";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Configuração lida das variáveis de ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Chave pública PEM do provedor de identidade (RS256).
    pub clerk_public_key: String,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
    /// Destinatários dos alertas de segurança. Vazio = só log.
    pub alert_recipients: Vec<String>,
    pub frontend_url: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        // Em .env a chave costuma vir numa linha só, com "\n" literais
        let clerk_public_key = env::var("CLERK_PEM_PUBLIC_KEY")
            .context("CLERK_PEM_PUBLIC_KEY deve ser definida")?
            .replace("\\n", "\n");

        let database_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(v) => v
                .parse()
                .context("DATABASE_MAX_CONNECTIONS deve ser um número inteiro")?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            clerk_public_key,
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| DEFAULT_MAIL_FROM.to_string()),
            alert_recipients: parse_recipients(&env::var("ALERT_RECIPIENTS").unwrap_or_default()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            database_max_connections,
        })
    }
}

fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[derive(Clone)]
pub struct AppState {
    pub token_verifier: TokenVerifier,
    pub tenant_service: TenantService,
    pub team_service: TeamService,
    pub land_service: LandService,
    pub compliance_service: ComplianceService,
    pub traceability_service: TraceabilityService,
    pub logistics_service: LogisticsService,
    pub finance_service: FinanceService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    /// Monta o gráfico de dependências a partir dos repositórios e do despachante.
    pub fn new(
        config: &Config,
        repos: Repositories,
        dispatcher: NotificationDispatcher,
    ) -> anyhow::Result<Self> {
        let token_verifier = TokenVerifier::from_pem(config.clerk_public_key.as_bytes())
            .context("CLERK_PEM_PUBLIC_KEY não é uma chave RSA válida")?;

        Ok(Self {
            token_verifier,
            tenant_service: TenantService::new(repos.tenants.clone()),
            team_service: TeamService::new(
                repos.tenants.clone(),
                dispatcher.clone(),
                config.frontend_url.clone(),
            ),
            land_service: LandService::new(repos.farms.clone()),
            compliance_service: ComplianceService::new(
                repos.compliance.clone(),
                repos.farms.clone(),
                dispatcher,
            ),
            traceability_service: TraceabilityService::new(
                repos.traceability.clone(),
                repos.farms.clone(),
            ),
            logistics_service: LogisticsService::new(repos.logistics.clone()),
            finance_service: FinanceService::new(repos.finance.clone(), repos.farms.clone()),
            dashboard_service: DashboardService::new(repos.dashboard),
        })
    }
}
