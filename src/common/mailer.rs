// src/common/mailer.rs

use std::sync::Arc;

use anyhow::{Context, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Um e-mail HTML pronto para envio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()>;
}

/// Envio real pela API HTTP do Resend.
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        let payload = ResendRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
        };

        let res = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("Falha na requisição ao Resend")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            bail!("Resend respondeu {}: {}", status, body);
        }

        let sent: ResendResponse = res.json().await.context("Resposta inválida do Resend")?;
        tracing::info!("✅ E-mail enviado com sucesso. ID: {}", sent.id);
        Ok(())
    }
}

/// Modo local sem credenciais: só registra no log.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
        tracing::warn!(
            to = ?email.to,
            subject = %email.subject,
            "[MAILER SIMULADO] RESEND_API_KEY ausente, e-mail não enviado"
        );
        Ok(())
    }
}

/// Escolhe o mailer conforme a configuração.
pub fn from_config(config: &Config) -> Arc<dyn Mailer> {
    match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(key.clone(), config.mail_from.clone())),
        None => Arc::new(LogMailer),
    }
}
