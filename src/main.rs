//src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use agritrust_backend::{
    common::mailer,
    config::{AppState, Config},
    create_app,
    db::{self, Repositories},
    services::notification_service::NotificationDispatcher,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG manda; sem ele, info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;

    let pool = db::connect(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados.")?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Fila de e-mails: um único worker em segundo plano
    let mailer = mailer::from_config(&config);
    let dispatcher = NotificationDispatcher::spawn(mailer, config.alert_recipients.clone());

    let app_state = AppState::new(&config, Repositories::postgres(pool), dispatcher)?;
    let app = create_app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", config.bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
