// src/services/notification_service.rs

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::{
    common::mailer::{Mailer, OutgoingEmail},
    models::auth::UserRole,
};

/// Eventos que viram e-mail. Entrega "best effort": falha só vai para o log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Tentativa de aplicar um químico proibido.
    SecurityAlert {
        farm_name: String,
        chemical_name: String,
        actor: String,
    },
    TeamInvite {
        email: String,
        role: UserRole,
        link: String,
    },
}

impl Notification {
    /// Monta o e-mail. `alert_recipients` só é usado nos alertas.
    pub fn render(&self, alert_recipients: &[String]) -> OutgoingEmail {
        match self {
            Notification::SecurityAlert {
                farm_name,
                chemical_name,
                actor,
            } => OutgoingEmail {
                to: alert_recipients.to_vec(),
                subject: format!("🚨 ALERTA: Intento de uso de {}", chemical_name),
                html: security_alert_template(farm_name, chemical_name, actor),
            },
            Notification::TeamInvite { email, role, link } => OutgoingEmail {
                to: vec![email.clone()],
                subject: "Invitación a AgriTrust".to_string(),
                html: invite_template(link, *role),
            },
        }
    }
}

/// Lado que enfileira. Clonar é barato; enfileirar nunca bloqueia nem falha a requisição.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    pub fn new(tx: UnboundedSender<Notification>) -> Self {
        Self { tx }
    }

    /// Fila + receptor, para quem quiser consumir manualmente (testes).
    pub fn channel() -> (Self, UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Cria a fila e sobe o worker em background que entrega os e-mails.
    pub fn spawn(mailer: Arc<dyn Mailer>, alert_recipients: Vec<String>) -> Self {
        let (dispatcher, rx) = Self::channel();
        tokio::spawn(run_worker(rx, mailer, alert_recipients));
        dispatcher
    }

    pub fn dispatch(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::warn!("Fila de notificações fechada; notificação descartada");
        }
    }
}

async fn run_worker(
    mut rx: UnboundedReceiver<Notification>,
    mailer: Arc<dyn Mailer>,
    alert_recipients: Vec<String>,
) {
    while let Some(notification) = rx.recv().await {
        let email = notification.render(&alert_recipients);

        if email.to.is_empty() {
            tracing::warn!(subject = %email.subject, "Notificação sem destinatários; só registrada no log");
            continue;
        }

        // Sem retry
        if let Err(e) = mailer.send(&email).await {
            tracing::error!("❌ Erro enviando e-mail '{}': {:#}", email.subject, e);
        }
    }
}

// --- Templates HTML ---

fn security_alert_template(farm_name: &str, chemical_name: &str, actor: &str) -> String {
    format!(
        r#"
<div style="font-family: sans-serif; padding: 20px; border: 1px solid #fee2e2; border-radius: 8px; background-color: #fffaf9;">
  <h2 style="color: #b91c1c; margin-top: 0;">🚨 ALERTA DE SEGURIDAD FITOSANITARIA</h2>
  <p style="color: #454545;">El sistema AgriTrust ha bloqueado automáticamente una operación de alto riesgo en campo.</p>
  <ul style="color: #454545;">
    <li><strong>Rancho:</strong> {farm_name}</li>
    <li><strong>Usuario Responsable:</strong> {actor}</li>
    <li><strong>Incidente:</strong> Intento de aplicar producto boletinado</li>
    <li><strong>Producto Bloqueado:</strong> <span style="color: #d32f2f; font-weight: bold;">{chemical_name}</span></li>
  </ul>
  <div style="padding: 10px; background-color: #fee2e2; color: #991b1b; border-radius: 4px; font-size: 14px;">
    <strong>Acción Automática:</strong> La operación fue denegada.
  </div>
  <hr style="border: 0; border-top: 1px solid #eee; margin: 20px 0;">
  <p style="font-size: 12px; color: #888;">AgriTrust Security System</p>
</div>
"#
    )
}

fn invite_template(link: &str, role: UserRole) -> String {
    let role_name = match role {
        UserRole::Admin => "Administrador del Sistema",
        UserRole::Operator => "Operador de Campo",
        UserRole::Viewer => "Consulta",
    };

    format!(
        r#"
<div style="font-family: sans-serif; padding: 30px; border: 1px solid #e5e7eb; border-radius: 8px;">
  <h2 style="color: #0f172a; margin-top: 0;">Bienvenido al equipo AgriTrust</h2>
  <p style="color: #374151;">Has sido invitado a colaborar en la plataforma como <strong>{role_name}</strong>.</p>
  <p style="color: #374151;">Para activar tu acceso, haz clic en el siguiente botón:</p>
  <a href="{link}" style="background-color: #16a34a; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; font-weight: bold; display: inline-block;">Aceptar Invitación</a>
  <p style="font-size: 12px; color: #9ca3af;">Si el botón no funciona, copia este enlace: {link}</p>
</div>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    // Falha na primeira entrega e registra as seguintes
    #[derive(Default)]
    struct FlakyMailer {
        calls: Mutex<usize>,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
            let mut calls = self.calls.lock().await;
            *calls += 1;
            if *calls == 1 {
                anyhow::bail!("provedor fora do ar");
            }
            self.sent.lock().await.push(email.clone());
            Ok(())
        }
    }

    fn alert() -> Notification {
        Notification::SecurityAlert {
            farm_name: "Rancho Norte".into(),
            chemical_name: "ParaXYZ".into(),
            actor: "user_42".into(),
        }
    }

    #[test]
    fn security_alert_goes_to_configured_recipients() {
        let email = alert().render(&["seguridad@agri.test".to_string()]);
        assert_eq!(email.to, vec!["seguridad@agri.test".to_string()]);
        assert!(email.subject.contains("ParaXYZ"));
        assert!(email.html.contains("Rancho Norte"));
        assert!(email.html.contains("user_42"));
    }

    #[test]
    fn invite_goes_to_invited_email_with_link() {
        let email = Notification::TeamInvite {
            email: "ana@agri.test".into(),
            role: UserRole::Admin,
            link: "http://front/join?token=abc".into(),
        }
        .render(&[]);
        assert_eq!(email.to, vec!["ana@agri.test".to_string()]);
        assert!(email.html.contains("http://front/join?token=abc"));
        assert!(email.html.contains("Administrador del Sistema"));
    }

    #[tokio::test]
    async fn worker_delivers_queued_notifications() {
        let mailer = Arc::new(RecordingMailer::default());
        let dispatcher = NotificationDispatcher::spawn(mailer.clone(), vec!["sec@agri.test".into()]);

        dispatcher.dispatch(alert());

        // O worker é assíncrono: espera um pouco pela entrega
        for _ in 0..50 {
            if !mailer.sent.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(mailer.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_the_worker() {
        let mailer = Arc::new(FlakyMailer::default());
        let dispatcher = NotificationDispatcher::spawn(mailer.clone(), vec!["x@y.z".into()]);

        dispatcher.dispatch(alert());
        dispatcher.dispatch(Notification::TeamInvite {
            email: "ana@agri.test".into(),
            role: UserRole::Operator,
            link: "http://front/join?token=abc".into(),
        });

        for _ in 0..50 {
            if !mailer.sent.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        // A primeira falhou; a segunda ainda foi entregue
        assert_eq!(*mailer.calls.lock().await, 2);
        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["ana@agri.test".to_string()]);
    }
}
