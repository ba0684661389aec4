// src/services/team_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::{
        auth::UserRole,
        tenancy::{Invitation, TeamMember, TeamOverview},
    },
    services::notification_service::{Notification, NotificationDispatcher},
};

#[derive(Clone)]
pub struct TeamService {
    tenant_repo: Arc<dyn TenantRepository>,
    dispatcher: NotificationDispatcher,
    frontend_url: String,
}

impl TeamService {
    pub fn new(
        tenant_repo: Arc<dyn TenantRepository>,
        dispatcher: NotificationDispatcher,
        frontend_url: String,
    ) -> Self {
        Self {
            tenant_repo,
            dispatcher,
            frontend_url,
        }
    }

    /// Gera o convite (token de uso único) e enfileira o e-mail.
    pub async fn invite(&self, tenant_id: Uuid, email: &str, role: UserRole) -> Result<Invitation, AppError> {
        let token = Uuid::new_v4().to_string();
        let invitation = self
            .tenant_repo
            .create_invitation(tenant_id, email, role, &token)
            .await?;

        let link = format!("{}/join?token={}", self.frontend_url.trim_end_matches('/'), token);
        self.dispatcher.dispatch(Notification::TeamInvite {
            email: email.to_string(),
            role,
            link,
        });

        tracing::info!(%tenant_id, email, role = role.as_str(), "Convite criado");
        Ok(invitation)
    }

    pub async fn overview(&self, tenant_id: Uuid) -> Result<TeamOverview, AppError> {
        let members = self.tenant_repo.list_members(tenant_id).await?;
        let invites = self.tenant_repo.list_pending_invitations(tenant_id).await?;
        Ok(TeamOverview { members, invites })
    }

    /// Consome o convite. Token desconhecido ou já usado -> 404.
    pub async fn join(&self, token: &str, user_id: &str) -> Result<TeamMember, AppError> {
        let member = self
            .tenant_repo
            .accept_invitation(token, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Convite inválido ou já utilizado.".into()))?;

        tracing::info!(tenant_id = %member.tenant_id, user_id, "Convite aceito");
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::tenancy::{NewTenant, SubscriptionPlan};

    async fn setup() -> (TeamService, InMemoryStore, tokio::sync::mpsc::UnboundedReceiver<Notification>, Uuid) {
        let store = InMemoryStore::new();
        let tenant = store
            .create_with_owner(
                "owner",
                NewTenant {
                    name: "Agrícola".into(),
                    tax_id: None,
                    plan: SubscriptionPlan::Basic,
                },
            )
            .await
            .unwrap();
        let (dispatcher, rx) = NotificationDispatcher::channel();
        let svc = TeamService::new(Arc::new(store.clone()), dispatcher, "http://front/".into());
        (svc, store, rx, tenant.id)
    }

    #[tokio::test]
    async fn invite_enqueues_email_with_join_link() {
        let (svc, _store, mut rx, tenant_id) = setup().await;
        let invitation = svc.invite(tenant_id, "ana@agri.test", UserRole::Viewer).await.unwrap();

        match rx.try_recv().unwrap() {
            Notification::TeamInvite { email, link, role } => {
                assert_eq!(email, "ana@agri.test");
                assert_eq!(role, UserRole::Viewer);
                assert_eq!(link, format!("http://front/join?token={}", invitation.token));
            }
            other => panic!("notificação inesperada: {:?}", other),
        }
    }

    #[tokio::test]
    async fn invitation_is_consumed_exactly_once() {
        let (svc, store, _rx, tenant_id) = setup().await;
        let invitation = svc.invite(tenant_id, "ana@agri.test", UserRole::Operator).await.unwrap();

        let member = svc.join(&invitation.token, "ana").await.unwrap();
        assert_eq!(member.tenant_id, tenant_id);
        assert_eq!(member.role, UserRole::Operator);
        assert!(store.has_access("ana", tenant_id).await.unwrap());

        let second = svc.join(&invitation.token, "ana").await.unwrap_err();
        assert!(matches!(second, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn overview_lists_only_pending_invites() {
        let (svc, _store, _rx, tenant_id) = setup().await;
        let used = svc.invite(tenant_id, "a@x.com", UserRole::Operator).await.unwrap();
        svc.invite(tenant_id, "b@x.com", UserRole::Operator).await.unwrap();
        svc.join(&used.token, "a").await.unwrap();

        let overview = svc.overview(tenant_id).await.unwrap();
        assert_eq!(overview.members.len(), 2); // dono + "a"
        assert_eq!(overview.invites.len(), 1);
        assert_eq!(overview.invites[0].email, "b@x.com");
    }
}
