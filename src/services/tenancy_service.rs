// src/services/tenancy_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::tenancy::{NewTenant, Tenant, TenantUpdate},
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: Arc<dyn TenantRepository>,
}

impl TenantService {
    pub fn new(tenant_repo: Arc<dyn TenantRepository>) -> Self {
        Self { tenant_repo }
    }

    /// Resolve a empresa da requisição.
    ///
    /// Empresa pedida explicitamente só vale se o chamador for dono ou membro;
    /// caso contrário devolvemos 404 (nunca 403), para não vazar que ela existe.
    /// Sem pedido explícito, cai na empresa padrão do chamador.
    pub async fn resolve_scope(&self, user_id: &str, requested: Option<Uuid>) -> Result<Uuid, AppError> {
        match requested {
            Some(tenant_id) => {
                if self.tenant_repo.has_access(user_id, tenant_id).await? {
                    Ok(tenant_id)
                } else {
                    tracing::warn!(user_id, %tenant_id, "Acesso a empresa fora do escopo");
                    Err(AppError::NotFound("Empresa não encontrada.".into()))
                }
            }
            None => self
                .tenant_repo
                .default_tenant(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Nenhuma empresa vinculada ao usuário.".into())),
        }
    }

    pub async fn list_for_identity(&self, user_id: &str) -> Result<Vec<Tenant>, AppError> {
        self.tenant_repo.list_for_identity(user_id).await
    }

    /// Cria a empresa; o chamador vira dono e admin da equipe (atomicamente).
    pub async fn create_tenant_with_owner(&self, owner_id: &str, new: NewTenant) -> Result<Tenant, AppError> {
        let tenant = self.tenant_repo.create_with_owner(owner_id, new).await?;
        tracing::info!(tenant_id = %tenant.id, owner_id, "Empresa criada");
        Ok(tenant)
    }

    /// Só nome e tax ID. O plano não é editável aqui.
    pub async fn update_tenant(&self, tenant_id: Uuid, update: TenantUpdate) -> Result<Tenant, AppError> {
        self.tenant_repo
            .update(tenant_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Empresa não encontrada.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::tenancy::SubscriptionPlan;

    fn service() -> TenantService {
        TenantService::new(Arc::new(InMemoryStore::new()))
    }

    fn new_tenant(name: &str, tax_id: &str) -> NewTenant {
        NewTenant {
            name: name.into(),
            tax_id: Some(tax_id.into()),
            plan: SubscriptionPlan::Basic,
        }
    }

    #[tokio::test]
    async fn default_scope_is_first_owned_tenant() {
        let svc = service();
        let first = svc.create_tenant_with_owner("owner", new_tenant("A", "T1")).await.unwrap();
        svc.create_tenant_with_owner("owner", new_tenant("B", "T2")).await.unwrap();

        assert_eq!(svc.resolve_scope("owner", None).await.unwrap(), first.id);
    }

    #[tokio::test]
    async fn foreign_tenant_resolves_to_not_found() {
        let svc = service();
        let theirs = svc.create_tenant_with_owner("alice", new_tenant("A", "T1")).await.unwrap();

        let err = svc.resolve_scope("mallory", Some(theirs.id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn caller_without_tenants_gets_not_found() {
        let err = service().resolve_scope("nobody", None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_tax_id_conflicts() {
        let svc = service();
        svc.create_tenant_with_owner("a", new_tenant("A", "DUP")).await.unwrap();
        let err = svc.create_tenant_with_owner("b", new_tenant("B", "DUP")).await.unwrap_err();
        assert!(matches!(err, AppError::UniqueConstraintViolation(_)));
    }
}
