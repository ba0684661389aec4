// src/db/tenancy_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::{
        auth::UserRole,
        tenancy::{Invitation, InvitationStatus, NewTenant, TeamMember, Tenant, TenantUpdate},
    },
};

/// Acesso a empresas, equipes e convites.
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Cria a empresa e registra o dono como admin da equipe, atomicamente.
    async fn create_with_owner(&self, owner_id: &str, new: NewTenant) -> Result<Tenant, AppError>;

    async fn update(&self, tenant_id: Uuid, update: TenantUpdate) -> Result<Option<Tenant>, AppError>;

    /// Empresas das quais a identidade é dona ou membro.
    async fn list_for_identity(&self, user_id: &str) -> Result<Vec<Tenant>, AppError>;

    /// A verificação de autorização mais importante do sistema.
    async fn has_access(&self, user_id: &str, tenant_id: Uuid) -> Result<bool, AppError>;

    /// Primeira empresa própria; senão, a primeira em que é membro.
    async fn default_tenant(&self, user_id: &str) -> Result<Option<Uuid>, AppError>;

    async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TeamMember>, AppError>;

    async fn create_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
        token: &str,
    ) -> Result<Invitation, AppError>;

    async fn list_pending_invitations(&self, tenant_id: Uuid) -> Result<Vec<Invitation>, AppError>;

    /// Consome um convite pendente (uma única vez) e grava o vínculo na equipe.
    /// `None` quando o token não existe ou já foi usado.
    async fn accept_invitation(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>, AppError>;
}

#[derive(Clone)]
pub struct PostgresTenantRepository {
    pool: PgPool,
}

impl PostgresTenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn create_with_owner(&self, owner_id: &str, new: NewTenant) -> Result<Tenant, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a empresa
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, tax_id, plan, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.tax_id)
        .bind(new.plan)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma empresa com este RFC/tax ID."))?;

        // 3. O dono entra na equipe como admin
        sqlx::query(
            r#"
            INSERT INTO team_members (tenant_id, user_id, role)
            VALUES ($1, $2, 'admin')
            "#,
        )
        .bind(tenant.id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        // 4. Commit
        tx.commit().await?;

        Ok(tenant)
    }

    async fn update(&self, tenant_id: Uuid, update: TenantUpdate) -> Result<Option<Tenant>, AppError> {
        sqlx::query_as::<_, Tenant>(
            r#"
            UPDATE tenants
            SET name = $2, tax_id = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&update.name)
        .bind(&update.tax_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma empresa com este RFC/tax ID."))
    }

    async fn list_for_identity(&self, user_id: &str) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.* FROM tenants t
            WHERE t.owner_id = $1
               OR EXISTS (
                   SELECT 1 FROM team_members tm
                   WHERE tm.tenant_id = t.id AND tm.user_id = $1
               )
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn has_access(&self, user_id: &str, tenant_id: Uuid) -> Result<bool, AppError> {
        // SELECT EXISTS: só queremos saber se a linha existe.
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenants WHERE id = $2 AND owner_id = $1
                UNION ALL
                SELECT 1 FROM team_members WHERE tenant_id = $2 AND user_id = $1
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn default_tenant(&self, user_id: &str) -> Result<Option<Uuid>, AppError> {
        let owned: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM tenants WHERE owner_id = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if owned.is_some() {
            return Ok(owned);
        }

        let member: Option<Uuid> = sqlx::query_scalar(
            "SELECT tenant_id FROM team_members WHERE user_id = $1 ORDER BY joined_at ASC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(member)
    }

    async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TeamMember>, AppError> {
        let members = sqlx::query_as::<_, TeamMember>(
            "SELECT * FROM team_members WHERE tenant_id = $1 ORDER BY joined_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    async fn create_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
        token: &str,
    ) -> Result<Invitation, AppError> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (tenant_id, email, role, token, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .bind(role)
        .bind(token)
        .fetch_one(&self.pool)
        .await?;

        Ok(invitation)
    }

    async fn list_pending_invitations(&self, tenant_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let invites = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT * FROM invitations
            WHERE tenant_id = $1 AND status = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(InvitationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;

        Ok(invites)
    }

    async fn accept_invitation(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Transição condicional: só um chamador consegue passar de pending -> accepted
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET status = 'accepted'
            WHERE token = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invitation) = invitation else {
            return Ok(None);
        };

        // 2. Upsert do vínculo (um papel por empresa)
        let member = sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (tenant_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id) DO UPDATE SET role = EXCLUDED.role
            RETURNING *
            "#,
        )
        .bind(invitation.tenant_id)
        .bind(user_id)
        .bind(invitation.role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(member))
    }
}
