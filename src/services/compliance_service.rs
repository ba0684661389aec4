// src/services/compliance_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ComplianceRepository, FarmRepository},
    models::{
        auth::Identity,
        compliance::{ApplicationRecord, ApplicationStatus, Chemical, NewApplication, NewChemical},
    },
    services::notification_service::{Notification, NotificationDispatcher},
};

/// Catálogo de químicos e o guardião fitossanitário.
#[derive(Clone)]
pub struct ComplianceService {
    compliance_repo: Arc<dyn ComplianceRepository>,
    farm_repo: Arc<dyn FarmRepository>,
    dispatcher: NotificationDispatcher,
}

impl ComplianceService {
    pub fn new(
        compliance_repo: Arc<dyn ComplianceRepository>,
        farm_repo: Arc<dyn FarmRepository>,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            compliance_repo,
            farm_repo,
            dispatcher,
        }
    }

    pub async fn list_chemicals(&self, tenant_id: Uuid) -> Result<Vec<Chemical>, AppError> {
        self.compliance_repo.list_chemicals(tenant_id).await
    }

    /// Químicos criados pela API sempre pertencem à empresa.
    pub async fn create_chemical(&self, tenant_id: Uuid, new: NewChemical) -> Result<Chemical, AppError> {
        self.compliance_repo.create_chemical(tenant_id, new).await
    }

    pub async fn list_applications(&self, tenant_id: Uuid) -> Result<Vec<ApplicationRecord>, AppError> {
        self.compliance_repo.list_applications(tenant_id).await
    }

    /// LÓGICA DE NEGÓCIO: registra a aplicação, a menos que o químico seja proibido.
    ///
    /// Químico proibido: nada é gravado, um alerta de segurança é enfileirado
    /// e a chamada falha com `ChemicalBlocked` (403).
    pub async fn record_application(
        &self,
        tenant_id: Uuid,
        actor: &Identity,
        new: NewApplication,
    ) -> Result<ApplicationRecord, AppError> {
        // 1. O químico precisa existir (global ou da empresa)
        let chemical = self
            .compliance_repo
            .find_chemical(tenant_id, new.chemical_id)
            .await?
            .ok_or_else(|| AppError::InvalidReference("Químico não encontrado.".into()))?;

        // 2. O rancho, se for da empresa
        let farm = self.farm_repo.find_farm(tenant_id, new.farm_id).await?;

        // 3. O guardião vem antes de qualquer outra validação
        if chemical.is_banned {
            let banned_markets = chemical.banned_markets.clone().unwrap_or_default();
            let farm_name = farm
                .map(|f| f.name)
                .unwrap_or_else(|| new.farm_id.to_string());
            tracing::warn!(
                %tenant_id,
                farm = %farm_name,
                chemical = %chemical.name,
                actor = %actor.subject,
                "⛔ Aplicação bloqueada: produto proibido"
            );

            self.dispatcher.dispatch(Notification::SecurityAlert {
                farm_name,
                chemical_name: chemical.name.clone(),
                actor: actor.subject.clone(),
            });

            return Err(AppError::ChemicalBlocked {
                chemical: chemical.name,
                banned_markets,
            });
        }

        if farm.is_none() {
            return Err(AppError::InvalidReference("Rancho não encontrado.".into()));
        }

        // 4. Aprovada
        self.compliance_repo
            .create_application(tenant_id, new, ApplicationStatus::Approved, Utc::now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::{
        auth::UserRole,
        farm::{NewFarm, OwnershipType},
    };
    use rust_decimal::Decimal;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Fixture {
        store: InMemoryStore,
        svc: ComplianceService,
        rx: UnboundedReceiver<Notification>,
        tenant_id: Uuid,
        farm_id: Uuid,
        actor: Identity,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let tenant_id = Uuid::new_v4();
        let farm = store
            .create_farm(
                tenant_id,
                NewFarm {
                    name: "Rancho Norte".into(),
                    total_area: Decimal::new(50, 0),
                    location: None,
                    ownership_type: OwnershipType::Own,
                },
            )
            .await
            .unwrap();
        let (dispatcher, rx) = NotificationDispatcher::channel();
        Fixture {
            svc: ComplianceService::new(Arc::new(store.clone()), Arc::new(store.clone()), dispatcher),
            store,
            rx,
            tenant_id,
            farm_id: farm.id,
            actor: Identity {
                subject: "user_42".into(),
                role: UserRole::Operator,
            },
        }
    }

    fn chemical(name: &str, banned: bool) -> NewChemical {
        NewChemical {
            name: name.into(),
            active_ingredient: None,
            is_banned: banned,
            banned_markets: banned.then(|| "EU,USA".to_string()),
        }
    }

    fn application(farm_id: Uuid, chemical_id: Uuid) -> NewApplication {
        NewApplication {
            farm_id,
            chemical_id,
            dosage: Decimal::new(25, 1),
            unit: "L".into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn banned_chemical_is_blocked_and_alert_enqueued() {
        let mut f = fixture().await;
        let banned = f.svc.create_chemical(f.tenant_id, chemical("ParaXYZ", true)).await.unwrap();

        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(f.farm_id, banned.id))
            .await
            .unwrap_err();

        match err {
            AppError::ChemicalBlocked { chemical, banned_markets } => {
                assert_eq!(chemical, "ParaXYZ");
                assert_eq!(banned_markets, "EU,USA");
            }
            other => panic!("esperava bloqueio, veio {:?}", other),
        }

        // Nada gravado
        assert!(f.svc.list_applications(f.tenant_id).await.unwrap().is_empty());

        // Alerta na fila
        assert_eq!(
            f.rx.try_recv().unwrap(),
            Notification::SecurityAlert {
                farm_name: "Rancho Norte".into(),
                chemical_name: "ParaXYZ".into(),
                actor: "user_42".into(),
            }
        );
    }

    #[tokio::test]
    async fn allowed_chemical_is_approved() {
        let mut f = fixture().await;
        let ok = f.svc.create_chemical(f.tenant_id, chemical("Azufre", false)).await.unwrap();

        let record = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(f.farm_id, ok.id))
            .await
            .unwrap();

        assert_eq!(record.status, ApplicationStatus::Approved);
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_chemical_is_invalid_reference() {
        let f = fixture().await;
        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(f.farm_id, Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn farm_outside_tenant_is_invalid_reference() {
        let f = fixture().await;
        let ok = f.svc.create_chemical(f.tenant_id, chemical("Azufre", false)).await.unwrap();
        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(Uuid::new_v4(), ok.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn banned_chemical_with_unknown_farm_is_still_blocked() {
        let mut f = fixture().await;
        let banned = f.svc.create_chemical(f.tenant_id, chemical("ParaXYZ", true)).await.unwrap();
        let stray_farm = Uuid::new_v4();

        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(stray_farm, banned.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ChemicalBlocked { .. }));

        // Sem rancho conhecido, o alerta leva o id enviado
        assert_eq!(
            f.rx.try_recv().unwrap(),
            Notification::SecurityAlert {
                farm_name: stray_farm.to_string(),
                chemical_name: "ParaXYZ".into(),
                actor: "user_42".into(),
            }
        );
        assert!(f.svc.list_applications(f.tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_tenants_chemicals_are_invisible() {
        let f = fixture().await;
        let foreign = f.svc.create_chemical(Uuid::new_v4(), chemical("Secreto", false)).await.unwrap();
        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(f.farm_id, foreign.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn global_catalog_is_shared_and_still_guarded() {
        let mut f = fixture().await;
        let global = f.store.seed_global_chemical(chemical("Endosulfán", true)).await;

        let visible = f.svc.list_chemicals(f.tenant_id).await.unwrap();
        assert!(visible.iter().any(|c| c.id == global.id && c.tenant_id.is_none()));

        let err = f
            .svc
            .record_application(f.tenant_id, &f.actor, application(f.farm_id, global.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ChemicalBlocked { .. }));
        assert!(f.rx.try_recv().is_ok());
    }
}
