// src/services/land_service.rs

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FarmRepository,
    models::farm::{Farm, LeaseContract, LeaseStatus, NewFarm, NewLeaseContract},
};

/// Janela do alerta de vencimento de contratos.
pub const LEASE_ALERT_WINDOW_DAYS: u64 = 60;

/// Ranchos e arrendamentos.
#[derive(Clone)]
pub struct LandService {
    farm_repo: Arc<dyn FarmRepository>,
}

impl LandService {
    pub fn new(farm_repo: Arc<dyn FarmRepository>) -> Self {
        Self { farm_repo }
    }

    pub async fn list_farms(&self, tenant_id: Uuid) -> Result<Vec<Farm>, AppError> {
        self.farm_repo.list_farms(tenant_id).await
    }

    pub async fn create_farm(&self, tenant_id: Uuid, new: NewFarm) -> Result<Farm, AppError> {
        self.farm_repo.create_farm(tenant_id, new).await
    }

    /// Regra: fim > início. Criar o contrato força o rancho para "rented".
    pub async fn create_contract(&self, tenant_id: Uuid, new: NewLeaseContract) -> Result<LeaseContract, AppError> {
        // 1. Validação de datas antes de qualquer escrita
        if new.end_date <= new.start_date {
            return Err(AppError::BusinessRule(
                "A data de término deve ser posterior à data de início.".into(),
            ));
        }

        // 2. Rancho + contrato na mesma transação
        let lease = self.farm_repo.create_lease(tenant_id, new).await?;
        tracing::info!(lease_id = %lease.id, farm_id = %lease.farm_id, "Contrato criado; rancho marcado como arrendado");
        Ok(lease)
    }

    pub async fn list_contracts(&self, tenant_id: Uuid) -> Result<Vec<LeaseContract>, AppError> {
        self.farm_repo.list_leases(tenant_id).await
    }

    pub async fn get_contract(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<LeaseContract, AppError> {
        self.farm_repo
            .find_lease(tenant_id, lease_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Contrato não encontrado.".into()))
    }

    pub async fn update_contract_status(
        &self,
        tenant_id: Uuid,
        lease_id: Uuid,
        status: LeaseStatus,
    ) -> Result<LeaseContract, AppError> {
        self.farm_repo
            .update_lease_status(tenant_id, lease_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Contrato não encontrado.".into()))
    }

    pub async fn delete_contract(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<(), AppError> {
        if self.farm_repo.delete_lease(tenant_id, lease_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Contrato não encontrado.".into()))
        }
    }

    /// Contratos ativos vencendo entre hoje e hoje + 60 dias.
    pub async fn expiring_contracts(&self, tenant_id: Uuid, today: NaiveDate) -> Result<Vec<LeaseContract>, AppError> {
        let limit = today
            .checked_add_days(Days::new(LEASE_ALERT_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        self.farm_repo.expiring_leases(tenant_id, today, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::farm::{OwnershipType, PaymentFrequency};
    use rust_decimal::Decimal;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract(farm_id: Uuid, start: NaiveDate, end: NaiveDate) -> NewLeaseContract {
        NewLeaseContract {
            farm_id,
            landowner_name: "Don Pedro".into(),
            start_date: start,
            end_date: end,
            payment_amount: Decimal::new(150000, 2),
            payment_freq: PaymentFrequency::Yearly,
            contract_doc_url: None,
        }
    }

    async fn setup() -> (LandService, Uuid, Farm) {
        let svc = LandService::new(Arc::new(InMemoryStore::new()));
        let tenant_id = Uuid::new_v4();
        let farm = svc
            .create_farm(
                tenant_id,
                NewFarm {
                    name: "El Sauz".into(),
                    total_area: Decimal::new(1205, 1),
                    location: None,
                    ownership_type: OwnershipType::Own,
                },
            )
            .await
            .unwrap();
        (svc, tenant_id, farm)
    }

    #[tokio::test]
    async fn end_before_start_is_rejected_and_farm_untouched() {
        let (svc, tenant_id, farm) = setup().await;

        let err = svc
            .create_contract(tenant_id, contract(farm.id, date(2026, 1, 1), date(2025, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        let farms = svc.list_farms(tenant_id).await.unwrap();
        assert_eq!(farms[0].ownership_type, OwnershipType::Own);
        assert!(svc.list_contracts(tenant_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn contract_marks_farm_as_rented() {
        let (svc, tenant_id, farm) = setup().await;

        let lease = svc
            .create_contract(tenant_id, contract(farm.id, date(2025, 1, 1), date(2027, 1, 1)))
            .await
            .unwrap();
        assert_eq!(lease.status, LeaseStatus::Active);

        let farms = svc.list_farms(tenant_id).await.unwrap();
        assert_eq!(farms[0].ownership_type, OwnershipType::Rented);
    }

    #[tokio::test]
    async fn farm_from_another_tenant_is_invalid_reference() {
        let (svc, _tenant_id, farm) = setup().await;

        let err = svc
            .create_contract(Uuid::new_v4(), contract(farm.id, date(2025, 1, 1), date(2027, 1, 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn alerts_cover_the_next_sixty_days_only() {
        let (svc, tenant_id, farm) = setup().await;
        let today = date(2025, 6, 1);

        let soon = svc
            .create_contract(tenant_id, contract(farm.id, date(2024, 1, 1), date(2025, 7, 15)))
            .await
            .unwrap();
        svc.create_contract(tenant_id, contract(farm.id, date(2024, 1, 1), date(2025, 12, 31)))
            .await
            .unwrap();
        svc.create_contract(tenant_id, contract(farm.id, date(2024, 1, 1), date(2025, 5, 1)))
            .await
            .unwrap();

        let alerts = svc.expiring_contracts(tenant_id, today).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, soon.id);
    }

    #[tokio::test]
    async fn deleting_unknown_contract_is_not_found() {
        let (svc, tenant_id, _farm) = setup().await;
        let err = svc.delete_contract(tenant_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
