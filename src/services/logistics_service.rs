// src/services/logistics_service.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LogisticsRepository,
    models::logistics::{Claim, ClaimStatus, NewClaim, NewShipment, Shipment, ShipmentStatus},
};

#[derive(Clone)]
pub struct LogisticsService {
    logistics_repo: Arc<dyn LogisticsRepository>,
}

impl LogisticsService {
    pub fn new(logistics_repo: Arc<dyn LogisticsRepository>) -> Self {
        Self { logistics_repo }
    }

    /// Cria o embarque (saída = agora) com as caixas listadas. Tudo ou nada.
    pub async fn create_shipment(
        &self,
        tenant_id: Uuid,
        customer_name: String,
        destination: Option<String>,
        truck_plate: Option<String>,
        bin_ids: &[Uuid],
    ) -> Result<Shipment, AppError> {
        // Duplicatas são ignoradas, preservando a ordem
        let mut unique_ids: Vec<Uuid> = Vec::with_capacity(bin_ids.len());
        for id in bin_ids {
            if !unique_ids.contains(id) {
                unique_ids.push(*id);
            }
        }

        if unique_ids.is_empty() {
            return Err(AppError::BusinessRule("O embarque precisa de ao menos uma caixa.".into()));
        }

        let shipment = self
            .logistics_repo
            .create_shipment(
                tenant_id,
                NewShipment {
                    customer_name,
                    destination,
                    truck_plate,
                    departure_time: Utc::now(),
                },
                &unique_ids,
            )
            .await?;

        tracing::info!(shipment_id = %shipment.id, bins = unique_ids.len(), "🚚 Embarque criado");
        Ok(shipment)
    }

    pub async fn list_shipments(
        &self,
        tenant_id: Uuid,
        status: Option<ShipmentStatus>,
    ) -> Result<Vec<Shipment>, AppError> {
        self.logistics_repo.list_shipments(tenant_id, status).await
    }

    pub async fn get_shipment(&self, tenant_id: Uuid, shipment_id: Uuid) -> Result<Shipment, AppError> {
        self.logistics_repo
            .find_shipment(tenant_id, shipment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Embarque não encontrado.".into()))
    }

    pub async fn update_shipment_status(
        &self,
        tenant_id: Uuid,
        shipment_id: Uuid,
        status: ShipmentStatus,
    ) -> Result<Shipment, AppError> {
        self.logistics_repo
            .update_shipment_status(tenant_id, shipment_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Embarque não encontrado.".into()))
    }

    /// Abrir uma reclamação coloca o embarque em disputa.
    pub async fn create_claim(&self, tenant_id: Uuid, new: NewClaim) -> Result<Claim, AppError> {
        let claim = self.logistics_repo.create_claim(tenant_id, new).await?;
        tracing::info!(claim_id = %claim.id, shipment_id = %claim.shipment_id, "Reclamação aberta; embarque em disputa");
        Ok(claim)
    }

    pub async fn list_claims(&self, tenant_id: Uuid) -> Result<Vec<Claim>, AppError> {
        self.logistics_repo.list_claims(tenant_id).await
    }

    pub async fn update_claim_status(
        &self,
        tenant_id: Uuid,
        claim_id: Uuid,
        status: ClaimStatus,
    ) -> Result<Claim, AppError> {
        self.logistics_repo
            .update_claim_status(tenant_id, claim_id, status)
            .await?
            .ok_or_else(|| AppError::NotFound("Reclamação não encontrada.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{InMemoryStore, TraceabilityRepository};
    use crate::models::traceability::{BinFilter, BinScan, BinStatus};
    use rust_decimal::Decimal;

    async fn bin(store: &InMemoryStore, tenant_id: Uuid, qr: &str) -> Uuid {
        store
            .upsert_bin(
                tenant_id,
                BinScan {
                    qr_code: qr.into(),
                    harvest_batch_id: Uuid::new_v4(),
                    weight_kg: Decimal::new(20, 0),
                    scanned_at: Utc::now(),
                },
            )
            .await
            .unwrap()
            .id
    }

    fn claim(shipment_id: Uuid) -> NewClaim {
        NewClaim {
            shipment_id,
            claim_date: Utc::now(),
            reason: "Decay".into(),
            amount_usd: Decimal::new(125000, 2),
            evidence_url: None,
            internal_notes: None,
        }
    }

    #[tokio::test]
    async fn shipment_attaches_every_bin() {
        let store = InMemoryStore::new();
        let svc = LogisticsService::new(Arc::new(store.clone()));
        let tenant_id = Uuid::new_v4();
        let a = bin(&store, tenant_id, "A").await;
        let b = bin(&store, tenant_id, "B").await;

        let shipment = svc
            .create_shipment(tenant_id, "Whole Foods".into(), None, None, &[a, b, a])
            .await
            .unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Shipped);

        let bins = store.list_bins(tenant_id, BinFilter::default(), 100).await.unwrap();
        assert!(bins.iter().all(|b| b.status == BinStatus::Shipped && b.shipment_id == Some(shipment.id)));
    }

    #[tokio::test]
    async fn shipment_with_foreign_bin_writes_nothing() {
        let store = InMemoryStore::new();
        let svc = LogisticsService::new(Arc::new(store.clone()));
        let tenant_id = Uuid::new_v4();
        let mine = bin(&store, tenant_id, "A").await;
        let theirs = bin(&store, Uuid::new_v4(), "B").await;

        let err = svc
            .create_shipment(tenant_id, "Cliente".into(), None, None, &[mine, theirs])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));

        assert!(svc.list_shipments(tenant_id, None).await.unwrap().is_empty());
        let bins = store.list_bins(tenant_id, BinFilter::default(), 100).await.unwrap();
        assert_eq!(bins[0].status, BinStatus::FullInField);
        assert_eq!(bins[0].shipment_id, None);
    }

    #[tokio::test]
    async fn already_shipped_bin_cannot_ship_again() {
        let store = InMemoryStore::new();
        let svc = LogisticsService::new(Arc::new(store.clone()));
        let tenant_id = Uuid::new_v4();
        let a = bin(&store, tenant_id, "A").await;

        svc.create_shipment(tenant_id, "C1".into(), None, None, &[a]).await.unwrap();
        let err = svc.create_shipment(tenant_id, "C2".into(), None, None, &[a]).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn empty_bin_list_is_rejected() {
        let svc = LogisticsService::new(Arc::new(InMemoryStore::new()));
        let err = svc
            .create_shipment(Uuid::new_v4(), "C".into(), None, None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn claim_puts_shipment_in_dispute() {
        let store = InMemoryStore::new();
        let svc = LogisticsService::new(Arc::new(store.clone()));
        let tenant_id = Uuid::new_v4();
        let a = bin(&store, tenant_id, "A").await;
        let shipment = svc.create_shipment(tenant_id, "C".into(), None, None, &[a]).await.unwrap();

        let opened = svc.create_claim(tenant_id, claim(shipment.id)).await.unwrap();
        assert_eq!(opened.status, ClaimStatus::Open);

        let disputed = svc.get_shipment(tenant_id, shipment.id).await.unwrap();
        assert_eq!(disputed.status, ShipmentStatus::Disputed);
    }

    #[tokio::test]
    async fn claim_against_foreign_shipment_is_invalid_reference() {
        let svc = LogisticsService::new(Arc::new(InMemoryStore::new()));
        let err = svc.create_claim(Uuid::new_v4(), claim(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }
}
