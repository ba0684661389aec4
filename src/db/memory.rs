// src/db/memory.rs

//! Implementação em memória de todos os repositórios.
//! Usada nos testes e para subir a API sem banco. Cada escrita composta roda
//! sob um único write lock, equivalente à transação do Postgres.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        ComplianceRepository, DashboardRepository, FarmRepository, FinanceRepository,
        LogisticsRepository, TenantRepository, TraceabilityRepository, finance_repo::BudgetUpsert,
    },
    models::{
        auth::UserRole,
        compliance::{ApplicationRecord, ApplicationStatus, Chemical, NewApplication, NewChemical},
        dashboard::ChartPoint,
        farm::{Farm, LeaseContract, LeaseStatus, NewFarm, NewLeaseContract, OwnershipType},
        finance::{
            Budget, BudgetKey, CategoryTotal, CostCategory, Expense, NewCostCategory, NewExpense,
            NewSeason, Season,
        },
        logistics::{Claim, ClaimStatus, NewClaim, NewShipment, Shipment, ShipmentStatus},
        tenancy::{Invitation, InvitationStatus, NewTenant, TeamMember, Tenant, TenantUpdate},
        traceability::{
            Bin, BinFilter, BinScan, BinStatus, Crop, HarvestBatch, NewCrop, NewHarvestBatch,
            PassportRecord,
        },
    },
};

#[derive(Debug, Default)]
struct Tables {
    tenants: Vec<Tenant>,
    members: Vec<TeamMember>,
    invitations: Vec<Invitation>,
    farms: Vec<Farm>,
    leases: Vec<LeaseContract>,
    chemicals: Vec<Chemical>,
    applications: Vec<ApplicationRecord>,
    crops: Vec<Crop>,
    batches: Vec<HarvestBatch>,
    bins: Vec<Bin>,
    shipments: Vec<Shipment>,
    claims: Vec<Claim>,
    seasons: Vec<Season>,
    categories: Vec<CostCategory>,
    budgets: Vec<Budget>,
    expenses: Vec<Expense>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere um químico do catálogo global (sem empresa).
    pub async fn seed_global_chemical(&self, new: NewChemical) -> Chemical {
        let now = Utc::now();
        let chemical = Chemical {
            id: Uuid::new_v4(),
            tenant_id: None,
            name: new.name,
            active_ingredient: new.active_ingredient,
            is_banned: new.is_banned,
            banned_markets: new.banned_markets,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.chemicals.push(chemical.clone());
        chemical
    }
}

// =============================================================================
//  EMPRESAS / EQUIPE
// =============================================================================

#[async_trait]
impl TenantRepository for InMemoryStore {
    async fn create_with_owner(&self, owner_id: &str, new: NewTenant) -> Result<Tenant, AppError> {
        let mut t = self.tables.write().await;

        if let Some(tax_id) = &new.tax_id {
            if t.tenants.iter().any(|x| x.tax_id.as_deref() == Some(tax_id)) {
                return Err(AppError::UniqueConstraintViolation(
                    "Já existe uma empresa com este RFC/tax ID.".into(),
                ));
            }
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: new.name,
            tax_id: new.tax_id,
            plan: new.plan,
            active: true,
            owner_id: owner_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.members.push(TeamMember {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            user_id: owner_id.to_string(),
            role: UserRole::Admin,
            joined_at: now,
        });
        t.tenants.push(tenant.clone());

        Ok(tenant)
    }

    async fn update(&self, tenant_id: Uuid, update: TenantUpdate) -> Result<Option<Tenant>, AppError> {
        let mut t = self.tables.write().await;

        if let Some(tax_id) = &update.tax_id {
            let taken = t
                .tenants
                .iter()
                .any(|x| x.id != tenant_id && x.tax_id.as_deref() == Some(tax_id));
            if taken {
                return Err(AppError::UniqueConstraintViolation(
                    "Já existe uma empresa com este RFC/tax ID.".into(),
                ));
            }
        }

        Ok(t.tenants.iter_mut().find(|x| x.id == tenant_id).map(|tenant| {
            tenant.name = update.name;
            tenant.tax_id = update.tax_id;
            tenant.updated_at = Utc::now();
            tenant.clone()
        }))
    }

    async fn list_for_identity(&self, user_id: &str) -> Result<Vec<Tenant>, AppError> {
        let t = self.tables.read().await;
        let mut tenants: Vec<Tenant> = t
            .tenants
            .iter()
            .filter(|x| {
                x.owner_id == user_id
                    || t.members.iter().any(|m| m.tenant_id == x.id && m.user_id == user_id)
            })
            .cloned()
            .collect();
        tenants.sort_by_key(|x| x.created_at);
        Ok(tenants)
    }

    async fn has_access(&self, user_id: &str, tenant_id: Uuid) -> Result<bool, AppError> {
        let t = self.tables.read().await;
        let owner = t.tenants.iter().any(|x| x.id == tenant_id && x.owner_id == user_id);
        let member = t.members.iter().any(|m| m.tenant_id == tenant_id && m.user_id == user_id);
        Ok(owner || member)
    }

    async fn default_tenant(&self, user_id: &str) -> Result<Option<Uuid>, AppError> {
        let t = self.tables.read().await;
        let owned = t
            .tenants
            .iter()
            .filter(|x| x.owner_id == user_id)
            .min_by_key(|x| x.created_at)
            .map(|x| x.id);

        Ok(owned.or_else(|| {
            t.members
                .iter()
                .filter(|m| m.user_id == user_id)
                .min_by_key(|m| m.joined_at)
                .map(|m| m.tenant_id)
        }))
    }

    async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<TeamMember>, AppError> {
        let t = self.tables.read().await;
        Ok(t.members.iter().filter(|m| m.tenant_id == tenant_id).cloned().collect())
    }

    async fn create_invitation(
        &self,
        tenant_id: Uuid,
        email: &str,
        role: UserRole,
        token: &str,
    ) -> Result<Invitation, AppError> {
        let invitation = Invitation {
            id: Uuid::new_v4(),
            tenant_id,
            email: email.to_string(),
            role,
            token: token.to_string(),
            status: InvitationStatus::Pending,
            created_at: Utc::now(),
        };
        self.tables.write().await.invitations.push(invitation.clone());
        Ok(invitation)
    }

    async fn list_pending_invitations(&self, tenant_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let t = self.tables.read().await;
        let mut invites: Vec<Invitation> = t
            .invitations
            .iter()
            .filter(|i| i.tenant_id == tenant_id && i.status == InvitationStatus::Pending)
            .cloned()
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn accept_invitation(
        &self,
        token: &str,
        user_id: &str,
    ) -> Result<Option<TeamMember>, AppError> {
        let mut t = self.tables.write().await;

        let Some(invitation) = t
            .invitations
            .iter_mut()
            .find(|i| i.token == token && i.status == InvitationStatus::Pending)
        else {
            return Ok(None);
        };
        invitation.status = InvitationStatus::Accepted;
        let (tenant_id, role) = (invitation.tenant_id, invitation.role);

        if let Some(member) = t
            .members
            .iter_mut()
            .find(|m| m.tenant_id == tenant_id && m.user_id == user_id)
        {
            member.role = role;
            return Ok(Some(member.clone()));
        }

        let member = TeamMember {
            id: Uuid::new_v4(),
            tenant_id,
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
        };
        t.members.push(member.clone());
        Ok(Some(member))
    }
}

// =============================================================================
//  RANCHOS / ARRENDAMENTOS
// =============================================================================

#[async_trait]
impl FarmRepository for InMemoryStore {
    async fn list_farms(&self, tenant_id: Uuid) -> Result<Vec<Farm>, AppError> {
        let t = self.tables.read().await;
        let mut farms: Vec<Farm> = t.farms.iter().filter(|f| f.tenant_id == tenant_id).cloned().collect();
        farms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(farms)
    }

    async fn create_farm(&self, tenant_id: Uuid, new: NewFarm) -> Result<Farm, AppError> {
        let now = Utc::now();
        let farm = Farm {
            id: Uuid::new_v4(),
            tenant_id,
            name: new.name,
            total_area: new.total_area,
            location: new.location,
            ownership_type: new.ownership_type,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.farms.push(farm.clone());
        Ok(farm)
    }

    async fn find_farm(&self, tenant_id: Uuid, farm_id: Uuid) -> Result<Option<Farm>, AppError> {
        let t = self.tables.read().await;
        Ok(t.farms.iter().find(|f| f.id == farm_id && f.tenant_id == tenant_id).cloned())
    }

    async fn create_lease(
        &self,
        tenant_id: Uuid,
        new: NewLeaseContract,
    ) -> Result<LeaseContract, AppError> {
        let mut t = self.tables.write().await;
        let now = Utc::now();

        let Some(farm) = t
            .farms
            .iter_mut()
            .find(|f| f.id == new.farm_id && f.tenant_id == tenant_id)
        else {
            return Err(AppError::InvalidReference("Rancho não encontrado.".into()));
        };
        farm.ownership_type = OwnershipType::Rented;
        farm.updated_at = now;

        let lease = LeaseContract {
            id: Uuid::new_v4(),
            tenant_id,
            farm_id: new.farm_id,
            landowner_name: new.landowner_name,
            start_date: new.start_date,
            end_date: new.end_date,
            payment_amount: new.payment_amount,
            payment_freq: new.payment_freq,
            contract_doc_url: new.contract_doc_url,
            status: LeaseStatus::Active,
            created_at: now,
            updated_at: now,
        };
        t.leases.push(lease.clone());
        Ok(lease)
    }

    async fn list_leases(&self, tenant_id: Uuid) -> Result<Vec<LeaseContract>, AppError> {
        let t = self.tables.read().await;
        let mut leases: Vec<LeaseContract> =
            t.leases.iter().filter(|l| l.tenant_id == tenant_id).cloned().collect();
        leases.sort_by_key(|l| l.end_date);
        Ok(leases)
    }

    async fn find_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<Option<LeaseContract>, AppError> {
        let t = self.tables.read().await;
        Ok(t.leases.iter().find(|l| l.id == lease_id && l.tenant_id == tenant_id).cloned())
    }

    async fn update_lease_status(
        &self,
        tenant_id: Uuid,
        lease_id: Uuid,
        status: LeaseStatus,
    ) -> Result<Option<LeaseContract>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.leases
            .iter_mut()
            .find(|l| l.id == lease_id && l.tenant_id == tenant_id)
            .map(|lease| {
                lease.status = status;
                lease.updated_at = Utc::now();
                lease.clone()
            }))
    }

    async fn delete_lease(&self, tenant_id: Uuid, lease_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        let before = t.leases.len();
        t.leases.retain(|l| !(l.id == lease_id && l.tenant_id == tenant_id));
        Ok(t.leases.len() < before)
    }

    async fn expiring_leases(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaseContract>, AppError> {
        let t = self.tables.read().await;
        let mut leases: Vec<LeaseContract> = t
            .leases
            .iter()
            .filter(|l| {
                l.tenant_id == tenant_id
                    && l.status == LeaseStatus::Active
                    && l.end_date >= from
                    && l.end_date <= to
            })
            .cloned()
            .collect();
        leases.sort_by_key(|l| l.end_date);
        Ok(leases)
    }
}

// =============================================================================
//  COMPLIANCE
// =============================================================================

#[async_trait]
impl ComplianceRepository for InMemoryStore {
    async fn list_chemicals(&self, tenant_id: Uuid) -> Result<Vec<Chemical>, AppError> {
        let t = self.tables.read().await;
        let mut chemicals: Vec<Chemical> = t
            .chemicals
            .iter()
            .filter(|c| c.tenant_id.is_none() || c.tenant_id == Some(tenant_id))
            .cloned()
            .collect();
        chemicals.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(chemicals)
    }

    async fn create_chemical(&self, tenant_id: Uuid, new: NewChemical) -> Result<Chemical, AppError> {
        let now = Utc::now();
        let chemical = Chemical {
            id: Uuid::new_v4(),
            tenant_id: Some(tenant_id),
            name: new.name,
            active_ingredient: new.active_ingredient,
            is_banned: new.is_banned,
            banned_markets: new.banned_markets,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.chemicals.push(chemical.clone());
        Ok(chemical)
    }

    async fn find_chemical(&self, tenant_id: Uuid, chemical_id: Uuid) -> Result<Option<Chemical>, AppError> {
        let t = self.tables.read().await;
        Ok(t.chemicals
            .iter()
            .find(|c| c.id == chemical_id && (c.tenant_id.is_none() || c.tenant_id == Some(tenant_id)))
            .cloned())
    }

    async fn create_application(
        &self,
        tenant_id: Uuid,
        new: NewApplication,
        status: ApplicationStatus,
        applied_at: DateTime<Utc>,
    ) -> Result<ApplicationRecord, AppError> {
        let record = ApplicationRecord {
            id: Uuid::new_v4(),
            tenant_id,
            farm_id: new.farm_id,
            chemical_id: new.chemical_id,
            dosage: new.dosage,
            unit: new.unit,
            applied_at,
            status,
            notes: new.notes,
            created_at: Utc::now(),
        };
        self.tables.write().await.applications.push(record.clone());
        Ok(record)
    }

    async fn list_applications(&self, tenant_id: Uuid) -> Result<Vec<ApplicationRecord>, AppError> {
        let t = self.tables.read().await;
        let mut records: Vec<ApplicationRecord> =
            t.applications.iter().filter(|a| a.tenant_id == tenant_id).cloned().collect();
        records.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));
        Ok(records)
    }
}

// =============================================================================
//  RASTREABILIDADE
// =============================================================================

#[async_trait]
impl TraceabilityRepository for InMemoryStore {
    async fn list_crops(&self, tenant_id: Uuid) -> Result<Vec<Crop>, AppError> {
        let t = self.tables.read().await;
        let mut crops: Vec<Crop> = t.crops.iter().filter(|c| c.tenant_id == tenant_id).cloned().collect();
        crops.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(crops)
    }

    async fn create_crop(&self, tenant_id: Uuid, new: NewCrop) -> Result<Crop, AppError> {
        let crop = Crop {
            id: Uuid::new_v4(),
            tenant_id,
            farm_id: new.farm_id,
            name: new.name,
            variety: new.variety,
            planting_date: new.planting_date,
            status: new.status,
        };
        self.tables.write().await.crops.push(crop.clone());
        Ok(crop)
    }

    async fn find_crop(&self, tenant_id: Uuid, crop_id: Uuid) -> Result<Option<Crop>, AppError> {
        let t = self.tables.read().await;
        Ok(t.crops.iter().find(|c| c.id == crop_id && c.tenant_id == tenant_id).cloned())
    }

    async fn list_batches(&self, tenant_id: Uuid) -> Result<Vec<HarvestBatch>, AppError> {
        let t = self.tables.read().await;
        let mut batches: Vec<HarvestBatch> =
            t.batches.iter().filter(|b| b.tenant_id == tenant_id).cloned().collect();
        batches.sort_by(|a, b| b.harvest_date.cmp(&a.harvest_date));
        Ok(batches)
    }

    async fn create_batch(&self, tenant_id: Uuid, new: NewHarvestBatch) -> Result<HarvestBatch, AppError> {
        let mut t = self.tables.write().await;

        if t.batches.iter().any(|b| b.tenant_id == tenant_id && b.batch_code == new.batch_code) {
            return Err(AppError::UniqueConstraintViolation(format!(
                "O lote '{}' já existe.",
                new.batch_code
            )));
        }

        let batch = HarvestBatch {
            id: Uuid::new_v4(),
            tenant_id,
            farm_id: new.farm_id,
            crop_id: new.crop_id,
            batch_code: new.batch_code,
            harvest_date: new.harvest_date,
            total_bins: new.total_bins,
        };
        t.batches.push(batch.clone());
        Ok(batch)
    }

    async fn find_batch(&self, tenant_id: Uuid, batch_id: Uuid) -> Result<Option<HarvestBatch>, AppError> {
        let t = self.tables.read().await;
        Ok(t.batches.iter().find(|b| b.id == batch_id && b.tenant_id == tenant_id).cloned())
    }

    async fn upsert_bin(&self, tenant_id: Uuid, scan: BinScan) -> Result<Bin, AppError> {
        let mut t = self.tables.write().await;

        if let Some(bin) = t
            .bins
            .iter_mut()
            .find(|b| b.tenant_id == tenant_id && b.qr_code == scan.qr_code)
        {
            bin.harvest_batch_id = Some(scan.harvest_batch_id);
            bin.weight_kg = scan.weight_kg;
            bin.status = BinStatus::FullInField;
            bin.updated_at = scan.scanned_at;
            return Ok(bin.clone());
        }

        let bin = Bin {
            id: Uuid::new_v4(),
            tenant_id,
            qr_code: scan.qr_code,
            harvest_batch_id: Some(scan.harvest_batch_id),
            weight_kg: scan.weight_kg,
            status: BinStatus::FullInField,
            updated_at: scan.scanned_at,
            shipment_id: None,
        };
        t.bins.push(bin.clone());
        Ok(bin)
    }

    async fn list_bins(&self, tenant_id: Uuid, filter: BinFilter, limit: i64) -> Result<Vec<Bin>, AppError> {
        let t = self.tables.read().await;
        let mut bins: Vec<Bin> = t
            .bins
            .iter()
            .filter(|b| b.tenant_id == tenant_id)
            .filter(|b| filter.status.is_none_or(|s| b.status == s))
            .filter(|b| filter.harvest_batch_id.is_none_or(|id| b.harvest_batch_id == Some(id)))
            .cloned()
            .collect();
        bins.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        bins.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(bins)
    }

    async fn passport_record(&self, qr_code: &str) -> Result<Option<PassportRecord>, AppError> {
        let t = self.tables.read().await;

        let Some(bin) = t
            .bins
            .iter()
            .filter(|b| b.qr_code == qr_code)
            .max_by_key(|b| b.updated_at)
        else {
            return Ok(None);
        };

        let batch = bin
            .harvest_batch_id
            .and_then(|id| t.batches.iter().find(|b| b.id == id));
        let crop = batch.and_then(|hb| t.crops.iter().find(|c| c.id == hb.crop_id));
        let farm = batch.and_then(|hb| t.farms.iter().find(|f| f.id == hb.farm_id));
        let tenant = t.tenants.iter().find(|x| x.id == bin.tenant_id);
        let shipment = bin
            .shipment_id
            .and_then(|id| t.shipments.iter().find(|s| s.id == id));

        Ok(Some(PassportRecord {
            qr_code: bin.qr_code.clone(),
            bin_updated_at: bin.updated_at,
            product_name: crop.map(|c| c.name.clone()),
            variety: crop.and_then(|c| c.variety.clone()),
            origin: farm.map(|f| f.name.clone()),
            location: farm.and_then(|f| f.location.clone()),
            producer: tenant.map(|x| x.name.clone()),
            harvest_date: batch.map(|hb| hb.harvest_date),
            departure_time: shipment.map(|s| s.departure_time),
        }))
    }
}

// =============================================================================
//  DASHBOARD
// =============================================================================

#[async_trait]
impl DashboardRepository for InMemoryStore {
    async fn harvest_weight_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<Decimal, AppError> {
        let t = self.tables.read().await;
        Ok(t.bins
            .iter()
            .filter(|b| b.tenant_id == tenant_id && b.updated_at.date_naive() == day)
            .map(|b| b.weight_kg)
            .sum())
    }

    async fn batches_harvested_on(&self, tenant_id: Uuid, day: NaiveDate) -> Result<i64, AppError> {
        let t = self.tables.read().await;
        let count = t
            .batches
            .iter()
            .filter(|b| b.tenant_id == tenant_id && b.harvest_date.date_naive() == day)
            .count();
        Ok(count as i64)
    }

    async fn daily_weight_since(&self, tenant_id: Uuid, since: NaiveDate) -> Result<Vec<ChartPoint>, AppError> {
        let t = self.tables.read().await;
        // BTreeMap mantém as datas em ordem crescente
        let mut per_day = std::collections::BTreeMap::<NaiveDate, Decimal>::new();
        for bin in t.bins.iter().filter(|b| b.tenant_id == tenant_id) {
            let day = bin.updated_at.date_naive();
            if day >= since {
                *per_day.entry(day).or_default() += bin.weight_kg;
            }
        }
        Ok(per_day
            .into_iter()
            .map(|(day, value)| ChartPoint {
                date: day.format("%Y-%m-%d").to_string(),
                value,
            })
            .collect())
    }
}

// =============================================================================
//  LOGÍSTICA
// =============================================================================

#[async_trait]
impl LogisticsRepository for InMemoryStore {
    async fn create_shipment(
        &self,
        tenant_id: Uuid,
        new: NewShipment,
        bin_ids: &[Uuid],
    ) -> Result<Shipment, AppError> {
        let mut t = self.tables.write().await;

        // Valida tudo antes de escrever qualquer coisa
        let all_available = bin_ids.iter().all(|id| {
            t.bins
                .iter()
                .any(|b| b.id == *id && b.tenant_id == tenant_id && b.shipment_id.is_none())
        });
        if !all_available {
            return Err(AppError::InvalidReference(
                "Uma ou mais caixas não existem, são de outra empresa ou já foram embarcadas.".into(),
            ));
        }

        let shipment = Shipment {
            id: Uuid::new_v4(),
            tenant_id,
            customer_name: new.customer_name,
            destination: new.destination,
            departure_time: new.departure_time,
            truck_plate: new.truck_plate,
            status: ShipmentStatus::Shipped,
        };

        let now = Utc::now();
        for bin in t.bins.iter_mut().filter(|b| bin_ids.contains(&b.id)) {
            bin.shipment_id = Some(shipment.id);
            bin.status = BinStatus::Shipped;
            bin.updated_at = now;
        }
        t.shipments.push(shipment.clone());

        Ok(shipment)
    }

    async fn list_shipments(
        &self,
        tenant_id: Uuid,
        status: Option<ShipmentStatus>,
    ) -> Result<Vec<Shipment>, AppError> {
        let t = self.tables.read().await;
        let mut shipments: Vec<Shipment> = t
            .shipments
            .iter()
            .filter(|s| s.tenant_id == tenant_id && status.is_none_or(|st| s.status == st))
            .cloned()
            .collect();
        shipments.sort_by(|a, b| b.departure_time.cmp(&a.departure_time));
        Ok(shipments)
    }

    async fn find_shipment(&self, tenant_id: Uuid, shipment_id: Uuid) -> Result<Option<Shipment>, AppError> {
        let t = self.tables.read().await;
        Ok(t.shipments
            .iter()
            .find(|s| s.id == shipment_id && s.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_shipment_status(
        &self,
        tenant_id: Uuid,
        shipment_id: Uuid,
        status: ShipmentStatus,
    ) -> Result<Option<Shipment>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.shipments
            .iter_mut()
            .find(|s| s.id == shipment_id && s.tenant_id == tenant_id)
            .map(|s| {
                s.status = status;
                s.clone()
            }))
    }

    async fn create_claim(&self, tenant_id: Uuid, new: NewClaim) -> Result<Claim, AppError> {
        let mut t = self.tables.write().await;

        let Some(shipment) = t
            .shipments
            .iter_mut()
            .find(|s| s.id == new.shipment_id && s.tenant_id == tenant_id)
        else {
            return Err(AppError::InvalidReference("Embarque não encontrado.".into()));
        };
        shipment.status = ShipmentStatus::Disputed;

        let claim = Claim {
            id: Uuid::new_v4(),
            tenant_id,
            shipment_id: new.shipment_id,
            claim_date: new.claim_date,
            reason: new.reason,
            amount_usd: new.amount_usd,
            evidence_url: new.evidence_url,
            internal_notes: new.internal_notes,
            status: ClaimStatus::Open,
            created_at: Utc::now(),
        };
        t.claims.push(claim.clone());
        Ok(claim)
    }

    async fn list_claims(&self, tenant_id: Uuid) -> Result<Vec<Claim>, AppError> {
        let t = self.tables.read().await;
        let mut claims: Vec<Claim> = t.claims.iter().filter(|c| c.tenant_id == tenant_id).cloned().collect();
        claims.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(claims)
    }

    async fn update_claim_status(
        &self,
        tenant_id: Uuid,
        claim_id: Uuid,
        status: ClaimStatus,
    ) -> Result<Option<Claim>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.claims
            .iter_mut()
            .find(|c| c.id == claim_id && c.tenant_id == tenant_id)
            .map(|c| {
                c.status = status;
                c.clone()
            }))
    }
}

// =============================================================================
//  FINANÇAS
// =============================================================================

#[async_trait]
impl FinanceRepository for InMemoryStore {
    async fn create_season(&self, tenant_id: Uuid, new: NewSeason) -> Result<Season, AppError> {
        let now = Utc::now();
        let season = Season {
            id: Uuid::new_v4(),
            tenant_id,
            name: new.name,
            start_date: new.start_date,
            end_date: new.end_date,
            active: new.active,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.seasons.push(season.clone());
        Ok(season)
    }

    async fn list_seasons(&self, tenant_id: Uuid) -> Result<Vec<Season>, AppError> {
        let t = self.tables.read().await;
        let mut seasons: Vec<Season> = t.seasons.iter().filter(|s| s.tenant_id == tenant_id).cloned().collect();
        seasons.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(seasons)
    }

    async fn find_season(&self, tenant_id: Uuid, season_id: Uuid) -> Result<Option<Season>, AppError> {
        let t = self.tables.read().await;
        Ok(t.seasons.iter().find(|s| s.id == season_id && s.tenant_id == tenant_id).cloned())
    }

    async fn create_category(&self, tenant_id: Uuid, new: NewCostCategory) -> Result<CostCategory, AppError> {
        let category = CostCategory {
            id: Uuid::new_v4(),
            tenant_id,
            name: new.name,
            code: new.code,
            color: new.color,
            parent_id: new.parent_id,
        };
        self.tables.write().await.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<CostCategory>, AppError> {
        let t = self.tables.read().await;
        let mut categories: Vec<CostCategory> =
            t.categories.iter().filter(|c| c.tenant_id == tenant_id).cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<Option<CostCategory>, AppError> {
        let t = self.tables.read().await;
        Ok(t.categories
            .iter()
            .find(|c| c.id == category_id && c.tenant_id == tenant_id)
            .cloned())
    }

    async fn set_category_parent(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<CostCategory>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.categories
            .iter_mut()
            .find(|c| c.id == category_id && c.tenant_id == tenant_id)
            .map(|c| {
                c.parent_id = parent_id;
                c.clone()
            }))
    }

    async fn upsert_budget(
        &self,
        tenant_id: Uuid,
        key: BudgetKey,
        amount: Decimal,
    ) -> Result<BudgetUpsert, AppError> {
        let mut t = self.tables.write().await;
        let now = Utc::now();

        if let Some(budget) = t.budgets.iter_mut().find(|b| {
            b.season_id == key.season_id
                && b.farm_id == key.farm_id
                && b.cost_category_id == key.cost_category_id
                && b.month == key.month
                && b.year == key.year
        }) {
            budget.amount = amount;
            budget.updated_at = now;
            return Ok(BudgetUpsert {
                budget: budget.clone(),
                created: false,
            });
        }

        let budget = Budget {
            id: Uuid::new_v4(),
            tenant_id,
            season_id: key.season_id,
            farm_id: key.farm_id,
            cost_category_id: key.cost_category_id,
            month: key.month,
            year: key.year,
            amount,
            created_at: now,
            updated_at: now,
        };
        t.budgets.push(budget.clone());
        Ok(BudgetUpsert {
            budget,
            created: true,
        })
    }

    async fn list_budgets(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Budget>, AppError> {
        let t = self.tables.read().await;
        let mut budgets: Vec<Budget> = t
            .budgets
            .iter()
            .filter(|b| b.tenant_id == tenant_id && b.season_id == season_id && b.farm_id == farm_id)
            .cloned()
            .collect();
        budgets.sort_by_key(|b| (b.year, b.month));
        Ok(budgets)
    }

    async fn create_expense(&self, tenant_id: Uuid, new: NewExpense) -> Result<Expense, AppError> {
        let expense = Expense {
            id: Uuid::new_v4(),
            tenant_id,
            season_id: new.season_id,
            farm_id: new.farm_id,
            cost_category_id: new.cost_category_id,
            description: new.description,
            expense_date: new.expense_date,
            amount: new.amount,
            receipt_url: new.receipt_url,
            created_at: Utc::now(),
        };
        self.tables.write().await.expenses.push(expense.clone());
        Ok(expense)
    }

    async fn list_expenses(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Expense>, AppError> {
        let t = self.tables.read().await;
        let mut expenses: Vec<Expense> = t
            .expenses
            .iter()
            .filter(|e| e.tenant_id == tenant_id && e.season_id == season_id && e.farm_id == farm_id)
            .cloned()
            .collect();
        expenses.sort_by(|a, b| b.expense_date.cmp(&a.expense_date));
        Ok(expenses)
    }

    async fn budget_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        let t = self.tables.read().await;
        Ok(group_totals(
            t.budgets
                .iter()
                .filter(|b| b.tenant_id == tenant_id && b.season_id == season_id && b.farm_id == farm_id)
                .map(|b| (b.cost_category_id, b.amount)),
        ))
    }

    async fn expense_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        let t = self.tables.read().await;
        Ok(group_totals(
            t.expenses
                .iter()
                .filter(|e| e.tenant_id == tenant_id && e.season_id == season_id && e.farm_id == farm_id)
                .map(|e| (e.cost_category_id, e.amount)),
        ))
    }
}

// GROUP BY cost_category_id
fn group_totals(rows: impl Iterator<Item = (Uuid, Decimal)>) -> Vec<CategoryTotal> {
    let mut totals = HashMap::<Uuid, Decimal>::new();
    for (category_id, amount) in rows {
        *totals.entry(category_id).or_default() += amount;
    }
    totals
        .into_iter()
        .map(|(cost_category_id, total)| CategoryTotal {
            cost_category_id,
            total,
        })
        .collect()
}
