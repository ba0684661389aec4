// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Public ---
        handlers::public::health,
        handlers::public::get_passport,

        // --- Tenants ---
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::create_tenant,
        handlers::tenancy::update_tenant,

        // --- Team ---
        handlers::team::invite_member,
        handlers::team::list_team,
        handlers::team::join_team,

        // --- Farms / Land ---
        handlers::land::list_farms,
        handlers::land::create_farm,
        handlers::land::create_contract,
        handlers::land::list_contracts,
        handlers::land::get_contract,
        handlers::land::update_contract_status,
        handlers::land::delete_contract,
        handlers::land::lease_alerts,

        // --- Compliance ---
        handlers::compliance::list_chemicals,
        handlers::compliance::create_chemical,
        handlers::compliance::create_application,
        handlers::compliance::list_applications,

        // --- Traceability ---
        handlers::traceability::list_crops,
        handlers::traceability::create_crop,
        handlers::traceability::list_batches,
        handlers::traceability::create_batch,
        handlers::traceability::scan_bin,
        handlers::traceability::list_bins,

        // --- Logistics ---
        handlers::logistics::create_shipment,
        handlers::logistics::list_shipments,
        handlers::logistics::get_shipment,
        handlers::logistics::update_shipment_status,
        handlers::logistics::create_claim,
        handlers::logistics::list_claims,
        handlers::logistics::update_claim_status,

        // --- Finance ---
        handlers::finance::create_season,
        handlers::finance::list_seasons,
        handlers::finance::create_category,
        handlers::finance::list_categories,
        handlers::finance::update_category,
        handlers::finance::upsert_budget,
        handlers::finance::list_budgets,
        handlers::finance::create_expense,
        handlers::finance::list_expenses,
        handlers::finance::variance_report,

        // --- Dashboard ---
        handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            // --- AUTH / TENANCY ---
            models::auth::UserRole,
            models::tenancy::SubscriptionPlan,
            models::tenancy::InvitationStatus,
            models::tenancy::Tenant,
            models::tenancy::TeamMember,
            models::tenancy::Invitation,
            models::tenancy::TeamOverview,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::UpdateTenantPayload,
            handlers::team::InvitePayload,
            handlers::team::JoinPayload,
            handlers::team::JoinResponse,

            // --- FARMS ---
            models::farm::OwnershipType,
            models::farm::LeaseStatus,
            models::farm::PaymentFrequency,
            models::farm::Farm,
            models::farm::LeaseContract,
            handlers::land::CreateFarmPayload,
            handlers::land::CreateContractPayload,
            handlers::land::UpdateContractStatusPayload,

            // --- COMPLIANCE ---
            models::compliance::ApplicationStatus,
            models::compliance::Chemical,
            models::compliance::ApplicationRecord,
            handlers::compliance::CreateChemicalPayload,
            handlers::compliance::CreateApplicationPayload,

            // --- TRACEABILITY ---
            models::traceability::CropStatus,
            models::traceability::BinStatus,
            models::traceability::Crop,
            models::traceability::HarvestBatch,
            models::traceability::Bin,
            models::traceability::Passport,
            models::traceability::JourneyStage,
            handlers::traceability::CreateCropPayload,
            handlers::traceability::CreateBatchPayload,
            handlers::traceability::ScanBinPayload,
            handlers::public::HealthResponse,

            // --- LOGISTICS ---
            models::logistics::ShipmentStatus,
            models::logistics::ClaimStatus,
            models::logistics::Shipment,
            models::logistics::Claim,
            handlers::logistics::CreateShipmentPayload,
            handlers::logistics::UpdateShipmentStatusPayload,
            handlers::logistics::CreateClaimPayload,
            handlers::logistics::UpdateClaimStatusPayload,

            // --- FINANCE ---
            models::finance::Season,
            models::finance::CostCategory,
            models::finance::CostCategoryNode,
            models::finance::Budget,
            models::finance::Expense,
            models::finance::VarianceRow,
            handlers::finance::CreateSeasonPayload,
            handlers::finance::CreateCategoryPayload,
            handlers::finance::UpdateCategoryPayload,
            handlers::finance::UpsertBudgetPayload,
            handlers::finance::CreateExpensePayload,

            // --- DASHBOARD ---
            models::dashboard::DashboardStats,
            models::dashboard::ChartPoint,
        )
    ),
    tags(
        (name = "Public", description = "Saúde do servidor e Passaporte Digital"),
        (name = "Tenants", description = "Empresas (agrícolas) do usuário"),
        (name = "Team", description = "Equipe e convites"),
        (name = "Farms", description = "Ranchos"),
        (name = "Land", description = "Contratos de arrendamento e alertas de vencimento"),
        (name = "Compliance", description = "Químicos e aplicações fitossanitárias"),
        (name = "Traceability", description = "Cultivos, lotes de colheita e caixas"),
        (name = "Logistics", description = "Embarques e reclamações"),
        (name = "Finance", description = "Temporadas, plano de contas, orçamentos e gastos"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
