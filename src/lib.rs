// src/lib.rs

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{
    config::AppState,
    docs::ApiDoc,
    middleware::{auth::auth_guard, rbac::admin_guard, tenancy::tenant_guard},
};

/// Monta o router completo. Os guardas rodam na ordem auth -> admin -> tenant
/// (a última camada adicionada é a primeira a rodar).
pub fn create_app(app_state: AppState) -> Router {
    // Públicas (sem credencial)
    let public_routes = Router::new()
        .route("/health", get(handlers::public::health))
        .route("/public/passport/{qr_code}", get(handlers::public::get_passport));

    // Qualquer usuário autenticado, sem empresa
    let user_routes = Router::new()
        .route("/tenants", get(handlers::tenancy::list_my_tenants))
        .route("/team/join", post(handlers::team::join_team))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    // Admin, sem empresa
    let admin_routes = Router::new()
        .route("/tenants", post(handlers::tenancy::create_tenant))
        .route_layer(from_fn(admin_guard))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    // Qualquer papel, dentro da empresa
    let tenant_routes = Router::new()
        .route("/farms", get(handlers::land::list_farms))
        .route("/chemicals", get(handlers::compliance::list_chemicals))
        .route("/crops", get(handlers::traceability::list_crops))
        .route("/harvest-batches", get(handlers::traceability::list_batches))
        .route("/applications", post(handlers::compliance::create_application))
        .route("/bins/scan", post(handlers::traceability::scan_bin))
        .route_layer(from_fn_with_state(app_state.clone(), tenant_guard))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    // Admin, dentro da empresa
    let tenant_admin_routes = Router::new()
        .route("/tenants", put(handlers::tenancy::update_tenant))
        .route("/dashboard/stats", get(handlers::dashboard::get_stats))
        // Equipe
        .route("/team", get(handlers::team::list_team))
        .route("/team/invite", post(handlers::team::invite_member))
        // Catálogos
        .route("/farms", post(handlers::land::create_farm))
        .route("/chemicals", post(handlers::compliance::create_chemical))
        .route("/crops", post(handlers::traceability::create_crop))
        .route("/harvest-batches", post(handlers::traceability::create_batch))
        .route("/applications", get(handlers::compliance::list_applications))
        .route("/bins", get(handlers::traceability::list_bins))
        // Terras
        .route(
            "/land/contracts",
            post(handlers::land::create_contract).get(handlers::land::list_contracts),
        )
        .route(
            "/land/contracts/{id}",
            get(handlers::land::get_contract)
                .patch(handlers::land::update_contract_status)
                .delete(handlers::land::delete_contract),
        )
        .route("/land/alerts", get(handlers::land::lease_alerts))
        // Logística
        .route(
            "/shipments",
            post(handlers::logistics::create_shipment).get(handlers::logistics::list_shipments),
        )
        .route(
            "/shipments/{id}",
            get(handlers::logistics::get_shipment).patch(handlers::logistics::update_shipment_status),
        )
        .route(
            "/claims",
            post(handlers::logistics::create_claim).get(handlers::logistics::list_claims),
        )
        .route("/claims/{id}", patch(handlers::logistics::update_claim_status))
        // Finanças
        .route(
            "/finance/seasons",
            post(handlers::finance::create_season).get(handlers::finance::list_seasons),
        )
        .route(
            "/finance/categories",
            post(handlers::finance::create_category).get(handlers::finance::list_categories),
        )
        .route("/finance/categories/{id}", patch(handlers::finance::update_category))
        .route(
            "/finance/budgets",
            post(handlers::finance::upsert_budget).get(handlers::finance::list_budgets),
        )
        .route(
            "/finance/expenses",
            post(handlers::finance::create_expense).get(handlers::finance::list_expenses),
        )
        .route("/finance/report/variance", get(handlers::finance::variance_report))
        .route_layer(from_fn_with_state(app_state.clone(), tenant_guard))
        .route_layer(from_fn(admin_guard))
        .route_layer(from_fn_with_state(app_state.clone(), auth_guard));

    let api = public_routes
        .merge(user_routes)
        .merge(admin_routes)
        .merge(tenant_routes)
        .merge(tenant_admin_routes);

    Router::new()
        .nest("/api", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
