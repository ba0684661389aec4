// src/handlers/finance.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    handlers::JsonBody,
    middleware::tenancy::TenantContext,
    models::finance::{
        Budget, BudgetKey, CostCategory, CostCategoryNode, Expense, NewCostCategory, NewExpense,
        NewSeason, Season, VarianceRow,
    },
};

const DEFAULT_CATEGORY_COLOR: &str = "#10b981";

// Filtro comum: (temporada, rancho)
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SeasonFarmQuery {
    pub season_id: Uuid,
    pub farm_id: Uuid,
}

// =============================================================================
//  1. TEMPORADAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSeasonPayload {
    #[validate(length(min = 1, message = "O nome da temporada é obrigatório."))]
    #[schema(example = "Tomate 2025")]
    pub name: String,

    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,

    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub end_date: NaiveDate,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// POST /api/finance/seasons
#[utoipa::path(
    post,
    path = "/api/finance/seasons",
    tag = "Finance",
    request_body = CreateSeasonPayload,
    responses(
        (status = 201, description = "Temporada criada", body = Season)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_season(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateSeasonPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let season = app_state
        .finance_service
        .create_season(
            tenant.0,
            NewSeason {
                name: payload.name,
                start_date: payload.start_date,
                end_date: payload.end_date,
                active: payload.active,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(season)))
}

// GET /api/finance/seasons
#[utoipa::path(
    get,
    path = "/api/finance/seasons",
    tag = "Finance",
    responses(
        (status = 200, description = "Temporadas, mais recentes primeiro", body = Vec<Season>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_seasons(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let seasons = app_state.finance_service.list_seasons(tenant.0).await?;
    Ok(Json(seasons))
}

// =============================================================================
//  2. PLANO DE CONTAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    #[validate(length(min = 1, message = "O nome da categoria é obrigatório."))]
    #[schema(example = "Fertilizantes")]
    pub name: String,

    #[schema(example = "NUT-001")]
    pub code: Option<String>,

    #[schema(example = "#10b981")]
    pub color: Option<String>,

    pub parent_id: Option<Uuid>,
}

// `parentId: null` move a categoria para a raiz
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPayload {
    pub parent_id: Option<Uuid>,
}

// POST /api/finance/categories
#[utoipa::path(
    post,
    path = "/api/finance/categories",
    tag = "Finance",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = CostCategory),
        (status = 400, description = "Categoria pai de outra empresa")
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let color = payload
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());

    let category = app_state
        .finance_service
        .create_category(
            tenant.0,
            NewCostCategory {
                name: payload.name,
                code: payload.code,
                color,
                parent_id: payload.parent_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/finance/categories
#[utoipa::path(
    get,
    path = "/api/finance/categories",
    tag = "Finance",
    responses(
        (status = 200, description = "Árvore de categorias (raízes com filhos aninhados)", body = Vec<CostCategoryNode>)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let tree = app_state.finance_service.category_tree(tenant.0).await?;
    Ok(Json(tree))
}

// PATCH /api/finance/categories/{id}
#[utoipa::path(
    patch,
    path = "/api/finance/categories/{id}",
    tag = "Finance",
    request_body = UpdateCategoryPayload,
    responses(
        (status = 200, description = "Categoria movida", body = CostCategory),
        (status = 400, description = "Movimento criaria um ciclo"),
        (status = 404, description = "Categoria não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Categoria"),
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateCategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    let category = app_state
        .finance_service
        .set_parent(tenant.0, id, payload.parent_id)
        .await?;
    Ok(Json(category))
}

// =============================================================================
//  3. ORÇAMENTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBudgetPayload {
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,

    #[validate(range(min = 1, max = 12, message = "O mês deve estar entre 1 e 12."))]
    #[schema(example = 3)]
    pub month: i32,

    #[validate(range(min = 2000, max = 2100, message = "Ano inválido."))]
    #[schema(example = 2025)]
    pub year: i32,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "1000.00")]
    pub amount: Decimal,
}

// POST /api/finance/budgets
#[utoipa::path(
    post,
    path = "/api/finance/budgets",
    tag = "Finance",
    request_body = UpsertBudgetPayload,
    responses(
        (status = 201, description = "Orçamento criado", body = Budget),
        (status = 200, description = "Orçamento existente atualizado", body = Budget)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn upsert_budget(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<UpsertBudgetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let key = BudgetKey {
        season_id: payload.season_id,
        farm_id: payload.farm_id,
        cost_category_id: payload.cost_category_id,
        month: payload.month,
        year: payload.year,
    };

    let result = app_state
        .finance_service
        .upsert_budget(tenant.0, key, payload.amount)
        .await?;

    let status = if result.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(result.budget)))
}

// GET /api/finance/budgets
#[utoipa::path(
    get,
    path = "/api/finance/budgets",
    tag = "Finance",
    responses(
        (status = 200, description = "Orçamentos da temporada no rancho", body = Vec<Budget>)
    ),
    params(
        SeasonFarmQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_budgets(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SeasonFarmQuery>,
) -> Result<impl IntoResponse, AppError> {
    let budgets = app_state
        .finance_service
        .list_budgets(tenant.0, query.season_id, query.farm_id)
        .await?;
    Ok(Json(budgets))
}

// =============================================================================
//  4. GASTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpensePayload {
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,

    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    #[schema(example = "Factura F-2034 Proveedor X")]
    pub description: String,

    // Sem data = hoje
    #[schema(value_type = Option<String>, format = Date, example = "2025-03-14")]
    pub expense_date: Option<NaiveDate>,

    #[validate(custom(function = "crate::handlers::validate_not_negative"))]
    #[schema(example = "650.00")]
    pub amount: Decimal,

    pub receipt_url: Option<String>,
}

// POST /api/finance/expenses
#[utoipa::path(
    post,
    path = "/api/finance/expenses",
    tag = "Finance",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, description = "Gasto registrado", body = Expense)
    ),
    params(
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    WithRejection(Json(payload), _): JsonBody<CreateExpensePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let expense = app_state
        .finance_service
        .create_expense(
            tenant.0,
            NewExpense {
                season_id: payload.season_id,
                farm_id: payload.farm_id,
                cost_category_id: payload.cost_category_id,
                description: payload.description,
                expense_date: payload
                    .expense_date
                    .unwrap_or_else(|| Utc::now().date_naive()),
                amount: payload.amount,
                receipt_url: payload.receipt_url,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

// GET /api/finance/expenses
#[utoipa::path(
    get,
    path = "/api/finance/expenses",
    tag = "Finance",
    responses(
        (status = 200, description = "Gastos da temporada no rancho", body = Vec<Expense>)
    ),
    params(
        SeasonFarmQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SeasonFarmQuery>,
) -> Result<impl IntoResponse, AppError> {
    let expenses = app_state
        .finance_service
        .list_expenses(tenant.0, query.season_id, query.farm_id)
        .await?;
    Ok(Json(expenses))
}

// =============================================================================
//  5. RELATÓRIO ORÇADO x REALIZADO
// =============================================================================

// GET /api/finance/report/variance
#[utoipa::path(
    get,
    path = "/api/finance/report/variance",
    tag = "Finance",
    responses(
        (status = 200, description = "Orçado x gasto por categoria, ordenado por nome", body = Vec<VarianceRow>)
    ),
    params(
        SeasonFarmQuery,
        ("x-tenant-id" = Option<Uuid>, Header, description = "ID da Empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn variance_report(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SeasonFarmQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state
        .finance_service
        .variance_report(tenant.0, query.season_id, query.farm_id)
        .await?;
    Ok(Json(rows))
}
