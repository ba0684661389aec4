// src/models/finance.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Structs ---

// O ciclo agrícola (ex: "Tomate 2025")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Tomate 2025")]
    pub name: String,
    #[schema(value_type = String, format = Date, example = "2025-01-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date, example = "2025-12-31")]
    pub end_date: NaiveDate,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSeason {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

// Plano de contas hierárquico (pai/filho por ID)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostCategory {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Fertilizantes")]
    pub name: String,
    #[schema(example = "NUT-001")]
    pub code: Option<String>,
    #[schema(example = "#10b981")]
    pub color: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewCostCategory {
    pub name: String,
    pub code: Option<String>,
    pub color: String,
    pub parent_id: Option<Uuid>,
}

// Nó da árvore devolvida no GET /finance/categories
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostCategoryNode {
    #[serde(flatten)]
    pub category: CostCategory,
    #[schema(no_recursion)]
    pub children: Vec<CostCategoryNode>,
}

// A meta financeira ("quanto planejo gastar")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,
    #[schema(example = 3)]
    pub month: i32,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = "1000.00")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Chave natural do orçamento: (temporada, rancho, categoria, mês, ano)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BudgetKey {
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,
    pub month: i32,
    pub year: i32,
}

// Dinheiro real saindo do caixa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,
    #[schema(example = "Factura F-2034 Proveedor X")]
    pub description: String,
    #[schema(value_type = String, format = Date, example = "2025-03-14")]
    pub expense_date: NaiveDate,
    #[schema(example = "650.00")]
    pub amount: Decimal,
    pub receipt_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub season_id: Uuid,
    pub farm_id: Uuid,
    pub cost_category_id: Uuid,
    pub description: String,
    pub expense_date: NaiveDate,
    pub amount: Decimal,
    pub receipt_url: Option<String>,
}

// Soma agrupada por categoria (orçamentos ou gastos)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryTotal {
    pub cost_category_id: Uuid,
    pub total: Decimal,
}

// Linha do relatório Orçado x Realizado
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VarianceRow {
    pub cost_category_id: Uuid,
    pub category_name: String,
    pub budgeted: Decimal,
    pub spent: Decimal,
    // Orçado - Gasto
    pub variance: Decimal,
}
