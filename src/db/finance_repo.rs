// src/db/finance_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_foreign_key_violation, error::AppError},
    models::finance::{
        Budget, BudgetKey, CategoryTotal, CostCategory, Expense, NewCostCategory, NewExpense,
        NewSeason, Season,
    },
};

/// Resultado do upsert de orçamento: a linha + se foi inserida agora.
#[derive(Debug, Clone)]
pub struct BudgetUpsert {
    pub budget: Budget,
    pub created: bool,
}

#[async_trait]
pub trait FinanceRepository: Send + Sync {
    // --- Temporadas ---
    async fn create_season(&self, tenant_id: Uuid, new: NewSeason) -> Result<Season, AppError>;
    async fn list_seasons(&self, tenant_id: Uuid) -> Result<Vec<Season>, AppError>;
    async fn find_season(&self, tenant_id: Uuid, season_id: Uuid) -> Result<Option<Season>, AppError>;

    // --- Plano de contas ---
    async fn create_category(&self, tenant_id: Uuid, new: NewCostCategory) -> Result<CostCategory, AppError>;
    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<CostCategory>, AppError>;
    async fn find_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<Option<CostCategory>, AppError>;
    async fn set_category_parent(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<CostCategory>, AppError>;

    // --- Orçamentos ---
    /// Upsert pela chave natural (temporada, rancho, categoria, mês, ano).
    async fn upsert_budget(
        &self,
        tenant_id: Uuid,
        key: BudgetKey,
        amount: Decimal,
    ) -> Result<BudgetUpsert, AppError>;
    async fn list_budgets(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Budget>, AppError>;

    // --- Gastos ---
    async fn create_expense(&self, tenant_id: Uuid, new: NewExpense) -> Result<Expense, AppError>;
    async fn list_expenses(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Expense>, AppError>;

    // --- Agregações (Orçado x Realizado) ---
    async fn budget_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError>;
    async fn expense_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError>;
}

#[derive(Clone)]
pub struct PostgresFinanceRepository {
    pool: PgPool,
}

impl PostgresFinanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// `xmax = 0` só é verdade para a linha recém-inserida
#[derive(FromRow)]
struct UpsertedBudget {
    #[sqlx(flatten)]
    budget: Budget,
    inserted: bool,
}

#[async_trait]
impl FinanceRepository for PostgresFinanceRepository {
    async fn create_season(&self, tenant_id: Uuid, new: NewSeason) -> Result<Season, AppError> {
        let season = sqlx::query_as::<_, Season>(
            r#"
            INSERT INTO seasons (tenant_id, name, start_date, end_date, active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&new.name)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(season)
    }

    async fn list_seasons(&self, tenant_id: Uuid) -> Result<Vec<Season>, AppError> {
        let seasons = sqlx::query_as::<_, Season>(
            "SELECT * FROM seasons WHERE tenant_id = $1 ORDER BY start_date DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(seasons)
    }

    async fn find_season(&self, tenant_id: Uuid, season_id: Uuid) -> Result<Option<Season>, AppError> {
        let season = sqlx::query_as::<_, Season>(
            "SELECT * FROM seasons WHERE id = $1 AND tenant_id = $2",
        )
        .bind(season_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(season)
    }

    async fn create_category(&self, tenant_id: Uuid, new: NewCostCategory) -> Result<CostCategory, AppError> {
        sqlx::query_as::<_, CostCategory>(
            r#"
            INSERT INTO cost_categories (tenant_id, name, code, color, parent_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(&new.name)
        .bind(&new.code)
        .bind(&new.color)
        .bind(new.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_foreign_key_violation(e, "Categoria pai não encontrada."))
    }

    async fn list_categories(&self, tenant_id: Uuid) -> Result<Vec<CostCategory>, AppError> {
        let categories = sqlx::query_as::<_, CostCategory>(
            "SELECT * FROM cost_categories WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_category(&self, tenant_id: Uuid, category_id: Uuid) -> Result<Option<CostCategory>, AppError> {
        let category = sqlx::query_as::<_, CostCategory>(
            "SELECT * FROM cost_categories WHERE id = $1 AND tenant_id = $2",
        )
        .bind(category_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn set_category_parent(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Option<CostCategory>, AppError> {
        let category = sqlx::query_as::<_, CostCategory>(
            r#"
            UPDATE cost_categories SET parent_id = $3
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(category_id)
        .bind(tenant_id)
        .bind(parent_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn upsert_budget(
        &self,
        tenant_id: Uuid,
        key: BudgetKey,
        amount: Decimal,
    ) -> Result<BudgetUpsert, AppError> {
        let row = sqlx::query_as::<_, UpsertedBudget>(
            r#"
            INSERT INTO budgets (tenant_id, season_id, farm_id, cost_category_id, month, year, amount)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (season_id, farm_id, cost_category_id, month, year) DO UPDATE
            SET amount = EXCLUDED.amount, updated_at = NOW()
            RETURNING *, (xmax = 0) AS inserted
            "#,
        )
        .bind(tenant_id)
        .bind(key.season_id)
        .bind(key.farm_id)
        .bind(key.cost_category_id)
        .bind(key.month)
        .bind(key.year)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(BudgetUpsert {
            budget: row.budget,
            created: row.inserted,
        })
    }

    async fn list_budgets(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Budget>, AppError> {
        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT * FROM budgets
            WHERE tenant_id = $1 AND season_id = $2 AND farm_id = $3
            ORDER BY year ASC, month ASC
            "#,
        )
        .bind(tenant_id)
        .bind(season_id)
        .bind(farm_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    async fn create_expense(&self, tenant_id: Uuid, new: NewExpense) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses
                (tenant_id, season_id, farm_id, cost_category_id, description, expense_date, amount, receipt_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(new.season_id)
        .bind(new.farm_id)
        .bind(new.cost_category_id)
        .bind(&new.description)
        .bind(new.expense_date)
        .bind(new.amount)
        .bind(&new.receipt_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    async fn list_expenses(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE tenant_id = $1 AND season_id = $2 AND farm_id = $3
            ORDER BY expense_date DESC
            "#,
        )
        .bind(tenant_id)
        .bind(season_id)
        .bind(farm_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    async fn budget_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT cost_category_id, SUM(amount) AS total
            FROM budgets
            WHERE tenant_id = $1 AND season_id = $2 AND farm_id = $3
            GROUP BY cost_category_id
            "#,
        )
        .bind(tenant_id)
        .bind(season_id)
        .bind(farm_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }

    async fn expense_totals(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<CategoryTotal>, AppError> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT cost_category_id, SUM(amount) AS total
            FROM expenses
            WHERE tenant_id = $1 AND season_id = $2 AND farm_id = $3
            GROUP BY cost_category_id
            "#,
        )
        .bind(tenant_id)
        .bind(season_id)
        .bind(farm_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
