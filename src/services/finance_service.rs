// src/services/finance_service.rs

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{FarmRepository, FinanceRepository, finance_repo::BudgetUpsert},
    models::finance::{
        Budget, BudgetKey, CategoryTotal, CostCategory, CostCategoryNode, Expense, NewCostCategory,
        NewExpense, NewSeason, Season, VarianceRow,
    },
};

#[derive(Clone)]
pub struct FinanceService {
    finance_repo: Arc<dyn FinanceRepository>,
    farm_repo: Arc<dyn FarmRepository>,
}

impl FinanceService {
    pub fn new(finance_repo: Arc<dyn FinanceRepository>, farm_repo: Arc<dyn FarmRepository>) -> Self {
        Self { finance_repo, farm_repo }
    }

    // =========================================================================
    //  TEMPORADAS
    // =========================================================================

    pub async fn create_season(&self, tenant_id: Uuid, new: NewSeason) -> Result<Season, AppError> {
        if new.end_date < new.start_date {
            return Err(AppError::BusinessRule(
                "A data de término da temporada não pode ser anterior ao início.".into(),
            ));
        }
        self.finance_repo.create_season(tenant_id, new).await
    }

    pub async fn list_seasons(&self, tenant_id: Uuid) -> Result<Vec<Season>, AppError> {
        self.finance_repo.list_seasons(tenant_id).await
    }

    // =========================================================================
    //  PLANO DE CONTAS
    // =========================================================================

    pub async fn create_category(&self, tenant_id: Uuid, new: NewCostCategory) -> Result<CostCategory, AppError> {
        if let Some(parent_id) = new.parent_id {
            if self.finance_repo.find_category(tenant_id, parent_id).await?.is_none() {
                return Err(AppError::InvalidReference("Categoria pai não encontrada.".into()));
            }
        }
        self.finance_repo.create_category(tenant_id, new).await
    }

    /// Árvore de categorias: só as raízes no topo, filhos aninhados.
    pub async fn category_tree(&self, tenant_id: Uuid) -> Result<Vec<CostCategoryNode>, AppError> {
        let categories = self.finance_repo.list_categories(tenant_id).await?;
        Ok(build_tree(categories))
    }

    /// Move a categoria para outro pai (ou para a raiz). Ciclos são recusados.
    pub async fn set_parent(
        &self,
        tenant_id: Uuid,
        category_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<CostCategory, AppError> {
        let categories = self.finance_repo.list_categories(tenant_id).await?;

        if !categories.iter().any(|c| c.id == category_id) {
            return Err(AppError::NotFound("Categoria não encontrada.".into()));
        }

        if let Some(parent_id) = parent_id {
            if !categories.iter().any(|c| c.id == parent_id) {
                return Err(AppError::InvalidReference("Categoria pai não encontrada.".into()));
            }
            if creates_cycle(&categories, category_id, parent_id) {
                return Err(AppError::BusinessRule(
                    "A categoria não pode ficar abaixo de si mesma ou de um descendente.".into(),
                ));
            }
        }

        self.finance_repo
            .set_category_parent(tenant_id, category_id, parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Categoria não encontrada.".into()))
    }

    // =========================================================================
    //  ORÇAMENTOS E GASTOS
    // =========================================================================

    /// Upsert pela chave natural. `created` diz se a linha é nova (201) ou atualizada (200).
    pub async fn upsert_budget(&self, tenant_id: Uuid, key: BudgetKey, amount: Decimal) -> Result<BudgetUpsert, AppError> {
        if !(1..=12).contains(&key.month) {
            return Err(AppError::BusinessRule("O mês deve estar entre 1 e 12.".into()));
        }
        self.ensure_references(tenant_id, key.season_id, key.farm_id, key.cost_category_id)
            .await?;

        let result = self.finance_repo.upsert_budget(tenant_id, key, amount).await?;
        tracing::info!(
            budget_id = %result.budget.id,
            created = result.created,
            "Orçamento gravado"
        );
        Ok(result)
    }

    pub async fn list_budgets(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Budget>, AppError> {
        self.finance_repo.list_budgets(tenant_id, season_id, farm_id).await
    }

    pub async fn create_expense(&self, tenant_id: Uuid, new: NewExpense) -> Result<Expense, AppError> {
        self.ensure_references(tenant_id, new.season_id, new.farm_id, new.cost_category_id)
            .await?;
        self.finance_repo.create_expense(tenant_id, new).await
    }

    pub async fn list_expenses(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<Expense>, AppError> {
        self.finance_repo.list_expenses(tenant_id, season_id, farm_id).await
    }

    // =========================================================================
    //  ORÇADO x REALIZADO
    // =========================================================================

    pub async fn variance_report(&self, tenant_id: Uuid, season_id: Uuid, farm_id: Uuid) -> Result<Vec<VarianceRow>, AppError> {
        // Duas somas independentes, unidas por categoria
        let budgets = self.finance_repo.budget_totals(tenant_id, season_id, farm_id).await?;
        let expenses = self.finance_repo.expense_totals(tenant_id, season_id, farm_id).await?;
        let categories = self.finance_repo.list_categories(tenant_id).await?;

        Ok(merge_variance(&budgets, &expenses, &categories))
    }

    async fn ensure_references(
        &self,
        tenant_id: Uuid,
        season_id: Uuid,
        farm_id: Uuid,
        category_id: Uuid,
    ) -> Result<(), AppError> {
        if self.finance_repo.find_season(tenant_id, season_id).await?.is_none() {
            return Err(AppError::InvalidReference("Temporada não encontrada.".into()));
        }
        if self.farm_repo.find_farm(tenant_id, farm_id).await?.is_none() {
            return Err(AppError::InvalidReference("Rancho não encontrado.".into()));
        }
        if self.finance_repo.find_category(tenant_id, category_id).await?.is_none() {
            return Err(AppError::InvalidReference("Categoria não encontrada.".into()));
        }
        Ok(())
    }
}

/// Sobe a partir do novo pai; se encontrar a própria categoria, há ciclo.
fn creates_cycle(categories: &[CostCategory], category_id: Uuid, new_parent: Uuid) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> = categories.iter().map(|c| (c.id, c.parent_id)).collect();

    let mut current = Some(new_parent);
    let mut visited = BTreeSet::new();
    while let Some(id) = current {
        if id == category_id {
            return true;
        }
        // Dado já corrompido: não fica em loop
        if !visited.insert(id) {
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

fn build_tree(categories: Vec<CostCategory>) -> Vec<CostCategoryNode> {
    let mut children_of: HashMap<Option<Uuid>, Vec<CostCategory>> = HashMap::new();
    for category in categories {
        children_of.entry(category.parent_id).or_default().push(category);
    }

    fn attach(parent: Option<Uuid>, children_of: &mut HashMap<Option<Uuid>, Vec<CostCategory>>) -> Vec<CostCategoryNode> {
        let Some(mut level) = children_of.remove(&parent) else {
            return Vec::new();
        };
        level.sort_by(|a, b| a.name.cmp(&b.name));
        level
            .into_iter()
            .map(|category| {
                let children = attach(Some(category.id), children_of);
                CostCategoryNode { category, children }
            })
            .collect()
    }

    attach(None, &mut children_of)
}

fn merge_variance(
    budgets: &[CategoryTotal],
    expenses: &[CategoryTotal],
    categories: &[CostCategory],
) -> Vec<VarianceRow> {
    let mut totals: HashMap<Uuid, (Decimal, Decimal)> = HashMap::new();
    for b in budgets {
        totals.entry(b.cost_category_id).or_default().0 += b.total;
    }
    for e in expenses {
        totals.entry(e.cost_category_id).or_default().1 += e.total;
    }

    let names: HashMap<Uuid, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let mut rows: Vec<VarianceRow> = totals
        .into_iter()
        .map(|(cost_category_id, (budgeted, spent))| VarianceRow {
            cost_category_id,
            category_name: names.get(&cost_category_id).copied().unwrap_or_default().to_string(),
            budgeted,
            spent,
            variance: budgeted - spent,
        })
        .collect();

    rows.sort_by(|a, b| a.category_name.cmp(&b.category_name));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::farm::{NewFarm, OwnershipType};
    use chrono::NaiveDate;

    struct Fixture {
        svc: FinanceService,
        tenant_id: Uuid,
        season_id: Uuid,
        farm_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let svc = FinanceService::new(Arc::new(store.clone()), Arc::new(store.clone()));
        let tenant_id = Uuid::new_v4();
        let farm = store
            .create_farm(
                tenant_id,
                NewFarm {
                    name: "El Sauz".into(),
                    total_area: Decimal::new(10, 0),
                    location: None,
                    ownership_type: OwnershipType::Own,
                },
            )
            .await
            .unwrap();
        let season = svc
            .create_season(
                tenant_id,
                NewSeason {
                    name: "Tomate 2025".into(),
                    start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                    active: true,
                },
            )
            .await
            .unwrap();
        Fixture {
            svc,
            tenant_id,
            season_id: season.id,
            farm_id: farm.id,
        }
    }

    async fn category(f: &Fixture, name: &str, parent_id: Option<Uuid>) -> CostCategory {
        f.svc
            .create_category(
                f.tenant_id,
                NewCostCategory {
                    name: name.into(),
                    code: None,
                    color: "#10b981".into(),
                    parent_id,
                },
            )
            .await
            .unwrap()
    }

    fn key(f: &Fixture, category_id: Uuid, month: i32) -> BudgetKey {
        BudgetKey {
            season_id: f.season_id,
            farm_id: f.farm_id,
            cost_category_id: category_id,
            month,
            year: 2025,
        }
    }

    fn expense(f: &Fixture, category_id: Uuid, amount: Decimal) -> NewExpense {
        NewExpense {
            season_id: f.season_id,
            farm_id: f.farm_id,
            cost_category_id: category_id,
            description: "Factura".into(),
            expense_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            amount,
            receipt_url: None,
        }
    }

    #[tokio::test]
    async fn budget_upsert_updates_in_place() {
        let f = fixture().await;
        let c = category(&f, "Fertilizantes", None).await;

        let first = f.svc.upsert_budget(f.tenant_id, key(&f, c.id, 3), Decimal::new(500, 0)).await.unwrap();
        let second = f.svc.upsert_budget(f.tenant_id, key(&f, c.id, 3), Decimal::new(800, 0)).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.budget.id, second.budget.id);

        let budgets = f.svc.list_budgets(f.tenant_id, f.season_id, f.farm_id).await.unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0].amount, Decimal::new(800, 0));
    }

    #[tokio::test]
    async fn variance_merges_missing_sides_with_zero() {
        let f = fixture().await;
        let c1 = category(&f, "C1", None).await;
        let c2 = category(&f, "C2", None).await;

        f.svc.upsert_budget(f.tenant_id, key(&f, c1.id, 1), Decimal::new(1000, 0)).await.unwrap();
        f.svc.create_expense(f.tenant_id, expense(&f, c1.id, Decimal::new(650, 0))).await.unwrap();
        f.svc.create_expense(f.tenant_id, expense(&f, c2.id, Decimal::new(200, 0))).await.unwrap();

        let rows = f.svc.variance_report(f.tenant_id, f.season_id, f.farm_id).await.unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].category_name, "C1");
        assert_eq!(rows[0].budgeted, Decimal::new(1000, 0));
        assert_eq!(rows[0].spent, Decimal::new(650, 0));
        assert_eq!(rows[0].variance, Decimal::new(350, 0));

        assert_eq!(rows[1].category_name, "C2");
        assert_eq!(rows[1].budgeted, Decimal::ZERO);
        assert_eq!(rows[1].spent, Decimal::new(200, 0));
        assert_eq!(rows[1].variance, Decimal::new(-200, 0));
    }

    #[tokio::test]
    async fn budget_with_foreign_farm_is_invalid_reference() {
        let f = fixture().await;
        let c = category(&f, "C", None).await;
        let mut k = key(&f, c.id, 1);
        k.farm_id = Uuid::new_v4();

        let err = f.svc.upsert_budget(f.tenant_id, k, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn season_ending_before_start_is_rejected() {
        let f = fixture().await;
        let err = f
            .svc
            .create_season(
                f.tenant_id,
                NewSeason {
                    name: "Errada".into(),
                    start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                    end_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                    active: false,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn tree_nests_children_under_roots() {
        let f = fixture().await;
        let root = category(&f, "Insumos", None).await;
        category(&f, "Fertilizantes", Some(root.id)).await;
        category(&f, "Mano de obra", None).await;

        let tree = f.svc.category_tree(f.tenant_id).await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].category.name, "Insumos");
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].category.name, "Fertilizantes");
    }

    #[tokio::test]
    async fn reparenting_under_a_descendant_is_rejected() {
        let f = fixture().await;
        let a = category(&f, "A", None).await;
        let b = category(&f, "B", Some(a.id)).await;
        let c = category(&f, "C", Some(b.id)).await;

        let err = f.svc.set_parent(f.tenant_id, a.id, Some(c.id)).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        let self_parent = f.svc.set_parent(f.tenant_id, a.id, Some(a.id)).await.unwrap_err();
        assert!(matches!(self_parent, AppError::BusinessRule(_)));

        // Árvore intacta
        let tree = f.svc.category_tree(f.tenant_id).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].category.id, a.id);
    }

    #[tokio::test]
    async fn moving_to_root_is_allowed() {
        let f = fixture().await;
        let a = category(&f, "A", None).await;
        let b = category(&f, "B", Some(a.id)).await;

        let moved = f.svc.set_parent(f.tenant_id, b.id, None).await.unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(f.svc.category_tree(f.tenant_id).await.unwrap().len(), 2);
    }
}
