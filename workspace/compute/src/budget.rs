use chrono::{Months, NaiveDate};
use model::entities::budget;
use model::entities::expense::{self, ExpenseType};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Select};
use tracing::{debug, instrument};

use crate::error::{ComputeError, Result};

/// How much of one budget has been used.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub budget: budget::Model,
    pub spent: Decimal,
    /// Negative when the budget is exceeded.
    pub remaining: Decimal,
    /// Spent share of the budget in percent, one decimal place.
    pub percentage: Decimal,
    pub is_over: bool,
}

/// Totals over all budgets of a month.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BudgetSummary {
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub total_remaining: Decimal,
    pub percentage: Decimal,
}

/// First day of the month and first day of the following one.
fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ComputeError::InvalidInput(format!("invalid month {}/{}", month, year)))?;
    let next = first
        .checked_add_months(Months::new(1))
        .ok_or_else(|| ComputeError::InvalidInput(format!("month {}/{} out of range", month, year)))?;
    Ok((first, next))
}

fn percentage(spent: Decimal, amount: Decimal) -> Decimal {
    if amount.is_zero() {
        return Decimal::ZERO;
    }
    (spent / amount * Decimal::ONE_HUNDRED).round_dp(1)
}

/// Live one-time expenses dated within `[from, until)`.
fn spending_between(from: NaiveDate, until: NaiveDate) -> Select<expense::Entity> {
    expense::Entity::find()
        .filter(expense::Column::Kind.eq(ExpenseType::OneTime))
        .filter(expense::Column::DeletedAt.is_null())
        .filter(expense::Column::Date.gte(from))
        .filter(expense::Column::Date.lt(until))
}

async fn sum_amounts(db: &DatabaseConnection, query: Select<expense::Entity>) -> Result<Decimal> {
    let rows = query.all(db).await?;
    Ok(rows.iter().map(|row| row.amount).sum())
}

/// Total spent in a category during the given month.
#[instrument(skip(db))]
pub async fn category_spent_for_month(
    db: &DatabaseConnection,
    category_id: i32,
    month: u32,
    year: i32,
) -> Result<Decimal> {
    let (from, until) = month_bounds(month, year)?;
    let query =
        spending_between(from, until).filter(expense::Column::CategoryId.eq(category_id));
    sum_amounts(db, query).await
}

/// Usage of every budget `user_id` set for the month, with totals.
#[instrument(skip(db))]
pub async fn budget_statuses(
    db: &DatabaseConnection,
    user_id: i32,
    month: u32,
    year: i32,
) -> Result<(Vec<BudgetStatus>, BudgetSummary)> {
    let (from, until) = month_bounds(month, year)?;

    let budgets = budget::Entity::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Month.eq(month as i32))
        .filter(budget::Column::Year.eq(year))
        .order_by_asc(budget::Column::Id)
        .all(db)
        .await?;
    debug!("Found {} budgets for {}/{}", budgets.len(), month, year);

    let mut statuses = Vec::with_capacity(budgets.len());
    let mut summary = BudgetSummary::default();

    for budget in budgets {
        let mut query = spending_between(from, until).filter(expense::Column::UserId.eq(user_id));
        if let Some(category_id) = budget.category_id {
            query = query.filter(expense::Column::CategoryId.eq(category_id));
        }
        let spent = sum_amounts(db, query).await?;

        summary.total_budget += budget.amount;
        summary.total_spent += spent;

        statuses.push(BudgetStatus {
            remaining: budget.amount - spent,
            percentage: percentage(spent, budget.amount),
            is_over: spent > budget.amount,
            spent,
            budget,
        });
    }

    summary.total_remaining = summary.total_budget - summary.total_spent;
    summary.percentage = percentage(summary.total_spent, summary.total_budget);

    Ok((statuses, summary))
}
