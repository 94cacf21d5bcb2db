use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use compute::budget::{budget_statuses, category_spent_for_month};
use model::entities::category;

use crate::config;

pub async fn budget_status(
    database_url: &str,
    user_id: i32,
    month: Option<u32>,
    year: Option<i32>,
) -> Result<()> {
    let today: NaiveDate = config::local_now().date();
    let month = month.unwrap_or_else(|| today.month());
    let year = year.unwrap_or_else(|| today.year());

    let db = config::connect(database_url, false).await?;
    let (statuses, summary) = budget_statuses(&db, user_id, month, year).await?;

    let categories = category::Model::find_for_user(&db, user_id).await?;
    if !categories.is_empty() {
        println!("Spending by category for {:02}/{}", month, year);
        for category in &categories {
            let spent = category_spent_for_month(&db, category.id, month, year).await?;
            println!("{}: {}", category.name, spent);
        }
    }

    if statuses.is_empty() {
        println!("No budgets for {:02}/{}.", month, year);
        return Ok(());
    }

    println!("Budgets for {:02}/{}", month, year);
    for status in &statuses {
        let name = match status.budget.category_id {
            Some(category_id) => categories
                .iter()
                .find(|category| category.id == category_id)
                .map(|category| category.name.clone())
                .unwrap_or_else(|| format!("category {}", category_id)),
            None => "All categories".to_string(),
        };
        println!(
            "{}: spent {} of {} ({}%), remaining {}{}",
            name,
            status.spent,
            status.budget.amount,
            status.percentage,
            status.remaining,
            if status.is_over { " OVER BUDGET" } else { "" }
        );
    }
    println!(
        "Total: spent {} of {} ({}%), remaining {}",
        summary.total_spent, summary.total_budget, summary.percentage, summary.total_remaining
    );
    Ok(())
}
