use anyhow::Result;
use compute::recurring::{
    create_recurring_template, delete_recurring_template, list_recurring_templates,
    DatabaseStore, NewRecurringTemplate, RecurringGenerator, RecurringTemplate,
};
use tracing::debug;

use crate::config;

pub async fn add_recurring(
    database_url: &str,
    user_id: i32,
    input: NewRecurringTemplate,
) -> Result<()> {
    let db = config::connect(database_url, false).await?;
    let template = create_recurring_template(&db, user_id, input, config::local_now()).await?;
    println!(
        "Created recurring expense #{} ({}).",
        template.id, template.title
    );
    Ok(())
}

pub async fn list_recurring(database_url: &str, user_id: i32) -> Result<()> {
    let db = config::connect(database_url, false).await?;
    let overviews = list_recurring_templates(&db, user_id).await?;
    let generator = RecurringGenerator::new(DatabaseStore::new(db.clone()));
    debug!("Listing {} recurring expenses", overviews.len());

    if overviews.is_empty() {
        println!("No recurring expenses for user {}.", user_id);
        return Ok(());
    }

    for overview in overviews {
        let template = &overview.template;
        let until = template
            .recurring_end_date
            .map(|end| end.to_string())
            .unwrap_or_else(|| "open".to_string());
        let last = overview
            .last_occurrence
            .map(|date| date.to_string())
            .unwrap_or_else(|| "never".to_string());
        let next = match RecurringTemplate::try_from(template) {
            Ok(valid) => generator
                .next_occurrence_date(&valid)
                .await?
                .filter(|date| valid.end_date.is_none_or(|end| *date <= end))
                .map(|date| date.to_string())
                .unwrap_or_else(|| "none".to_string()),
            Err(reason) => format!("invalid: {}", reason),
        };
        println!(
            "#{} {} {} {} from {} until {} ({} occurrences, last {}, next {})",
            template.id,
            template.title,
            template.amount,
            template.recurring_frequency.as_deref().unwrap_or("-"),
            template
                .recurring_start_date
                .map(|start| start.to_string())
                .unwrap_or_else(|| "-".to_string()),
            until,
            overview.occurrence_count,
            last,
            next
        );
    }
    Ok(())
}

pub async fn delete_recurring(database_url: &str, user_id: i32, template_id: i32) -> Result<()> {
    let db = config::connect(database_url, false).await?;
    let deleted =
        delete_recurring_template(&db, user_id, template_id, config::local_now()).await?;
    println!(
        "Deleted recurring expense {} and {} occurrences.",
        template_id, deleted
    );
    Ok(())
}
