use anyhow::Result;
use chrono::NaiveDateTime;
use compute::recurring::{DatabaseStore, GenerationReport, RecurringGenerator, SkipReason};
use tracing::{info, instrument};

use crate::config;

/// Creates the due occurrences of every recurring expense as of `now`.
#[instrument(skip(database_url))]
pub async fn generate_recurring(database_url: &str, now: Option<NaiveDateTime>) -> Result<()> {
    let now = now.unwrap_or_else(config::local_now);
    let db = config::connect(database_url, false).await?;

    let generator = RecurringGenerator::new(DatabaseStore::new(db));
    let report = generator.run(now).await?;
    info!("Recurring generation finished as of {}", now);

    print_report(&report);
    Ok(())
}

fn print_report(report: &GenerationReport) {
    println!(
        "Successfully generated {} recurring expenses.",
        report.generated()
    );

    for skipped in &report.skipped {
        let reason = match &skipped.reason {
            SkipReason::Invalid(reason) => reason.to_string(),
            SkipReason::UnknownFrequency(value) => format!("unknown frequency '{}'", value),
        };
        eprintln!("Skipped recurring expense {}: {}", skipped.template_id, reason);
    }
    for failure in &report.failures {
        eprintln!(
            "Failed recurring expense {}: {}",
            failure.template_id, failure.error
        );
    }
}
