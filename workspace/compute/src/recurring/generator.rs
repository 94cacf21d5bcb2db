use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, error, info, instrument, trace, warn};

use super::store::{ChildDates, InsertOutcome, OccurrenceStore};
use super::template::RecurringTemplate;
use crate::error::{ComputeError, Result, TemplateError};

/// An occurrence row created during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedOccurrence {
    pub template_id: i32,
    pub expense_id: i32,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The template row failed validation.
    Invalid(TemplateError),
    /// The stored frequency is not one the generator understands.
    UnknownFrequency(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedTemplate {
    pub template_id: i32,
    pub reason: SkipReason,
}

/// A template whose processing stopped on a store error.
#[derive(Debug)]
pub struct TemplateFailure {
    pub template_id: i32,
    pub error: ComputeError,
}

/// Summary of one generator run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Live recurring templates looked at, skipped ones included.
    pub templates_processed: usize,
    pub occurrences: Vec<GeneratedOccurrence>,
    pub skipped: Vec<SkippedTemplate>,
    pub failures: Vec<TemplateFailure>,
}

impl GenerationReport {
    /// Number of occurrence rows inserted.
    pub fn generated(&self) -> usize {
        self.occurrences.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Materializes the due occurrences of every recurring template.
///
/// Each run walks a template's schedule from its start date up to the run
/// date (or the template's end date when that comes first) and creates one
/// auto-generated child row for every date that has none. Dates whose child
/// was soft-deleted stay empty. Running twice with the same `now` creates
/// nothing the second time.
pub struct RecurringGenerator<S> {
    store: S,
}

impl<S: OccurrenceStore> RecurringGenerator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Processes all live recurring templates as of `now`.
    ///
    /// Only a failure to load the templates fails the run. Errors while
    /// handling a single template end up in [`GenerationReport::failures`].
    #[instrument(skip(self), fields(now = %now))]
    pub async fn run(&self, now: NaiveDateTime) -> Result<GenerationReport> {
        let rows = self.store.recurring_templates().await?;
        let mut report = GenerationReport::default();

        for row in &rows {
            if row.is_deleted() || !row.is_recurring() {
                trace!("Ignoring expense {}: not a live recurring template", row.id);
                continue;
            }
            report.templates_processed += 1;

            let template = match RecurringTemplate::try_from(row) {
                Ok(template) => template,
                Err(reason) => {
                    warn!("Skipping recurring template {}: {}", row.id, reason);
                    report.skipped.push(SkippedTemplate {
                        template_id: row.id,
                        reason: SkipReason::Invalid(reason),
                    });
                    continue;
                }
            };

            if template.frequency.is_none() {
                warn!(
                    "Skipping recurring template {}: unknown frequency '{}'",
                    template.id, template.raw_frequency
                );
                report.skipped.push(SkippedTemplate {
                    template_id: template.id,
                    reason: SkipReason::UnknownFrequency(template.raw_frequency.clone()),
                });
                continue;
            }

            match self
                .generate_for_template(&template, now, &mut report.occurrences)
                .await
            {
                Ok(count) => debug!("Template {} produced {} occurrences", template.id, count),
                Err(err) => {
                    error!(
                        "Failed to generate occurrences for template {}: {}",
                        template.id, err
                    );
                    report.failures.push(TemplateFailure {
                        template_id: template.id,
                        error: err,
                    });
                }
            }
        }

        info!(
            "Generated {} recurring expenses from {} templates ({} skipped, {} failed)",
            report.generated(),
            report.templates_processed,
            report.skipped.len(),
            report.failures.len()
        );
        Ok(report)
    }

    /// First schedule date of `template` that has no child row yet.
    ///
    /// `None` when the frequency is unknown or the schedule runs past the
    /// representable calendar.
    pub async fn next_occurrence_date(
        &self,
        template: &RecurringTemplate,
    ) -> Result<Option<NaiveDate>> {
        let Some(schedule) = template.schedule() else {
            return Ok(None);
        };
        let children = self.store.child_dates(template.id).await?;
        Ok(children.first_open_date(&schedule))
    }

    /// Creates every due occurrence of one template and returns how many were
    /// inserted. Created rows are appended to `generated` as they are stored,
    /// so they are kept even if a later insert fails.
    #[instrument(skip(self, template, generated), fields(template_id = template.id))]
    pub async fn generate_for_template(
        &self,
        template: &RecurringTemplate,
        now: NaiveDateTime,
        generated: &mut Vec<GeneratedOccurrence>,
    ) -> Result<usize> {
        let today = now.date();
        let Some(schedule) = template.schedule() else {
            return Ok(0);
        };

        let children = self.store.child_dates(template.id).await?;
        let Some(next_due) = children.first_open_date(&schedule) else {
            return Ok(0);
        };

        if !template.should_generate(next_due, today) {
            trace!("Template {} next due on {}, nothing to do", template.id, next_due);
            return Ok(0);
        }

        let mut count = 0;
        for date in schedule.occurrences_between(next_due, template.generation_limit(today)) {
            if children.is_taken(date) {
                continue;
            }
            if self.store.occurrence_exists(template.id, date).await? {
                trace!("Template {} already has an occurrence on {}", template.id, date);
                continue;
            }

            match self.store.insert_occurrence(template, date, now).await? {
                InsertOutcome::Inserted(row) => {
                    info!("Generated {} for date {}", template.title, date);
                    generated.push(GeneratedOccurrence {
                        template_id: template.id,
                        expense_id: row.id,
                        date,
                    });
                    count += 1;
                }
                InsertOutcome::Duplicate => {
                    debug!("Occurrence of template {} on {} was stored concurrently", template.id, date);
                }
            }
        }

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use model::entities::expense::{self, ExpenseType};
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

    use super::*;
    use crate::recurring::store::DatabaseStore;
    use crate::testing::helpers::{
        at, date, live_occurrence_dates, new_occurrence, new_template, new_user, soft_delete,
    };
    use crate::testing::setup_db;

    fn generator(db: &DatabaseConnection) -> RecurringGenerator<DatabaseStore> {
        RecurringGenerator::new(DatabaseStore::new(db.clone()))
    }

    #[tokio::test]
    async fn test_daily_catch_up() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;

        let now = date(2024, 1, 5).and_hms_opt(0, 0, 0).unwrap();
        let report = generator(&db).run(now).await.unwrap();

        assert_eq!(report.generated(), 5);
        assert_eq!(report.templates_processed, 1);
        assert!(!report.has_failures());
        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            (1..=5).map(|day| date(2024, 1, day)).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_generated_rows_copy_the_template() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "weekly", date(2024, 1, 1), None, 42).await?;

        let now = at(2024, 1, 1);
        let report = generator(&db).run(now).await.unwrap();
        assert_eq!(report.generated(), 1);

        let generated = &report.occurrences[0];
        assert_eq!(generated.template_id, template.id);
        assert_eq!(generated.date, date(2024, 1, 1));

        let row = expense::Entity::find_by_id(generated.expense_id)
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(row.kind, ExpenseType::OneTime);
        assert_eq!(row.parent_expense_id, Some(template.id));
        assert!(row.is_auto_generated);
        assert_eq!(row.user_id, user.id);
        assert_eq!(row.amount, Decimal::new(4200, 2));
        assert_eq!(row.title, template.title);
        assert_eq!(row.description, template.description);
        assert_eq!(row.recurring_frequency, None);
        assert_eq!(row.created_at, now);
        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_end_of_month_in_leap_year() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "monthly", date(2024, 1, 31), None, 10).await?;

        generator(&db).run(at(2024, 4, 1)).await.unwrap();

        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_monthly_end_of_month_in_common_year() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "monthly", date(2023, 1, 31), None, 10).await?;

        generator(&db).run(at(2023, 3, 31)).await.unwrap();

        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            vec![date(2023, 1, 31), date(2023, 2, 28), date(2023, 3, 31)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_stops_at_end_date() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(
            &db,
            &user,
            "weekly",
            date(2024, 1, 1),
            Some(date(2024, 1, 10)),
            10,
        )
        .await?;

        let report = generator(&db).run(at(2024, 2, 1)).await.unwrap();

        assert_eq!(report.generated(), 2);
        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            vec![date(2024, 1, 1), date(2024, 1, 8)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_frequency_does_not_block_others() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let biweekly = new_template(&db, &user, "biweekly", date(2024, 1, 1), None, 10).await?;
        let daily = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;

        let report = generator(&db).run(at(2024, 1, 3)).await.unwrap();

        assert_eq!(report.templates_processed, 2);
        assert_eq!(
            report.skipped,
            vec![SkippedTemplate {
                template_id: biweekly.id,
                reason: SkipReason::UnknownFrequency("biweekly".to_string()),
            }]
        );
        assert!(!report.has_failures());
        assert!(live_occurrence_dates(&db, biweekly.id).await?.is_empty());
        assert_eq!(live_occurrence_dates(&db, daily.id).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_frequency_with_wrong_case_is_unknown() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "Monthly", date(2024, 1, 1), None, 10).await?;

        let report = generator(&db).run(at(2024, 3, 1)).await.unwrap();

        assert_eq!(report.generated(), 0);
        assert_eq!(
            report.skipped,
            vec![SkippedTemplate {
                template_id: template.id,
                reason: SkipReason::UnknownFrequency("Monthly".to_string()),
            }]
        );
        assert!(live_occurrence_dates(&db, template.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_template_is_skipped() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(
            &db,
            &user,
            "daily",
            date(2024, 2, 1),
            Some(date(2024, 1, 1)),
            10,
        )
        .await?;

        let report = generator(&db).run(at(2024, 3, 1)).await.unwrap();

        assert_eq!(report.generated(), 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].template_id, template.id);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Invalid(TemplateError::EndBeforeStart { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;
        let now = at(2024, 1, 10);

        let first = generator(&db).run(now).await.unwrap();
        let second = generator(&db).run(now).await.unwrap();

        assert_eq!(first.generated(), 10);
        assert_eq!(second.generated(), 0);
        assert_eq!(live_occurrence_dates(&db, template.id).await?.len(), 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_in_the_future() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let future = new_template(&db, &user, "daily", date(2024, 2, 1), None, 10).await?;
        let yearly = new_template(&db, &user, "yearly", date(2023, 6, 1), None, 10).await?;

        let report = generator(&db).run(at(2024, 1, 15)).await.unwrap();

        assert!(report.skipped.is_empty());
        assert!(live_occurrence_dates(&db, future.id).await?.is_empty());
        assert_eq!(
            live_occurrence_dates(&db, yearly.id).await?,
            vec![date(2023, 6, 1)]
        );
        for occurrence in &report.occurrences {
            assert!(occurrence.date <= date(2024, 1, 15));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_long_backlog_is_filled_in_one_run() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "monthly", date(2023, 1, 15), None, 10).await?;

        let report = generator(&db).run(at(2024, 1, 15)).await.unwrap();

        assert_eq!(report.generated(), 13);
        let dates = live_occurrence_dates(&db, template.id).await?;
        assert_eq!(dates.first(), Some(&date(2023, 1, 15)));
        assert_eq!(dates.last(), Some(&date(2024, 1, 15)));
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_occurrence_is_not_duplicated() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;
        new_occurrence(&db, &template, date(2024, 1, 3)).await?;

        let report = generator(&db).run(at(2024, 1, 5)).await.unwrap();

        assert_eq!(report.generated(), 4);
        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            (1..=5).map(|day| date(2024, 1, day)).collect::<Vec<_>>()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_occurrence_is_not_regenerated() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;
        let removed = new_occurrence(&db, &template, date(2024, 1, 2)).await?;
        soft_delete(&db, removed, at(2024, 1, 2)).await?;

        let report = generator(&db).run(at(2024, 1, 3)).await.unwrap();

        assert_eq!(report.generated(), 2);
        assert_eq!(
            live_occurrence_dates(&db, template.id).await?,
            vec![date(2024, 1, 1), date(2024, 1, 3)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_template_is_ignored() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let template = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;
        let template_id = template.id;
        soft_delete(&db, template, at(2024, 1, 1)).await?;

        let report = generator(&db).run(at(2024, 1, 5)).await.unwrap();

        assert_eq!(report.templates_processed, 0);
        assert!(live_occurrence_dates(&db, template_id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_next_occurrence_date() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let row = new_template(&db, &user, "weekly", date(2024, 1, 1), None, 10).await?;
        let template = RecurringTemplate::try_from(&row).unwrap();
        let jobs = generator(&db);

        assert_eq!(
            jobs.next_occurrence_date(&template).await.unwrap(),
            Some(date(2024, 1, 1))
        );

        jobs.run(at(2024, 1, 10)).await.unwrap();
        assert_eq!(
            jobs.next_occurrence_date(&template).await.unwrap(),
            Some(date(2024, 1, 15))
        );
        Ok(())
    }

    /// Store whose inserts start failing for one template from a given date.
    struct FailingStore {
        inner: DatabaseStore,
        template_id: i32,
        fail_from: NaiveDate,
    }

    #[async_trait]
    impl OccurrenceStore for FailingStore {
        async fn recurring_templates(&self) -> Result<Vec<expense::Model>> {
            self.inner.recurring_templates().await
        }

        async fn child_dates(&self, template_id: i32) -> Result<ChildDates> {
            self.inner.child_dates(template_id).await
        }

        async fn occurrence_exists(&self, template_id: i32, date: NaiveDate) -> Result<bool> {
            self.inner.occurrence_exists(template_id, date).await
        }

        async fn insert_occurrence(
            &self,
            template: &RecurringTemplate,
            date: NaiveDate,
            created_at: NaiveDateTime,
        ) -> Result<InsertOutcome> {
            if template.id == self.template_id && date >= self.fail_from {
                return Err(ComputeError::Database(DbErr::Custom(
                    "disk I/O error".to_string(),
                )));
            }
            self.inner.insert_occurrence(template, date, created_at).await
        }
    }

    #[tokio::test]
    async fn test_store_error_is_isolated_per_template() -> std::result::Result<(), DbErr> {
        let db = setup_db().await?;
        let user = new_user(&db).await?;
        let broken = new_template(&db, &user, "daily", date(2024, 1, 1), None, 10).await?;
        let healthy = new_template(&db, &user, "daily", date(2024, 1, 1), None, 20).await?;

        let failing = RecurringGenerator::new(FailingStore {
            inner: DatabaseStore::new(db.clone()),
            template_id: broken.id,
            fail_from: date(2024, 1, 4),
        });
        let report = failing.run(at(2024, 1, 5)).await.unwrap();

        assert!(report.has_failures());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].template_id, broken.id);
        assert!(matches!(report.failures[0].error, ComputeError::Database(_)));

        // Rows inserted before the failure stay counted.
        assert_eq!(report.generated(), 8);
        assert_eq!(live_occurrence_dates(&db, broken.id).await?.len(), 3);
        assert_eq!(live_occurrence_dates(&db, healthy.id).await?.len(), 5);

        // A later run picks up where the failed one stopped.
        let retry = generator(&db).run(at(2024, 1, 5)).await.unwrap();
        assert_eq!(retry.generated(), 2);
        Ok(())
    }
}
