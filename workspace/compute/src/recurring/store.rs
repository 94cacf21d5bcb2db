use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use model::entities::expense::{self, ExpenseType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tracing::{debug, trace};

use super::schedule::Schedule;
use super::template::RecurringTemplate;
use crate::error::Result;

/// Outcome of inserting a generated occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(expense::Model),
    /// A row for the same template and date already exists.
    Duplicate,
}

/// Dates already used by the children of one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildDates {
    /// Dates with a live child row.
    pub live: BTreeSet<NaiveDate>,
    /// Dates whose child row was soft-deleted by the user.
    pub deleted: BTreeSet<NaiveDate>,
}

impl ChildDates {
    /// A date is taken when it has a live child or a soft-deleted one.
    /// Deleted occurrences stay deleted: they are not generated again.
    pub fn is_taken(&self, date: NaiveDate) -> bool {
        self.live.contains(&date) || self.deleted.contains(&date)
    }

    /// First schedule date that has no child row yet.
    pub fn first_open_date(&self, schedule: &Schedule) -> Option<NaiveDate> {
        let mut index = 0u32;
        loop {
            let date = schedule.nth(index)?;
            if !self.is_taken(date) {
                return Some(date);
            }
            index = index.checked_add(1)?;
        }
    }
}

/// Storage operations the occurrence generator relies on.
#[async_trait]
pub trait OccurrenceStore: Send + Sync {
    /// Live expense rows of kind `recurring`.
    async fn recurring_templates(&self) -> Result<Vec<expense::Model>>;

    /// Dates of every child row of the template, split into live and soft-deleted.
    async fn child_dates(&self, template_id: i32) -> Result<ChildDates>;

    /// Whether a live child exists for the template on exactly `date`.
    async fn occurrence_exists(&self, template_id: i32, date: NaiveDate) -> Result<bool>;

    /// Creates a one-time, auto-generated child of `template` dated `date`.
    async fn insert_occurrence(
        &self,
        template: &RecurringTemplate,
        date: NaiveDate,
        created_at: NaiveDateTime,
    ) -> Result<InsertOutcome>;
}

/// `OccurrenceStore` backed by the expenses table.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OccurrenceStore for DatabaseStore {
    async fn recurring_templates(&self) -> Result<Vec<expense::Model>> {
        trace!("Loading recurring templates");
        let templates = expense::Entity::find()
            .filter(expense::Column::Kind.eq(ExpenseType::Recurring))
            .filter(expense::Column::DeletedAt.is_null())
            .order_by_asc(expense::Column::Id)
            .all(&self.db)
            .await?;
        debug!("Loaded {} recurring templates", templates.len());
        Ok(templates)
    }

    async fn child_dates(&self, template_id: i32) -> Result<ChildDates> {
        let children = expense::Entity::find()
            .filter(expense::Column::ParentExpenseId.eq(template_id))
            .all(&self.db)
            .await?;

        let mut dates = ChildDates::default();
        for child in children {
            if child.is_deleted() {
                dates.deleted.insert(child.date);
            } else {
                dates.live.insert(child.date);
            }
        }
        trace!(
            "Template {} has {} live and {} deleted children",
            template_id,
            dates.live.len(),
            dates.deleted.len()
        );
        Ok(dates)
    }

    async fn occurrence_exists(&self, template_id: i32, date: NaiveDate) -> Result<bool> {
        let count = expense::Entity::find()
            .filter(expense::Column::ParentExpenseId.eq(template_id))
            .filter(expense::Column::Date.eq(date))
            .filter(expense::Column::DeletedAt.is_null())
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn insert_occurrence(
        &self,
        template: &RecurringTemplate,
        date: NaiveDate,
        created_at: NaiveDateTime,
    ) -> Result<InsertOutcome> {
        let occurrence = expense::ActiveModel {
            user_id: Set(template.user_id),
            category_id: Set(template.category_id),
            amount: Set(template.amount),
            title: Set(template.title.clone()),
            description: Set(template.description.clone()),
            date: Set(date),
            kind: Set(ExpenseType::OneTime),
            recurring_frequency: Set(None),
            recurring_start_date: Set(None),
            recurring_end_date: Set(None),
            parent_expense_id: Set(Some(template.id)),
            is_auto_generated: Set(true),
            created_at: Set(created_at),
            deleted_at: Set(None),
            ..Default::default()
        };

        match occurrence.insert(&self.db).await {
            Ok(model) => Ok(InsertOutcome::Inserted(model)),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    debug!(
                        "Occurrence of template {} on {} already stored",
                        template.id, date
                    );
                    Ok(InsertOutcome::Duplicate)
                }
                _ => Err(err.into()),
            },
        }
    }
}
