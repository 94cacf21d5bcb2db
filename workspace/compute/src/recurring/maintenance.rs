use chrono::{NaiveDate, NaiveDateTime};
use model::entities::category;
use model::entities::expense::{self, ExpenseType};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument};

use super::frequency::Frequency;
use crate::error::{ComputeError, Result, TemplateError};

const MAX_TITLE_LEN: usize = 255;

/// Input for a new recurring expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecurringTemplate {
    pub category_id: Option<i32>,
    pub amount: Decimal,
    pub title: String,
    pub description: Option<String>,
    /// One of `daily`, `weekly`, `monthly`, `yearly`.
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewRecurringTemplate {
    fn validate(&self) -> std::result::Result<Frequency, TemplateError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TemplateError::EmptyTitle);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(TemplateError::TitleTooLong { max: MAX_TITLE_LEN });
        }
        if self.amount < Decimal::new(1, 2) {
            return Err(TemplateError::AmountBelowMinimum(self.amount));
        }
        let frequency = self.frequency.parse::<Frequency>()?;
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(TemplateError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
        }
        Ok(frequency)
    }
}

/// Stores a new recurring expense owned by `user_id`.
///
/// The category, when given, must belong to the same user. Occurrences are
/// not created here; the next generator run picks the template up.
#[instrument(skip(db, input), fields(title = %input.title))]
pub async fn create_recurring_template(
    db: &DatabaseConnection,
    user_id: i32,
    input: NewRecurringTemplate,
    now: NaiveDateTime,
) -> Result<expense::Model> {
    let frequency = input.validate()?;

    if let Some(category_id) = input.category_id {
        category::Entity::find_by_id(category_id)
            .filter(category::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| ComputeError::NotFound(format!("category {}", category_id)))?;
    }

    let template = expense::ActiveModel {
        user_id: Set(user_id),
        category_id: Set(input.category_id),
        amount: Set(input.amount),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        date: Set(input.start_date),
        kind: Set(ExpenseType::Recurring),
        recurring_frequency: Set(Some(frequency.to_string())),
        recurring_start_date: Set(Some(input.start_date)),
        recurring_end_date: Set(input.end_date),
        parent_expense_id: Set(None),
        is_auto_generated: Set(false),
        created_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Created recurring expense {} ({} from {})",
        template.id, frequency, input.start_date
    );
    Ok(template)
}

/// A recurring template together with what has been generated from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOverview {
    pub template: expense::Model,
    /// Live children only.
    pub occurrence_count: usize,
    pub last_occurrence: Option<NaiveDate>,
}

/// Live recurring templates of `user_id`, newest first.
#[instrument(skip(db))]
pub async fn list_recurring_templates(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Vec<TemplateOverview>> {
    let templates = expense::Entity::find()
        .filter(expense::Column::UserId.eq(user_id))
        .filter(expense::Column::Kind.eq(ExpenseType::Recurring))
        .filter(expense::Column::DeletedAt.is_null())
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await?;

    let mut overviews = Vec::with_capacity(templates.len());
    for template in templates {
        let live: Vec<expense::Model> = template
            .find_occurrences(db)
            .await?
            .into_iter()
            .filter(|child| !child.is_deleted())
            .collect();

        overviews.push(TemplateOverview {
            occurrence_count: live.len(),
            last_occurrence: live.iter().map(|child| child.date).max(),
            template,
        });
    }

    debug!("User {} has {} recurring templates", user_id, overviews.len());
    Ok(overviews)
}

/// Soft-deletes a recurring template and its live occurrences.
///
/// Only the owner may delete a template. Returns the number of occurrences
/// that were deleted along with it.
#[instrument(skip(db), fields(now = %now))]
pub async fn delete_recurring_template(
    db: &DatabaseConnection,
    user_id: i32,
    template_id: i32,
    now: NaiveDateTime,
) -> Result<u64> {
    let template = expense::Entity::find_by_id(template_id)
        .filter(expense::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .filter(|row| row.is_recurring())
        .ok_or_else(|| ComputeError::NotFound(format!("recurring expense {}", template_id)))?;

    if template.user_id != user_id {
        return Err(ComputeError::Forbidden {
            user_id,
            expense_id: template_id,
        });
    }

    let txn = db.begin().await?;

    let children = expense::Entity::update_many()
        .col_expr(expense::Column::DeletedAt, Expr::value(now))
        .filter(expense::Column::ParentExpenseId.eq(template_id))
        .filter(expense::Column::DeletedAt.is_null())
        .exec(&txn)
        .await?;

    let mut active = template.into_active_model();
    active.deleted_at = Set(Some(now));
    active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Deleted recurring template {} and {} occurrences",
        template_id, children.rows_affected
    );
    Ok(children.rows_affected)
}
