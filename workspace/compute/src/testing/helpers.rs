use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};

use model::entities::expense::{self, ExpenseType};
use model::entities::{category, user};

pub type Result<T> = std::result::Result<T, DbErr>;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Noon on the given day.
pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(12, 0, 0).unwrap()
}

pub async fn new_user(db: &DatabaseConnection) -> Result<user::Model> {
    static USER_ID: AtomicU64 = AtomicU64::new(0);

    let current_id = USER_ID.fetch_add(1, Ordering::SeqCst);
    user::ActiveModel {
        name: Set(format!("user_{}", current_id)),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_category(
    db: &DatabaseConnection,
    user: &user::Model,
    name: &str,
) -> Result<category::Model> {
    category::ActiveModel {
        user_id: Set(user.id),
        name: Set(name.to_string()),
        color: Set(None),
        icon: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Recurring template with the amount given in whole units.
pub async fn new_template(
    db: &DatabaseConnection,
    user: &user::Model,
    frequency: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    amount: i64,
) -> Result<expense::Model> {
    expense::ActiveModel {
        user_id: Set(user.id),
        category_id: Set(None),
        amount: Set(Decimal::new(amount * 100, 2)),
        title: Set(format!("{} payment", frequency)),
        description: Set(Some("Recurring test payment".to_string())),
        date: Set(start),
        kind: Set(ExpenseType::Recurring),
        recurring_frequency: Set(Some(frequency.to_string())),
        recurring_start_date: Set(Some(start)),
        recurring_end_date: Set(end),
        parent_expense_id: Set(None),
        is_auto_generated: Set(false),
        created_at: Set(at(2024, 1, 1)),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Child row of `template` as if it had been generated earlier.
pub async fn new_occurrence(
    db: &DatabaseConnection,
    template: &expense::Model,
    on: NaiveDate,
) -> Result<expense::Model> {
    expense::ActiveModel {
        user_id: Set(template.user_id),
        category_id: Set(template.category_id),
        amount: Set(template.amount),
        title: Set(template.title.clone()),
        description: Set(template.description.clone()),
        date: Set(on),
        kind: Set(ExpenseType::OneTime),
        recurring_frequency: Set(None),
        recurring_start_date: Set(None),
        recurring_end_date: Set(None),
        parent_expense_id: Set(Some(template.id)),
        is_auto_generated: Set(true),
        created_at: Set(at(2024, 1, 1)),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_one_time_expense(
    db: &DatabaseConnection,
    user: &user::Model,
    category: Option<&category::Model>,
    on: NaiveDate,
    amount: Decimal,
) -> Result<expense::Model> {
    expense::ActiveModel {
        user_id: Set(user.id),
        category_id: Set(category.map(|c| c.id)),
        amount: Set(amount),
        title: Set("Purchase".to_string()),
        description: Set(None),
        date: Set(on),
        kind: Set(ExpenseType::OneTime),
        recurring_frequency: Set(None),
        recurring_start_date: Set(None),
        recurring_end_date: Set(None),
        parent_expense_id: Set(None),
        is_auto_generated: Set(false),
        created_at: Set(at(2024, 1, 1)),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn soft_delete(
    db: &DatabaseConnection,
    row: expense::Model,
    when: NaiveDateTime,
) -> Result<expense::Model> {
    let mut active = row.into_active_model();
    active.deleted_at = Set(Some(when));
    active.update(db).await
}

/// Dates of the live children of `template_id`, ascending.
pub async fn live_occurrence_dates(
    db: &DatabaseConnection,
    template_id: i32,
) -> Result<Vec<NaiveDate>> {
    let rows = expense::Entity::find()
        .filter(expense::Column::ParentExpenseId.eq(template_id))
        .filter(expense::Column::DeletedAt.is_null())
        .order_by_asc(expense::Column::Date)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|row| row.date).collect())
}
