use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

use super::{category, user};

/// Whether an expense is a single payment or a template for repeating ones.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum ExpenseType {
    #[sea_orm(string_value = "one-time")]
    OneTime,
    #[sea_orm(string_value = "recurring")]
    Recurring,
}

/// A single expense row.
///
/// The same table holds both user-entered one-time expenses and recurring
/// templates. Occurrences generated from a template are one-time rows whose
/// `parent_expense_id` points back to the template.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Owner of the expense. Never changes after creation.
    pub user_id: i32,
    pub category_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub title: String,
    pub description: Option<String>,
    /// Date of the payment, or the anchor date for a recurring template.
    pub date: NaiveDate,
    #[sea_orm(column_name = "type")]
    pub kind: ExpenseType,
    /// Kept as free text so rows with an unsupported value can still be loaded.
    pub recurring_frequency: Option<String>,
    pub recurring_start_date: Option<NaiveDate>,
    pub recurring_end_date: Option<NaiveDate>,
    /// Template this occurrence was generated from.
    pub parent_expense_id: Option<i32>,
    #[sea_orm(default_value = "false")]
    pub is_auto_generated: bool,
    pub created_at: NaiveDateTime,
    /// Soft-delete marker. Rows with a value here are treated as removed.
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "category::Entity",
        from = "Column::CategoryId",
        to = "category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentExpenseId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_recurring(&self) -> bool {
        self.kind == ExpenseType::Recurring
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Children generated from this template, live and soft-deleted alike.
    pub async fn find_occurrences<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<Model>, DbErr> {
        Entity::find()
            .filter(Column::ParentExpenseId.eq(self.id))
            .order_by_asc(Column::Date)
            .all(db)
            .await
    }
}
