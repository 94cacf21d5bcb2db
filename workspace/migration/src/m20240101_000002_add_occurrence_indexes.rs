use crate::entity_iden::EntityIden;
use model::entities::expense;
use model::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One generated row per template and date. User-entered rows have a
        // NULL parent and are not constrained.
        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_parent_date")
                    .table(Expense::table())
                    .col(Expense::column(expense::Column::ParentExpenseId))
                    .col(Expense::column(expense::Column::Date))
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_user_date")
                    .table(Expense::table())
                    .col(Expense::column(expense::Column::UserId))
                    .col(Expense::column(expense::Column::Date))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_expenses_user_date")
                    .table(Expense::table())
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_expenses_parent_date")
                    .table(Expense::table())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
