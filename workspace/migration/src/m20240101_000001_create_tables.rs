use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{budget, category, expense, user};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::table())
                    .if_not_exists()
                    .col(pk_auto(User::column(user::Column::Id)))
                    .col(string(User::column(user::Column::Name)).unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Category::table())
                    .if_not_exists()
                    .col(pk_auto(Category::column(category::Column::Id)))
                    .col(integer(Category::column(category::Column::UserId)))
                    .col(string(Category::column(category::Column::Name)))
                    .col(string_null(Category::column(category::Column::Color)))
                    .col(string_null(Category::column(category::Column::Icon)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_user")
                            .from(Category::table(), Category::column(category::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expense::table())
                    .if_not_exists()
                    .col(pk_auto(Expense::column(expense::Column::Id)))
                    .col(integer(Expense::column(expense::Column::UserId)))
                    .col(integer_null(Expense::column(expense::Column::CategoryId)))
                    .col(
                        decimal(Expense::column(expense::Column::Amount))
                            .decimal_len(16, 4),
                    )
                    .col(string(Expense::column(expense::Column::Title)))
                    .col(text_null(Expense::column(expense::Column::Description)))
                    .col(date(Expense::column(expense::Column::Date)))
                    .col(string(Expense::column(expense::Column::Kind)).string_len(10))
                    .col(string_null(Expense::column(
                        expense::Column::RecurringFrequency,
                    )))
                    .col(date_null(Expense::column(
                        expense::Column::RecurringStartDate,
                    )))
                    .col(date_null(Expense::column(expense::Column::RecurringEndDate)))
                    .col(integer_null(Expense::column(expense::Column::ParentExpenseId)))
                    .col(
                        boolean(Expense::column(expense::Column::IsAutoGenerated))
                            .default(false),
                    )
                    .col(date_time(Expense::column(expense::Column::CreatedAt)))
                    .col(date_time_null(Expense::column(expense::Column::DeletedAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_user")
                            .from(Expense::table(), Expense::column(expense::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_category")
                            .from(
                                Expense::table(),
                                Expense::column(expense::Column::CategoryId),
                            )
                            .to(Category::table(), Category::column(category::Column::Id))
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_parent")
                            .from(
                                Expense::table(),
                                Expense::column(expense::Column::ParentExpenseId),
                            )
                            .to(Expense::table(), Expense::column(expense::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Budget::table())
                    .if_not_exists()
                    .col(pk_auto(Budget::column(budget::Column::Id)))
                    .col(integer(Budget::column(budget::Column::UserId)))
                    .col(integer_null(Budget::column(budget::Column::CategoryId)))
                    .col(decimal(Budget::column(budget::Column::Amount)).decimal_len(16, 4))
                    .col(integer(Budget::column(budget::Column::Month)))
                    .col(integer(Budget::column(budget::Column::Year)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_user")
                            .from(Budget::table(), Budget::column(budget::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_category")
                            .from(Budget::table(), Budget::column(budget::Column::CategoryId))
                            .to(Category::table(), Category::column(category::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Budget::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expense::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::table()).to_owned())
            .await?;

        Ok(())
    }
}
