//! This file serves as the root for all SeaORM entity modules.
//! Expenses live in a single table: one-time rows, recurring templates and the
//! occurrences generated from those templates.

pub mod budget;
pub mod category;
pub mod expense;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::category::Entity as Category;
    pub use super::expense::Entity as Expense;
    pub use super::user::Entity as User;
}
