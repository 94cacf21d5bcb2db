pub mod budgets;
pub mod generate_recurring;
pub mod initdb;
pub mod recurring;

pub use budgets::budget_status;
pub use generate_recurring::generate_recurring;
pub use initdb::init_database;
pub use recurring::{add_recurring, delete_recurring, list_recurring};
