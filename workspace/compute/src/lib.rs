//! Business logic on top of the expense entities: generating occurrences of
//! recurring expenses and reporting budget usage.

pub mod budget;
pub mod error;
pub mod recurring;

#[cfg(test)]
mod testing;

pub use error::{ComputeError, Result, TemplateError, UnknownFrequency};
pub use recurring::{GenerationReport, RecurringGenerator};
