//! Recurring expenses: schedules, validation and occurrence generation.

pub mod frequency;
pub mod generator;
pub mod maintenance;
pub mod schedule;
pub mod store;
pub mod template;

pub use frequency::Frequency;
pub use generator::{
    GeneratedOccurrence, GenerationReport, RecurringGenerator, SkipReason, SkippedTemplate,
    TemplateFailure,
};
pub use maintenance::{
    create_recurring_template, delete_recurring_template, list_recurring_templates,
    NewRecurringTemplate, TemplateOverview,
};
pub use schedule::Schedule;
pub use store::{ChildDates, DatabaseStore, InsertOutcome, OccurrenceStore};
pub use template::RecurringTemplate;
