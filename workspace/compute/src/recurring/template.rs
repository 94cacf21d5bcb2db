use chrono::NaiveDate;
use model::entities::expense;
use rust_decimal::Decimal;

use super::frequency::Frequency;
use super::schedule::Schedule;
use crate::error::TemplateError;

/// A recurring expense row that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringTemplate {
    pub id: i32,
    pub user_id: i32,
    pub category_id: Option<i32>,
    pub amount: Decimal,
    pub title: String,
    pub description: Option<String>,
    /// `None` when the stored value is not a supported frequency.
    pub frequency: Option<Frequency>,
    /// Stored frequency text, kept for logging.
    pub raw_frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl TryFrom<&expense::Model> for RecurringTemplate {
    type Error = TemplateError;

    fn try_from(row: &expense::Model) -> Result<Self, Self::Error> {
        if !row.is_recurring() {
            return Err(TemplateError::NotRecurring);
        }

        let raw_frequency = row
            .recurring_frequency
            .clone()
            .filter(|value| !value.trim().is_empty())
            .ok_or(TemplateError::MissingFrequency)?;
        let start_date = row
            .recurring_start_date
            .ok_or(TemplateError::MissingStartDate)?;

        if let Some(end) = row.recurring_end_date {
            if end < start_date {
                return Err(TemplateError::EndBeforeStart {
                    start: start_date,
                    end,
                });
            }
        }

        if row.amount <= Decimal::ZERO {
            return Err(TemplateError::NonPositiveAmount(row.amount));
        }

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            category_id: row.category_id,
            amount: row.amount,
            title: row.title.clone(),
            description: row.description.clone(),
            frequency: raw_frequency.parse().ok(),
            raw_frequency,
            start_date,
            end_date: row.recurring_end_date,
        })
    }
}

impl RecurringTemplate {
    pub fn schedule(&self) -> Option<Schedule> {
        self.frequency
            .map(|frequency| Schedule::new(self.start_date, frequency))
    }

    /// Last date an occurrence may have when the job runs on `today`.
    pub fn generation_limit(&self, today: NaiveDate) -> NaiveDate {
        match self.end_date {
            Some(end) if end < today => end,
            _ => today,
        }
    }

    /// Whether an occurrence dated `next_due` may be generated on `today`.
    pub fn should_generate(&self, next_due: NaiveDate, today: NaiveDate) -> bool {
        next_due <= self.generation_limit(today)
    }
}
