use chrono::{Datelike, NaiveDate};

use super::frequency::Frequency;

/// The sequence of dates a recurring template falls on.
///
/// Every occurrence is computed from the anchor in one step
/// (`anchor + n * unit`) rather than from the previous occurrence, so a
/// clamped month end does not pull later occurrences earlier:
/// Jan 31, Feb 29, Mar 31, Apr 30, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    anchor: NaiveDate,
    frequency: Frequency,
}

impl Schedule {
    pub fn new(anchor: NaiveDate, frequency: Frequency) -> Self {
        Self { anchor, frequency }
    }

    /// The `index`-th occurrence, starting at 0 for the anchor itself.
    pub fn nth(&self, index: u32) -> Option<NaiveDate> {
        self.frequency.advance(self.anchor, index)
    }

    /// Index of the first occurrence on or after `date`.
    pub fn first_index_on_or_after(&self, date: NaiveDate) -> Option<u32> {
        if date <= self.anchor {
            return Some(0);
        }

        // Lower bound for the index; never past the answer.
        let estimate = match self.frequency {
            Frequency::Daily => (date - self.anchor).num_days(),
            Frequency::Weekly => (date - self.anchor).num_days() / 7,
            Frequency::Monthly => {
                i64::from(date.year() - self.anchor.year()) * 12 + i64::from(date.month())
                    - i64::from(self.anchor.month())
            }
            Frequency::Yearly => i64::from(date.year() - self.anchor.year()),
        };

        let mut index = u32::try_from(estimate).ok()?;
        while self.nth(index)? < date {
            index = index.checked_add(1)?;
        }
        Some(index)
    }

    /// All occurrences in `from..=until`, in ascending order.
    pub fn occurrences_between(&self, from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
        let mut occurrences = Vec::new();
        if until < from {
            return occurrences;
        }

        let Some(mut index) = self.first_index_on_or_after(from) else {
            return occurrences;
        };

        while let Some(date) = self.nth(index) {
            if date > until {
                break;
            }
            occurrences.push(date);
            index = match index.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        occurrences
    }
}
