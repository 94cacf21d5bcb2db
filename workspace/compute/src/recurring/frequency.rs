use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months, NaiveDate};

use crate::error::UnknownFrequency;

/// Step unit of a recurring expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    /// Only the exact lowercase names are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        f.write_str(name)
    }
}

impl Frequency {
    /// Moves `date` forward by `count` units of this frequency.
    ///
    /// Month and year arithmetic keeps the day of month and clamps it to the
    /// last valid day, so Jan 31 + 1 month is Feb 28/29 and Feb 29 + 1 year
    /// is Feb 28. Returns `None` only when the result is out of chrono's range.
    pub fn advance(self, date: NaiveDate, count: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => date.checked_add_days(Days::new(u64::from(count))),
            Frequency::Weekly => date.checked_add_days(Days::new(7 * u64::from(count))),
            Frequency::Monthly => date.checked_add_months(Months::new(count)),
            Frequency::Yearly => date.checked_add_months(Months::new(count.checked_mul(12)?)),
        }
    }
}
