use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::Transaction;

/// Calendar month used to bucket a monthly report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Month { year: date.year(), month: date.month() }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Month { year: self.year - 1, month: 12 }
        } else {
            Month { year: self.year, month: self.month - 1 }
        }
    }
}

/// Last day of the month a payment belongs to when it is booked late.
const MONTH_END_DAY: u32 = 25;
/// Bookings on or before this day may still belong to the previous month.
const LATE_BOOKING_DAYS: u32 = 7;

/// Moves recurring month-end payments that were booked in the first week of
/// a month back to the 25th of the previous month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthEndRule {
    keywords: Vec<String>,
}

impl MonthEndRule {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        MonthEndRule { keywords }
    }

    pub fn applies_to(&self, tx: &Transaction) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let haystack = tx.haystack();
        self.keywords.iter().any(|k| haystack.contains(k.as_str()))
    }

    /// Date the transaction is attributed to. The transaction is not touched.
    pub fn attributed_date(&self, tx: &Transaction) -> NaiveDate {
        if tx.date.day() > LATE_BOOKING_DAYS || !self.applies_to(tx) {
            return tx.date;
        }
        let prev = Month::of(tx.date).previous();
        NaiveDate::from_ymd_opt(prev.year, prev.month, MONTH_END_DAY).unwrap_or(tx.date)
    }

    pub fn attributed_month(&self, tx: &Transaction) -> Month {
        Month::of(self.attributed_date(tx))
    }
}
