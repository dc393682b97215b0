use chrono::NaiveDate;

use crate::error::EngineError;
use crate::types::DateRange;
use crate::EngineResult;

/// One calendar month inside a reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSlot {
    pub month: u32,
    pub year: i32,
}

impl MonthSlot {
    /// "YYYY-MM" label used in season rows.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// First through last day of the month, inclusive.
    pub fn range(&self) -> EngineResult<DateRange> {
        let start = month_start(self.year, self.month)?;
        let end = month_end(self.year, self.month)?;
        Ok(DateRange::new(start, end))
    }
}

/// Resolve a `(month, year[, day])` request into the period's date range:
/// the calendar month, narrowed to a single day when `day` is set.
pub fn period_range(month: u32, year: i32, day: Option<u32>) -> EngineResult<DateRange> {
    validate_month(month)?;
    match day {
        None => MonthSlot { month, year }.range(),
        Some(d) => {
            let date = resolve_day(month, year, d)?;
            Ok(DateRange::new(date, date))
        }
    }
}

/// Reference date for aging and trailing-window valuation: the narrowed
/// day when set, otherwise the caller-injected fallback ("now" in
/// production, a fixed date in tests).
pub fn resolve_reference(
    month: u32,
    year: i32,
    day: Option<u32>,
    fallback: NaiveDate,
) -> EngineResult<NaiveDate> {
    validate_month(month)?;
    match day {
        Some(d) => resolve_day(month, year, d),
        None => Ok(fallback),
    }
}

/// Ordered month slots for a season window, rolling over year ends.
pub fn season_months(
    start_month: u32,
    start_year: i32,
    length: u32,
) -> EngineResult<Vec<MonthSlot>> {
    validate_month(start_month)?;
    if length == 0 {
        return Err(EngineError::InvalidPeriod {
            field: "length".to_string(),
            reason: "A season spans at least one month.".to_string(),
        });
    }

    let mut slots = Vec::with_capacity(length as usize);
    let mut month = start_month;
    let mut year = start_year;
    for _ in 0..length {
        slots.push(MonthSlot { month, year });
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    Ok(slots)
}

fn validate_month(month: u32) -> EngineResult<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(EngineError::InvalidPeriod {
            field: "month".to_string(),
            reason: format!("{month} is outside 1-12"),
        })
    }
}

fn resolve_day(month: u32, year: i32, day: u32) -> EngineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| EngineError::InvalidPeriod {
        field: "day".to_string(),
        reason: format!("{year:04}-{month:02} has no day {day}"),
    })
}

fn month_start(year: i32, month: u32) -> EngineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| EngineError::InvalidPeriod {
        field: "year".to_string(),
        reason: format!("{year} is outside the supported calendar"),
    })
}

fn month_end(year: i32, month: u32) -> EngineResult<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = month_start(next_year, next_month)?;
    first_of_next
        .pred_opt()
        .ok_or_else(|| EngineError::InvalidPeriod {
            field: "year".to_string(),
            reason: format!("{year} is outside the supported calendar"),
        })
}
