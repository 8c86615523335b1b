use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A calendar month: zero-based `month` (0-11) and `year`.
///
/// Holds the inclusive bounds `[first day 00:00:00, last day 23:59:59]`.
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "PeriodParts", try_from = "PeriodParts")]
pub struct Period {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PeriodParts {
    month: u32,
    year: i32,
}

impl From<Period> for PeriodParts {
    fn from(p: Period) -> Self {
        Self {
            month: p.month(),
            year: p.year(),
        }
    }
}

impl TryFrom<PeriodParts> for Period {
    type Error = String;

    fn try_from(parts: PeriodParts) -> Result<Self, Self::Error> {
        Period::new(parts.month, parts.year)
            .ok_or_else(|| format!("invalid period {}/{}", parts.month, parts.year))
    }
}

impl Period {
    /// Returns `None` when `month` is outside 0-11 or the year is not representable.
    pub fn new(month: u32, year: i32) -> Option<Self> {
        if month > 11 {
            return None;
        }
        let first = NaiveDate::from_ymd_opt(year, month + 1, 1)?;
        // December is handled directly so the following January never has to exist.
        let last = if month == 11 {
            NaiveDate::from_ymd_opt(year, 12, 31)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 2, 1)?.pred_opt()?
        };
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
        Some(Self {
            start: first.and_time(NaiveTime::MIN),
            end: last.and_time(end_of_day),
        })
    }

    pub fn month(&self) -> u32 {
        self.start.month0()
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// First instant of the period, `00:00:00` on day 1.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Last instant of the period, `23:59:59` on the last day.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }

    pub fn days_in_month(&self) -> u32 {
        self.end.day()
    }

    /// Days of this period that have started by `now`: the full month for past
    /// periods, `now`'s day-of-month for the current one, 0 for future ones.
    pub fn days_elapsed(&self, now: NaiveDateTime) -> u32 {
        if now > self.end {
            self.days_in_month()
        } else if now < self.start {
            0
        } else {
            now.day()
        }
    }
}

impl std::fmt::Display for Period {
    /// `YYYY-MM` with a one-based month.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month() + 1)
    }
}
