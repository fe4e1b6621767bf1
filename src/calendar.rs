use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

/// First calendar month of the academic year (July).
const YEAR_START_MONTH: u32 = 7;

/// A July-to-June school year, identified by its starting calendar year.
///
/// Every instant belongs to exactly one academic year: July through December
/// of year `Y` and January through June of year `Y+1` both map to `Y/Y+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AcademicYear {
    start_year: i32,
}

impl AcademicYear {
    pub fn from_start_year(start_year: i32) -> Self {
        Self { start_year }
    }

    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= YEAR_START_MONTH {
            Self {
                start_year: date.year(),
            }
        } else {
            Self {
                start_year: date.year() - 1,
            }
        }
    }

    /// Parses a `"2024/2025"` style label. The two years must be consecutive
    /// and four digits; anything else is rejected.
    pub fn parse(label: &str) -> Option<Self> {
        let (a, b) = label.trim().split_once('/')?;
        let start = a.trim().parse::<i32>().ok()?;
        let end = b.trim().parse::<i32>().ok()?;
        if end != start + 1 || !(1000..=9998).contains(&start) {
            return None;
        }
        Some(Self::from_start_year(start))
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// First civil day of the given semester: 1 July of the start year, or
    /// 1 January of the year after. Uses the academic-year-relative start
    /// year, never a year re-derived from an instant, so semester-2 dates
    /// (whose own calendar year is already `start_year + 1`) land correctly.
    pub fn semester_start(&self, semester: Semester) -> NaiveDate {
        let (year, month) = match semester {
            Semester::First => (self.start_year, YEAR_START_MONTH),
            Semester::Second => (self.start_year + 1, 1),
        };
        NaiveDate::from_ymd_opt(year, month, 1).expect("semester start is a valid civil date")
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_year, self.start_year + 1)
    }
}

/// First half (Jul-Dec) or second half (Jan-Jun) of an academic year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= YEAR_START_MONTH {
            Semester::First
        } else {
            Semester::Second
        }
    }

    pub fn number(self) -> i64 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }

    pub fn from_number(n: i64) -> Option<Self> {
        match n {
            1 => Some(Semester::First),
            2 => Some(Semester::Second),
            _ => None,
        }
    }
}

/// 1-based 7-day bucket index counted from the first day of the date's
/// semester within `year`. Always >= 1 for dates inside the year; the last
/// week of a semester may be partial.
pub fn week_in_semester(date: NaiveDate, year: AcademicYear) -> i64 {
    let start = year.semester_start(Semester::containing(date));
    date.signed_duration_since(start).num_days() / 7 + 1
}

/// Inverse of [`week_in_semester`]: the 7-day civil range covered by a week
/// coordinate, inclusive on both ends.
pub fn week_date_range(year: AcademicYear, semester: Semester, week: i64) -> (NaiveDate, NaiveDate) {
    let start = year.semester_start(semester) + Duration::days((week - 1) * 7);
    (start, start + Duration::days(6))
}
