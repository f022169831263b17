use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};

use crate::error::{HealthError, HealthResult};

// Calendar-month types and the analysis window live here so metrics never touch the wall clock.

/// A calendar month, rendered as `YYYY-MM`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
  year: i32,
  month: u32,
}

impl YearMonth {
  pub fn new(year: i32, month: u32) -> Option<Self> {
    if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
      return None;
    }
    Some(Self { year, month })
  }

  pub fn of_date(date: NaiveDate) -> Self {
    Self {
      year: date.year(),
      month: date.month(),
    }
  }

  pub fn of(ts: DateTime<Utc>) -> Self {
    Self::of_date(ts.date_naive())
  }

  pub fn year(&self) -> i32 {
    self.year
  }

  pub fn month(&self) -> u32 {
    self.month
  }

  /// Months since year 0, used for distance and offset math.
  pub fn ordinal(&self) -> i32 {
    self.year * 12 + self.month as i32 - 1
  }

  fn from_ordinal(ordinal: i32) -> Self {
    Self {
      year: ordinal.div_euclid(12),
      month: (ordinal.rem_euclid(12) + 1) as u32,
    }
  }

  /// Offset inside a validated window; use `checked_add_months` for untrusted offsets.
  pub fn add_months(&self, n: i32) -> Self {
    Self::from_ordinal(self.ordinal() + n)
  }

  /// `None` when the result leaves years 1..=9999.
  pub fn checked_add_months(&self, n: i64) -> Option<Self> {
    let ordinal = i64::from(self.ordinal()).checked_add(n)?;
    let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
    let month = (ordinal.rem_euclid(12) + 1) as u32;

    Self::new(year, month)
  }

  pub fn succ(&self) -> Self {
    self.add_months(1)
  }

  pub fn first_day(&self) -> NaiveDate {
    NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("year-month validated on construction")
  }
}

impl fmt::Display for YearMonth {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for YearMonth {
  type Err = HealthError;

  fn from_str(s: &str) -> HealthResult<Self> {
    let invalid = || HealthError::InvalidWindow(format!("expected YYYY-MM, got {s:?}"));
    let (y, m) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;

    Self::new(year, month).ok_or_else(invalid)
  }
}

/// A `[start, end)` range of whole calendar months.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AnalysisWindow {
  start: NaiveDate,
  end: NaiveDate,
}

impl AnalysisWindow {
  pub fn new(start: NaiveDate, end: NaiveDate) -> HealthResult<Self> {
    if start.day() != 1 || end.day() != 1 {
      return Err(HealthError::InvalidWindow(format!(
        "{start} .. {end} is not aligned to month boundaries"
      )));
    }
    if start >= end {
      return Err(HealthError::InvalidWindow(format!("start {start} is not before end {end}")));
    }
    Ok(Self { start, end })
  }

  pub fn from_months(start: YearMonth, end: YearMonth) -> HealthResult<Self> {
    Self::new(start.first_day(), end.first_day())
  }

  /// The window covering `years` whole years that ends with the last complete month before `as_of`.
  pub fn for_years(as_of: NaiveDate, years: u32) -> HealthResult<Self> {
    if years == 0 {
      return Err(HealthError::InvalidWindow("lookback must be at least one year".into()));
    }
    let end = YearMonth::of_date(as_of);
    let start = end
      .checked_add_months(-12 * i64::from(years))
      .ok_or_else(|| HealthError::InvalidWindow(format!("{years} years before {as_of} is out of range")))?;

    Self::from_months(start, end)
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  /// Exclusive end (first day of the month after the last reported month).
  pub fn end(&self) -> NaiveDate {
    self.end
  }

  /// Last calendar day inside the window.
  pub fn last_day(&self) -> NaiveDate {
    self.end.pred_opt().unwrap_or(self.end)
  }

  pub fn start_ts(&self) -> DateTime<Utc> {
    self.start.and_time(chrono::NaiveTime::MIN).and_utc()
  }

  pub fn end_ts(&self) -> DateTime<Utc> {
    self.end.and_time(chrono::NaiveTime::MIN).and_utc()
  }

  pub fn start_month(&self) -> YearMonth {
    YearMonth::of_date(self.start)
  }

  /// The last complete month, used to key artifact directories.
  pub fn report_month(&self) -> YearMonth {
    YearMonth::of_date(self.end).add_months(-1)
  }

  pub fn month_count(&self) -> usize {
    (YearMonth::of_date(self.end).ordinal() - self.start_month().ordinal()) as usize
  }

  pub fn months(&self) -> impl Iterator<Item = YearMonth> {
    let first = self.start_month();
    (0..self.month_count() as i32).map(move |i| first.add_months(i))
  }

  pub fn contains_month(&self, ym: YearMonth) -> bool {
    ym >= self.start_month() && ym < YearMonth::of_date(self.end)
  }

  pub fn contains(&self, ts: DateTime<Utc>) -> bool {
    ts >= self.start_ts() && ts < self.end_ts()
  }
}

impl fmt::Display for AnalysisWindow {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} to {}", self.start, self.last_day())
  }
}

fn is_weekend(day: Weekday) -> bool {
  matches!(day, Weekday::Sat | Weekday::Sun)
}

/// Advance `ts` by `days` business days (weekends skipped, no holiday calendar).
///
/// Each step moves one day forward and then past any weekend, so a Saturday start
/// reaches Monday on the first step. Time of day is preserved.
pub fn add_business_days(ts: DateTime<Utc>, days: u32) -> DateTime<Utc> {
  let mut out = ts;

  for _ in 0..days {
    out += Duration::days(1);
    while is_weekend(out.weekday()) {
      out += Duration::days(1);
    }
  }

  out
}

/// Parse an `--as-of` date (`YYYY-MM-DD`).
pub fn parse_as_of(raw: &str) -> HealthResult<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|e| HealthError::InvalidWindow(format!("invalid --as-of {raw:?}: {e}")))
}
