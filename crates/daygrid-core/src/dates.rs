use chrono::{
  Datelike,
  Duration,
  NaiveDate,
  Weekday
};

pub fn first_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  let (year, month) =
    if date.month() == 12 {
      (date.year().saturating_add(1), 1)
    } else {
      (date.year(), date.month() + 1)
    };
  NaiveDate::from_ymd_opt(year, month, 1)
    .map(|next| add_days(next, -1))
    .unwrap_or(date)
}

pub fn days_in_month(
  date: NaiveDate
) -> u32 {
  last_day_of_month(date).day()
}

pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

/// Moves `date` by `months`, clamping the day to the target month's length
/// (Jan 31 + 1 month is the last day of February).
pub fn shift_month(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let total = date.year() as i64 * 12
    + date.month0() as i64
    + months as i64;
  let year = total.div_euclid(12) as i32;
  let month =
    total.rem_euclid(12) as u32 + 1;

  let Some(first) =
    NaiveDate::from_ymd_opt(
      year, month, 1
    )
  else {
    return date;
  };
  let day =
    date.day().min(days_in_month(first));
  first.with_day(day).unwrap_or(first)
}

pub fn is_same_day(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a == b
}

pub fn is_same_month(
  a: NaiveDate,
  b: NaiveDate
) -> bool {
  a.year() == b.year()
    && a.month() == b.month()
}

/// Orders two dates by (year, month) only.
pub fn cmp_month(
  a: NaiveDate,
  b: NaiveDate
) -> std::cmp::Ordering {
  (a.year(), a.month())
    .cmp(&(b.year(), b.month()))
}

pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_sunday()
    as i64;
  let start_idx = week_start
    .num_days_from_sunday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn shift_month_clamps_day() {
    assert_eq!(
      shift_month(date(2024, 1, 31), 1),
      date(2024, 2, 29)
    );
    assert_eq!(
      shift_month(date(2023, 1, 31), 1),
      date(2023, 2, 28)
    );
  }

  #[test]
  fn shift_month_crosses_years() {
    assert_eq!(
      shift_month(date(2024, 12, 15), 1),
      date(2025, 1, 15)
    );
    assert_eq!(
      shift_month(date(2024, 1, 15), -1),
      date(2023, 12, 15)
    );
    assert_eq!(
      shift_month(date(2024, 3, 1), -27),
      date(2021, 12, 1)
    );
  }

  #[test]
  fn month_bounds() {
    assert_eq!(
      last_day_of_month(date(
        2024, 2, 10
      )),
      date(2024, 2, 29)
    );
    assert_eq!(
      last_day_of_month(date(
        2024, 12, 3
      )),
      date(2024, 12, 31)
    );
    assert_eq!(
      days_in_month(date(2023, 4, 9)),
      30
    );
    assert_eq!(
      first_day_of_month(date(
        2023, 4, 9
      )),
      date(2023, 4, 1)
    );
  }

  #[test]
  fn same_month_ignores_day() {
    assert!(is_same_month(
      date(2024, 3, 1),
      date(2024, 3, 31)
    ));
    assert!(!is_same_month(
      date(2024, 3, 1),
      date(2023, 3, 1)
    ));
    assert!(!is_same_day(
      date(2024, 3, 1),
      date(2024, 3, 2)
    ));
  }

  #[test]
  fn start_of_week_respects_week_start() {
    // 2024-03-15 is a Friday.
    assert_eq!(
      start_of_week(
        date(2024, 3, 15),
        Weekday::Sun
      ),
      date(2024, 3, 10)
    );
    assert_eq!(
      start_of_week(
        date(2024, 3, 15),
        Weekday::Fri
      ),
      date(2024, 3, 15)
    );
    assert_eq!(
      start_of_week(
        date(2024, 3, 15),
        Weekday::Sat
      ),
      date(2024, 3, 9)
    );
  }
}
