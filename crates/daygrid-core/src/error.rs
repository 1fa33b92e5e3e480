//! Error types for the calendar grid engine.

use chrono::NaiveDate;

/// Boxed error returned by caller-supplied callbacks.
pub type HookError =
  Box<dyn std::error::Error + Send + Sync>;

/// Error type for every fallible operation of the calendar engine.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
  /// Returned when both bounds are set and `min` is after `max`.
  #[error("invalid range: min {min} is after max {max}")]
  InvalidRange {
    min: NaiveDate,
    max: NaiveDate
  },

  /// Returned when a format pattern contains unsupported specifiers.
  #[error("invalid {field} format pattern: {pattern:?}")]
  InvalidFormat {
    field:   &'static str,
    pattern: String
  },

  #[error("unknown weekday code: {0:?} (expected one of su, mo, tu, we, th, fr, sa)")]
  UnknownWeekday(String),

  #[error("unknown locale: {0:?}")]
  UnknownLocale(String),

  #[error("invalid timezone: {0:?}")]
  InvalidTimezone(String),

  /// A caller-supplied callback failed while evaluating `date`.
  #[error("{hook} callback failed for {date}")]
  Callback {
    hook:   &'static str,
    date:   NaiveDate,
    #[source]
    source: HookError
  }
}

#[cfg(test)]
mod tests {
  use std::error::Error;

  use chrono::NaiveDate;

  use super::CalendarError;

  #[test]
  fn invalid_range_message() {
    let err = CalendarError::InvalidRange {
      min: NaiveDate::from_ymd_opt(
        2024, 3, 20
      )
      .expect("valid date"),
      max: NaiveDate::from_ymd_opt(
        2024, 3, 10
      )
      .expect("valid date")
    };
    assert_eq!(
      err.to_string(),
      "invalid range: min 2024-03-20 is after max 2024-03-10"
    );
  }

  #[test]
  fn callback_error_keeps_source() {
    let err = CalendarError::Callback {
      hook:   "is_day_disabled",
      date:   NaiveDate::from_ymd_opt(
        2024, 3, 15
      )
      .expect("valid date"),
      source: "backend offline".into()
    };
    assert_eq!(
      err.to_string(),
      "is_day_disabled callback failed for 2024-03-15"
    );
    assert_eq!(
      err
        .source()
        .map(|source| source.to_string())
        .as_deref(),
      Some("backend offline")
    );
  }

  #[test]
  fn error_is_send_and_sync() {
    fn assert_impl<T: Send + Sync>() {}
    assert_impl::<CalendarError>();
  }
}
