//! Per-day policies: disabled state, labels, styling hooks, navigation and
//! selection toggling.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::dates;
use crate::error::CalendarError;
use crate::grid::{Day, generate_weekday_header};
use crate::options::{CalendarConfig, DayFormatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// The callback, when present, decides alone; otherwise `min`/`max` are
/// compared at day granularity.
pub fn is_day_disabled(day: &Day, config: &CalendarConfig) -> Result<bool, CalendarError> {
    is_date_disabled(day.date, config)
}

pub fn is_date_disabled(date: NaiveDate, config: &CalendarConfig) -> Result<bool, CalendarError> {
    if let Some(predicate) = &config.is_day_disabled {
        return predicate(date).map_err(|source| CalendarError::Callback {
            hook: "is_day_disabled",
            date,
            source,
        });
    }

    if config.min.is_some_and(|min| date < min) {
        trace!(%date, "before min");
        return Ok(true);
    }

    Ok(config.max.is_some_and(|max| date > max))
}

pub fn header_label(config: &CalendarConfig, viewed_month: NaiveDate) -> Result<String, CalendarError> {
    let month = dates::first_day_of_month(viewed_month);
    format_with(
        config,
        config.month_formatter.as_ref(),
        "month_formatter",
        &config.month_format,
        month,
    )
}

pub fn day_label(config: &CalendarConfig, date: NaiveDate) -> Result<String, CalendarError> {
    format_with(
        config,
        config.day_formatter.as_ref(),
        "day_formatter",
        &config.day_format,
        date,
    )
}

/// Header labels in column order for the week containing `reference`.
pub fn weekday_labels(config: &CalendarConfig, reference: NaiveDate) -> Result<Vec<String>, CalendarError> {
    generate_weekday_header(config.first_day_of_week, reference)
        .into_iter()
        .map(|date| {
            format_with(
                config,
                config.weekday_formatter.as_ref(),
                "weekday_formatter",
                &config.weekday_format,
                date,
            )
        })
        .collect()
}

/// Value a picker writes back into its input for `date`.
pub fn date_value(config: &CalendarConfig, date: NaiveDate) -> Result<String, CalendarError> {
    config.locale.format_date(date, &config.date_format)
}

pub fn day_css_class(config: &CalendarConfig, date: NaiveDate) -> Result<String, CalendarError> {
    match &config.day_css_class {
        Some(callback) => callback(date).map_err(|source| CalendarError::Callback {
            hook: "day_css_class",
            date,
            source,
        }),
        None => Ok(String::new()),
    }
}

/// Left is blocked once `min` lies in or after the viewed month; right is
/// blocked once `max` lies in or before it.
pub fn can_navigate(direction: Direction, config: &CalendarConfig, viewed_month: NaiveDate) -> bool {
    match direction {
        Direction::Left => config
            .min
            .is_none_or(|min| dates::cmp_month(min, viewed_month) == Ordering::Less),
        Direction::Right => config
            .max
            .is_none_or(|max| dates::cmp_month(max, viewed_month) == Ordering::Greater),
    }
}

/// First day of the month one step in `direction`, or `None` when the
/// bounds forbid the move. Uses the locale provider's month arithmetic.
pub fn step_month(direction: Direction, config: &CalendarConfig, viewed_month: NaiveDate) -> Option<NaiveDate> {
    if !can_navigate(direction, config, viewed_month) {
        trace!(?direction, %viewed_month, "navigation blocked");
        return None;
    }
    let months = match direction {
        Direction::Left => -1,
        Direction::Right => 1,
    };
    let first = dates::first_day_of_month(viewed_month);
    Some(dates::first_day_of_month(config.locale.add_months(first, months)))
}

/// Returns the selection after `date` is clicked.
///
/// Multi-select toggles `date` in or out; single-select always yields
/// exactly `[date]`. Days are matched with the config's locale provider.
pub fn toggle_selection(config: &CalendarConfig, selected: &[NaiveDate], date: NaiveDate) -> Vec<NaiveDate> {
    if !config.allow_multi_select {
        return vec![date];
    }

    let locale = config.locale.as_ref();
    if selected.iter().any(|picked| locale.is_same_day(*picked, date)) {
        selected
            .iter()
            .copied()
            .filter(|picked| !locale.is_same_day(*picked, date))
            .collect()
    } else {
        let mut next = selected.to_vec();
        next.push(date);
        next
    }
}

fn format_with(
    config: &CalendarConfig,
    formatter: Option<&DayFormatter>,
    hook: &'static str,
    pattern: &str,
    date: NaiveDate,
) -> Result<String, CalendarError> {
    match formatter {
        Some(formatter) => formatter(date).map_err(|source| CalendarError::Callback { hook, date, source }),
        None => config.locale.format_date(date, pattern),
    }
}
