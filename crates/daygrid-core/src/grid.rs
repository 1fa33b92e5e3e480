//! Month grid generation.
//!
//! A grid always starts on the configured first day of the week and covers
//! 42 consecutive calendar days (6 rows of 7). Days are stepped with the
//! locale provider's day arithmetic, which defaults to `NaiveDate` steps, so
//! timezone and DST transitions have no effect on which days appear.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{debug, trace};

use crate::dates;
use crate::locale::CalendarLocale;
use crate::options::CalendarConfig;
use crate::weekday::WeekdayCode;

pub const DAYS_PER_WEEK: usize = 7;
pub const WEEKS_PER_GRID: usize = 6;
pub const GRID_DAYS: usize = DAYS_PER_WEEK * WEEKS_PER_GRID;

/// Which month a grid cell belongs to, relative to the viewed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthPosition {
    Prev,
    Viewed,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Day {
    pub date: NaiveDate,
    pub selected: bool,
    pub position: MonthPosition,
    pub is_today: bool,
}

impl Day {
    pub fn is_in_viewed_month(&self) -> bool {
        self.position == MonthPosition::Viewed
    }

    pub fn is_prev_month(&self) -> bool {
        self.position == MonthPosition::Prev
    }

    pub fn is_next_month(&self) -> bool {
        self.position == MonthPosition::Next
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    /// First day of the viewed month.
    pub month: NaiveDate,
    pub weeks: Vec<Vec<Day>>,
}

impl MonthGrid {
    pub fn days(&self) -> impl Iterator<Item = &Day> {
        self.weeks.iter().flatten()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days().next().map(|day| day.date)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days().last().map(|day| day.date)
    }
}

/// Number of days the board starts before the first of the month.
///
/// Always within `0..=6`.
pub fn leading_days(first_of_month: Weekday, first_day_of_week: WeekdayCode) -> u32 {
    let day_idx = first_of_month.num_days_from_sunday();
    let start_idx = first_day_of_week.index() as u32;
    (7 + day_idx - start_idx) % 7
}

pub fn first_day_of_board(config: &CalendarConfig, viewed_month: NaiveDate) -> NaiveDate {
    let first = dates::first_day_of_month(viewed_month);
    let lead = leading_days(first.weekday(), config.first_day_of_week);
    config.locale.add_days(first, -(lead as i64))
}

/// Builds the grid using the config's locale provider for "today".
pub fn generate_month_grid(
    config: &CalendarConfig,
    viewed_month: NaiveDate,
    selected: &[NaiveDate],
) -> MonthGrid {
    generate_month_grid_at(config, viewed_month, selected, config.locale.today())
}

/// Builds the grid against an explicit "today".
///
/// Day matching and stepping go through `config.locale`. Viewed months
/// must leave room for the board inside chrono's date range: the first
/// month of `NaiveDate::MIN`'s year and December of `NaiveDate::MAX`'s
/// year are unsupported, and their boards repeat the boundary date.
#[tracing::instrument(skip(config, selected), fields(selected = selected.len()))]
pub fn generate_month_grid_at(
    config: &CalendarConfig,
    viewed_month: NaiveDate,
    selected: &[NaiveDate],
    today: NaiveDate,
) -> MonthGrid {
    let month = dates::first_day_of_month(viewed_month);
    let locale = config.locale.as_ref();
    let start = first_day_of_board(config, month);
    trace!(%start, "first day of board");

    let mut weeks: Vec<Vec<Day>> = Vec::with_capacity(WEEKS_PER_GRID);
    let mut current = start;
    for _ in 0..WEEKS_PER_GRID {
        let mut week = Vec::with_capacity(DAYS_PER_WEEK);
        for _ in 0..DAYS_PER_WEEK {
            week.push(Day {
                date: current,
                selected: selected.iter().any(|picked| locale.is_same_day(current, *picked)),
                position: position_of(locale, current, month),
                is_today: locale.is_same_day(current, today),
            });
            current = locale.add_days(current, 1);
        }
        weeks.push(week);
    }

    if !config.show_near_month_days {
        remove_near_month_week(&mut weeks);
    }

    debug!(rows = weeks.len(), %month, "generated month grid");
    MonthGrid { month, weeks }
}

/// Drops the trailing row when it has no day of the viewed month.
fn remove_near_month_week(weeks: &mut Vec<Vec<Day>>) {
    let trailing_is_foreign = weeks
        .last()
        .is_some_and(|week| !week.iter().any(Day::is_in_viewed_month));
    if weeks.len() > 1 && trailing_is_foreign {
        weeks.pop();
    }
}

fn position_of(locale: &dyn CalendarLocale, date: NaiveDate, month: NaiveDate) -> MonthPosition {
    if locale.is_same_month(date, month) {
        return MonthPosition::Viewed;
    }
    match dates::cmp_month(date, month) {
        Ordering::Less => MonthPosition::Prev,
        _ => MonthPosition::Next,
    }
}

/// ISO week number of the row, taken from the row's Thursday.
pub fn week_number(week: &[Day]) -> Option<u32> {
    week.iter()
        .find(|day| day.date.weekday() == Weekday::Thu)
        .map(|day| day.date.iso_week().week())
}

/// One date per column, drawn from the week containing `reference`.
pub fn generate_weekday_header(
    first_day_of_week: WeekdayCode,
    reference: NaiveDate,
) -> [NaiveDate; DAYS_PER_WEEK] {
    let start = dates::start_of_week(reference, first_day_of_week.to_chrono());
    std::array::from_fn(|column| dates::add_days(start, column as i64))
}
