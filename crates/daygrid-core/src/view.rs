use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::CalendarError;
use crate::grid::{Day, MonthGrid, generate_month_grid_at, week_number};
use crate::options::CalendarConfig;
use crate::policy::{
    Direction, can_navigate, date_value, day_css_class, day_label, header_label, is_day_disabled,
    weekday_labels,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayView {
    #[serde(flatten)]
    pub day: Day,
    pub disabled: bool,
    pub label: String,
    pub value: String,
    pub css_class: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_number: Option<u32>,
    pub days: Vec<DayView>,
}

/// Everything a UI layer needs to draw one month of the day calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthView {
    pub month: NaiveDate,
    pub header: String,
    pub weekdays: Vec<String>,
    pub can_navigate_left: bool,
    pub can_navigate_right: bool,
    pub weeks: Vec<WeekView>,
}

pub fn build_month_view(
    config: &CalendarConfig,
    viewed_month: NaiveDate,
    selected: &[NaiveDate],
) -> Result<MonthView, CalendarError> {
    build_month_view_at(config, viewed_month, selected, config.locale.today())
}

/// Like [`build_month_view`] with an explicit "today".
///
/// Callbacks run before anything is returned, so a failing callback leaves
/// no partial view behind.
#[tracing::instrument(skip(config, selected))]
pub fn build_month_view_at(
    config: &CalendarConfig,
    viewed_month: NaiveDate,
    selected: &[NaiveDate],
    today: NaiveDate,
) -> Result<MonthView, CalendarError> {
    let grid = generate_month_grid_at(config, viewed_month, selected, today);
    let weeks = annotate_weeks(config, &grid)?;

    let view = MonthView {
        month: grid.month,
        header: header_label(config, grid.month)?,
        weekdays: weekday_labels(config, grid.month)?,
        can_navigate_left: can_navigate(Direction::Left, config, grid.month),
        can_navigate_right: can_navigate(Direction::Right, config, grid.month),
        weeks,
    };
    debug!(header = %view.header, rows = view.weeks.len(), "built month view");
    Ok(view)
}

fn annotate_weeks(config: &CalendarConfig, grid: &MonthGrid) -> Result<Vec<WeekView>, CalendarError> {
    grid.weeks
        .iter()
        .map(|week| -> Result<WeekView, CalendarError> {
            let days = week
                .iter()
                .map(|day| annotate_day(config, *day))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WeekView {
                week_number: if config.show_week_numbers { week_number(week) } else { None },
                days,
            })
        })
        .collect()
}

fn annotate_day(config: &CalendarConfig, day: Day) -> Result<DayView, CalendarError> {
    Ok(DayView {
        disabled: is_day_disabled(&day, config)?,
        label: day_label(config, day.date)?,
        value: date_value(config, day.date)?,
        css_class: day_css_class(config, day.date)?,
        day,
    })
}
