use std::collections::BTreeMap;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::Invocation;
use crate::config::Config;
use crate::datetime::{parse_day_expr, parse_month_expr};
use crate::grid::{MonthGrid, generate_month_grid_at};
use crate::options::CalendarConfig;
use crate::policy::{Direction, can_navigate, is_date_disabled, step_month, toggle_selection, weekday_labels};
use crate::render::Renderer;
use crate::view::{MonthView, build_month_view_at};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "month",
        "grid",
        "weekdays",
        "disabled",
        "navigate",
        "toggle",
        "_commands",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisabledReport {
    pub date: NaiveDate,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationReport {
    pub month: NaiveDate,
    pub left: bool,
    pub right: bool,
    pub prev_month: Option<NaiveDate>,
    pub next_month: Option<NaiveDate>,
}

#[instrument(skip(cfg, calendar, renderer, inv))]
pub fn dispatch(
    cfg: &Config,
    calendar: &CalendarConfig,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = calendar.locale.today();
    let command = inv.command.as_str();
    let args = inv.command_args.as_slice();

    debug!(command, ?args, %today, "dispatching command");

    match command {
        "month" => renderer.print_json(&cmd_month(calendar, args, today)?),
        "grid" => renderer.print_json(&cmd_grid(calendar, args, today)?),
        "weekdays" => renderer.print_json(&weekday_labels(calendar, today)?),
        "disabled" => renderer.print_json(&cmd_disabled(calendar, args, today)?),
        "navigate" => renderer.print_json(&cmd_navigate(calendar, args, today)?),
        "toggle" => renderer.print_json(&cmd_toggle(calendar, args, today)?),
        "_commands" => cmd_commands(),
        "_show" => cmd_show(cfg, renderer),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// First argument is the viewed month, the rest are selected days.
fn month_and_selection(
    calendar: &CalendarConfig,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<(NaiveDate, Vec<NaiveDate>)> {
    let Some((month_arg, rest)) = args.split_first() else {
        return Ok((parse_month_expr("today", today)?, vec![]));
    };

    let month = parse_month_expr(month_arg, today)?;
    let selected = parse_days(calendar, rest, today)?;
    Ok((month, selected))
}

fn parse_days(calendar: &CalendarConfig, args: &[String], today: NaiveDate) -> anyhow::Result<Vec<NaiveDate>> {
    args.iter()
        .map(|arg| parse_day_expr(arg, today, &calendar.date_format))
        .collect()
}

pub fn cmd_month(calendar: &CalendarConfig, args: &[String], today: NaiveDate) -> anyhow::Result<MonthView> {
    let (month, selected) = month_and_selection(calendar, args, today)?;
    let view = build_month_view_at(calendar, month, &selected, today)
        .with_context(|| format!("failed to build month view for {}", month.format("%Y-%m")))?;
    info!(month = %view.month, rows = view.weeks.len(), "month view ready");
    Ok(view)
}

pub fn cmd_grid(calendar: &CalendarConfig, args: &[String], today: NaiveDate) -> anyhow::Result<MonthGrid> {
    let (month, selected) = month_and_selection(calendar, args, today)?;
    Ok(generate_month_grid_at(calendar, month, &selected, today))
}

pub fn cmd_disabled(
    calendar: &CalendarConfig,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<Vec<DisabledReport>> {
    if args.is_empty() {
        return Err(anyhow!("disabled requires at least one date"));
    }

    parse_days(calendar, args, today)?
        .into_iter()
        .map(|date| -> anyhow::Result<DisabledReport> {
            Ok(DisabledReport {
                date,
                disabled: is_date_disabled(date, calendar)?,
            })
        })
        .collect()
}

pub fn cmd_navigate(
    calendar: &CalendarConfig,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<NavigationReport> {
    let month = match args.first() {
        Some(arg) => parse_month_expr(arg, today)?,
        None => parse_month_expr("today", today)?,
    };

    Ok(NavigationReport {
        month,
        left: can_navigate(Direction::Left, calendar, month),
        right: can_navigate(Direction::Right, calendar, month),
        prev_month: step_month(Direction::Left, calendar, month),
        next_month: step_month(Direction::Right, calendar, month),
    })
}

pub fn cmd_toggle(calendar: &CalendarConfig, args: &[String], today: NaiveDate) -> anyhow::Result<Vec<NaiveDate>> {
    let Some((clicked, selected)) = args.split_first() else {
        return Err(anyhow!("toggle requires a date"));
    };

    let clicked = parse_day_expr(clicked, today, &calendar.date_format)?;
    let selected = parse_days(calendar, selected, today)?;
    Ok(toggle_selection(calendar, &selected, clicked))
}

fn cmd_commands() -> anyhow::Result<()> {
    for command in known_command_names() {
        println!("{command}");
    }
    Ok(())
}

fn cmd_show(cfg: &Config, renderer: &mut Renderer) -> anyhow::Result<()> {
    let sorted: BTreeMap<&String, &String> = cfg.iter().collect();
    let rows: Vec<(String, String)> = sorted.into_iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    renderer.print_key_values(&rows)
}

fn cmd_help() -> anyhow::Result<()> {
    println!("Usage: daygrid [OPTIONS] [COMMAND] [ARGS...]");
    println!();
    println!("  month [MONTH] [DATE...]    month view with labels and flags (default)");
    println!("  grid [MONTH] [DATE...]     bare 6x7 day grid");
    println!("  weekdays                   weekday header labels");
    println!("  disabled DATE...           disabled state of each date");
    println!("  navigate [MONTH]           whether left/right navigation is allowed");
    println!("  toggle DATE [SELECTED...]  selection after clicking DATE");
    println!("  _show                      effective configuration");
    println!();
    println!("MONTH: YYYY-MM, YYYY-MM-DD, month name, today/next/prev, +Nm/-Nm, +Ny/-Ny");
    println!("DATE:  YYYY-MM-DD, today/tomorrow/yesterday, weekday name, calendar.format.date");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::options::CalendarConfig;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn abbrev_requires_unique_prefix() {
        let known = known_command_names();
        assert_eq!(expand_command_abbrev("gr", &known), Some("grid"));
        assert_eq!(expand_command_abbrev("_", &known), None);
        assert_eq!(expand_command_abbrev("zzz", &known), None);
    }

    #[test]
    fn month_defaults_to_current_month() {
        let view = cmd_month(&CalendarConfig::default(), &[], date(2024, 3, 15)).expect("month");
        assert_eq!(view.month, date(2024, 3, 1));
        let todays = view
            .weeks
            .iter()
            .flat_map(|week| week.days.iter())
            .filter(|cell| cell.day.is_today)
            .count();
        assert_eq!(todays, 1);
    }

    #[test]
    fn grid_marks_selection_from_args() {
        let grid = cmd_grid(
            &CalendarConfig::default(),
            &args(&["2024-03", "2024-03-15"]),
            date(2026, 1, 1),
        )
        .expect("grid");
        let picked: Vec<_> = grid.days().filter(|day| day.selected).collect();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].date, date(2024, 3, 15));
    }

    #[test]
    fn disabled_reports_each_date() {
        let calendar = CalendarConfig {
            min: Some(date(2024, 3, 10)),
            max: Some(date(2024, 3, 20)),
            ..CalendarConfig::default()
        };
        let report = cmd_disabled(
            &calendar,
            &args(&["2024-03-05", "2024-03-15", "2024-03-25"]),
            date(2024, 3, 1),
        )
        .expect("disabled");
        let flags: Vec<bool> = report.iter().map(|entry| entry.disabled).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert!(cmd_disabled(&calendar, &[], date(2024, 3, 1)).is_err());
    }

    #[test]
    fn navigate_checks_bounds() {
        let calendar = CalendarConfig {
            max: Some(date(2024, 3, 20)),
            ..CalendarConfig::default()
        };
        let report = cmd_navigate(&calendar, &args(&["2024-03"]), date(2024, 1, 1)).expect("navigate");
        assert!(report.left);
        assert!(!report.right);
        assert_eq!(report.prev_month, Some(date(2024, 2, 1)));
        assert_eq!(report.next_month, None);
    }

    #[test]
    fn toggle_uses_configured_mode() {
        let calendar = CalendarConfig {
            allow_multi_select: true,
            ..CalendarConfig::default()
        };
        let next = cmd_toggle(&calendar, &args(&["2024-03-02", "2024-03-01"]), date(2024, 3, 1)).expect("toggle");
        assert_eq!(next, vec![date(2024, 3, 1), date(2024, 3, 2)]);
        assert!(cmd_toggle(&calendar, &[], date(2024, 3, 1)).is_err());
    }
}
