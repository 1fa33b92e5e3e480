pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod datetime;
pub mod error;
pub mod grid;
pub mod locale;
pub mod options;
pub mod policy;
pub mod render;
pub mod view;
pub mod weekday;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use error::{
  CalendarError,
  HookError
};
pub use grid::{
  Day,
  MonthGrid,
  MonthPosition,
  generate_month_grid,
  generate_month_grid_at,
  generate_weekday_header
};
pub use locale::{
  CalendarLocale,
  ChronoLocale,
  Clock
};
pub use options::{
  CalendarConfig,
  CalendarOptions
};
pub use policy::{
  Direction,
  can_navigate,
  day_css_class,
  day_label,
  header_label,
  is_day_disabled,
  step_month,
  toggle_selection,
  weekday_labels
};
pub use view::{
  MonthView,
  build_month_view
};
pub use weekday::{
  WeekdayCode,
  WeekdayOrder
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daygrid CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.daygridrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let options = cfg
    .calendar_options()
    .context(
      "failed to read calendar \
       settings"
    )?;
  let calendar =
    CalendarConfig::from_options(
      options
    )
    .context(
      "invalid calendar \
       configuration"
    )?;

  let mut renderer =
    render::Renderer::new(&cfg);
  let inv = cli::Invocation::parse(
    &cfg, cli.rest
  )?;

  commands::dispatch(
    &cfg,
    &calendar,
    &mut renderer,
    inv
  )?;

  info!("done");
  Ok(())
}
