use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::datetime;
use crate::options::CalendarOptions;
use crate::weekday::WeekdayCode;

const RC_ENV_VAR: &str = "DAYGRIDRC";
const RC_FILE_NAME: &str = ".daygridrc";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "default.command".to_string(),
      "month".to_string()
    );
    map.insert(
      "output.pretty".to_string(),
      "on".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(
      rc_override
    )?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading daygridrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no daygridrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// Converts the `calendar.*` keys into engine overrides.
  #[tracing::instrument(skip(self))]
  pub fn calendar_options(
    &self
  ) -> anyhow::Result<CalendarOptions>
  {
    let first_day_of_week = self
      .get("calendar.first_day_of_week")
      .map(|raw| {
        raw.parse::<WeekdayCode>().with_context(|| {
          format!(
            "invalid calendar.first_day_of_week: {raw}"
          )
        })
      })
      .transpose()?;

    let min = self
      .get("calendar.min")
      .map(|raw| {
        parse_bound("calendar.min", &raw)
      })
      .transpose()?;
    let max = self
      .get("calendar.max")
      .map(|raw| {
        parse_bound("calendar.max", &raw)
      })
      .transpose()?;

    let timezone = datetime::resolve_timezone(
      self
        .get("calendar.timezone")
        .as_deref()
    );

    let options = CalendarOptions {
      show_near_month_days: self
        .get_bool(
          "calendar.show_near_month_days"
        ),
      show_week_numbers: self.get_bool(
        "calendar.show_week_numbers"
      ),
      first_day_of_week,
      min,
      max,
      allow_multi_select: self.get_bool(
        "calendar.allow_multi_select"
      ),
      date_format: self
        .get("calendar.format.date"),
      month_format: self
        .get("calendar.format.month"),
      day_format: self
        .get("calendar.format.day"),
      weekday_format: self
        .get("calendar.format.weekday"),
      locale: self.get("calendar.locale"),
      timezone
    };
    trace!(?options, "calendar options from rc");
    Ok(options)
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = unquote(v.trim());
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

fn parse_bound(
  key: &str,
  raw: &str
) -> anyhow::Result<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    "%Y-%m-%d"
  )
  .with_context(|| {
    format!(
      "{key} must be YYYY-MM-DD, got: \
       {raw}"
    )
  })
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping daygridrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

/// Format patterns such as `%b, %Y` may be written quoted.
fn unquote(value: &str) -> String {
  value
    .strip_prefix('"')
    .and_then(|rest| {
      rest.strip_suffix('"')
    })
    .unwrap_or(value)
    .to_string()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use super::{
    Config,
    parse_bool,
    unquote
  };
  use crate::weekday::WeekdayCode;

  #[test]
  fn defaults_choose_month_command() {
    let cfg = Config::default();
    assert_eq!(
      cfg.get("default.command").as_deref(),
      Some("month")
    );
    assert_eq!(
      cfg.get_bool("output.pretty"),
      Some(true)
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "rc.calendar.first_day_of_week"
        .to_string(),
      "mo".to_string()
    )]);
    let options = cfg
      .calendar_options()
      .expect("calendar options");
    assert_eq!(
      options.first_day_of_week,
      Some(WeekdayCode::Mo)
    );
  }

  #[test]
  fn bad_bound_is_reported() {
    let mut cfg = Config::default();
    cfg.apply_overrides(vec![(
      "calendar.min".to_string(),
      "03/10/2024".to_string()
    )]);
    let err = cfg
      .calendar_options()
      .expect_err("bad min");
    assert!(
      format!("{err:#}")
        .contains("calendar.min")
    );
  }

  #[test]
  fn bool_and_quote_helpers() {
    assert!(parse_bool("On"));
    assert!(!parse_bool("off"));
    assert_eq!(
      unquote("\"%b, %Y\""),
      "%b, %Y"
    );
    assert_eq!(unquote("%d"), "%d");
  }
}
