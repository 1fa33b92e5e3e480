//! Day-calendar configuration: defaults, user overrides and callbacks.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalendarError, HookError};
use crate::locale::{CalendarLocale, ChronoLocale, validate_pattern};
use crate::weekday::WeekdayCode;

pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";
pub const DEFAULT_MONTH_FORMAT: &str = "%b, %Y";
pub const DEFAULT_DAY_FORMAT: &str = "%d";
pub const DEFAULT_WEEKDAY_FORMAT: &str = "%a";

pub type DayPredicate = Arc<dyn Fn(NaiveDate) -> Result<bool, HookError> + Send + Sync>;
pub type DayFormatter = Arc<dyn Fn(NaiveDate) -> Result<String, HookError> + Send + Sync>;

/// User overrides. Every field left as `None` keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarOptions {
    pub show_near_month_days: Option<bool>,
    pub show_week_numbers: Option<bool>,
    pub first_day_of_week: Option<WeekdayCode>,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub allow_multi_select: Option<bool>,
    pub date_format: Option<String>,
    pub month_format: Option<String>,
    pub day_format: Option<String>,
    pub weekday_format: Option<String>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
}

/// Merged configuration consumed by the grid engine and the policies.
#[derive(Clone)]
pub struct CalendarConfig {
    pub show_near_month_days: bool,
    pub show_week_numbers: bool,
    pub first_day_of_week: WeekdayCode,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub allow_multi_select: bool,
    pub date_format: String,
    pub month_format: String,
    pub day_format: String,
    pub weekday_format: String,
    pub locale: Arc<dyn CalendarLocale>,
    pub is_day_disabled: Option<DayPredicate>,
    pub month_formatter: Option<DayFormatter>,
    pub day_formatter: Option<DayFormatter>,
    pub weekday_formatter: Option<DayFormatter>,
    pub day_css_class: Option<DayFormatter>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            show_near_month_days: true,
            show_week_numbers: false,
            first_day_of_week: WeekdayCode::Su,
            min: None,
            max: None,
            allow_multi_select: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            month_format: DEFAULT_MONTH_FORMAT.to_string(),
            day_format: DEFAULT_DAY_FORMAT.to_string(),
            weekday_format: DEFAULT_WEEKDAY_FORMAT.to_string(),
            locale: Arc::new(ChronoLocale::default()),
            is_day_disabled: None,
            month_formatter: None,
            day_formatter: None,
            weekday_formatter: None,
            day_css_class: None,
        }
    }
}

impl fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("show_near_month_days", &self.show_near_month_days)
            .field("show_week_numbers", &self.show_week_numbers)
            .field("first_day_of_week", &self.first_day_of_week)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("allow_multi_select", &self.allow_multi_select)
            .field("date_format", &self.date_format)
            .field("month_format", &self.month_format)
            .field("day_format", &self.day_format)
            .field("weekday_format", &self.weekday_format)
            .field("locale", &self.locale)
            .field("is_day_disabled", &self.is_day_disabled.is_some())
            .field("month_formatter", &self.month_formatter.is_some())
            .field("day_formatter", &self.day_formatter.is_some())
            .field("weekday_formatter", &self.weekday_formatter.is_some())
            .field("day_css_class", &self.day_css_class.is_some())
            .finish()
    }
}

impl CalendarConfig {
    /// Merges `options` over the defaults and validates the result.
    #[tracing::instrument(skip_all)]
    pub fn from_options(options: CalendarOptions) -> Result<Self, CalendarError> {
        let mut cfg = Self::default();

        if let Some(value) = options.show_near_month_days {
            cfg.show_near_month_days = value;
        }
        if let Some(value) = options.show_week_numbers {
            cfg.show_week_numbers = value;
        }
        if let Some(value) = options.first_day_of_week {
            cfg.first_day_of_week = value;
        }
        if let Some(value) = options.allow_multi_select {
            cfg.allow_multi_select = value;
        }
        cfg.min = options.min;
        cfg.max = options.max;

        if let Some(value) = options.date_format {
            cfg.date_format = value;
        }
        if let Some(value) = options.month_format {
            cfg.month_format = value;
        }
        if let Some(value) = options.day_format {
            cfg.day_format = value;
        }
        if let Some(value) = options.weekday_format {
            cfg.weekday_format = value;
        }

        if options.locale.is_some() || options.timezone.is_some() {
            let locale = ChronoLocale::from_names(
                options.locale.as_deref().unwrap_or("en_US"),
                options.timezone.as_deref(),
            )?;
            cfg.locale = Arc::new(locale);
        }

        cfg.validate()?;
        debug!(config = ?cfg, "merged calendar config");
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CalendarError> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(CalendarError::InvalidRange { min, max });
        }

        validate_pattern("date", &self.date_format)?;
        validate_pattern("month", &self.month_format)?;
        validate_pattern("day", &self.day_format)?;
        validate_pattern("weekday", &self.weekday_format)?;
        Ok(())
    }

    pub fn with_locale<L>(mut self, locale: L) -> Self
    where
        L: CalendarLocale + 'static,
    {
        self.locale = Arc::new(locale);
        self
    }

    pub fn with_day_disabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(NaiveDate) -> Result<bool, HookError> + Send + Sync + 'static,
    {
        self.is_day_disabled = Some(Arc::new(predicate));
        self
    }

    pub fn with_month_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(NaiveDate) -> Result<String, HookError> + Send + Sync + 'static,
    {
        self.month_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_day_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(NaiveDate) -> Result<String, HookError> + Send + Sync + 'static,
    {
        self.day_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_weekday_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(NaiveDate) -> Result<String, HookError> + Send + Sync + 'static,
    {
        self.weekday_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_day_css_class<F>(mut self, callback: F) -> Self
    where
        F: Fn(NaiveDate) -> Result<String, HookError> + Send + Sync + 'static,
    {
        self.day_css_class = Some(Arc::new(callback));
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::CalendarError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn empty_options_yield_defaults() {
        let cfg = CalendarConfig::from_options(CalendarOptions::default()).expect("merge");
        assert!(cfg.show_near_month_days);
        assert!(!cfg.show_week_numbers);
        assert!(!cfg.allow_multi_select);
        assert_eq!(cfg.first_day_of_week, WeekdayCode::Su);
        assert_eq!(cfg.month_format, DEFAULT_MONTH_FORMAT);
        assert_eq!(cfg.day_format, DEFAULT_DAY_FORMAT);
        assert!(cfg.min.is_none() && cfg.max.is_none());
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let cfg = CalendarConfig::from_options(CalendarOptions {
            first_day_of_week: Some(WeekdayCode::Mo),
            show_near_month_days: Some(false),
            day_format: Some("%e".to_string()),
            ..CalendarOptions::default()
        })
        .expect("merge");
        assert_eq!(cfg.first_day_of_week, WeekdayCode::Mo);
        assert!(!cfg.show_near_month_days);
        assert_eq!(cfg.day_format, "%e");
        assert_eq!(cfg.month_format, DEFAULT_MONTH_FORMAT);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = CalendarConfig::from_options(CalendarOptions {
            min: Some(date(2024, 3, 20)),
            max: Some(date(2024, 3, 10)),
            ..CalendarOptions::default()
        })
        .expect_err("min after max");
        assert!(matches!(err, CalendarError::InvalidRange { .. }));
    }

    #[test]
    fn equal_bounds_are_accepted() {
        let cfg = CalendarConfig::from_options(CalendarOptions {
            min: Some(date(2024, 3, 10)),
            max: Some(date(2024, 3, 10)),
            ..CalendarOptions::default()
        });
        assert!(cfg.is_ok());
    }

    #[test]
    fn broken_format_is_rejected() {
        let err = CalendarConfig::from_options(CalendarOptions {
            month_format: Some("%Q %Y".to_string()),
            ..CalendarOptions::default()
        })
        .expect_err("bad pattern");
        assert!(matches!(err, CalendarError::InvalidFormat { field: "month", .. }));
    }

    #[test]
    fn unknown_locale_is_rejected() {
        let err = CalendarConfig::from_options(CalendarOptions {
            locale: Some("xx_XX".to_string()),
            ..CalendarOptions::default()
        })
        .expect_err("bad locale");
        assert!(matches!(err, CalendarError::UnknownLocale(_)));
    }

    #[test]
    fn options_deserialize_from_toml() {
        let options: CalendarOptions = toml::from_str(
            r#"
            first_day_of_week = "mo"
            show_near_month_days = false
            min = "2024-03-10"
            "#,
        )
        .expect("parse options");
        assert_eq!(options.first_day_of_week, Some(WeekdayCode::Mo));
        assert_eq!(options.show_near_month_days, Some(false));
        assert_eq!(options.min, Some(date(2024, 3, 10)));
        assert!(options.max.is_none());
    }

    #[test]
    fn debug_output_reports_callback_presence() {
        let cfg = CalendarConfig::default().with_day_disabled(|_| Ok(false));
        let rendered = format!("{cfg:?}");
        assert!(rendered.contains("is_day_disabled: true"));
        assert!(rendered.contains("day_formatter: false"));
    }
}
