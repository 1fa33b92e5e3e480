//! Calendar locale provider: localized formatting plus the clock that
//! decides which day is "today".

use std::fmt::{self, Write as _};

use chrono::format::{Item, StrftimeItems};
use chrono::{Local, Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::dates;
use crate::error::CalendarError;

/// Capability the grid engine needs from a date library.
///
/// Only `format_date` and `today` have to be supplied; the arithmetic
/// defaults work on calendar days and never on wall-clock hours. The grid
/// steps and matches days through these methods, so overriding them
/// changes which cells are generated, selected and marked as today.
pub trait CalendarLocale: fmt::Debug + Send + Sync {
    fn format_date(&self, date: NaiveDate, pattern: &str) -> Result<String, CalendarError>;

    fn today(&self) -> NaiveDate;

    fn add_days(&self, date: NaiveDate, days: i64) -> NaiveDate {
        dates::add_days(date, days)
    }

    fn add_months(&self, date: NaiveDate, months: i32) -> NaiveDate {
        dates::shift_month(date, months)
    }

    fn is_same_day(&self, a: NaiveDate, b: NaiveDate) -> bool {
        dates::is_same_day(a, b)
    }

    fn is_same_month(&self, a: NaiveDate, b: NaiveDate) -> bool {
        dates::is_same_month(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Clock {
    /// The operating system's local zone.
    System,
    Zone(Tz),
    /// Frozen "today", for reproducible output.
    Fixed(NaiveDate),
}

/// `CalendarLocale` backed by chrono's localized strftime and chrono-tz.
#[derive(Debug, Clone, Copy)]
pub struct ChronoLocale {
    locale: Locale,
    clock: Clock,
}

impl Default for ChronoLocale {
    fn default() -> Self {
        Self {
            locale: Locale::en_US,
            clock: Clock::System,
        }
    }
}

impl ChronoLocale {
    pub fn new(locale: Locale, clock: Clock) -> Self {
        Self { locale, clock }
    }

    pub fn from_names(locale: &str, timezone: Option<&str>) -> Result<Self, CalendarError> {
        let locale = parse_locale(locale)?;
        let clock = match timezone {
            Some(raw) => Clock::Zone(parse_timezone(raw)?),
            None => Clock::System,
        };
        Ok(Self { locale, clock })
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }
}

impl CalendarLocale for ChronoLocale {
    fn format_date(&self, date: NaiveDate, pattern: &str) -> Result<String, CalendarError> {
        validate_pattern("strftime", pattern)?;
        let at_midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let mut out = String::new();
        write!(out, "{}", at_midnight.format_localized(pattern, self.locale)).map_err(|_| {
            CalendarError::InvalidFormat {
                field: "strftime",
                pattern: pattern.to_string(),
            }
        })?;
        Ok(out)
    }

    fn today(&self) -> NaiveDate {
        match self.clock {
            Clock::System => Local::now().date_naive(),
            Clock::Zone(tz) => Utc::now().with_timezone(&tz).date_naive(),
            Clock::Fixed(date) => date,
        }
    }
}

/// Rejects strftime patterns chrono cannot render.
pub fn validate_pattern(field: &'static str, pattern: &str) -> Result<(), CalendarError> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        warn!(field, pattern, "rejected format pattern");
        return Err(CalendarError::InvalidFormat {
            field,
            pattern: pattern.to_string(),
        });
    }
    Ok(())
}

/// Accepts `en_US`, `en-US` and bare language codes such as `de`.
pub fn parse_locale(raw: &str) -> Result<Locale, CalendarError> {
    let normalized = raw.trim().replace('-', "_");
    if normalized.is_empty() {
        return Err(CalendarError::UnknownLocale(raw.to_string()));
    }

    let candidate = if normalized.contains('_') || normalized == "POSIX" {
        normalized
    } else {
        let lang = normalized.to_ascii_lowercase();
        match lang.as_str() {
            "en" => "en_US".to_string(),
            "pt" => "pt_BR".to_string(),
            "zh" => "zh_CN".to_string(),
            "ja" => "ja_JP".to_string(),
            "ko" => "ko_KR".to_string(),
            "sv" => "sv_SE".to_string(),
            "he" => "he_IL".to_string(),
            "da" => "da_DK".to_string(),
            "cs" => "cs_CZ".to_string(),
            "uk" => "uk_UA".to_string(),
            _ => format!("{lang}_{}", lang.to_ascii_uppercase()),
        }
    };

    match Locale::try_from(candidate.as_str()) {
        Ok(locale) => {
            debug!(input = raw, locale = %candidate, "resolved locale");
            Ok(locale)
        }
        Err(_) => Err(CalendarError::UnknownLocale(raw.to_string())),
    }
}

pub fn parse_timezone(raw: &str) -> Result<Tz, CalendarError> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| CalendarError::InvalidTimezone(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Locale, NaiveDate};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn formats_in_english_by_default() {
        let locale = ChronoLocale::default();
        let label = locale
            .format_date(date(2024, 3, 5), "%b, %Y")
            .expect("format month");
        assert_eq!(label, "Mar, 2024");
    }

    #[test]
    fn formats_localized_month_names() {
        let locale = ChronoLocale::new(Locale::de_DE, Clock::System);
        let label = locale
            .format_date(date(2024, 3, 5), "%B %Y")
            .expect("format month");
        assert_eq!(label, "März 2024");
    }

    #[test]
    fn rejects_broken_patterns() {
        let locale = ChronoLocale::default();
        let err = locale.format_date(date(2024, 3, 5), "%Q").expect_err("unknown specifier");
        assert!(matches!(err, CalendarError::InvalidFormat { field: "strftime", .. }));
        assert_eq!(err.to_string(), "invalid strftime format pattern: \"%Q\"");
        assert!(validate_pattern("day", "%d").is_ok());
    }

    #[test]
    fn fixed_clock_reports_frozen_today() {
        let locale = ChronoLocale::default().with_clock(Clock::Fixed(date(2024, 3, 15)));
        assert_eq!(locale.today(), date(2024, 3, 15));
    }

    #[test]
    fn parses_locale_spellings() {
        assert_eq!(parse_locale("en").ok(), Some(Locale::en_US));
        assert_eq!(parse_locale("de").ok(), Some(Locale::de_DE));
        assert_eq!(parse_locale("fr-FR").ok(), Some(Locale::fr_FR));
        assert!(parse_locale("zz_ZZ").is_err());
        assert!(parse_locale("   ").is_err());
    }

    #[test]
    fn parses_timezones() {
        assert!(parse_timezone("Europe/Berlin").is_ok());
        assert!(parse_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn default_arithmetic_is_calendar_based() {
        let locale = ChronoLocale::default();
        assert_eq!(locale.add_days(date(2024, 2, 28), 2), date(2024, 3, 1));
        assert_eq!(locale.add_months(date(2024, 12, 31), 2), date(2025, 2, 28));
        assert!(locale.is_same_month(date(2024, 2, 1), date(2024, 2, 29)));
        assert!(locale.is_same_day(date(2024, 2, 1), date(2024, 2, 1)));
    }
}
