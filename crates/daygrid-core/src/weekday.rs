use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// Two-letter weekday code used to configure grid column 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekdayCode {
    Su,
    Mo,
    Tu,
    We,
    Th,
    Fr,
    Sa,
}

impl WeekdayCode {
    /// Canonical order, Sunday first.
    pub const ALL: [WeekdayCode; 7] = [
        WeekdayCode::Su,
        WeekdayCode::Mo,
        WeekdayCode::Tu,
        WeekdayCode::We,
        WeekdayCode::Th,
        WeekdayCode::Fr,
        WeekdayCode::Sa,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeekdayCode::Su => "su",
            WeekdayCode::Mo => "mo",
            WeekdayCode::Tu => "tu",
            WeekdayCode::We => "we",
            WeekdayCode::Th => "th",
            WeekdayCode::Fr => "fr",
            WeekdayCode::Sa => "sa",
        }
    }

    /// Position in the canonical Sunday-first sequence.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 7]
    }

    pub fn to_chrono(self) -> Weekday {
        match self {
            WeekdayCode::Su => Weekday::Sun,
            WeekdayCode::Mo => Weekday::Mon,
            WeekdayCode::Tu => Weekday::Tue,
            WeekdayCode::We => Weekday::Wed,
            WeekdayCode::Th => Weekday::Thu,
            WeekdayCode::Fr => Weekday::Fri,
            WeekdayCode::Sa => Weekday::Sat,
        }
    }
}

impl From<Weekday> for WeekdayCode {
    fn from(value: Weekday) -> Self {
        Self::from_index(value.num_days_from_sunday() as usize)
    }
}

impl From<WeekdayCode> for Weekday {
    fn from(value: WeekdayCode) -> Self {
        value.to_chrono()
    }
}

impl fmt::Display for WeekdayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekdayCode {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let code = match lower.as_str() {
            "su" | "sun" | "sunday" => WeekdayCode::Su,
            "mo" | "mon" | "monday" => WeekdayCode::Mo,
            "tu" | "tue" | "tues" | "tuesday" => WeekdayCode::Tu,
            "we" | "wed" | "wednesday" => WeekdayCode::We,
            "th" | "thu" | "thur" | "thurs" | "thursday" => WeekdayCode::Th,
            "fr" | "fri" | "friday" => WeekdayCode::Fr,
            "sa" | "sat" | "saturday" => WeekdayCode::Sa,
            _ => return Err(CalendarError::UnknownWeekday(s.to_string())),
        };
        Ok(code)
    }
}

/// Rotated mapping between weekdays and grid columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdayOrder {
    first: WeekdayCode,
}

impl WeekdayOrder {
    pub fn new(first: WeekdayCode) -> Self {
        Self { first }
    }

    pub fn first(&self) -> WeekdayCode {
        self.first
    }

    pub fn column_of(&self, day: WeekdayCode) -> usize {
        (7 + day.index() - self.first.index()) % 7
    }

    pub fn weekday_at(&self, column: usize) -> WeekdayCode {
        WeekdayCode::from_index(self.first.index() + column)
    }

    /// Weekdays in column order.
    pub fn iter(&self) -> impl Iterator<Item = WeekdayCode> + '_ {
        (0..7).map(|column| self.weekday_at(column))
    }
}

#[cfg(test)]
mod tests {
    use super::{WeekdayCode, WeekdayOrder};

    #[test]
    fn monday_first_rotation() {
        let order = WeekdayOrder::new(WeekdayCode::Mo);
        let codes: Vec<&str> = order.iter().map(WeekdayCode::as_str).collect();
        assert_eq!(codes, vec!["mo", "tu", "we", "th", "fr", "sa", "su"]);
        assert_eq!(order.column_of(WeekdayCode::Su), 6);
        assert_eq!(order.column_of(WeekdayCode::Mo), 0);
    }

    #[test]
    fn mapping_is_a_bijection_for_every_start() {
        for first in WeekdayCode::ALL {
            let order = WeekdayOrder::new(first);
            assert_eq!(order.weekday_at(0), first);
            for column in 0..7 {
                assert_eq!(order.column_of(order.weekday_at(column)), column);
            }
            for code in WeekdayCode::ALL {
                assert_eq!(order.weekday_at(order.column_of(code)), code);
            }
        }
    }

    #[test]
    fn parses_codes_and_names() {
        assert_eq!("sa".parse::<WeekdayCode>().ok(), Some(WeekdayCode::Sa));
        assert_eq!("Monday".parse::<WeekdayCode>().ok(), Some(WeekdayCode::Mo));
        assert_eq!(" THU ".parse::<WeekdayCode>().ok(), Some(WeekdayCode::Th));
        assert!("xx".parse::<WeekdayCode>().is_err());
    }

    #[test]
    fn chrono_round_trip() {
        for code in WeekdayCode::ALL {
            assert_eq!(WeekdayCode::from(code.to_chrono()), code);
        }
    }

    #[test]
    fn serializes_as_two_letter_code() {
        let json = serde_json::to_string(&WeekdayCode::We).expect("serialize weekday");
        assert_eq!(json, "\"we\"");
        let back: WeekdayCode = serde_json::from_str("\"fr\"").expect("deserialize weekday");
        assert_eq!(back, WeekdayCode::Fr);
    }
}
