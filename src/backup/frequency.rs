//! Backup frequency tokens: `<number>m` for minutes, `<number>h` for hours.

use std::fmt;
use std::time::Duration;

use crate::core::errors::{MbkError, Result};

/// Upper bound on the schedulable interval, in seconds. `Duration` holds at
/// most `u64::MAX` whole seconds.
#[allow(clippy::cast_precision_loss)]
const MAX_SCHEDULABLE_SECS: f64 = u64::MAX as f64;

/// A parsed backup interval, canonically in minutes.
///
/// Fractional values are allowed on both units so `1.5h` and `0.5m` work;
/// the value is always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frequency {
    minutes: f64,
}

impl Frequency {
    /// Parse a user-supplied token such as `30m`, `90m`, `1h`, or `1.5h`.
    ///
    /// There is no silent default: every malformed token is rejected so a
    /// typo cannot quietly turn into a different schedule.
    pub fn parse(token: &str) -> Result<Self> {
        let invalid = |details: &str| MbkError::InvalidFrequency {
            token: token.to_string(),
            details: details.to_string(),
        };

        let (prefix, unit_minutes) = if let Some(prefix) = token.strip_suffix('m') {
            (prefix, 1.0)
        } else if let Some(prefix) = token.strip_suffix('h') {
            (prefix, 60.0)
        } else {
            return Err(invalid("expected an 'm' or 'h' unit suffix"));
        };

        let value: f64 = prefix
            .parse()
            .map_err(|_| invalid("numeric prefix is not a valid number"))?;
        if !value.is_finite() {
            return Err(invalid("numeric prefix must be finite"));
        }

        let minutes = value * unit_minutes;
        if minutes <= 0.0 {
            return Err(invalid("interval must be strictly positive"));
        }
        if minutes * 60.0 > MAX_SCHEDULABLE_SECS {
            return Err(invalid("interval is too large to schedule"));
        }
        Ok(Self { minutes })
    }

    /// Interval length in minutes.
    #[must_use]
    pub const fn minutes(self) -> f64 {
        self.minutes
    }

    /// Interval as a wall-clock duration.
    #[must_use]
    pub fn as_duration(self) -> Duration {
        Duration::from_secs_f64(self.minutes * 60.0)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parses_whole_minutes() {
        assert!((Frequency::parse("30m").unwrap().minutes() - 30.0).abs() < f64::EPSILON);
        assert!((Frequency::parse("90m").unwrap().minutes() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_hours_as_sixty_minutes() {
        assert!((Frequency::parse("1h").unwrap().minutes() - 60.0).abs() < f64::EPSILON);
        assert!((Frequency::parse("1.5h").unwrap().minutes() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_fractional_minutes() {
        let freq = Frequency::parse("0.5m").unwrap();
        assert!((freq.minutes() - 0.5).abs() < f64::EPSILON);
        assert_eq!(freq.as_duration(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_missing_suffix() {
        let err = Frequency::parse("30").unwrap_err();
        assert_eq!(err.code(), "MBK-1201");
    }

    #[test]
    fn rejects_unknown_suffix() {
        assert_eq!(Frequency::parse("30x").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("30M").unwrap_err().code(), "MBK-1201");
    }

    #[test]
    fn rejects_non_numeric_prefix() {
        assert_eq!(Frequency::parse("abch").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("m").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("").unwrap_err().code(), "MBK-1201");
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(Frequency::parse("0m").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("-5m").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("0h").unwrap_err().code(), "MBK-1201");
    }

    #[test]
    fn rejects_over_range_intervals() {
        // These would overflow Duration if conversion were attempted.
        assert_eq!(Frequency::parse("1e18m").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("1e300m").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("1e300h").unwrap_err().code(), "MBK-1201");
    }

    #[test]
    fn long_but_schedulable_interval_converts() {
        let freq = Frequency::parse("525600m").unwrap(); // one year
        assert_eq!(freq.as_duration(), Duration::from_secs(525_600 * 60));
    }

    #[test]
    fn rejects_non_finite_prefix() {
        assert_eq!(Frequency::parse("infm").unwrap_err().code(), "MBK-1201");
        assert_eq!(Frequency::parse("NaNh").unwrap_err().code(), "MBK-1201");
    }

    #[test]
    fn duration_matches_minutes() {
        assert_eq!(
            Frequency::parse("2m").unwrap().as_duration(),
            Duration::from_secs(120)
        );
        assert_eq!(
            Frequency::parse("1h").unwrap().as_duration(),
            Duration::from_secs(3600)
        );
    }

    proptest! {
        #[test]
        fn minute_tokens_parse_to_their_prefix(value in 0.001f64..10_000.0) {
            let token = format!("{value}m");
            let freq = Frequency::parse(&token).unwrap();
            prop_assert!((freq.minutes() - value).abs() < 1e-9);
        }

        #[test]
        fn hour_tokens_scale_by_sixty(value in 0.001f64..1_000.0) {
            let token = format!("{value}h");
            let freq = Frequency::parse(&token).unwrap();
            prop_assert!((freq.minutes() - value * 60.0).abs() < 1e-6);
        }

        #[test]
        fn suffixless_numbers_never_parse(value in 0.001f64..10_000.0) {
            prop_assert!(Frequency::parse(&value.to_string()).is_err());
        }
    }
}
