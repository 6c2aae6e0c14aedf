pub mod selector;

pub use selector::{compute_interval, select_interval};

use crate::error::{PanelError, PanelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Short-form units, widest first. A month is 30 days and a year 365 days.
const UNITS: [(char, u64); 7] = [
    ('y', 31_536_000),
    ('M', 2_592_000),
    ('w', 604_800),
    ('d', 86_400),
    ('h', 3_600),
    ('m', 60),
    ('s', 1),
];

/// A bucket width, kept in whole seconds and rendered as a short-form label
/// such as `5m` or `1w`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Interval {
    seconds: u64,
}

impl Interval {
    /// Ascending list of the "nice" widths auto selection snaps to.
    pub const CANONICAL: [Interval; 12] = [
        Interval::from_secs_unchecked(1),
        Interval::from_secs_unchecked(60),
        Interval::from_secs_unchecked(300),
        Interval::from_secs_unchecked(600),
        Interval::from_secs_unchecked(1_800),
        Interval::from_secs_unchecked(3_600),
        Interval::from_secs_unchecked(10_800),
        Interval::from_secs_unchecked(43_200),
        Interval::from_secs_unchecked(86_400),
        Interval::from_secs_unchecked(604_800),
        Interval::from_secs_unchecked(2_592_000),
        Interval::from_secs_unchecked(31_536_000),
    ];

    /// Used whenever the interval cannot be derived from the active range.
    pub const DEFAULT: Interval = Interval::from_secs_unchecked(600);

    const fn from_secs_unchecked(seconds: u64) -> Self {
        Self { seconds }
    }

    /// Widest interval whose width still fits in `i64` milliseconds.
    pub const MAX_SECONDS: u64 = i64::MAX as u64 / 1000;

    pub fn from_seconds(seconds: u64) -> PanelResult<Self> {
        if seconds == 0 {
            return Err(PanelError::InvalidInterval(
                "interval must be at least one second".to_string(),
            ));
        }
        if seconds > Self::MAX_SECONDS {
            return Err(PanelError::InvalidInterval(format!(
                "{}s is wider than the {}s maximum",
                seconds,
                Self::MAX_SECONDS
            )));
        }
        Ok(Self { seconds })
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn millis(&self) -> i64 {
        // `seconds` never exceeds MAX_SECONDS, so this cannot overflow.
        self.seconds as i64 * 1000
    }

    pub fn is_canonical(&self) -> bool {
        Self::CANONICAL.contains(self)
    }

    /// Label using the widest unit that divides the duration evenly.
    pub fn label(&self) -> String {
        for (unit, unit_seconds) in UNITS {
            if self.seconds % unit_seconds == 0 {
                return format!("{}{}", self.seconds / unit_seconds, unit);
            }
        }
        // Unreachable while seconds are whole: the `s` unit divides everything.
        format!("{}s", self.seconds)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Interval {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| PanelError::InvalidInterval(format!("missing unit in '{}'", s)))?;
        let (count, unit) = s.split_at(split);

        let count: u64 = count
            .parse()
            .map_err(|_| PanelError::InvalidInterval(format!("missing count in '{}'", s)))?;

        let unit_seconds = UNITS
            .iter()
            .find(|(c, _)| unit.len() == 1 && unit.starts_with(*c))
            .map(|(_, secs)| *secs)
            .ok_or_else(|| PanelError::InvalidInterval(format!("unknown unit in '{}'", s)))?;

        let seconds = count
            .checked_mul(unit_seconds)
            .ok_or_else(|| PanelError::InvalidInterval(format!("'{}' is too large", s)))?;
        Self::from_seconds(seconds)
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.label()
    }
}

impl TryFrom<String> for Interval {
    type Error = PanelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_forms() {
        assert_eq!("1s".parse::<Interval>().unwrap().seconds(), 1);
        assert_eq!("5m".parse::<Interval>().unwrap().seconds(), 300);
        assert_eq!("3h".parse::<Interval>().unwrap().seconds(), 10_800);
        assert_eq!("1w".parse::<Interval>().unwrap().seconds(), 604_800);
        assert_eq!("1M".parse::<Interval>().unwrap().seconds(), 2_592_000);
        assert_eq!("1y".parse::<Interval>().unwrap().seconds(), 31_536_000);
        assert_eq!(" 10m ".parse::<Interval>().unwrap().millis(), 600_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Interval>().is_err());
        assert!("m".parse::<Interval>().is_err());
        assert!("10".parse::<Interval>().is_err());
        assert!("10x".parse::<Interval>().is_err());
        assert!("10mm".parse::<Interval>().is_err());
        assert!("0m".parse::<Interval>().is_err());
    }

    #[test]
    fn test_rejects_intervals_too_wide_for_millis() {
        assert!(matches!(
            "9300000000000000000s".parse::<Interval>(),
            Err(PanelError::InvalidInterval(_))
        ));
        assert!(Interval::from_seconds(Interval::MAX_SECONDS + 1).is_err());

        let widest = Interval::from_seconds(Interval::MAX_SECONDS).unwrap();
        assert_eq!(widest.millis(), 9_223_372_036_854_775_000);

        let mut config = crate::PanelConfig::default();
        assert!(config.set_interval("9300000000000000000s").is_err());
        assert!(config.auto_int);
    }

    #[test]
    fn test_labels_use_widest_unit() {
        assert_eq!("3600s".parse::<Interval>().unwrap().label(), "1h");
        assert_eq!("90m".parse::<Interval>().unwrap().label(), "90m");
        assert_eq!("14d".parse::<Interval>().unwrap().label(), "2w");
        assert_eq!("30d".parse::<Interval>().unwrap().label(), "1M");
        assert_eq!("365d".parse::<Interval>().unwrap().label(), "1y");
        assert_eq!(Interval::DEFAULT.to_string(), "10m");
    }

    #[test]
    fn test_canonical_list_is_ascending() {
        let labels: Vec<String> = Interval::CANONICAL.iter().map(|i| i.label()).collect();
        assert_eq!(
            labels,
            vec!["1s", "1m", "5m", "10m", "30m", "1h", "3h", "12h", "1d", "1w", "1M", "1y"]
        );
        assert!(Interval::CANONICAL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_serializes_as_label() {
        let interval: Interval = "12h".parse().unwrap();
        assert_eq!(serde_json::to_string(&interval).unwrap(), "\"12h\"");
        let back: Interval = serde_json::from_str("\"12h\"").unwrap();
        assert_eq!(back, interval);
        assert!(serde_json::from_str::<Interval>("\"nope\"").is_err());
    }
}
