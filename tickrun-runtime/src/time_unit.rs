use std::time::Duration;

/// Wall-clock unit used by duration settings such as the tick length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    pub fn to_millis(&self, value: u64) -> u64 {
        match self {
            TimeUnit::Milliseconds => value,
            TimeUnit::Seconds => value.saturating_mul(1000),
            TimeUnit::Minutes => value.saturating_mul(60_000),
            TimeUnit::Hours => value.saturating_mul(3_600_000),
        }
    }

    pub fn to_duration(&self, value: u64) -> Duration {
        Duration::from_millis(self.to_millis(value))
    }

    /// Parse a duration string like "50ms", "5s", "10m", "2h"
    /// Returns (value, TimeUnit) if successful
    ///
    /// Only lowercase suffixes are accepted and no space is allowed between
    /// the number and the suffix.
    pub fn parse_duration(s: &str) -> Option<(u64, TimeUnit)> {
        let s = s.trim();

        let split_pos = s.find(|c: char| !c.is_ascii_digit())?;
        if split_pos == 0 {
            return None;
        }

        let (num_str, unit_str) = s.split_at(split_pos);
        let value = num_str.parse::<u64>().ok()?;

        let time_unit = match unit_str {
            "ms" => TimeUnit::Milliseconds,
            "s" => TimeUnit::Seconds,
            "m" => TimeUnit::Minutes,
            "h" => TimeUnit::Hours,
            _ => return None,
        };

        Some((value, time_unit))
    }

    /// Parse a shorthand duration, falling back to plain milliseconds for bare numbers
    pub fn parse_to_duration(s: &str) -> Option<Duration> {
        if let Some((value, unit)) = Self::parse_duration(s) {
            return Some(unit.to_duration(value));
        }
        s.trim().parse::<u64>().ok().map(Duration::from_millis)
    }
}
