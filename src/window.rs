//! Randomized date windows for record API queries.
//!
//! A window is a pair of timestamps drawn independently and uniformly from
//! the configured bounds, then sorted. Windows are created fresh for every
//! query attempt and discarded after use, which spreads queries across the
//! whole bound interval instead of hot-spotting one dataset slice.

use crate::error::PathGenError;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;

/// Inclusive interval from which window endpoints are drawn.
///
/// Peg this to the range of highest activity for the target instance.
#[derive(Debug, Clone, Copy)]
pub struct DateBounds {
    /// Earliest timestamp a window may start at
    pub start: DateTime<Utc>,
    /// Latest timestamp a window may end at
    pub end: DateTime<Utc>,
}

impl DateBounds {
    /// Parse bounds from two timestamp strings (RFC 3339 or `YYYY-MM-DD`).
    pub fn parse(start: &str, end: &str) -> Result<Self, PathGenError> {
        let start = parse_timestamp(start).ok_or_else(|| {
            PathGenError::Configuration(format!("invalid date bound: {start}"))
        })?;
        let end = parse_timestamp(end)
            .ok_or_else(|| PathGenError::Configuration(format!("invalid date bound: {end}")))?;
        if start > end {
            return Err(PathGenError::Configuration(format!(
                "date bounds out of order: {start} > {end}"
            )));
        }
        Ok(Self { start, end })
    }
}

/// An ordered time range (`start <= end`) used to filter one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Window start (inclusive)
    pub start: DateTime<Utc>,
    /// Window end (inclusive)
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Render as the bracketed range parameter the record API expects,
    /// e.g. `[2021-03-01T12:00:00Z,2021-07-15T08:30:00Z]`.
    pub fn to_range_param(&self) -> String {
        format!(
            "[{},{}]",
            self.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }

    /// Render as a date-only bracketed range, e.g. `[2021-03-01,2021-07-15]`.
    ///
    /// Deleted-date queries are filtered at day granularity.
    pub fn to_date_range_param(&self) -> String {
        format!(
            "[{},{}]",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Draw a window by sampling two timestamps uniformly from `bounds` and
/// sorting them. Second granularity.
pub fn sample_window<R: Rng>(bounds: &DateBounds, rng: &mut R) -> DateWindow {
    let lo = bounds.start.timestamp();
    let hi = bounds.end.timestamp();

    let a = rng.random_range(lo..=hi);
    let b = rng.random_range(lo..=hi);
    let (start_ts, end_ts) = if a <= b { (a, b) } else { (b, a) };

    DateWindow {
        start: DateTime::from_timestamp(start_ts, 0).unwrap_or(bounds.start),
        end: DateTime::from_timestamp(end_ts, 0).unwrap_or(bounds.end),
    }
}

/// Parse a timestamp in RFC 3339 or date-only (`YYYY-MM-DD`) form.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds() -> DateBounds {
        DateBounds::parse("2021-01-01T00:00:00-04:00", "2021-12-31T23:59:59-04:00").unwrap()
    }

    #[test]
    fn test_windows_ordered_and_within_bounds() {
        let bounds = bounds();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let w = sample_window(&bounds, &mut rng);
            assert!(w.start <= w.end);
            assert!(w.start >= bounds.start);
            assert!(w.end <= bounds.end);
        }
    }

    #[test]
    fn test_range_param_format() {
        let w = DateWindow {
            start: parse_timestamp("2021-03-01T12:00:00Z").unwrap(),
            end: parse_timestamp("2021-07-15T08:30:00Z").unwrap(),
        };
        assert_eq!(
            w.to_range_param(),
            "[2021-03-01T12:00:00Z,2021-07-15T08:30:00Z]"
        );
        assert_eq!(w.to_date_range_param(), "[2021-03-01,2021-07-15]");
    }

    #[test]
    fn test_date_only_bounds() {
        let bounds = DateBounds::parse("2020-01-01", "2020-12-31").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let w = sample_window(&bounds, &mut rng);
        assert!(w.start >= bounds.start && w.end <= bounds.end);
    }

    #[test]
    fn test_bad_bounds_rejected() {
        assert!(DateBounds::parse("not-a-date", "2020-12-31").is_err());
        assert!(DateBounds::parse("2021-01-01", "2020-01-01").is_err());
    }

    #[test]
    fn test_degenerate_bounds() {
        let bounds = DateBounds::parse("2021-06-01", "2021-06-01").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let w = sample_window(&bounds, &mut rng);
        assert_eq!(w.start, w.end);
    }
}
