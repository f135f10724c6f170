use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::SeriesError;

const SINCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which part of a series' history is shown.
///
/// Typed input (`Full`, `Trailing`, `Since`) and a dragged `Explicit` range
/// replace each other; the most recent one wins.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewWindow {
    #[default]
    Full,
    Trailing {
        seconds: f64,
    },
    Since {
        time: f64,
    },
    Explicit {
        t0: f64,
        t1: f64,
    },
}

impl ViewWindow {
    pub fn trailing(seconds: f64) -> Result<Self, SeriesError> {
        ViewWindow::Trailing { seconds }.validated()
    }

    /// A dragged range; the endpoints may come in either order.
    pub fn explicit(a: f64, b: f64) -> Result<Self, SeriesError> {
        ViewWindow::Explicit { t0: a, t1: b }.validated()
    }

    pub fn validated(self) -> Result<Self, SeriesError> {
        match self {
            ViewWindow::Full => Ok(self),
            ViewWindow::Trailing { seconds } => {
                if seconds.is_finite() && seconds > 0.0 {
                    Ok(self)
                } else {
                    Err(SeriesError::InvalidWindow(format!(
                        "trailing window must be positive, got {}",
                        seconds
                    )))
                }
            }
            ViewWindow::Since { time } => {
                if time.is_finite() {
                    Ok(self)
                } else {
                    Err(SeriesError::InvalidWindow("start time must be finite".into()))
                }
            }
            ViewWindow::Explicit { t0, t1 } => {
                if !t0.is_finite() || !t1.is_finite() {
                    return Err(SeriesError::InvalidWindow("range must be finite".into()));
                }
                Ok(ViewWindow::Explicit {
                    t0: t0.min(t1),
                    t1: t0.max(t1),
                })
            }
        }
    }

    /// Visible `[t0, t1]` for data spanning `[min_time, max_time]`.
    pub fn bounds(&self, min_time: f64, max_time: f64) -> AxisRange {
        match *self {
            ViewWindow::Full => AxisRange::new(min_time, max_time),
            ViewWindow::Trailing { seconds } => AxisRange::new(max_time - seconds, max_time),
            ViewWindow::Since { time } => AxisRange::new(time, max_time),
            ViewWindow::Explicit { t0, t1 } => AxisRange::new(t0, t1),
        }
    }

    /// Parse the typed time-limit box.
    ///
    /// Blank shows everything, a number or duration (`30`, `90s`, `5m`) is a
    /// trailing window, and a UTC timestamp (`2024-05-01 12:00:00` or RFC 3339)
    /// shows everything since that time.
    pub fn parse_limit(text: &str) -> Result<Self, SeriesError> {
        let s = text.trim();
        if s.is_empty() {
            return Ok(ViewWindow::Full);
        }

        if let Ok(n) = s.parse::<f64>() {
            if n.is_finite() {
                return Ok(trailing_or_full(n.abs()));
            }
        }

        if let Ok(d) = humantime::parse_duration(s) {
            return Ok(trailing_or_full(d.as_secs_f64()));
        }

        if let Ok(dt) = NaiveDateTime::parse_from_str(s, SINCE_FORMAT) {
            return Ok(ViewWindow::Since {
                time: epoch_seconds(dt.and_utc().timestamp(), dt.and_utc().timestamp_subsec_micros()),
            });
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(ViewWindow::Since {
                time: epoch_seconds(dt.timestamp(), dt.timestamp_subsec_micros()),
            });
        }

        Err(SeriesError::InvalidWindow(format!(
            "expected seconds, a duration or 'YYYY-MM-DD HH:MM:SS', got '{}'",
            s
        )))
    }
}

fn trailing_or_full(seconds: f64) -> ViewWindow {
    if seconds > 0.0 {
        ViewWindow::Trailing { seconds }
    } else {
        ViewWindow::Full
    }
}

fn epoch_seconds(secs: i64, micros: u32) -> f64 {
    secs as f64 + micros as f64 * 1e-6
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Per-field Y limits; an unset bound follows the visible data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct YRange {
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
}

impl YRange {
    pub fn new(ymin: Option<f64>, ymax: Option<f64>) -> Self {
        Self { ymin, ymax }
    }
}

/// Parse a Y-limit entry. Anything that is not a finite number clears the bound.
pub fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blank_as_full_history() {
        assert_eq!(ViewWindow::parse_limit("  ").unwrap(), ViewWindow::Full);
        assert_eq!(ViewWindow::parse_limit("0").unwrap(), ViewWindow::Full);
    }

    #[test]
    fn parses_numbers_and_durations_as_trailing() {
        assert_eq!(
            ViewWindow::parse_limit("30").unwrap(),
            ViewWindow::Trailing { seconds: 30.0 }
        );
        assert_eq!(
            ViewWindow::parse_limit("-45.5").unwrap(),
            ViewWindow::Trailing { seconds: 45.5 }
        );
        assert_eq!(
            ViewWindow::parse_limit("5m").unwrap(),
            ViewWindow::Trailing { seconds: 300.0 }
        );
    }

    #[test]
    fn parses_timestamps_as_since() {
        assert_eq!(
            ViewWindow::parse_limit("2024-05-01 12:00:00").unwrap(),
            ViewWindow::Since {
                time: 1_714_564_800.0
            }
        );
        assert_eq!(
            ViewWindow::parse_limit("2024-05-01T14:00:00+02:00").unwrap(),
            ViewWindow::Since {
                time: 1_714_564_800.0
            }
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ViewWindow::parse_limit("yesterday-ish"),
            Err(SeriesError::InvalidWindow(_))
        ));
        assert!(ViewWindow::parse_limit("nan").is_err());
    }

    #[test]
    fn explicit_range_is_ordered() {
        assert_eq!(
            ViewWindow::explicit(200.0, 100.0).unwrap(),
            ViewWindow::Explicit {
                t0: 100.0,
                t1: 200.0
            }
        );
    }

    #[test]
    fn trailing_window_must_be_positive() {
        assert!(ViewWindow::trailing(0.0).is_err());
        assert!(ViewWindow::trailing(-3.0).is_err());
        assert!(ViewWindow::trailing(f64::INFINITY).is_err());
        assert!(ViewWindow::trailing(3.0).is_ok());
    }

    #[test]
    fn bounds_follow_policy() {
        assert_eq!(ViewWindow::Full.bounds(1.0, 9.0), AxisRange::new(1.0, 9.0));
        assert_eq!(
            ViewWindow::Trailing { seconds: 2.0 }.bounds(1.0, 9.0),
            AxisRange::new(7.0, 9.0)
        );
        assert_eq!(
            ViewWindow::Since { time: 4.0 }.bounds(1.0, 9.0),
            AxisRange::new(4.0, 9.0)
        );
        assert_eq!(
            ViewWindow::Explicit { t0: 0.0, t1: 3.0 }.bounds(1.0, 9.0),
            AxisRange::new(0.0, 3.0)
        );
    }

    #[test]
    fn bound_parsing() {
        assert_eq!(parse_bound(" 2.5 "), Some(2.5));
        assert_eq!(parse_bound(""), None);
        assert_eq!(parse_bound("abc"), None);
        assert_eq!(parse_bound("inf"), None);
    }

    #[test]
    fn window_serializes_with_mode_tag() {
        let json = serde_json::to_string(&ViewWindow::Trailing { seconds: 30.0 }).unwrap();
        assert_eq!(json, r#"{"mode":"trailing","seconds":30.0}"#);
        let back: ViewWindow = serde_json::from_str(r#"{"mode":"full"}"#).unwrap();
        assert_eq!(back, ViewWindow::Full);
    }
}
