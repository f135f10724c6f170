use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::TrackError;
use super::sample::PositionSample;

/// Time-ordered vehicle positions shared by every position source.
///
/// Times are strictly increasing. A sample that does not advance the track is
/// dropped, so when two redundant links deliver the same fix, whichever
/// arrives first owns that slot. The lock is held only for the append or the
/// lookup itself.
#[derive(Debug, Default)]
pub struct PositionTrack {
    samples: Mutex<Vec<PositionSample>>,
}

impl PositionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PositionSample>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, time: f64, x: f64, y: f64) -> Result<(), TrackError> {
        let mut samples = self.lock();
        if let Some(last) = samples.last() {
            // NaN compares false here as well, so it is rejected with the stale samples
            if !(time > last.time) {
                return Err(TrackError::Stale {
                    time,
                    last: last.time,
                });
            }
        }
        samples.push(PositionSample { time, x, y });
        Ok(())
    }

    /// Linear interpolation of `(x, y)` at `query_time`, clamped to the first
    /// and last samples outside the track's time range.
    pub fn interpolate(&self, query_time: f64) -> Result<(f64, f64), TrackError> {
        let samples = self.lock();
        interpolate_sorted(&samples, query_time)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn time_range(&self) -> Option<(f64, f64)> {
        let samples = self.lock();
        match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    pub fn last(&self) -> Option<PositionSample> {
        self.lock().last().copied()
    }

    /// Copy of the stored samples, oldest first.
    pub fn snapshot(&self) -> Vec<PositionSample> {
        self.lock().clone()
    }
}

fn interpolate_sorted(samples: &[PositionSample], t: f64) -> Result<(f64, f64), TrackError> {
    let (first, last) = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(TrackError::NotReady),
    };
    if !t.is_finite() {
        return Err(TrackError::InvalidTime(t));
    }

    if t <= first.time {
        return Ok((first.x, first.y));
    }
    if t >= last.time {
        return Ok((last.x, last.y));
    }

    // first index with time > t; bounded to 1..len by the clamps above
    let hi = samples.partition_point(|s| s.time <= t);
    let a = &samples[hi - 1];
    let b = &samples[hi];
    let frac = (t - a.time) / (b.time - a.time);
    Ok((a.x + frac * (b.x - a.x), a.y + frac * (b.y - a.y)))
}
