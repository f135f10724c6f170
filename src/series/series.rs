use super::error::SeriesError;
use super::sample::{Admission, ScalarSample};
use super::window::{AxisRange, ViewWindow, YRange};

/// Growing `(time, value)` buffer for one subscribed field.
///
/// Admission is decimated to `sample_rate_hz`: a sample is kept only if it
/// arrives at least one period after the last kept one. Kept times are
/// therefore strictly increasing, which the windowed lookups rely on.
#[derive(Debug, Clone)]
pub struct ScalarSeries {
    period: f64,
    samples: Vec<ScalarSample>,
    last_accepted: Option<f64>,
    window: ViewWindow,
    y_range: YRange,
    visible: bool,
}

impl ScalarSeries {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self {
            period: 1.0 / sample_rate_hz,
            samples: Vec::new(),
            last_accepted: None,
            window: ViewWindow::Full,
            y_range: YRange::default(),
            visible: true,
        }
    }

    pub fn append(&mut self, time: f64, value: f64) -> Admission {
        if !time.is_finite() {
            return Admission::Decimated;
        }
        if let Some(last) = self.last_accepted {
            if !(time - last >= self.period) {
                return Admission::Decimated;
            }
        }
        let sample = ScalarSample { time, value };
        self.samples.push(sample);
        self.last_accepted = Some(time);
        Admission::Accepted(sample)
    }

    pub fn set_window(&mut self, window: ViewWindow) -> Result<(), SeriesError> {
        self.window = window.validated()?;
        Ok(())
    }

    pub fn window(&self) -> ViewWindow {
        self.window
    }

    pub fn set_y_range(&mut self, y_range: YRange) {
        self.y_range = y_range;
    }

    pub fn y_range(&self) -> YRange {
        self.y_range
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn samples(&self) -> &[ScalarSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn time_range(&self) -> Option<AxisRange> {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => Some(AxisRange::new(first.time, last.time)),
            _ => None,
        }
    }

    /// `[t0, t1]` the current window selects, if there is any data to anchor it.
    pub fn visible_bounds(&self) -> Option<AxisRange> {
        match self.window {
            ViewWindow::Explicit { t0, t1 } => Some(AxisRange::new(t0, t1)),
            window => self
                .time_range()
                .map(|range| window.bounds(range.min, range.max)),
        }
    }

    pub fn visible_slice(&self) -> &[ScalarSample] {
        let Some(bounds) = self.visible_bounds() else {
            return &[];
        };
        let lo = self.samples.partition_point(|s| s.time < bounds.min);
        let hi = self.samples.partition_point(|s| s.time <= bounds.max);
        if lo >= hi {
            return &[];
        }
        &self.samples[lo..hi]
    }

    /// Y limits for the visible data, or `None` when a bound is unset and
    /// nothing is visible to derive it from.
    pub fn effective_y_range(&self) -> Option<AxisRange> {
        let data = self
            .visible_slice()
            .iter()
            .map(|s| s.value)
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });

        let ymin = self.y_range.ymin.or(data.map(|(lo, _)| lo))?;
        let ymax = self.y_range.ymax.or(data.map(|(_, hi)| hi))?;
        Some(AxisRange::new(ymin, ymax))
    }

    /// Drop the history and reset the rate limiter. Display settings stay.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.last_accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted_times(series: &mut ScalarSeries, times: &[f64]) -> Vec<f64> {
        times
            .iter()
            .filter_map(|&t| match series.append(t, t * 10.0) {
                Admission::Accepted(s) => Some(s.time),
                Admission::Decimated => None,
            })
            .collect()
    }

    fn filled(times: &[f64]) -> ScalarSeries {
        let mut series = ScalarSeries::new(1000.0);
        for &t in times {
            assert!(series.append(t, t).is_accepted());
        }
        series
    }

    #[test]
    fn rate_limits_to_sample_period() {
        let mut series = ScalarSeries::new(2.0);
        let accepted = accepted_times(&mut series, &[0.0, 0.1, 0.6, 0.9, 1.2]);
        assert_eq!(accepted, vec![0.0, 0.6, 1.2]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn out_of_order_sample_is_decimated() {
        let mut series = ScalarSeries::new(1.0);
        assert!(series.append(10.0, 1.0).is_accepted());
        assert_eq!(series.append(5.0, 1.0), Admission::Decimated);
        assert_eq!(series.append(f64::NAN, 1.0), Admission::Decimated);
    }

    #[test]
    fn windows_select_the_expected_samples() {
        let mut series = filled(&[100.0, 150.0, 180.0, 200.0, 230.0, 250.0]);
        let times = |s: &ScalarSeries| s.visible_slice().iter().map(|x| x.time).collect::<Vec<_>>();

        assert_eq!(times(&series).len(), 6);

        series.set_window(ViewWindow::Trailing { seconds: 50.0 }).unwrap();
        assert_eq!(times(&series), vec![200.0, 230.0, 250.0]);

        series.set_window(ViewWindow::Since { time: 180.0 }).unwrap();
        assert_eq!(times(&series), vec![180.0, 200.0, 230.0, 250.0]);

        series.set_window(ViewWindow::Explicit { t0: 150.0, t1: 200.0 }).unwrap();
        assert_eq!(times(&series), vec![150.0, 180.0, 200.0]);

        series.set_window(ViewWindow::Explicit { t0: 300.0, t1: 400.0 }).unwrap();
        assert!(series.visible_slice().is_empty());
    }

    #[test]
    fn most_recent_window_setter_wins() {
        let mut series = filled(&[100.0, 150.0, 190.0, 200.0, 300.0, 320.0, 330.0]);

        series.set_window(ViewWindow::explicit(100.0, 200.0).unwrap()).unwrap();
        series.set_window(ViewWindow::trailing(30.0).unwrap()).unwrap();
        let visible: Vec<f64> = series.visible_slice().iter().map(|s| s.time).collect();
        assert_eq!(visible, vec![300.0, 320.0, 330.0]);

        series.set_window(ViewWindow::explicit(100.0, 200.0).unwrap()).unwrap();
        let visible: Vec<f64> = series.visible_slice().iter().map(|s| s.time).collect();
        assert_eq!(visible, vec![100.0, 150.0, 190.0, 200.0]);
    }

    #[test]
    fn invalid_window_leaves_previous_in_place() {
        let mut series = filled(&[1.0]);
        series.set_window(ViewWindow::Since { time: 0.0 }).unwrap();
        assert!(series.set_window(ViewWindow::Trailing { seconds: -1.0 }).is_err());
        assert_eq!(series.window(), ViewWindow::Since { time: 0.0 });
    }

    #[test]
    fn empty_series_has_empty_slice_and_no_range() {
        let mut series = ScalarSeries::new(1.0);
        assert!(series.visible_slice().is_empty());
        assert_eq!(series.effective_y_range(), None);

        series.set_y_range(YRange::new(Some(0.0), None));
        assert_eq!(series.effective_y_range(), None);

        series.set_y_range(YRange::new(Some(0.0), Some(5.0)));
        assert_eq!(series.effective_y_range(), Some(AxisRange::new(0.0, 5.0)));
    }

    #[test]
    fn y_range_follows_visible_data() {
        let mut series = ScalarSeries::new(1000.0);
        for (t, v) in [(1.0, 5.0), (2.0, -3.0), (3.0, 8.0), (4.0, 2.0)] {
            series.append(t, v);
        }
        assert_eq!(series.effective_y_range(), Some(AxisRange::new(-3.0, 8.0)));

        series.set_window(ViewWindow::Trailing { seconds: 1.0 }).unwrap();
        assert_eq!(series.effective_y_range(), Some(AxisRange::new(2.0, 8.0)));

        series.set_y_range(YRange::new(None, Some(10.0)));
        assert_eq!(series.effective_y_range(), Some(AxisRange::new(2.0, 10.0)));
    }

    #[test]
    fn clear_resets_history_and_rate_limiter() {
        let mut series = ScalarSeries::new(1.0);
        series.clear();
        assert!(series.is_empty());

        series.append(10.0, 1.0);
        series.set_visible(false);
        series.clear();
        assert!(series.is_empty());
        assert!(!series.is_visible());

        // a fresh series would accept this; so must a cleared one
        assert!(series.append(10.2, 2.0).is_accepted());
        assert_eq!(series.len(), 1);
    }
}
