// THEORY:
// A single frame can lie. A camera flash, a passing tail light, or one noisy
// exposure can look exactly like flame for a frame or two. This stage owns
// the memory that separates events from moments: sliding windows over recent
// evidence plus a wall-clock timer that demands the evidence persist.
//
// Key architectural principles:
// 1.  **Bounded windows**: Confidence and presence each live in a fixed-size
//     sliding window. The smoothed confidence is the window mean; persistence
//     is the fraction of recent frames with any candidate fire at all.
// 2.  **Windows survive gaps**: A frame with no fire pushes a zero into the
//     windows rather than clearing them. One missed detection dents the
//     scores instead of erasing the history.
// 3.  **The timer does not survive gaps**: Temporal consistency requires an
//     unbroken run of fire-positive frames spanning `min_fire_duration`
//     seconds. Any absent frame clears the timer, and the next positive frame
//     starts the wait from zero.

use std::collections::VecDeque;

/// Pixel area at `min_area * 3` maps to full confidence.
const AREA_SATURATION_FACTOR: usize = 3;

/// Per-frame output of the temporal stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalSummary {
    /// Confidence from this frame alone, in `0.0..=1.0`.
    pub raw_confidence: f64,
    /// Whether this frame had any surviving fire region.
    pub raw_present: bool,
    /// Mean raw confidence over the sliding window.
    pub smoothed_confidence: f64,
    /// Fraction of the window's frames with fire present.
    pub persistence: f64,
    /// Whether fire has been present continuously for the minimum duration.
    pub temporally_consistent: bool,
}

/// Accumulates per-frame region evidence into smoothed, duration-gated scores.
pub struct TemporalFilter {
    capacity: usize,
    min_fire_duration: f64,
    confidence_window: VecDeque<f64>,
    presence_window: VecDeque<bool>,
    fire_start_time: Option<f64>,
}

impl TemporalFilter {
    pub fn new(smoothing_window: usize, min_fire_duration: f64) -> Self {
        Self {
            capacity: smoothing_window,
            min_fire_duration,
            confidence_window: VecDeque::with_capacity(smoothing_window + 1),
            presence_window: VecDeque::with_capacity(smoothing_window + 1),
            fire_start_time: None,
        }
    }

    /// Folds one frame's total fire area into the windows and reports the
    /// updated scores. `timestamp` is the frame's capture time in seconds.
    pub fn update(&mut self, total_area: usize, min_area: usize, timestamp: f64) -> TemporalSummary {
        let raw_confidence =
            (total_area as f64 / (min_area * AREA_SATURATION_FACTOR) as f64).min(1.0);
        let raw_present = total_area >= min_area;

        Self::push_bounded(&mut self.confidence_window, raw_confidence, self.capacity);
        Self::push_bounded(&mut self.presence_window, raw_present, self.capacity);

        let len = self.confidence_window.len() as f64;
        let smoothed_confidence = self.confidence_window.iter().sum::<f64>() / len;
        let persistence =
            self.presence_window.iter().filter(|present| **present).count() as f64 / len;

        let temporally_consistent = if raw_present {
            match self.fire_start_time {
                Some(start) => timestamp - start >= self.min_fire_duration,
                None => {
                    self.fire_start_time = Some(timestamp);
                    false
                }
            }
        } else {
            self.fire_start_time = None;
            false
        };

        TemporalSummary {
            raw_confidence,
            raw_present,
            smoothed_confidence,
            persistence,
            temporally_consistent,
        }
    }

    /// When the current unbroken run of fire-positive frames began.
    pub fn fire_start_time(&self) -> Option<f64> {
        self.fire_start_time
    }

    /// Drops all accumulated history and the consistency timer.
    pub fn reset(&mut self) {
        self.confidence_window.clear();
        self.presence_window.clear();
        self.fire_start_time = None;
    }

    fn push_bounded<T>(window: &mut VecDeque<T>, value: T, capacity: usize) {
        window.push_back(value);
        if window.len() > capacity {
            window.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_saturates_at_three_times_the_area_floor() {
        let mut filter = TemporalFilter::new(10, 1.0);
        assert_eq!(filter.update(750, 500, 0.0).raw_confidence, 0.5);
        assert_eq!(filter.update(1500, 500, 1.0).raw_confidence, 1.0);
        assert_eq!(filter.update(90_000, 500, 2.0).raw_confidence, 1.0);
    }

    #[test]
    fn smoothing_averages_the_recent_window() {
        let mut filter = TemporalFilter::new(10, 1.0);
        filter.update(1500, 500, 0.0);
        filter.update(0, 500, 1.0);
        filter.update(1500, 500, 2.0);
        let summary = filter.update(0, 500, 3.0);

        assert!((summary.smoothed_confidence - 0.5).abs() < 1e-9);
        assert!((summary.persistence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn windows_are_bounded_by_the_configured_capacity() {
        let mut filter = TemporalFilter::new(3, 1.0);
        filter.update(1500, 500, 0.0);
        filter.update(1500, 500, 1.0);
        filter.update(0, 500, 2.0);
        filter.update(0, 500, 3.0);
        let summary = filter.update(0, 500, 4.0);

        // The two full-confidence frames have slid out of the window.
        assert_eq!(summary.smoothed_confidence, 0.0);
        assert_eq!(summary.persistence, 0.0);
    }

    #[test]
    fn duration_gate_is_inclusive() {
        let mut filter = TemporalFilter::new(10, 1.0);
        assert!(!filter.update(1500, 500, 0.0).temporally_consistent);
        assert!(!filter.update(1500, 500, 0.5).temporally_consistent);
        assert!(filter.update(1500, 500, 1.0).temporally_consistent);
        assert!(filter.update(1500, 500, 1.5).temporally_consistent);
    }

    #[test]
    fn one_absent_frame_restarts_the_duration_wait() {
        let mut filter = TemporalFilter::new(10, 1.0);
        filter.update(1500, 500, 0.0);
        filter.update(1500, 500, 0.9);
        filter.update(0, 500, 1.0);

        // The run restarts here, so a second of presence is owed again.
        assert!(!filter.update(1500, 500, 1.1).temporally_consistent);
        assert!(!filter.update(1500, 500, 2.0).temporally_consistent);
        assert!(filter.update(1500, 500, 2.1).temporally_consistent);
    }

    #[test]
    fn windows_survive_gaps_the_timer_does_not() {
        let mut filter = TemporalFilter::new(10, 1.0);
        filter.update(1500, 500, 0.0);
        filter.update(0, 500, 0.1);
        let summary = filter.update(1500, 500, 0.2);

        assert_eq!(filter.fire_start_time(), Some(0.2));
        assert!((summary.persistence - 2.0 / 3.0).abs() < 1e-9);
        assert!((summary.smoothed_confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn reset_returns_the_filter_to_its_initial_state() {
        let mut filter = TemporalFilter::new(10, 1.0);
        for n in 0..5 {
            filter.update(1500, 500, n as f64);
        }
        filter.reset();
        assert_eq!(filter.fire_start_time(), None);

        let summary = filter.update(750, 500, 10.0);
        assert_eq!(summary.smoothed_confidence, 0.5);
        assert_eq!(summary.persistence, 1.0);
        assert!(!summary.temporally_consistent);
    }
}
