/// One scroll notification from the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top.
    pub offset: f64,
    /// Total height of the document.
    pub scroll_height: f64,
    /// Height of the visible part of the document.
    pub viewport_height: f64,
}

impl ScrollMetrics {
    /// Normalized progress in 0.0..=1.0. A document that cannot scroll is at 0.
    pub fn progress(&self) -> f64 {
        let range = self.scroll_height - self.viewport_height;
        if range.is_nan() || range <= 0.0 || !self.offset.is_finite() {
            return 0.0;
        }
        (self.offset / range).clamp(0.0, 1.0)
    }
}

/// Turns raw scroll notifications into progress, publishing only changes.
#[derive(Debug, Default)]
pub struct ScrollSignal {
    progress: f64,
}

impl ScrollSignal {
    pub fn new() -> Self {
        ScrollSignal { progress: 0.0 }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Returns the new progress if it differs from the last published value.
    pub fn observe(&mut self, metrics: ScrollMetrics) -> Option<f64> {
        self.publish(metrics.progress())
    }

    /// Feed an already-normalized progress value (e.g. from an external host).
    pub fn observe_progress(&mut self, progress: f64) -> Option<f64> {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.publish(progress)
    }

    fn publish(&mut self, progress: f64) -> Option<f64> {
        if progress == self.progress {
            return None;
        }
        self.progress = progress;
        Some(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(offset: f64, scroll_height: f64, viewport_height: f64) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            scroll_height,
            viewport_height,
        }
    }

    #[test]
    fn progress_is_offset_over_scrollable_range() {
        assert_eq!(metrics(0.0, 3000.0, 1000.0).progress(), 0.0);
        assert_eq!(metrics(1000.0, 3000.0, 1000.0).progress(), 0.5);
        assert_eq!(metrics(2000.0, 3000.0, 1000.0).progress(), 1.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(metrics(5000.0, 3000.0, 1000.0).progress(), 1.0);
        assert_eq!(metrics(-40.0, 3000.0, 1000.0).progress(), 0.0);
    }

    #[test]
    fn degenerate_range_yields_zero() {
        assert_eq!(metrics(10.0, 1000.0, 1000.0).progress(), 0.0);
        assert_eq!(metrics(10.0, 500.0, 1000.0).progress(), 0.0);
        assert_eq!(metrics(10.0, f64::NAN, 1000.0).progress(), 0.0);
        assert_eq!(metrics(f64::INFINITY, 3000.0, 1000.0).progress(), 0.0);
    }

    #[test]
    fn identical_values_are_not_republished() {
        let mut signal = ScrollSignal::new();
        assert_eq!(signal.observe(metrics(0.0, 3000.0, 1000.0)), None);
        assert_eq!(signal.observe(metrics(500.0, 3000.0, 1000.0)), Some(0.25));
        assert_eq!(signal.observe(metrics(500.0, 3000.0, 1000.0)), None);
        assert_eq!(signal.observe_progress(0.25), None);
        assert_eq!(signal.observe_progress(2.0), Some(1.0));
        assert_eq!(signal.progress(), 1.0);
        assert_eq!(signal.observe_progress(f64::NAN), Some(0.0));
    }
}
