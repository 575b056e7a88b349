use crate::scene::scroll::ScrollMetrics;

/// Headings of the page sections, top to bottom. Each section is one viewport tall.
pub const SECTIONS: &[(&str, &str)] = &[
    (
        "Event Horizon",
        "Scroll to witness the cosmic dance",
    ),
    (
        "The Accretion Disk",
        "Matter spirals inward, heating to millions of degrees",
    ),
    (
        "Gravitational Lensing",
        "Gravity bends the path of light around the cosmic giant",
    ),
    (
        "Stellar Death",
        "Collapsed stars devour everything within reach",
    ),
    (
        "The Point of No Return",
        "Beyond the horizon, not even light can escape",
    ),
    (
        "Into the Void",
        "A glimpse of the extreme physics that govern our universe",
    ),
];

/// How far a single scroll input moves the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollStep {
    Lines(f64),
    Pages(f64),
    Top,
    Bottom,
}

/// A document of fixed sections scrolled by the viewer, measured in rows.
#[derive(Debug, Clone)]
pub struct Page {
    offset: f64,
    viewport_rows: f64,
}

impl Page {
    pub fn new(viewport_rows: usize) -> Self {
        Page {
            offset: 0.0,
            viewport_rows: viewport_rows.max(1) as f64,
        }
    }

    pub fn scroll_height(&self) -> f64 {
        SECTIONS.len() as f64 * self.viewport_rows
    }

    /// Keep the relative position when the terminal is resized.
    pub fn resize(&mut self, viewport_rows: usize) {
        let progress = self.metrics().progress();
        self.viewport_rows = viewport_rows.max(1) as f64;
        self.seek(progress);
    }

    /// Move to a normalized position, e.g. one published by an external host.
    pub fn seek(&mut self, progress: f64) {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.offset = progress * self.max_offset();
    }

    pub fn scroll(&mut self, step: ScrollStep) {
        let target = match step {
            ScrollStep::Lines(n) => self.offset + n,
            ScrollStep::Pages(n) => self.offset + n * self.viewport_rows,
            ScrollStep::Top => 0.0,
            ScrollStep::Bottom => self.max_offset(),
        };
        self.offset = target.clamp(0.0, self.max_offset());
    }

    pub fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            offset: self.offset,
            scroll_height: self.scroll_height(),
            viewport_height: self.viewport_rows,
        }
    }

    /// The section occupying the middle of the viewport.
    pub fn section_in_view(&self) -> (&'static str, &'static str) {
        let middle = self.offset + self.viewport_rows * 0.5;
        let idx = (middle / self.viewport_rows) as usize;
        SECTIONS[idx.min(SECTIONS.len() - 1)]
    }

    fn max_offset(&self) -> f64 {
        self.scroll_height() - self.viewport_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolling_is_clamped_to_document() {
        let mut page = Page::new(20);
        page.scroll(ScrollStep::Lines(-5.0));
        assert_eq!(page.metrics().offset, 0.0);
        page.scroll(ScrollStep::Pages(100.0));
        assert_eq!(page.metrics().offset, 100.0);
        assert_eq!(page.metrics().progress(), 1.0);
    }

    #[test]
    fn progress_tracks_offset() {
        let mut page = Page::new(10);
        page.scroll(ScrollStep::Lines(25.0));
        assert_eq!(page.metrics().progress(), 0.5);
        page.scroll(ScrollStep::Top);
        assert_eq!(page.metrics().progress(), 0.0);
    }

    #[test]
    fn resize_keeps_relative_position() {
        let mut page = Page::new(10);
        page.scroll(ScrollStep::Lines(25.0));
        page.resize(40);
        assert_eq!(page.metrics().offset, 100.0);
        assert_eq!(page.metrics().progress(), 0.5);
    }

    #[test]
    fn seek_lands_on_progress() {
        let mut page = Page::new(10);
        page.seek(0.5);
        assert_eq!(page.metrics().offset, 25.0);
        assert_eq!(page.section_in_view().0, "Stellar Death");
        page.seek(7.0);
        assert_eq!(page.metrics().progress(), 1.0);
        page.seek(f64::NAN);
        assert_eq!(page.metrics().offset, 0.0);
    }

    #[test]
    fn section_follows_viewport() {
        let mut page = Page::new(10);
        assert_eq!(
            page.section_in_view(),
            ("Event Horizon", "Scroll to witness the cosmic dance")
        );
        page.scroll(ScrollStep::Pages(2.0));
        assert_eq!(page.section_in_view().0, "Gravitational Lensing");
        page.scroll(ScrollStep::Bottom);
        assert_eq!(page.section_in_view().0, "Into the Void");
    }
}
