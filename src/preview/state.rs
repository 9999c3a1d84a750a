//! Page and zoom state for the preview pane.
//!
//! Zoom is stored in tenths so repeated steps never accumulate float error:
//! twenty `zoom_in` calls from 100 % land exactly on 200 %.

/// Smallest zoom, in tenths (50 %).
pub const MIN_ZOOM_TENTHS: u8 = 5;
/// Largest zoom, in tenths (200 %).
pub const MAX_ZOOM_TENTHS: u8 = 20;
/// Initial zoom, in tenths (100 %).
pub const DEFAULT_ZOOM_TENTHS: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewState {
    current_page: usize,
    total_pages: usize,
    zoom_tenths: u8,
}

impl Default for PreviewState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PreviewState {
    /// State for a document of `total_pages`, on page 1 at 100 %.
    ///
    /// A document always has at least one page to show.
    pub fn new(total_pages: usize) -> Self {
        Self {
            current_page: 1,
            total_pages: total_pages.max(1),
            zoom_tenths: DEFAULT_ZOOM_TENTHS,
        }
    }

    /// 1-based.
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn scale(&self) -> f32 {
        f32::from(self.zoom_tenths) / 10.0
    }

    /// Zoom as a whole percentage, e.g. `110`.
    pub fn zoom_percent(&self) -> u32 {
        u32::from(self.zoom_tenths) * 10
    }

    pub fn zoom_in(&mut self) {
        self.zoom_tenths = (self.zoom_tenths + 1).min(MAX_ZOOM_TENTHS);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_tenths = self.zoom_tenths.saturating_sub(1).max(MIN_ZOOM_TENTHS);
    }

    /// Set zoom from a scale factor, rounded to the nearest step and clamped.
    pub fn set_scale(&mut self, scale: f32) {
        let tenths = if scale.is_finite() {
            (scale * 10.0).round().clamp(0.0, f32::from(u8::MAX)) as u8
        } else {
            DEFAULT_ZOOM_TENTHS
        };
        self.zoom_tenths = tenths.clamp(MIN_ZOOM_TENTHS, MAX_ZOOM_TENTHS);
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Move back one page. Returns whether the page changed.
    pub fn prev_page(&mut self) -> bool {
        if self.can_go_prev() {
            self.current_page -= 1;
            true
        } else {
            false
        }
    }

    /// Move forward one page. Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        if self.can_go_next() {
            self.current_page += 1;
            true
        } else {
            false
        }
    }

    /// Jump to `page`, clamped to `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.total_pages);
    }

    /// "Page 2 of 5 · 110%"
    pub fn status_line(&self) -> String {
        format!(
            "Page {} of {} · {}%",
            self.current_page,
            self.total_pages,
            self.zoom_percent()
        )
    }
}
