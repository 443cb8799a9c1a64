//! Page window computation over a session's result set.

use super::Track;

/// Tracks shown per page.
pub const PAGE_SIZE: usize = 5;

/// Navigation step requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Computes page bounds for a fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

/// The visible slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow<'a> {
    /// 1-indexed page, already clamped.
    pub page: usize,
    pub total_pages: usize,
    /// Absolute index of `tracks[0]` in the full result set.
    pub start: usize,
    pub tracks: &'a [Track],
}

impl PageWindow<'_> {
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Absolute indices paired with their tracks.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &Track)> {
        self.tracks
            .iter()
            .enumerate()
            .map(move |(offset, track)| (self.start + offset, track))
    }
}

impl Paginator {
    /// Creates a paginator. A page size of zero is treated as one.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// `max(1, ceil(count / page_size))`.
    #[must_use]
    pub fn total_pages(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    /// Clamps `page` into `[1, total_pages(count)]`.
    #[must_use]
    pub fn clamp(&self, page: usize, count: usize) -> usize {
        page.clamp(1, self.total_pages(count))
    }

    /// Returns the clamped window for `page`. Never panics, even on empty input.
    #[must_use]
    pub fn window<'a>(&self, results: &'a [Track], page: usize) -> PageWindow<'a> {
        let total_pages = self.total_pages(results.len());
        let page = self.clamp(page, results.len());
        let start = ((page - 1) * self.page_size).min(results.len());
        let end = (start + self.page_size).min(results.len());
        PageWindow {
            page,
            total_pages,
            start,
            tracks: &results[start..end],
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}
