//! Pagination utilities for service layer
//!
//! Provides a simple `Pagination` struct and helpers to normalize inputs.

/// Pagination parameters
#[derive(Clone, Copy, Debug)]
pub struct Pagination {
    /// 1-based page index
    pub page: u32,
    /// items per page
    pub per_page: u32,
}

impl Pagination {
    /// Clamp to sane defaults and convert to an `(offset, limit)` pair
    pub fn normalize(self) -> (usize, usize) {
        let page = if self.page == 0 { 1 } else { self.page };
        let per_page = self.per_page.clamp(1, 100) as usize;
        ((page as usize - 1) * per_page, per_page)
    }

    /// The window of `items` this page covers; empty past the end.
    pub fn slice<T>(self, items: &[T]) -> &[T] {
        let (offset, limit) = self.normalize();
        let start = offset.min(items.len());
        let end = start.saturating_add(limit).min(items.len());
        &items[start..end]
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: 20 } }
}
