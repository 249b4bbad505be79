// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;

/// Number of pages for `count` items; never less than one.
#[must_use]
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    count.div_ceil(page_size).max(1)
}

/// Brings a 1-based page number into `[1, total_pages]`.
#[must_use]
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice `[(page-1)*size, page*size)` of `items`. Page 0, pages past the end
/// and a zero page size all yield an empty slice.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T: Clone> Page<T> {
    /// Clamps the requested page first, then slices.
    #[must_use]
    pub fn clamped(items: &[T], requested_page: usize, page_size: usize) -> Self {
        let total = total_pages(items.len(), page_size);
        let page = clamp_page(requested_page, total);
        Self {
            items: paginate(items, page, page_size).to_vec(),
            page,
            total_pages: total,
            total_items: items.len(),
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
