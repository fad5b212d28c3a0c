//! Per-turn pagination over embedded property lists
//!
//! Page numbers are 1-based and keyed by turn id. A turn that was never paged
//! is on page 1.

use super::turn::TurnId;
use crate::config::PageSize;
use std::collections::HashMap;

/// Number of pages needed for `total` items
pub fn total_pages(total: usize, page_size: PageSize) -> usize {
    total.div_ceil(page_size.get())
}

/// Items visible on `page`. Pages past the end yield an empty slice.
pub fn page_slice<T>(items: &[T], page: usize, page_size: PageSize) -> &[T] {
    let size = page_size.get();
    let start = page.saturating_sub(1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIndex {
    page_size: PageSize,
    pages: HashMap<TurnId, usize>,
}

impl PageIndex {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            pages: HashMap::new(),
        }
    }

    pub fn current_page(&self, turn_id: TurnId) -> usize {
        self.pages.get(&turn_id).copied().unwrap_or(1)
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total_pages(total, self.page_size)
    }

    pub fn visible_slice<'a, T>(&self, items: &'a [T], turn_id: TurnId) -> &'a [T] {
        page_slice(items, self.current_page(turn_id), self.page_size)
    }

    /// Move `turn_id` to `page`. Out-of-range pages leave state untouched and
    /// return false.
    pub fn set_page(&mut self, turn_id: TurnId, page: usize, total: usize) -> bool {
        if page < 1 || page > self.total_pages(total) {
            return false;
        }
        if page == 1 {
            // Page 1 is the default; keep the table sparse.
            self.pages.remove(&turn_id);
        } else {
            self.pages.insert(turn_id, page);
        }
        true
    }

    pub fn next_page(&mut self, turn_id: TurnId, total: usize) -> bool {
        let next = self.current_page(turn_id).saturating_add(1);
        self.set_page(turn_id, next, total)
    }

    pub fn previous_page(&mut self, turn_id: TurnId, total: usize) -> bool {
        let Some(previous) = self.current_page(turn_id).checked_sub(1) else {
            return false;
        };
        self.set_page(turn_id, previous, total)
    }
}
