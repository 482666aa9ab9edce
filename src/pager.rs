//! Client-side pagination over a fully fetched result set.
//!
//! The store returns every matching item in one go; pages are cut here.
//! This does not scale to very large lists, but it keeps page counts exact
//! and filtering consistent with what the store matched.

use serde::Serialize;

use crate::error::{Result, StockdeskError};
use crate::types::InventoryRecord;

/// One page of a result set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T = InventoryRecord> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }
}

/// Number of pages needed for `count` items, never less than one
pub fn total_pages(count: usize, page_size: usize) -> Result<usize> {
    if page_size == 0 {
        return Err(StockdeskError::InvalidArgument(
            "page size must be greater than zero".to_string(),
        ));
    }
    Ok(count.div_ceil(page_size).max(1))
}

/// Cut page `page_number` (1-based) out of `full_set`.
///
/// The page number is taken as given: callers clamp it. A page past the end,
/// or page 0, yields no items rather than an error.
pub fn paginate<T>(full_set: Vec<T>, page_size: usize, page_number: usize) -> Result<Page<T>> {
    let total_items = full_set.len();
    let total_pages = total_pages(total_items, page_size)?;

    let items = match page_number.checked_sub(1) {
        Some(index) => match index.checked_mul(page_size) {
            Some(start) => full_set.into_iter().skip(start).take(page_size).collect(),
            None => Vec::new(),
        },
        None => Vec::new(),
    };

    Ok(Page {
        items,
        page_number,
        total_pages,
        total_items,
        page_size,
        has_next: page_number < total_pages,
    })
}
