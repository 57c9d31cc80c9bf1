use crate::query::PageRequest;
use serde::Serialize;

/// One page of results plus the pagination metadata derived from the total count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    items: Vec<T>,
    page_number: u32,
    page_size: u32,
    total_count: u64,
    total_pages: u64,
    has_previous_page: bool,
    has_next_page: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: PageRequest) -> Self {
        let total_pages = if page.size == 0 {
            0
        } else {
            total_count.div_ceil(u64::from(page.size))
        };
        Self {
            items,
            page_number: page.page,
            page_size: page.size,
            total_count,
            total_pages,
            has_previous_page: page.page > 1,
            has_next_page: u64::from(page.page) < total_pages,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.has_previous_page
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// Projects the materialized page; counts and flags carry over untouched.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page,
            has_next_page: self.has_next_page,
        }
    }
}
