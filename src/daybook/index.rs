//! Listing view over the known entry dates: descending sort, search filter,
//! fixed-size pagination. This is session state (current page, query) held
//! by the owning caller, not ambient globals.

use crate::error::Result;
use crate::model::EntryDate;
use crate::store::{insert_date_desc, CacheStore};

pub const PAGE_SIZE: usize = 50;

/// One page of the (possibly filtered) date listing. `current` and `total`
/// are 1-based; there is always at least one page, even when empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub dates: Vec<EntryDate>,
    pub current: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Stateful filter/paginate view over the date index.
#[derive(Debug, Default)]
pub struct EntryIndex {
    /// Sorted descending, no duplicates.
    dates: Vec<EntryDate>,
    /// Lowercased search query; empty means no filter.
    query: String,
    /// 1-based; clamped into range on every `page()` call.
    current_page: usize,
}

impl EntryIndex {
    pub fn new() -> Self {
        Self {
            dates: Vec::new(),
            query: String::new(),
            current_page: 1,
        }
    }

    pub fn from_dates(dates: Vec<EntryDate>) -> Self {
        let mut index = Self::new();
        index.replace_all(dates);
        index
    }

    /// Authoritative reset, e.g. after a remote listing.
    pub fn replace_all(&mut self, dates: Vec<EntryDate>) {
        let mut sorted = dates;
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.dedup();
        self.dates = sorted;
    }

    /// Idempotent insert; keeps descending order.
    pub fn add(&mut self, date: EntryDate) {
        insert_date_desc(&mut self.dates, date);
    }

    pub fn remove(&mut self, date: &EntryDate) {
        self.dates.retain(|d| d != date);
    }

    pub fn dates(&self) -> &[EntryDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Case-insensitive; resets to page 1.
    pub fn set_search_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
        self.current_page = 1;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn next_page(&mut self) {
        self.current_page += 1;
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// A date matches when the date string itself contains the query, or the
    /// cached document text does. Dates with no cached document can only
    /// match on the date string.
    fn matches<S: CacheStore>(&self, store: &S, date: &EntryDate) -> Result<bool> {
        if self.query.is_empty() {
            return Ok(true);
        }
        if date.to_string().contains(&self.query) {
            return Ok(true);
        }
        match store.get_record(date)? {
            Some(record) => Ok(record.document.to_lowercase().contains(&self.query)),
            None => Ok(false),
        }
    }

    /// The current page of the filtered listing. Clamps the current page
    /// into [1, total] first, so a shrunk date set can never leave the view
    /// past the end.
    pub fn page<S: CacheStore>(&mut self, store: &S) -> Result<Page> {
        let mut filtered = Vec::new();
        for date in &self.dates {
            if self.matches(store, date)? {
                filtered.push(*date);
            }
        }

        let total = filtered.len().div_ceil(PAGE_SIZE).max(1);
        self.current_page = self.current_page.clamp(1, total);

        let start = (self.current_page - 1) * PAGE_SIZE;
        let page_dates = filtered
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .copied()
            .collect();

        Ok(Page {
            dates: page_dates,
            current: self.current_page,
            total,
            has_next: self.current_page < total,
            has_previous: self.current_page > 1,
        })
    }
}
