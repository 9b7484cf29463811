//! Filter + pagination state over the latest coin list.

use crate::models::coin::CoinRecord;

pub const DEFAULT_ROWS_PER_PAGE: usize = 25;

#[derive(Debug, Clone)]
pub struct TableState {
    all: Vec<CoinRecord>,
    filtered: Vec<CoinRecord>,
    query: String,
    current_page: usize,
    rows_per_page: usize,
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_PER_PAGE)
    }
}

impl TableState {
    pub fn new(rows_per_page: usize) -> Self {
        Self {
            all: Vec::new(),
            filtered: Vec::new(),
            query: String::new(),
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn all(&self) -> &[CoinRecord] {
        &self.all
    }

    pub fn filtered(&self) -> &[CoinRecord] {
        &self.filtered
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.rows_per_page)
    }

    /// Replace the full list after a fetch. The filter is re-applied and the
    /// page cursor clamped into range.
    pub fn set_data(&mut self, coins: Vec<CoinRecord>) {
        self.all = coins;
        self.refilter();
        self.current_page = self.current_page.clamp(1, self.total_pages().max(1));
    }

    /// Change the filter text; always resets to page 1.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
        self.refilter();
        self.current_page = 1;
    }

    /// Move by `delta` pages. Out-of-range targets are ignored; returns
    /// whether the page changed.
    pub fn change_page(&mut self, delta: isize) -> bool {
        let target = self.current_page as isize + delta;
        if target < 1 {
            return false;
        }
        self.go_to_page(target as usize)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() && page != self.current_page {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    /// 0-based index in `filtered` of the first row on the current page.
    pub fn page_start(&self) -> usize {
        (self.current_page - 1) * self.rows_per_page
    }

    pub fn page_slice(&self) -> &[CoinRecord] {
        let start = self.page_start().min(self.filtered.len());
        let end = (start + self.rows_per_page).min(self.filtered.len());
        &self.filtered[start..end]
    }

    fn refilter(&mut self) {
        self.filtered = if self.query.is_empty() {
            self.all.clone()
        } else {
            self.all
                .iter()
                .filter(|coin| coin.matches(&self.query))
                .cloned()
                .collect()
        };
    }
}
