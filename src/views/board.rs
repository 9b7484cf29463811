//! The price board: filter/pagination state, the diffing table renderer, the
//! ticker bar and the local favorite stars, kept consistent with each other.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::models::coin::CoinRecord;
use crate::views::pagination::TableState;
use crate::views::table::{RenderOutcome, TableRenderer};
use crate::views::ticker::{ticker_bar, TickerEntry};

/// Client-local star toggles. Not synced with the backend favorites.
#[derive(Debug, Clone, Default)]
pub struct FavoriteMarkers {
    starred: HashSet<String>,
}

impl FavoriteMarkers {
    /// Flip the star for `coin_id`; returns the new state.
    pub fn toggle(&mut self, coin_id: &str) -> bool {
        if self.starred.remove(coin_id) {
            false
        } else {
            self.starred.insert(coin_id.to_string());
            true
        }
    }

    pub fn is_starred(&self, coin_id: &str) -> bool {
        self.starred.contains(coin_id)
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    state: TableState,
    table: TableRenderer,
    ticker: Vec<TickerEntry>,
    markers: FavoriteMarkers,
}

impl Board {
    pub fn new(rows_per_page: usize, highlight: Duration) -> Self {
        Self {
            state: TableState::new(rows_per_page),
            table: TableRenderer::new(highlight),
            ticker: Vec::new(),
            markers: FavoriteMarkers::default(),
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn table(&self) -> &TableRenderer {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut TableRenderer {
        &mut self.table
    }

    pub fn ticker(&self) -> &[TickerEntry] {
        &self.ticker
    }

    pub fn markers(&self) -> &FavoriteMarkers {
        &self.markers
    }

    pub fn toggle_star(&mut self, coin_id: &str) -> bool {
        self.markers.toggle(coin_id)
    }

    /// A new full list arrived: refresh ticker and redraw the current page,
    /// emphasising changed cells.
    pub fn apply_fetch(&mut self, coins: Vec<CoinRecord>, now: Instant) -> RenderOutcome {
        self.ticker = ticker_bar(&coins);
        let page_before = self.state.current_page();
        self.state.set_data(coins);
        if self.state.current_page() != page_before {
            self.table.clear();
        }
        self.redraw(now)
    }

    pub fn set_query(&mut self, query: &str, now: Instant) -> RenderOutcome {
        self.state.set_query(query);
        self.table.clear();
        self.redraw(now)
    }

    /// Returns None when the move was out of range (nothing redrawn).
    pub fn change_page(&mut self, delta: isize, now: Instant) -> Option<RenderOutcome> {
        if !self.state.change_page(delta) {
            return None;
        }
        self.table.clear();
        Some(self.redraw(now))
    }

    pub fn go_to_page(&mut self, page: usize, now: Instant) -> Option<RenderOutcome> {
        if !self.state.go_to_page(page) {
            return None;
        }
        self.table.clear();
        Some(self.redraw(now))
    }

    fn redraw(&mut self, now: Instant) -> RenderOutcome {
        let first_rank = self.state.page_start() + 1;
        let page = self.state.page_slice();
        self.table.render(page, first_rank, now)
    }
}
