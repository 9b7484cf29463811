//! Table Renderer
//!
//! Turns coin records into rows of formatted cells and diffs them against the
//! previously rendered rows. A cell whose text changed gets an emphasis
//! deadline; emphasis is read against a caller-supplied `Instant` so the
//! renderer stays deterministic under test.

use std::time::{Duration, Instant};

use crate::models::coin::CoinRecord;
use crate::views::format::{format_percent, format_usd, Trend};

pub const DEFAULT_HIGHLIGHT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Rank,
    Name,
    Price,
    Change1h,
    Change24h,
    Change7d,
    MarketCap,
    Volume24h,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Rank,
        Column::Name,
        Column::Price,
        Column::Change1h,
        Column::Change24h,
        Column::Change7d,
        Column::MarketCap,
        Column::Volume24h,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Column::Rank => "#",
            Column::Name => "Name",
            Column::Price => "Price",
            Column::Change1h => "1h %",
            Column::Change24h => "24h %",
            Column::Change7d => "7d %",
            Column::MarketCap => "Market Cap",
            Column::Volume24h => "Volume (24h)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub trend: Option<Trend>,
    highlight_until: Option<Instant>,
}

impl Cell {
    fn plain(text: String) -> Self {
        Self { text, trend: None, highlight_until: None }
    }

    fn percent(value: Option<f64>) -> Self {
        let (text, trend) = format_percent(value);
        Self { text, trend: Some(trend), highlight_until: None }
    }

    pub fn is_highlighted(&self, now: Instant) -> bool {
        self.highlight_until.is_some_and(|until| now < until)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub coin_id: String,
    pub cells: Vec<Cell>,
}

impl Row {
    /// Build the cells for `coin` displayed at 1-based position `rank`.
    pub fn from_coin(coin: &CoinRecord, rank: usize) -> Self {
        let cells = Column::ALL
            .iter()
            .map(|column| match column {
                Column::Rank => Cell::plain(rank.to_string()),
                Column::Name => Cell::plain(coin.display_name()),
                Column::Price => Cell::plain(format_usd(coin.price)),
                Column::Change1h => Cell::percent(coin.percent_change_1h),
                Column::Change24h => Cell::percent(coin.percent_change_24h),
                Column::Change7d => Cell::percent(coin.percent_change_7d),
                Column::MarketCap => Cell::plain(format_usd(coin.market_cap)),
                Column::Volume24h => Cell::plain(format_usd(coin.volume_24h)),
            })
            .collect();

        Self { coin_id: coin.id.clone(), cells }
    }

    pub fn cell(&self, column: Column) -> &Cell {
        let index = Column::ALL.iter().position(|c| *c == column).unwrap_or(0);
        &self.cells[index]
    }
}

/// What one render pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutcome {
    /// (row index, column) of every cell whose text changed
    pub changed: Vec<(usize, Column)>,
    pub appended: usize,
    pub removed: usize,
}

#[derive(Debug, Clone)]
pub struct TableRenderer {
    rows: Vec<Row>,
    highlight: Duration,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_HIGHLIGHT)
    }
}

impl TableRenderer {
    pub fn new(highlight: Duration) -> Self {
        Self { rows: Vec::new(), highlight }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Forget everything rendered so far; the next render starts fresh.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Render `coins`, ranking them from `first_rank`, diffing by position
    /// against the current rows.
    pub fn render(&mut self, coins: &[CoinRecord], first_rank: usize, now: Instant) -> RenderOutcome {
        let mut outcome = RenderOutcome::default();
        let until = now + self.highlight;

        for (i, coin) in coins.iter().enumerate() {
            let mut fresh = Row::from_coin(coin, first_rank + i);

            match self.rows.get(i) {
                Some(old) => {
                    for (c, cell) in fresh.cells.iter_mut().enumerate() {
                        let previous = &old.cells[c];
                        if previous.text != cell.text {
                            cell.highlight_until = Some(until);
                            outcome.changed.push((i, Column::ALL[c]));
                        } else {
                            // keep a still-running emphasis alive
                            cell.highlight_until = previous.highlight_until.filter(|t| *t > now);
                        }
                    }
                    self.rows[i] = fresh;
                }
                None => {
                    self.rows.push(fresh);
                    outcome.appended += 1;
                }
            }
        }

        if self.rows.len() > coins.len() {
            outcome.removed = self.rows.len() - coins.len();
            self.rows.truncate(coins.len());
        }

        outcome
    }

    /// Drop emphasis that has run out; returns how many cells were cleared.
    pub fn expire_highlights(&mut self, now: Instant) -> usize {
        let mut cleared = 0;
        for cell in self.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
            if cell.highlight_until.is_some_and(|t| t <= now) {
                cell.highlight_until = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Earliest pending emphasis deadline, for scheduling a redraw.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter_map(|c| c.highlight_until)
            .min()
    }
}
