//! Plain-text drawing of the view models with comfy-table.

use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell as TableCell, Color, Table};
use std::time::Instant;

use crate::services::session_store::AuthGate;
use crate::views::board::Board;
use crate::views::detail::CoinDetail;
use crate::views::favorites::FavoriteCard;
use crate::views::format::Trend;
use crate::views::notification::{Notice, NoticeLevel};
use crate::views::table::Column;
use crate::models::news::NewsItem;

pub const EMPTY_TABLE_MESSAGE: &str = "No cryptocurrency found";

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::Positive => Color::Green,
        Trend::Negative => Color::Red,
    }
}

pub fn render_ticker(board: &Board) -> String {
    board
        .ticker()
        .iter()
        .map(|t| format!("{} {} {}", t.label, t.price, t.change_24h))
        .collect::<Vec<_>>()
        .join("  |  ")
}

pub fn render_board(board: &Board, now: Instant) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    let mut header = vec![TableCell::new("")];
    header.extend(Column::ALL.iter().map(|c| TableCell::new(c.title()).add_attribute(Attribute::Bold)));
    table.set_header(header);

    for row in board.table().rows() {
        let star = if board.markers().is_starred(&row.coin_id) { "★" } else { "☆" };
        let mut cells = vec![TableCell::new(star)];
        for cell in &row.cells {
            let mut out = TableCell::new(&cell.text);
            if let Some(trend) = cell.trend {
                out = out.fg(trend_color(trend));
            }
            if cell.is_highlighted(now) {
                out = out.add_attribute(Attribute::Reverse);
            }
            cells.push(out);
        }
        table.add_row(cells);
    }

    let state = board.state();
    let mut out = String::new();
    out.push_str(&render_ticker(board));
    out.push('\n');
    if board.table().is_empty() {
        out.push_str(EMPTY_TABLE_MESSAGE);
        out.push('\n');
    } else {
        out.push_str(&table.to_string());
        out.push('\n');
    }
    out.push_str(&format!(
        "Page {}/{} ({} coins{})",
        state.current_page(),
        state.total_pages().max(1),
        state.filtered().len(),
        if state.query().is_empty() { String::new() } else { format!(", filter \"{}\"", state.query()) },
    ));
    out
}

pub fn render_detail(detail: &CoinDetail) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![TableCell::new(&detail.title).add_attribute(Attribute::Bold), TableCell::new("")]);
    table.add_row(vec![TableCell::new("Price"), TableCell::new(&detail.price)]);
    for (label, text, trend) in &detail.changes {
        table.add_row(vec![
            TableCell::new(format!("Change {}", label)),
            TableCell::new(text).fg(trend_color(*trend)),
        ]);
    }
    table.add_row(vec![TableCell::new("Volume (24h)"), TableCell::new(&detail.volume_24h)]);
    table.add_row(vec![TableCell::new("Market Cap"), TableCell::new(&detail.market_cap)]);
    table.to_string()
}

pub fn render_favorites(cards: &[FavoriteCard]) -> String {
    if cards.is_empty() {
        return "No favorites yet".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Id", "Name", "Price", "24h %"]);
    for card in cards {
        table.add_row(vec![
            TableCell::new(&card.coin_id),
            TableCell::new(&card.name),
            TableCell::new(&card.price),
            TableCell::new(&card.change_24h).fg(trend_color(card.trend)),
        ]);
    }
    table.to_string()
}

pub fn render_news(items: &[&NewsItem]) -> String {
    if items.is_empty() {
        return "No news".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Published", "Category", "Title", "Summary"]);
    for item in items {
        table.add_row(vec![
            item.published_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            item.category.clone().unwrap_or_default(),
            item.title.clone(),
            item.description.clone().unwrap_or_default(),
        ]);
    }
    table.to_string()
}

pub fn render_auth_gate(gate: AuthGate) -> &'static str {
    match (gate.show_profile, gate.show_login) {
        (true, _) => "[profile] [logout]",
        _ => "[login] [register]",
    }
}

pub fn render_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            let mark = match n.level {
                NoticeLevel::Success => "✔",
                NoticeLevel::Error => "✖",
            };
            format!("[{}] {} {}", n.created_at.with_timezone(&Local).format("%H:%M:%S"), mark, n.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
