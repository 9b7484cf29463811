use crate::models::coin::CoinRecord;
use crate::views::format::{format_percent, format_usd, Trend};

/// Number of coins shown in the ticker bar.
pub const TICKER_SIZE: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct TickerEntry {
    pub coin_id: String,
    pub label: String,
    pub price: String,
    pub change_24h: String,
    pub trend: Trend,
}

/// Top of the full (unfiltered) list, in backend order.
pub fn ticker_bar(coins: &[CoinRecord]) -> Vec<TickerEntry> {
    coins
        .iter()
        .take(TICKER_SIZE)
        .map(|coin| {
            let (change_24h, trend) = format_percent(coin.percent_change_24h);
            TickerEntry {
                coin_id: coin.id.clone(),
                label: coin.display_name(),
                price: format_usd(coin.price),
                change_24h,
                trend,
            }
        })
        .collect()
}
