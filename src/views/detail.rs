use crate::models::coin::CoinRecord;
use crate::views::format::{format_percent, format_usd, Trend};

/// Detail panel for a single coin.
#[derive(Debug, Clone, PartialEq)]
pub struct CoinDetail {
    pub title: String,
    pub price: String,
    pub changes: Vec<(&'static str, String, Trend)>,
    pub volume_24h: String,
    pub market_cap: String,
}

impl CoinDetail {
    pub fn from_coin(coin: &CoinRecord) -> Self {
        let change = |label: &'static str, value: Option<f64>| {
            let (text, trend) = format_percent(value);
            (label, text, trend)
        };

        Self {
            title: coin.display_name(),
            price: format_usd(coin.price),
            changes: vec![
                change("1h", coin.percent_change_1h),
                change("24h", coin.percent_change_24h),
                change("7d", coin.percent_change_7d),
            ],
            volume_24h: format_usd(coin.volume_24h),
            market_cap: format_usd(coin.market_cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_coin() {
        let mut coin = CoinRecord::new("sol", "Solana", "sol").with_price(142.137);
        coin.percent_change_1h = Some(-0.42);
        coin.volume_24h = Some(2_100_000_000.0);

        let detail = CoinDetail::from_coin(&coin);
        assert_eq!(detail.title, "Solana (SOL)");
        assert_eq!(detail.price, "$142.14");
        assert_eq!(detail.changes[0], ("1h", "-0.42%".to_string(), Trend::Negative));
        assert_eq!(detail.changes[2].1, "0.00%");
        assert_eq!(detail.volume_24h, "$2.10B");
    }
}
