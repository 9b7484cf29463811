use crate::models::coin::FavoriteCoin;
use crate::views::format::{format_percent, format_usd, Trend};

#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteCard {
    pub coin_id: String,
    pub name: String,
    pub price: String,
    pub change_24h: String,
    pub trend: Trend,
}

/// Cards for the profile favorites grid.
pub fn favorite_cards(favorites: &[FavoriteCoin]) -> Vec<FavoriteCard> {
    favorites
        .iter()
        .map(|fav| {
            let (change_24h, trend) = format_percent(fav.price_change_percentage_24h);
            FavoriteCard {
                coin_id: fav.id.clone(),
                name: fav.name.clone(),
                price: format_usd(fav.current_price),
                change_24h,
                trend,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cards() {
        let favorites = vec![FavoriteCoin {
            id: "btc".to_string(),
            name: "Bitcoin".to_string(),
            symbol: Some("BTC".to_string()),
            current_price: Some(64_250.0),
            price_change_percentage_24h: Some(-3.216),
        }];

        let cards = favorite_cards(&favorites);
        assert_eq!(cards[0].price, "$64,250.00");
        assert_eq!(cards[0].change_24h, "-3.22%");
        assert_eq!(cards[0].trend, Trend::Negative);
    }
}
