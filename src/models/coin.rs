use serde::{Deserialize, Serialize};

/// Latest market snapshot for one coin, as returned by `GET /currency`.
///
/// Every numeric field is optional on the wire; views treat a missing value
/// as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub percent_change_1h: Option<f64>,
    #[serde(default)]
    pub percent_change_24h: Option<f64>,
    #[serde(default)]
    pub percent_change_7d: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
}

impl CoinRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            price: None,
            percent_change_1h: None,
            percent_change_24h: None,
            percent_change_7d: None,
            market_cap: None,
            volume_24h: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// "Bitcoin (BTC)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.symbol.to_uppercase())
    }

    /// Case-insensitive substring match on name or symbol. `needle` must
    /// already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.symbol.to_lowercase().contains(needle)
    }
}

/// A server-side favorite from `GET /favorites`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteCoin {
    #[serde(default, deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, alias = "price")]
    pub current_price: Option<f64>,
    #[serde(default, alias = "percent_change_24h")]
    pub price_change_percentage_24h: Option<f64>,
}

// Ids arrive as strings from some endpoints and as numbers from others.
pub(crate) fn id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_record() {
        let json = r#"{"id": 1, "name": "Bitcoin", "symbol": "btc", "price": 64000.5}"#;
        let coin: CoinRecord = serde_json::from_str(json).unwrap();

        assert_eq!(coin.id, "1");
        assert_eq!(coin.price, Some(64000.5));
        assert_eq!(coin.percent_change_7d, None);
        assert_eq!(coin.display_name(), "Bitcoin (BTC)");
    }

    #[test]
    fn test_matches_name_or_symbol() {
        let coin = CoinRecord::new("1", "Bitcoin", "BTC");
        assert!(coin.matches("bit"));
        assert!(coin.matches("btc"));
        assert!(!coin.matches("eth"));
    }

    #[test]
    fn test_favorite_accepts_currency_field_names() {
        let json = r#"{"id": "eth", "name": "Ethereum", "price": 3100.0, "percent_change_24h": -1.5}"#;
        let fav: FavoriteCoin = serde_json::from_str(json).unwrap();

        assert_eq!(fav.current_price, Some(3100.0));
        assert_eq!(fav.price_change_percentage_24h, Some(-1.5));
    }
}
