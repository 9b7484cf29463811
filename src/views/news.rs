use crate::models::news::NewsItem;

/// Category value that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

/// News items in `category`, or every item for [`ALL_CATEGORIES`].
/// Category comparison ignores case.
pub fn filter_news<'a>(items: &'a [NewsItem], category: &str) -> Vec<&'a NewsItem> {
    if category.eq_ignore_ascii_case(ALL_CATEGORIES) {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            item.category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
        })
        .collect()
}

/// Distinct categories in first-seen order.
pub fn categories(items: &[NewsItem]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in items.iter().filter_map(|i| i.category.as_deref()) {
        if !seen.iter().any(|s| s.eq_ignore_ascii_case(category)) {
            seen.push(category.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, category: Option<&str>) -> NewsItem {
        NewsItem {
            id,
            title: format!("News {}", id),
            description: None,
            content: None,
            category: category.map(str::to_string),
            author: None,
            published_at: None,
            image_url: None,
        }
    }

    #[test]
    fn test_filter_by_category() {
        let items = vec![item(1, Some("market")), item(2, Some("defi")), item(3, None), item(4, Some("Market"))];

        assert_eq!(filter_news(&items, "all").len(), 4);
        let ids: Vec<_> = filter_news(&items, "market").iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(filter_news(&items, "nft").is_empty());
        assert_eq!(categories(&items), vec!["market", "defi"]);
    }
}
