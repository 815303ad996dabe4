//! Catalog queries over an already-fetched product list.

use serde::Serialize;

use sanital_core::Product;

/// Category pseudo-value meaning "no filter".
pub const ALL_CATEGORIES: &str = "All";

/// Minimum query length before search returns anything.
pub const MIN_SEARCH_LEN: usize = 3;

/// Default number of search suggestions.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Default number of products shown on the homepage.
pub const DEFAULT_FEATURED_LIMIT: usize = 4;

/// A category name with how many products carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Distinct non-empty categories, sorted by name.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts = std::collections::BTreeMap::<&str, usize>::new();
    for product in products {
        let category = product.category.trim();
        if !category.is_empty() {
            *counts.entry(category).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

/// Products in `category`. `None`, blank and [`ALL_CATEGORIES`] match everything.
#[must_use]
pub fn filter_by_category<'a>(products: &'a [Product], category: Option<&str>) -> Vec<&'a Product> {
    match category.map(str::trim) {
        None | Some("" | ALL_CATEGORIES) => products.iter().collect(),
        Some(category) => products
            .iter()
            .filter(|p| p.category.trim() == category)
            .collect(),
    }
}

/// Case-insensitive substring search on name and description.
///
/// Queries shorter than [`MIN_SEARCH_LEN`] characters return nothing.
#[must_use]
pub fn search<'a>(products: &'a [Product], query: &str, limit: usize) -> Vec<&'a Product> {
    let query = query.trim().to_lowercase();
    if query.chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }

    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query)
                || p.description.to_lowercase().contains(&query)
        })
        .take(limit)
        .collect()
}

/// Products flagged for the homepage, in catalog order.
#[must_use]
pub fn featured(products: &[Product], limit: usize) -> Vec<&Product> {
    products.iter().filter(|p| p.on_homepage).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sanital_core::{Price, ProductId};

    fn product(id: &str, name: &str, category: &str, on_homepage: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} professionale"),
            price: Price::from_cents(100),
            category: category.to_string(),
            image: None,
            gallery: Vec::new(),
            on_homepage,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Detergente Pavimenti", "Detergenti", true),
            product("2", "Guanti Nitrile", "Protezione", false),
            product("3", "Sgrassatore", "Detergenti", true),
            product("4", "Senza categoria", "", false),
        ]
    }

    #[test]
    fn test_categories_sorted_with_counts() {
        assert_eq!(
            categories(&catalog()),
            vec![
                CategoryCount {
                    name: "Detergenti".to_string(),
                    count: 2
                },
                CategoryCount {
                    name: "Protezione".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_filter_by_category() {
        let products = catalog();
        assert_eq!(filter_by_category(&products, None).len(), 4);
        assert_eq!(filter_by_category(&products, Some("All")).len(), 4);
        assert_eq!(filter_by_category(&products, Some("Detergenti")).len(), 2);
        assert!(filter_by_category(&products, Some("Carta")).is_empty());
    }

    #[test]
    fn test_search_requires_three_chars() {
        let products = catalog();
        assert!(search(&products, "gu", 5).is_empty());
        let hits = search(&products, "GUANTI", 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_str(), "2");
    }

    #[test]
    fn test_search_matches_description_and_limits() {
        let products = catalog();
        assert_eq!(search(&products, "professionale", 5).len(), 4);
        assert_eq!(search(&products, "professionale", 2).len(), 2);
    }

    #[test]
    fn test_featured() {
        let products = catalog();
        let ids: Vec<_> = featured(&products, 4).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(featured(&products, 1).len(), 1);
    }
}
