//! Filter engine: turns the full batch into the ordered sequence the listing
//! pages through. Pure, never touches its input.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::data::Item;

/// The orderings the listing offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterId {
    /// Input order
    #[default]
    Default,
    /// Cheapest first, unknown prices last
    PriceAsc,
    /// Most expensive first
    PriceDesc,
}

impl FilterId {
    pub const ALL: [FilterId; 3] = [FilterId::Default, FilterId::PriceAsc, FilterId::PriceDesc];

    /// Canonical id, as persisted
    pub fn as_str(self) -> &'static str {
        match self {
            FilterId::Default => "default",
            FilterId::PriceAsc => "price-asc",
            FilterId::PriceDesc => "price-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterId::Default => "Recommended",
            FilterId::PriceAsc => "Cheapest first",
            FilterId::PriceDesc => "Most expensive first",
        }
    }

    /// Resolve a stored or user supplied id. Unknown ids fall back to
    /// [`FilterId::Default`] instead of failing.
    pub fn resolve(raw: &str) -> FilterId {
        raw.parse().unwrap_or_else(|_| {
            log::warn!("unknown filter id {raw:?}, using default ordering");
            FilterId::Default
        })
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`FilterId::from_str`] for ids this build does not know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFilter(pub String);

impl FromStr for FilterId {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" | "sort-hotels-default" => Ok(FilterId::Default),
            "price-asc" | "sort-by-price-asc" => Ok(FilterId::PriceAsc),
            "price-desc" | "sort-by-price-desc" => Ok(FilterId::PriceDesc),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

/// Order `items` according to `filter`.
///
/// Sorting is stable in every mode, so items comparing equal keep their
/// input order. The returned vector shares the items with the input.
pub fn apply(items: &[Arc<Item>], filter: FilterId) -> Vec<Arc<Item>> {
    let mut ordered = items.to_vec();

    match filter {
        FilterId::Default => {}
        FilterId::PriceAsc => {
            // Unknown prices (0) are not "free": they go after every real price
            ordered.sort_by_key(|item| (!item.has_known_price(), item.price));
        }
        FilterId::PriceDesc => {
            ordered.sort_by(|a, b| b.price.cmp(&a.price));
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::ItemId;
    use std::collections::BTreeSet;

    fn item(id: u64, price: u32) -> Arc<Item> {
        Arc::new(Item {
            id: ItemId(id),
            name: format!("Hotel {id}"),
            star_rating: 3,
            distance_km: 1.0,
            price,
            rating_score: 7.5,
            amenities: BTreeSet::new(),
            photos: Vec::new(),
            preview_url: None,
        })
    }

    fn ids(items: &[Arc<Item>]) -> Vec<u64> {
        items.iter().map(|item| item.id.0).collect()
    }

    #[test]
    fn test_price_asc_scenario() {
        let items = vec![item(1, 100), item(2, 0), item(3, 50)];
        assert_eq!(ids(&apply(&items, FilterId::PriceAsc)), vec![3, 1, 2]);
    }

    #[test]
    fn test_price_asc_zero_last_and_stable() {
        let items = vec![
            item(1, 0),
            item(2, 80),
            item(3, 40),
            item(4, 0),
            item(5, 80),
            item(6, 10),
            item(7, 40),
        ];
        let ordered = apply(&items, FilterId::PriceAsc);
        assert_eq!(ids(&ordered), vec![6, 3, 7, 2, 5, 1, 4]);

        let first_zero = ordered.iter().position(|i| i.price == 0).unwrap();
        assert!(ordered[first_zero..].iter().all(|i| i.price == 0));
        assert!(ordered[..first_zero].windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn test_price_desc_zero_sorts_last_by_value() {
        let items = vec![item(1, 0), item(2, 50), item(3, 200), item(4, 50)];
        assert_eq!(ids(&apply(&items, FilterId::PriceDesc)), vec![3, 2, 4, 1]);
    }

    #[test]
    fn test_default_keeps_input_order_and_input_untouched() {
        let items = vec![item(3, 10), item(1, 0), item(2, 5)];
        let before = ids(&items);

        assert_eq!(ids(&apply(&items, FilterId::Default)), before);
        let _ = apply(&items, FilterId::PriceAsc);
        assert_eq!(ids(&items), before);
    }

    #[test]
    fn test_resolve_aliases_and_unknown() {
        assert_eq!(FilterId::resolve("price-asc"), FilterId::PriceAsc);
        assert_eq!(FilterId::resolve("sort-by-price-desc"), FilterId::PriceDesc);
        assert_eq!(FilterId::resolve("sort-by-rating"), FilterId::Default);
        assert_eq!("bogus".parse::<FilterId>(), Err(UnknownFilter("bogus".into())));
    }
}
