/// Shared data structures for the catalog
///
/// These structs represent the immutable item batch that flows from the
/// data source into the listing and, through item views, into the UI.
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Amenities an item can advertise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Amenity {
    Breakfast,
    Parking,
    Wifi,
}

impl Amenity {
    /// Human readable label
    pub fn label(self) -> &'static str {
        match self {
            Amenity::Breakfast => "Breakfast",
            Amenity::Parking => "Parking",
            Amenity::Wifi => "Wi-Fi",
        }
    }
}

/// Represents a single hotel in the catalog
///
/// Items are supplied once by the data source and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Hotel class, 1 to 5 stars
    pub star_rating: u8,
    /// Distance from the city centre
    pub distance_km: f64,
    /// Nightly price; 0 means the price is unknown or not offered
    pub price: u32,
    /// Guest score, floored into a band for display
    pub rating_score: f64,
    pub amenities: BTreeSet<Amenity>,
    /// Gallery photos, in display order
    pub photos: Vec<String>,
    /// Card background image
    pub preview_url: Option<String>,
}

impl Item {
    /// Whether the price is a real, positive value
    pub fn has_known_price(&self) -> bool {
        self.price > 0
    }

    /// Integer band of the guest score (8.7 -> 8)
    pub fn rating_band(&self) -> u8 {
        self.rating_score.max(0.0).floor() as u8
    }

    /// Only bands 4 to 9 get a dedicated style
    pub fn has_styled_rating(&self) -> bool {
        (4..=9).contains(&self.rating_band())
    }

    pub fn stars_label(&self) -> String {
        "★".repeat(self.star_rating as usize)
    }

    pub fn distance_label(&self) -> String {
        format!("{} km", self.distance_km)
    }

    pub fn price_label(&self) -> String {
        if self.has_known_price() {
            self.price.to_string()
        } else {
            "—".to_string()
        }
    }
}

/// Wire shape of an item. Accepts both the camelCase names and the
/// short names used by older catalog exports.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(default)]
    id: Option<u64>,
    name: String,
    #[serde(alias = "stars")]
    star_rating: u8,
    #[serde(alias = "distance")]
    distance_km: f64,
    #[serde(default)]
    price: u32,
    #[serde(alias = "rating")]
    rating_score: f64,
    #[serde(default)]
    amenities: BTreeSet<Amenity>,
    #[serde(default, alias = "pictures")]
    photos: Vec<String>,
    #[serde(default, alias = "preview")]
    preview_url: Option<String>,
}

/// Decode and validate a full item batch
///
/// Items without an explicit id get their 1-based position as id.
pub fn parse_batch(json: &[u8]) -> Result<Vec<Item>, FetchError> {
    let raw: Vec<RawItem> = serde_json::from_slice(json)?;
    let mut seen = HashSet::with_capacity(raw.len());
    let mut items = Vec::with_capacity(raw.len());

    for (position, raw) in raw.into_iter().enumerate() {
        let id = raw.id.unwrap_or(position as u64 + 1);

        if !seen.insert(id) {
            return Err(invalid(id, "duplicate id"));
        }
        if !(1..=5).contains(&raw.star_rating) {
            return Err(invalid(id, format!("star rating {} outside 1..=5", raw.star_rating)));
        }
        if !raw.distance_km.is_finite() || raw.distance_km < 0.0 {
            return Err(invalid(id, format!("distance {} is not a non-negative number", raw.distance_km)));
        }
        if !raw.rating_score.is_finite() {
            return Err(invalid(id, "rating is not a number"));
        }

        // Blank preview strings are treated as "no preview"
        let preview_url = raw.preview_url.filter(|url| !url.trim().is_empty());

        items.push(Item {
            id: ItemId(id),
            name: raw.name,
            star_rating: raw.star_rating,
            distance_km: raw.distance_km,
            price: raw.price,
            rating_score: raw.rating_score,
            amenities: raw.amenities,
            photos: raw.photos,
            preview_url,
        });
    }

    Ok(items)
}

fn invalid(id: u64, reason: impl Into<String>) -> FetchError {
    FetchError::InvalidItem {
        id,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_field_names() {
        let json = br#"[{
            "name": "Hotel Aurora",
            "stars": 4,
            "distance": 1.5,
            "price": 120,
            "rating": 8.7,
            "amenities": ["wifi", "breakfast"],
            "preview": "img/aurora.jpg",
            "pictures": ["img/aurora-1.jpg", "img/aurora-2.jpg"]
        }]"#;

        let items = parse_batch(json).unwrap();
        assert_eq!(items.len(), 1);

        let item = &items[0];
        assert_eq!(item.id, ItemId(1));
        assert_eq!(item.star_rating, 4);
        assert_eq!(item.rating_band(), 8);
        assert!(item.amenities.contains(&Amenity::Wifi));
        assert_eq!(item.photos.len(), 2);
        assert_eq!(item.preview_url.as_deref(), Some("img/aurora.jpg"));
    }

    #[test]
    fn test_parse_camel_case_and_defaults() {
        let json = br#"[{
            "id": 42,
            "name": "Budget Inn",
            "starRating": 1,
            "distanceKm": 0,
            "ratingScore": 5.2,
            "previewUrl": "  "
        }]"#;

        let items = parse_batch(json).unwrap();
        let item = &items[0];
        assert_eq!(item.id, ItemId(42));
        assert_eq!(item.price, 0);
        assert!(!item.has_known_price());
        assert!(item.photos.is_empty());
        assert_eq!(item.preview_url, None);
    }

    #[test]
    fn test_rejects_out_of_range_stars() {
        let json = br#"[{"name": "X", "stars": 7, "distance": 1, "rating": 5}]"#;
        assert!(matches!(
            parse_batch(json),
            Err(FetchError::InvalidItem { id: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = br#"[
            {"id": 3, "name": "A", "stars": 2, "distance": 1, "rating": 5},
            {"id": 3, "name": "B", "stars": 2, "distance": 1, "rating": 5}
        ]"#;
        assert!(parse_batch(json).is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(parse_batch(b"{ not json"), Err(FetchError::Malformed(_))));
    }

    #[test]
    fn test_styled_rating_bands() {
        let mut item = parse_batch(br#"[{"name": "A", "stars": 2, "distance": 1, "rating": 9.9}]"#)
            .unwrap()
            .remove(0);
        assert!(item.has_styled_rating());

        item.rating_score = 3.4;
        assert!(!item.has_styled_rating());
    }
}
