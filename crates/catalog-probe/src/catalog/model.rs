//! Catalog resource types as they appear on the wire.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Product category, serialized by upper-case name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Uncategorised
    #[default]
    Unknown,
    /// Clothing
    Cloths,
    /// Groceries
    Food,
    /// Household goods
    Housewares,
    /// Car parts
    Automotive,
    /// Hand and power tools
    Tools,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Self; 6] = [
        Self::Unknown,
        Self::Cloths,
        Self::Food,
        Self::Housewares,
        Self::Automotive,
        Self::Tools,
    ];

    /// Wire name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Cloths => "CLOTHS",
            Self::Food => "FOOD",
            Self::Housewares => "HOUSEWARES",
            Self::Automotive => "AUTOMOTIVE",
            Self::Tools => "TOOLS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A string that names no [`Category`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A string that is not a two-place decimal amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid price '{0}'")]
pub struct InvalidPrice(pub String);

/// Price in cents
///
/// Serialized as a decimal string (`"12.50"`); accepts a string or a JSON
/// number when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(u64);

impl Price {
    /// Price from whole cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Amount in cents
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = InvalidPrice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidPrice(s.to_string());
        let trimmed = s.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() || frac.len() > 2 {
            return Err(invalid());
        }
        if !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid())? * 10,
            _ => frac.parse().map_err(|_| invalid())?,
        };
        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal price as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        v.checked_mul(100)
            .map(Price)
            .ok_or_else(|| E::custom(InvalidPrice(v.to_string())))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        u64::try_from(v)
            .map_err(|_| E::custom(InvalidPrice(v.to_string())))
            .and_then(|v| self.visit_u64(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        if !v.is_finite() || v < 0.0 {
            return Err(E::custom(InvalidPrice(v.to_string())));
        }
        Ok(Price((v * 100.0).round() as u64))
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Service-assigned id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Product name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Unit price
    pub price: Price,
    /// Whether the product can be ordered
    pub available: bool,
    /// Category
    pub category: Category,
}

impl Product {
    /// Same product with `id` set
    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Fields other than `id` are equal
    #[must_use]
    pub fn same_fields(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.price == other.price
            && self.available == other.available
            && self.category == other.category
    }
}

/// Filter for listing products; at most one criterion
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductQuery {
    /// Every product
    #[default]
    All,
    /// Products with exactly this name
    Name(String),
    /// Products in this category
    Category(Category),
    /// Products with this availability
    Available(bool),
}

impl ProductQuery {
    /// Query-string pairs for the list endpoint
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::All => Vec::new(),
            Self::Name(name) => vec![("name".into(), name.clone())],
            Self::Category(c) => vec![("category".into(), c.name().into())],
            Self::Available(a) => vec![("available".into(), a.to_string())],
        }
    }

    /// Whether `product` passes the filter
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Name(name) => &product.name == name,
            Self::Category(c) => product.category == *c,
            Self::Available(a) => product.available == *a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hammer() -> Product {
        Product {
            id: None,
            name: "Hammer".into(),
            description: "Claw hammer".into(),
            price: Price::from_cents(1250),
            available: true,
            category: Category::Tools,
        }
    }

    mod category {
        use super::*;

        #[test]
        fn test_serializes_by_name() {
            assert_eq!(serde_json::to_string(&Category::Tools).unwrap(), "\"TOOLS\"");
            let c: Category = serde_json::from_str("\"HOUSEWARES\"").unwrap();
            assert_eq!(c, Category::Housewares);
        }

        #[test]
        fn test_from_str_ignores_case() {
            assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
            assert!("toys".parse::<Category>().is_err());
        }
    }

    mod price {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(Price::from_cents(1250).to_string(), "12.50");
            assert_eq!(Price::from_cents(5).to_string(), "0.05");
        }

        #[test]
        fn test_parse() {
            assert_eq!("12.5".parse::<Price>().unwrap().cents(), 1250);
            assert_eq!("12".parse::<Price>().unwrap().cents(), 1200);
            assert_eq!("0.07".parse::<Price>().unwrap().cents(), 7);
            assert!("12.345".parse::<Price>().is_err());
            assert!("-1.00".parse::<Price>().is_err());
            assert!(".50".parse::<Price>().is_err());
            assert!("abc".parse::<Price>().is_err());
        }

        #[test]
        fn test_serializes_as_string() {
            let json = serde_json::to_value(Price::from_cents(1999)).unwrap();
            assert_eq!(json, serde_json::json!("19.99"));
        }

        #[test]
        fn test_deserializes_from_number() {
            let p: Price = serde_json::from_str("19.99").unwrap();
            assert_eq!(p.cents(), 1999);
            let p: Price = serde_json::from_str("4").unwrap();
            assert_eq!(p.cents(), 400);
            assert!(serde_json::from_str::<Price>("-4").is_err());
        }
    }

    mod product {
        use super::*;

        #[test]
        fn test_wire_format() {
            let json = serde_json::to_value(hammer().with_id(7)).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "id": 7,
                    "name": "Hammer",
                    "description": "Claw hammer",
                    "price": "12.50",
                    "available": true,
                    "category": "TOOLS"
                })
            );
        }

        #[test]
        fn test_id_omitted_when_unset() {
            let json = serde_json::to_value(hammer()).unwrap();
            assert!(json.get("id").is_none());
        }

        #[test]
        fn test_missing_fields_rejected() {
            assert!(serde_json::from_str::<Product>(r#"{"name":"bad data"}"#).is_err());
        }

        #[test]
        fn test_same_fields_ignores_id() {
            assert!(hammer().with_id(1).same_fields(&hammer()));
        }
    }

    mod query {
        use super::*;

        #[test]
        fn test_pairs() {
            assert!(ProductQuery::All.pairs().is_empty());
            assert_eq!(
                ProductQuery::Category(Category::Food).pairs(),
                vec![("category".to_string(), "FOOD".to_string())]
            );
            assert_eq!(
                ProductQuery::Available(false).pairs(),
                vec![("available".to_string(), "false".to_string())]
            );
        }

        #[test]
        fn test_matches() {
            let p = hammer();
            assert!(ProductQuery::All.matches(&p));
            assert!(ProductQuery::Name("Hammer".into()).matches(&p));
            assert!(!ProductQuery::Name("hammer".into()).matches(&p));
            assert!(ProductQuery::Category(Category::Tools).matches(&p));
            assert!(!ProductQuery::Available(false).matches(&p));
        }
    }

    proptest! {
        #[test]
        fn prop_price_text_round_trip(cents in 0u64..10_000_000) {
            let price = Price::from_cents(cents);
            prop_assert_eq!(price.to_string().parse::<Price>().unwrap(), price);
        }
    }
}
