//! Pharmacy pricing models.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters for a pharmacy price search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreQuery {
    /// Drug name as validated by the resolver
    pub name: String,
    /// Brand label override (e.g. "zestril"); the generic name when absent
    pub brand: Option<String>,
    /// Dosage form (e.g. "tablet")
    pub form: String,
    /// Dosage strength (e.g. "10mg")
    pub dosage: String,
    /// Number of units
    pub quantity: u32,
}

impl StoreQuery {
    /// Create a query for the generic label.
    pub fn new(name: String, form: String, dosage: String, quantity: u32) -> Self {
        Self {
            name,
            brand: None,
            form,
            dosage,
            quantity,
        }
    }

    /// Price a specific brand instead of the generic.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }
}

/// One pharmacy's price for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorePrice {
    /// Pharmacy name
    pub store: String,
    /// Price as displayed (e.g. "$4.00")
    pub price: String,
    /// Relative path of the coupon page for this price
    pub coupon_path: String,
}

impl StorePrice {
    /// Parse the displayed price into dollars, if it looks like one.
    pub fn price_usd(&self) -> Option<f64> {
        let cleaned: String = self
            .price
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        cleaned.parse().ok()
    }
}

/// Coupon details as published by the catalog (opaque to the resolver).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Coupon(pub Value);

impl Coupon {
    /// Read a top-level string field, e.g. `"bin"` or `"member_id"`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_usd() {
        let price = StorePrice {
            store: "CVS".into(),
            price: "$12.34".into(),
            coupon_path: "coupon/cvs".into(),
        };
        assert_eq!(price.price_usd(), Some(12.34));

        let unknown = StorePrice {
            price: "Call".into(),
            ..price
        };
        assert_eq!(unknown.price_usd(), None);
    }

    #[test]
    fn test_store_query_brand() {
        let query = StoreQuery::new("lisinopril".into(), "tablet".into(), "10mg".into(), 30);
        assert!(query.brand.is_none());

        let branded = query.with_brand("zestril");
        assert_eq!(branded.brand.as_deref(), Some("zestril"));
    }

    #[test]
    fn test_coupon_field() {
        let coupon = Coupon(serde_json::json!({"bin": "015995", "copay": 4}));
        assert_eq!(coupon.field("bin"), Some("015995"));
        assert_eq!(coupon.field("copay"), None);
        assert_eq!(coupon.field("missing"), None);
    }
}
