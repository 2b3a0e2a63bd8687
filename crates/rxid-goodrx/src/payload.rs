//! Decoding of extracted page payloads.

use rxid_core::models::{Coupon, RawDrugData, StorePrice};
use serde::Deserialize;
use serde_json::Value;

use crate::pages::{PageError, PageResult};

/// A `.price-row` as the page renders it.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriceRow {
    /// `.store-name` text
    pub name: String,
    /// `.drug-price` text
    pub price: String,
    /// `data-href` of the row's coupon button, e.g. `/coupon/cvs/lisinopril`
    pub href: String,
}

impl From<PriceRow> for StorePrice {
    fn from(row: PriceRow) -> Self {
        let coupon_path = row
            .href
            .strip_prefix('/')
            .map(str::to_string)
            .unwrap_or(row.href);

        Self {
            store: row.name.trim().to_string(),
            price: row.price.trim().to_string(),
            coupon_path,
        }
    }
}

/// Decode the `#jsonData #drug` blob.
///
/// A blob without any equivalent drugs is treated as a missing drug page.
pub fn parse_drug_payload(payload: &str) -> PageResult<RawDrugData> {
    let data = RawDrugData::from_json(payload)?;
    if data.equivalent_drugs.is_empty() {
        return Err(PageError::MissingSelector("#jsonData #drug".into()));
    }
    Ok(data)
}

/// Decode the price-row list.
pub fn parse_price_rows(payload: &str) -> PageResult<Vec<StorePrice>> {
    let rows: Vec<PriceRow> = serde_json::from_str(payload)?;
    Ok(rows.into_iter().map(StorePrice::from).collect())
}

/// Decode `window.couponDrug`. An undefined global comes back as `null`.
pub fn parse_coupon(payload: &str) -> PageResult<Coupon> {
    match serde_json::from_str::<Value>(payload)? {
        Value::Null => Err(PageError::MissingSelector("window.couponDrug".into())),
        value => Ok(Coupon(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drug_payload_keeps_internal_fields() {
        let payload = r#"{
            "equivalent_drugs": {
                "Lisinopril": {
                    "slug": "lisinopril",
                    "form_sort": ["tablet"],
                    "forms": {"tablet": {"dosage_sort": ["10mg"], "dosages": {"10mg": {}}}}
                }
            },
            "display": "Lisinopril"
        }"#;

        let data = parse_drug_payload(payload).unwrap();
        let drug = &data.equivalent_drugs["Lisinopril"];
        assert!(drug.slug.is_some());
        assert!(drug.forms["tablet"].dosage_sort.is_some());
    }

    #[test]
    fn test_parse_drug_payload_empty() {
        assert!(matches!(
            parse_drug_payload(r#"{"equivalent_drugs": {}}"#),
            Err(PageError::MissingSelector(_))
        ));
        assert!(matches!(parse_drug_payload("<html>"), Err(PageError::Payload(_))));
    }

    #[test]
    fn test_parse_price_rows() {
        let payload = r#"[
            {"name": " CVS Pharmacy ", "price": "$11.97", "href": "/coupon/cvs/lisinopril"},
            {"name": "Walgreens", "price": "$14.20", "href": "coupon/walgreens/lisinopril"}
        ]"#;

        let stores = parse_price_rows(payload).unwrap();
        assert_eq!(stores.len(), 2);
        assert_eq!(stores[0].store, "CVS Pharmacy");
        assert_eq!(stores[0].coupon_path, "coupon/cvs/lisinopril");
        assert_eq!(stores[1].coupon_path, "coupon/walgreens/lisinopril");
        assert_eq!(stores[0].price_usd(), Some(11.97));
    }

    #[test]
    fn test_parse_coupon() {
        let coupon = parse_coupon(r#"{"bin": "015995", "member_id": "ABC123"}"#).unwrap();
        assert_eq!(coupon.field("bin"), Some("015995"));

        assert!(matches!(parse_coupon("null"), Err(PageError::MissingSelector(_))));
    }
}
