//! Catalog boundary: the external source of truth for drug and price data.
//!
//! The resolver only ever talks to a catalog through [`CatalogLookup`]; price
//! searches go through [`PriceLookup`]. Page automation, HTTP and parsing live
//! in the adapter that implements them.

mod memory;

pub use memory::*;

use thiserror::Error;

use crate::models::{Coupon, RawDrugData, StorePrice, StoreQuery};

/// Catalog errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Drug not found in catalog: {0}")]
    NotFound(String),

    #[error("Catalog lookup failed: {0}")]
    Lookup(String),

    #[error("Catalog lookup timed out: {0}")]
    Timeout(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Drug detail lookup against the catalog.
///
/// Implementations may block (network, browser automation) and are
/// responsible for their own timeouts.
pub trait CatalogLookup: Send + Sync {
    /// Fetch raw drug data for a (case-folded) drug name.
    fn fetch(&self, name: &str) -> CatalogResult<RawDrugData>;
}

/// Pharmacy price and coupon lookup against the catalog.
pub trait PriceLookup: Send + Sync {
    /// List pharmacy prices for a drug, form, dosage and quantity.
    fn stores(&self, query: &StoreQuery) -> CatalogResult<Vec<StorePrice>>;

    /// Fetch the coupon behind a price row.
    fn coupon(&self, coupon_path: &str) -> CatalogResult<Coupon>;
}
