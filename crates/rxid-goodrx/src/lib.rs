//! GoodRx adapter for the rxid resolver.
//!
//! Implements [`rxid_core::CatalogLookup`] and [`rxid_core::PriceLookup`] by
//! visiting GoodRx drug, price and coupon pages through a [`PageFetcher`].
//! The browser itself stays outside this crate; hosts plug in whatever
//! automation they run and tests use [`FixtureFetcher`].

pub mod catalog;
pub mod pages;
pub mod payload;

pub use catalog::*;
pub use pages::*;
pub use payload::*;
