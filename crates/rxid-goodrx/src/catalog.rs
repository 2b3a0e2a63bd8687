//! GoodRx-backed catalog.

use rxid_core::catalog::CatalogResult;
use rxid_core::models::{fold_name, Coupon, RawDrugData, StorePrice, StoreQuery};
use rxid_core::{CatalogLookup, PriceLookup};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::pages::{Extraction, PageError, PageFetcher, PageQuery, PageResult};
use crate::payload::{parse_coupon, parse_drug_payload, parse_price_rows};

pub const DEFAULT_BASE_URL: &str = "https://www.goodrx.com";

const DRUG_READY: &str = "#configPanel #drug .config-options";
const DRUG_JSON: &str = "#jsonData #drug";
const PRICE_READY: &str = ".price-row";
const COUPON_READY: &str = "#clipping";
const COUPON_GLOBAL: &str = "couponDrug";

/// Adapter configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GoodRxConfig {
    /// Site root. Default: `https://www.goodrx.com`.
    pub base_url: String,
}

impl Default for GoodRxConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl GoodRxConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Point the adapter at another host (mirrors, test servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// URL path segment for a drug name: case-folded, whitespace runs as `-`.
pub fn drug_slug(name: &str) -> String {
    fold_name(name)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Catalog and price lookups driven through GoodRx pages.
pub struct GoodRxCatalog<F> {
    fetcher: F,
    base: Url,
}

impl<F: PageFetcher> GoodRxCatalog<F> {
    /// Wrap a fetcher. Fails if the configured base URL does not parse or
    /// cannot carry a path.
    pub fn new(fetcher: F, config: GoodRxConfig) -> PageResult<Self> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(PageError::InvalidUrl(format!("{} cannot hold a path", base)));
        }
        Ok(Self { fetcher, base })
    }

    /// Access the underlying fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Base URL extended by `segments`, each percent-encoded as exactly one
    /// path segment (`/`, `?` and `#` included).
    fn page_url<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> PageResult<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| PageError::InvalidUrl(format!("{} cannot hold a path", self.base)))?;
            path.pop_if_empty();
            for segment in segments {
                // Empty and dot segments would be dropped or collapsed, moving
                // the request to another page
                if matches!(segment, "" | "." | "..") {
                    return Err(PageError::InvalidUrl(format!(
                        "unusable path segment {:?}",
                        segment
                    )));
                }
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// `{base}/{slug}/what-is`
    pub fn details_query(&self, name: &str) -> PageResult<PageQuery> {
        Ok(PageQuery {
            url: self.page_url([drug_slug(name).as_str(), "what-is"])?,
            wait_for: DRUG_READY,
            extract: Extraction::ElementJson(DRUG_JSON),
        })
    }

    /// `{base}/{slug}?form=..&dosage=..&quantity=..&label_override=..`
    pub fn stores_query(&self, query: &StoreQuery) -> PageResult<PageQuery> {
        let mut url = self.page_url([drug_slug(&query.name).as_str()])?;
        let label = query.brand.as_deref().unwrap_or(&query.name);
        url.query_pairs_mut()
            .append_pair("form", &query.form)
            .append_pair("dosage", &query.dosage)
            .append_pair("quantity", &query.quantity.to_string())
            .append_pair("label_override", label);

        Ok(PageQuery {
            url,
            wait_for: PRICE_READY,
            extract: Extraction::PriceRows,
        })
    }

    /// `{base}/{coupon_path}`, where the path comes from a price row and may
    /// span several segments and carry a query.
    pub fn coupon_query(&self, coupon_path: &str) -> PageResult<PageQuery> {
        let (path, query) = match coupon_path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (coupon_path, None),
        };
        let mut url = self.page_url(path.split('/').filter(|s| !s.is_empty()))?;
        url.set_query(query);

        Ok(PageQuery {
            url,
            wait_for: COUPON_READY,
            extract: Extraction::WindowValue(COUPON_GLOBAL),
        })
    }

    fn visit(&self, query: PageResult<PageQuery>) -> PageResult<String> {
        let query = query?;
        debug!(url = %query.url, wait_for = query.wait_for, "Visiting page");
        self.fetcher.fetch(&query)
    }
}

impl<F: PageFetcher> CatalogLookup for GoodRxCatalog<F> {
    #[instrument(skip(self))]
    fn fetch(&self, name: &str) -> CatalogResult<RawDrugData> {
        self.visit(self.details_query(name))
            .and_then(|payload| parse_drug_payload(&payload))
            .map_err(|e| {
                if !matches!(e, PageError::MissingSelector(_)) {
                    warn!(error = %e, "Drug details page failed");
                }
                e.into_catalog_error(name)
            })
    }
}

impl<F: PageFetcher> PriceLookup for GoodRxCatalog<F> {
    #[instrument(skip(self), fields(name = %query.name))]
    fn stores(&self, query: &StoreQuery) -> CatalogResult<Vec<StorePrice>> {
        let stores = self
            .visit(self.stores_query(query))
            .and_then(|payload| parse_price_rows(&payload))
            .map_err(|e| e.into_catalog_error(&query.name))?;

        debug!(count = stores.len(), "Collected store prices");
        Ok(stores)
    }

    #[instrument(skip(self))]
    fn coupon(&self, coupon_path: &str) -> CatalogResult<Coupon> {
        self.visit(self.coupon_query(coupon_path))
            .and_then(|payload| parse_coupon(&payload))
            .map_err(|e| e.into_catalog_error(coupon_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::FixtureFetcher;
    use rxid_core::CatalogError;

    const LISINOPRIL: &str = r#"{"equivalent_drugs": {"Lisinopril": {"slug": "lisinopril", "forms": {}}}}"#;

    fn catalog(fetcher: FixtureFetcher) -> GoodRxCatalog<FixtureFetcher> {
        GoodRxCatalog::new(fetcher, GoodRxConfig::default()).unwrap()
    }

    #[test]
    fn test_drug_slug() {
        assert_eq!(drug_slug("Lisinopril"), "lisinopril");
        assert_eq!(drug_slug("  Metformin   HCL "), "metformin-hcl");
    }

    #[test]
    fn test_config_from_json() {
        assert_eq!(GoodRxConfig::from_json("{}").unwrap(), GoodRxConfig::default());

        let config = GoodRxConfig::from_json(r#"{"base_url": "http://localhost:8080/"}"#).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = GoodRxCatalog::new(FixtureFetcher::new(), GoodRxConfig::new().base_url("not a url"));
        assert!(matches!(result, Err(PageError::InvalidUrl(_))));
    }

    #[test]
    fn test_page_urls() {
        let catalog = GoodRxCatalog::new(
            FixtureFetcher::new(),
            GoodRxConfig::new().base_url("http://localhost:8080/"),
        )
        .unwrap();

        let details = catalog.details_query("Metformin HCL").unwrap();
        assert_eq!(details.url.as_str(), "http://localhost:8080/metformin-hcl/what-is");
        assert_eq!(details.wait_for, DRUG_READY);

        let stores = catalog
            .stores_query(
                &StoreQuery::new("lisinopril".into(), "tablet".into(), "10mg".into(), 30)
                    .with_brand("zestril"),
            )
            .unwrap();
        assert_eq!(
            stores.url.as_str(),
            "http://localhost:8080/lisinopril?form=tablet&dosage=10mg&quantity=30&label_override=zestril"
        );
        assert_eq!(stores.extract, Extraction::PriceRows);

        let coupon = catalog.coupon_query("/coupon/cvs/lisinopril").unwrap();
        assert_eq!(coupon.url.as_str(), "http://localhost:8080/coupon/cvs/lisinopril");
    }

    #[test]
    fn test_name_stays_in_one_path_segment() {
        let catalog = catalog(FixtureFetcher::new());

        let fragment = catalog.details_query("lisinopril#junk").unwrap();
        assert_eq!(fragment.url.path(), "/lisinopril%23junk/what-is");
        assert_eq!(fragment.url.fragment(), None);

        let query = catalog.details_query("lisinopril?x").unwrap();
        assert_eq!(query.url.path(), "/lisinopril%3Fx/what-is");
        assert_eq!(query.url.query(), None);

        let climb = catalog.details_query("../coupon/cvs/x").unwrap();
        assert_eq!(climb.url.path(), "/..%2Fcoupon%2Fcvs%2Fx/what-is");
        assert_eq!(climb.url.host_str(), Some("www.goodrx.com"));

        let stores = catalog
            .stores_query(&StoreQuery::new("a#b".into(), "tablet".into(), "10mg".into(), 30))
            .unwrap();
        assert_eq!(stores.url.path(), "/a%23b");
        assert_eq!(stores.url.fragment(), None);
    }

    #[test]
    fn test_dot_names_are_rejected() {
        let catalog = catalog(FixtureFetcher::new());

        assert!(matches!(catalog.details_query(".."), Err(PageError::InvalidUrl(_))));
        assert!(matches!(catalog.details_query("  "), Err(PageError::InvalidUrl(_))));
        assert!(matches!(catalog.fetch(".."), Err(CatalogError::Lookup(_))));
        assert!(catalog.fetcher().visited().is_empty());
    }

    #[test]
    fn test_base_path_is_kept() {
        let catalog = GoodRxCatalog::new(
            FixtureFetcher::new(),
            GoodRxConfig::new().base_url("https://mirror.test/goodrx/"),
        )
        .unwrap();

        let details = catalog.details_query("lisinopril").unwrap();
        assert_eq!(details.url.as_str(), "https://mirror.test/goodrx/lisinopril/what-is");

        let coupon = catalog.coupon_query("coupon/cvs/lisinopril?qty=30").unwrap();
        assert_eq!(coupon.url.path(), "/goodrx/coupon/cvs/lisinopril");
        assert_eq!(coupon.url.query(), Some("qty=30"));
    }

    #[test]
    fn test_generic_label_when_no_brand() {
        let catalog = catalog(FixtureFetcher::new());
        let query = catalog
            .stores_query(&StoreQuery::new(
                "metformin hcl".into(),
                "tablet".into(),
                "500mg".into(),
                60,
            ))
            .unwrap();
        assert!(query.url.as_str().ends_with("label_override=metformin+hcl"));
    }

    #[test]
    fn test_fetch_details() {
        let catalog = catalog(
            FixtureFetcher::new().with_page("https://www.goodrx.com/lisinopril/what-is", LISINOPRIL),
        );

        let data = catalog.fetch("lisinopril").unwrap();
        assert!(data.equivalent_drugs.contains_key("Lisinopril"));
        assert_eq!(catalog.fetcher().visited().len(), 1);
    }

    #[test]
    fn test_fetch_error_mapping() {
        let catalog = catalog(
            FixtureFetcher::new()
                .with_page("https://www.goodrx.com/garbled/what-is", "<div>")
                .with_failure(
                    "https://www.goodrx.com/slow/what-is",
                    PageError::Timeout("30000ms".into()),
                ),
        );

        assert_eq!(
            catalog.fetch("zzyzx").unwrap_err(),
            CatalogError::NotFound("zzyzx".into())
        );
        assert!(matches!(catalog.fetch("garbled"), Err(CatalogError::Lookup(_))));
        assert!(matches!(catalog.fetch("slow"), Err(CatalogError::Timeout(_))));
    }

    #[test]
    fn test_stores_and_coupon() {
        let catalog = catalog(
            FixtureFetcher::new()
                .with_page(
                    "https://www.goodrx.com/lisinopril?form=tablet&dosage=10mg&quantity=30&label_override=lisinopril",
                    r#"[{"name": "CVS", "price": "$4.00", "href": "/coupon/cvs/lisinopril"}]"#,
                )
                .with_page(
                    "https://www.goodrx.com/coupon/cvs/lisinopril",
                    r#"{"bin": "015995"}"#,
                ),
        );

        let query = StoreQuery::new("lisinopril".into(), "tablet".into(), "10mg".into(), 30);
        let stores = catalog.stores(&query).unwrap();
        assert_eq!(stores.len(), 1);

        let coupon = catalog.coupon(&stores[0].coupon_path).unwrap();
        assert_eq!(coupon.field("bin"), Some("015995"));
    }
}
