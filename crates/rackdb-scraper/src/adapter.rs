//! The vendor adapter capability interface and the static brand registry.
//!
//! Adapters are resolved once through [`AdapterRegistry`], built at startup;
//! there is no runtime name-based dispatch. Adding a retailer means adding an
//! adapter type and one line in [`AdapterRegistry::builtin`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rackdb_core::CanonicalProduct;

use crate::error::AdapterError;

/// One fetched group of raw vendor items, tagged with the category the
/// request was scoped to (empty when the vendor does not categorize).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub category: String,
    /// Vendor items exactly as returned, uninterpreted. Parsing happens in
    /// [`VendorAdapter::parse`] so the staged payload stays faithful.
    pub items: Vec<serde_json::Value>,
}

/// Everything one fetch pass pulled from a vendor, staged as-is in the
/// ledger and parsed later.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCatalog {
    pub batches: Vec<RawBatch>,
}

impl RawCatalog {
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.batches.iter().map(|b| b.items.len()).sum()
    }
}

/// Pacing and retry knobs for one fetch pass. `Default` is no delay and no
/// retries, which is what tests want.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Pause between consecutive vendor requests.
    pub inter_request_delay_ms: u64,
    /// Retries per request after the first attempt, on transient errors.
    pub max_retries: u32,
    /// Base of the exponential backoff between retries.
    pub backoff_base_secs: u64,
}

/// Per-retailer fetch + parse. Fetch and parse are split so raw payloads can
/// be staged, inspected, and re-parsed without re-hitting the vendor.
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    /// Brand key this adapter serves; also the `brand` written on every
    /// canonical product it produces.
    fn brand(&self) -> &'static str;

    /// Pulls the vendor's current listings.
    async fn fetch(
        &self,
        client: &reqwest::Client,
        options: FetchOptions,
    ) -> Result<RawCatalog, AdapterError>;

    /// Converts a raw payload into validated canonical products, deduplicated
    /// by `store_product_id` (first occurrence wins).
    fn parse(&self, raw: &RawCatalog) -> Result<Vec<CanonicalProduct>, AdapterError>;
}

impl std::fmt::Debug for dyn VendorAdapter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorAdapter")
            .field("brand", &self.brand())
            .finish()
    }
}

/// Static map from brand key to adapter, resolved at startup.
pub struct AdapterRegistry {
    adapters: HashMap<&'static str, Box<dyn VendorAdapter>>,
}

impl AdapterRegistry {
    /// Registry with every built-in adapter.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self {
            adapters: HashMap::new(),
        };
        registry.register(Box::new(crate::uniqlo::UniqloAdapter::new()));
        registry
    }

    pub fn register(&mut self, adapter: Box<dyn VendorAdapter>) {
        self.adapters.insert(adapter.brand(), adapter);
    }

    /// Resolves the adapter for `brand`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::UnknownBrand`] if no adapter is registered.
    pub fn get(&self, brand: &str) -> Result<&dyn VendorAdapter, AdapterError> {
        self.adapters
            .get(brand)
            .map(AsRef::as_ref)
            .ok_or_else(|| AdapterError::UnknownBrand(brand.to_string()))
    }

    #[must_use]
    pub fn brands(&self) -> Vec<&'static str> {
        let mut brands: Vec<&'static str> = self.adapters.keys().copied().collect();
        brands.sort_unstable();
        brands
    }
}
