//! Uniqlo US adapter over the public ranked-products recommendation API.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use rackdb_core::{CanonicalProduct, Gender};

use crate::adapter::{FetchOptions, RawBatch, RawCatalog, VendorAdapter};
use crate::error::AdapterError;
use crate::retry::retry_with_backoff;
use crate::types::{UniqloItem, UniqloResponse};

const DEFAULT_API_BASE: &str = "https://www.uniqlo.com/us/api/commerce/v5/en";
const PRODUCT_URL_PREFIX: &str = "https://www.uniqlo.com/us/en/products/";
const PAGE_LIMIT: &str = "62";

/// Category scopes queried per gender. The endpoint caps each response, so
/// the catalog is assembled from one request per (gender, category) pair.
const CATEGORIES: &[(&str, &str, &str)] = &[
    ("men", "24115", "Tops"),
    ("men", "24209", "Bottoms"),
    ("men", "23305", "Outerwear"),
    ("women", "23191", "Tops"),
    ("women", "23213", "Bottoms"),
    ("women", "22210", "Outerwear"),
];

pub struct UniqloAdapter {
    api_base: String,
}

impl Default for UniqloAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl UniqloAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Adapter pointed at a different API origin. Used by tests to target a
    /// local mock server.
    #[must_use]
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    fn ranked_products_url(&self) -> String {
        format!("{}/recommendations/ranked-products", self.api_base)
    }

    async fn fetch_category(
        &self,
        client: &reqwest::Client,
        gender: &str,
        category_id: &str,
    ) -> Result<Vec<serde_json::Value>, AdapterError> {
        let url = self.ranked_products_url();
        let response = client
            .get(&url)
            .query(&[
                ("schema", "general"),
                ("genders", gender),
                ("isDiscount", "false"),
                ("isAreaAvailable", "false"),
                ("limit", PAGE_LIMIT),
                ("categoryIds", category_id),
                ("temperatureSensitive", "false"),
                ("httpFailure", "true"),
            ])
            .header("Referer", "https://www.uniqlo.com/us/en/spl/ranking/men")
            .header("x-fr-clientid", "uq.us.web-spa")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        let parsed: UniqloResponse =
            serde_json::from_str(&body).map_err(|source| AdapterError::Deserialize {
                context: format!("ranked-products ({gender}/{category_id})"),
                source,
            })?;

        Ok(parsed.result.items)
    }
}

#[async_trait]
impl VendorAdapter for UniqloAdapter {
    fn brand(&self) -> &'static str {
        "Uniqlo"
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        options: FetchOptions,
    ) -> Result<RawCatalog, AdapterError> {
        let mut catalog = RawCatalog::default();

        for (index, (gender, category_id, category)) in CATEGORIES.iter().enumerate() {
            if index > 0 && options.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(options.inter_request_delay_ms)).await;
            }

            let items = retry_with_backoff(options.max_retries, options.backoff_base_secs, || {
                self.fetch_category(client, gender, category_id)
            })
            .await?;
            tracing::debug!(gender, category, count = items.len(), "fetched category");
            catalog.batches.push(RawBatch {
                category: (*category).to_string(),
                items,
            });
        }

        Ok(catalog)
    }

    fn parse(&self, raw: &RawCatalog) -> Result<Vec<CanonicalProduct>, AdapterError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut products = Vec::new();

        for batch in &raw.batches {
            for value in &batch.items {
                let item: UniqloItem = serde_json::from_value(value.clone()).map_err(|source| {
                    AdapterError::Deserialize {
                        context: format!("item in category {:?}", batch.category),
                        source,
                    }
                })?;

                // A product re-appears once per category it ranks in; the
                // first occurrence wins.
                if !seen.insert(item.product_id.clone()) {
                    continue;
                }

                products.push(parse_product(&item, &batch.category)?);
            }
        }

        Ok(products)
    }
}

fn parse_product(item: &UniqloItem, category: &str) -> Result<CanonicalProduct, AdapterError> {
    // Sorted by color-code key via the BTreeMap; the lowest key is primary.
    let images: Vec<String> = item
        .images
        .main
        .values()
        .map(|entry| entry.image.clone())
        .collect();

    let main_image_url = images
        .first()
        .cloned()
        .ok_or_else(|| AdapterError::Parse {
            store_product_id: item.product_id.clone(),
            reason: "product has no main images".to_string(),
        })?;

    let (raw_price, on_sale) = match &item.prices.promo {
        Some(promo) => (promo.value, true),
        None => (item.prices.base.value, false),
    };
    let price = Decimal::from_f64(raw_price)
        .ok_or_else(|| AdapterError::Parse {
            store_product_id: item.product_id.clone(),
            reason: format!("unrepresentable price {raw_price}"),
        })?
        .round_dp(2);

    let sizes: Vec<String> = item
        .sizes
        .iter()
        .map(|chip| chip.name.clone())
        .filter(|name| name != "One Size")
        .collect();
    let colors: Vec<String> = item.colors.iter().map(|chip| chip.name.clone()).collect();

    let product = CanonicalProduct {
        store_product_id: item.product_id.clone(),
        brand: "Uniqlo".to_string(),
        product_name: item.name.clone(),
        category: category.to_string(),
        gender: parse_gender(&item.gender_name),
        price,
        on_sale,
        sizes,
        colors,
        product_url: format!("{PRODUCT_URL_PREFIX}{}", item.product_id),
        main_image_url,
        images,
    };

    product.validate().map_err(|e| AdapterError::Parse {
        store_product_id: item.product_id.clone(),
        reason: e.to_string(),
    })?;

    Ok(product)
}

fn parse_gender(gender_name: &str) -> Gender {
    match gender_name {
        "MEN" => Gender::M,
        "WOMEN" => Gender::F,
        _ => Gender::U,
    }
}

#[cfg(test)]
#[path = "uniqlo_test.rs"]
mod tests;
