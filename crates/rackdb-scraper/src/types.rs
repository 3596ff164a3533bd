//! Uniqlo API response types for the `ranked-products` recommendation
//! endpoint.
//!
//! ## Observed shape
//!
//! ### Prices
//! `prices.base` is always present; `prices.promo` is `null` unless the item
//! is discounted. Price values are JSON floats in the vendor's response;
//! they are rounded to two decimal places on conversion to `Decimal`.
//!
//! ### Images
//! `images.main` is a map keyed by two-digit color codes (`"00"`, `"08"`, …)
//! to image entries. Map order is not meaningful; the primary image is the
//! entry with the lowest key.
//!
//! ### Sizes
//! Size chips carry a display `name` like `"S"`, `"M"`, `"US-30"`. The
//! placeholder `"One Size"` chip is dropped during parsing.
//!
//! ### Gender
//! `genderName` is `"MEN"`, `"WOMEN"`, or `"UNISEX"`; anything unrecognized
//! maps to unisex.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level response from the ranked-products endpoint.
#[derive(Debug, Deserialize)]
pub struct UniqloResponse {
    pub result: UniqloResult,
}

#[derive(Debug, Deserialize)]
pub struct UniqloResult {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

/// One product item, deserialized from the staged raw payload at parse time.
#[derive(Debug, Deserialize)]
pub struct UniqloItem {
    #[serde(rename = "productId")]
    pub product_id: String,
    pub name: String,
    #[serde(rename = "genderName")]
    pub gender_name: String,
    pub prices: UniqloPrices,
    #[serde(default)]
    pub colors: Vec<UniqloChip>,
    #[serde(default)]
    pub sizes: Vec<UniqloChip>,
    pub images: UniqloImages,
}

/// A color or size chip; only the display name matters downstream.
#[derive(Debug, Deserialize)]
pub struct UniqloChip {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UniqloPrices {
    pub base: UniqloPrice,
    #[serde(default)]
    pub promo: Option<UniqloPrice>,
}

#[derive(Debug, Deserialize)]
pub struct UniqloPrice {
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct UniqloImages {
    /// Keyed by two-digit color code. `BTreeMap` so iteration yields the
    /// lowest key first, and that entry is the primary image.
    #[serde(default)]
    pub main: BTreeMap<String, UniqloImageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct UniqloImageEntry {
    pub image: String,
}
