//! The canonical, store-agnostic product record produced by vendor adapters
//! and consumed by the reconciliation engine.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target demographic for a product. `U` covers unisex and anything a vendor
/// reports outside its men/women buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
    U,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
            Gender::U => "U",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ProductError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::M),
            "F" => Ok(Gender::F),
            "U" => Ok(Gender::U),
            other => Err(ProductError::InvalidGender(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("store_product_id is empty")]
    MissingStoreProductId,

    #[error("brand is empty for product {store_product_id}")]
    MissingBrand { store_product_id: String },

    #[error("negative price {price} for product {store_product_id}")]
    NegativePrice {
        store_product_id: String,
        price: Decimal,
    },

    #[error("invalid gender value: {0:?} (expected M, F, or U)")]
    InvalidGender(String),
}

/// A product scraped from a retail storefront, validated and normalized for
/// reconciliation against the persistent catalog.
///
/// `store_product_id` is the natural key: it is the vendor's own identifier
/// for the physical item and must be stable across re-scrapes. All other
/// fields are overwritten on every successful reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalProduct {
    /// Product id found on the vendor's website. Unique per brand catalog.
    pub store_product_id: String,
    /// Retailer the product was scraped from.
    pub brand: String,
    pub product_name: String,
    /// Type of product, e.g. "Tops", "Bottoms". Empty when the vendor does
    /// not categorize its listings.
    pub category: String,
    pub gender: Gender,
    /// Current listed price; the promo price when the item is on sale.
    pub price: Decimal,
    pub on_sale: bool,
    /// Size labels in the vendor's display order, e.g. `"S"`, `"US-30"`.
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    /// Image URLs; the first entry is the primary image.
    pub images: Vec<String>,
    pub main_image_url: String,
    pub product_url: String,
}

impl CanonicalProduct {
    /// Returns the primary image URL: `main_image_url` when set, otherwise
    /// the first entry of `images`.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        if self.main_image_url.is_empty() {
            self.images.first().map(String::as_str)
        } else {
            Some(&self.main_image_url)
        }
    }

    /// Checks the record-level invariants the reconciliation engine depends
    /// on. Adapters are expected to call this before staging a batch.
    ///
    /// # Errors
    ///
    /// Returns [`ProductError`] if `store_product_id` or `brand` is empty, or
    /// the price is negative.
    pub fn validate(&self) -> Result<(), ProductError> {
        if self.store_product_id.is_empty() {
            return Err(ProductError::MissingStoreProductId);
        }
        if self.brand.is_empty() {
            return Err(ProductError::MissingBrand {
                store_product_id: self.store_product_id.clone(),
            });
        }
        if self.price < Decimal::ZERO {
            return Err(ProductError::NegativePrice {
                store_product_id: self.store_product_id.clone(),
                price: self.price,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(store_product_id: &str) -> CanonicalProduct {
        CanonicalProduct {
            store_product_id: store_product_id.to_string(),
            brand: "Uniqlo".to_string(),
            product_name: "Airism Cotton T-Shirt".to_string(),
            category: "Tops".to_string(),
            gender: Gender::M,
            price: Decimal::new(1990, 2),
            on_sale: false,
            sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
            colors: vec!["WHITE".to_string(), "BLACK".to_string()],
            images: vec![
                "https://img.example.com/1.jpg".to_string(),
                "https://img.example.com/2.jpg".to_string(),
            ],
            main_image_url: "https://img.example.com/1.jpg".to_string(),
            product_url: "https://www.uniqlo.com/us/en/products/E459591".to_string(),
        }
    }

    #[test]
    fn validate_accepts_well_formed_product() {
        assert!(make_product("E459591-000").validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_store_product_id() {
        let product = make_product("");
        assert!(matches!(
            product.validate(),
            Err(ProductError::MissingStoreProductId)
        ));
    }

    #[test]
    fn validate_rejects_empty_brand() {
        let mut product = make_product("E459591-000");
        product.brand = String::new();
        assert!(matches!(
            product.validate(),
            Err(ProductError::MissingBrand { .. })
        ));
    }

    #[test]
    fn validate_rejects_negative_price() {
        let mut product = make_product("E459591-000");
        product.price = Decimal::new(-100, 2);
        assert!(matches!(
            product.validate(),
            Err(ProductError::NegativePrice { .. })
        ));
    }

    #[test]
    fn primary_image_prefers_main_image_url() {
        let product = make_product("E459591-000");
        assert_eq!(
            product.primary_image(),
            Some("https://img.example.com/1.jpg")
        );
    }

    #[test]
    fn primary_image_falls_back_to_first_image() {
        let mut product = make_product("E459591-000");
        product.main_image_url = String::new();
        assert_eq!(
            product.primary_image(),
            Some("https://img.example.com/1.jpg")
        );
    }

    #[test]
    fn primary_image_none_when_no_images() {
        let mut product = make_product("E459591-000");
        product.main_image_url = String::new();
        product.images.clear();
        assert!(product.primary_image().is_none());
    }

    #[test]
    fn gender_round_trips_through_str() {
        for gender in [Gender::M, Gender::F, Gender::U] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("X".parse::<Gender>().is_err());
    }

    #[test]
    fn serde_preserves_field_names() {
        let product = make_product("E459591-000");
        let value = serde_json::to_value(&product).unwrap();

        for field in [
            "store_product_id",
            "brand",
            "product_name",
            "category",
            "gender",
            "price",
            "on_sale",
            "sizes",
            "colors",
            "images",
            "main_image_url",
            "product_url",
        ] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(value["gender"], "M");

        let back: CanonicalProduct = serde_json::from_value(value).unwrap();
        assert_eq!(back.store_product_id, product.store_product_id);
        assert_eq!(back.price, product.price);
        assert_eq!(back.sizes, product.sizes);
    }
}
