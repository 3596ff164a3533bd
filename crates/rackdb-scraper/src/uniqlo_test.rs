use serde_json::json;

use super::*;

fn uniqlo_item(product_id: &str) -> serde_json::Value {
    json!({
        "productId": product_id,
        "name": "Airism Cotton T-Shirt",
        "genderName": "MEN",
        "prices": {
            "base": { "currency": { "code": "USD", "symbol": "$" }, "value": 19.9 },
            "promo": null,
            "isDualPrice": false
        },
        "colors": [
            { "code": "COL00", "displayCode": "00", "name": "WHITE" },
            { "code": "COL09", "displayCode": "09", "name": "BLACK" }
        ],
        "sizes": [
            { "code": "SMA002", "name": "S" },
            { "code": "SMA003", "name": "M" },
            { "code": "SMA999", "name": "One Size" }
        ],
        "images": {
            "main": {
                "09": { "image": "https://img.uniqlo.com/09.jpg" },
                "00": { "image": "https://img.uniqlo.com/00.jpg" }
            },
            "chip": {},
            "sub": []
        }
    })
}

fn one_batch(category: &str, items: Vec<serde_json::Value>) -> RawCatalog {
    RawCatalog {
        batches: vec![RawBatch {
            category: category.to_string(),
            items,
        }],
    }
}

#[test]
fn parse_maps_fields_to_canonical_product() {
    let adapter = UniqloAdapter::new();
    let raw = one_batch("Tops", vec![uniqlo_item("E459591-000")]);

    let products = adapter.parse(&raw).unwrap();

    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.store_product_id, "E459591-000");
    assert_eq!(product.brand, "Uniqlo");
    assert_eq!(product.product_name, "Airism Cotton T-Shirt");
    assert_eq!(product.category, "Tops");
    assert_eq!(product.gender, Gender::M);
    assert_eq!(product.price, Decimal::new(1990, 2));
    assert!(!product.on_sale);
    assert_eq!(
        product.product_url,
        "https://www.uniqlo.com/us/en/products/E459591-000"
    );
}

#[test]
fn parse_orders_images_by_color_code_and_picks_primary() {
    let adapter = UniqloAdapter::new();
    let raw = one_batch("Tops", vec![uniqlo_item("E1")]);

    let product = &adapter.parse(&raw).unwrap()[0];

    assert_eq!(
        product.images,
        vec![
            "https://img.uniqlo.com/00.jpg",
            "https://img.uniqlo.com/09.jpg"
        ]
    );
    assert_eq!(product.main_image_url, "https://img.uniqlo.com/00.jpg");
}

#[test]
fn parse_skips_one_size_chip_and_keeps_order() {
    let adapter = UniqloAdapter::new();
    let raw = one_batch("Tops", vec![uniqlo_item("E1")]);

    let product = &adapter.parse(&raw).unwrap()[0];
    assert_eq!(product.sizes, vec!["S", "M"]);
    assert_eq!(product.colors, vec!["WHITE", "BLACK"]);
}

#[test]
fn parse_uses_promo_price_when_on_sale() {
    let adapter = UniqloAdapter::new();
    let mut item = uniqlo_item("E1");
    item["prices"]["promo"] = json!({
        "currency": { "code": "USD", "symbol": "$" },
        "value": 14.9
    });
    let raw = one_batch("Tops", vec![item]);

    let product = &adapter.parse(&raw).unwrap()[0];
    assert!(product.on_sale);
    assert_eq!(product.price, Decimal::new(1490, 2));
}

#[test]
fn parse_maps_gender_names() {
    let adapter = UniqloAdapter::new();

    let mut women = uniqlo_item("E1");
    women["genderName"] = json!("WOMEN");
    let mut unisex = uniqlo_item("E2");
    unisex["genderName"] = json!("KIDS");

    let raw = one_batch("Tops", vec![women, unisex]);
    let products = adapter.parse(&raw).unwrap();

    assert_eq!(products[0].gender, Gender::F);
    assert_eq!(products[1].gender, Gender::U);
}

#[test]
fn parse_dedupes_across_batches_first_occurrence_wins() {
    let adapter = UniqloAdapter::new();
    let raw = RawCatalog {
        batches: vec![
            RawBatch {
                category: "Tops".to_string(),
                items: vec![uniqlo_item("E1")],
            },
            RawBatch {
                category: "Outerwear".to_string(),
                items: vec![uniqlo_item("E1"), uniqlo_item("E2")],
            },
        ],
    };

    let products = adapter.parse(&raw).unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].store_product_id, "E1");
    assert_eq!(products[0].category, "Tops");
    assert_eq!(products[1].store_product_id, "E2");
}

#[test]
fn parse_rejects_item_without_images() {
    let adapter = UniqloAdapter::new();
    let mut item = uniqlo_item("E1");
    item["images"]["main"] = json!({});
    let raw = one_batch("Tops", vec![item]);

    let err = adapter.parse(&raw).unwrap_err();
    assert!(matches!(err, AdapterError::Parse { store_product_id, .. } if store_product_id == "E1"));
}

#[test]
fn parse_fails_on_malformed_item() {
    let adapter = UniqloAdapter::new();
    let raw = one_batch("Tops", vec![json!({"productId": 42})]);

    let err = adapter.parse(&raw).unwrap_err();
    assert!(matches!(err, AdapterError::Deserialize { .. }));
}
