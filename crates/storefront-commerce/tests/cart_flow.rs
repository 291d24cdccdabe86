//! End-to-end cart scenarios against a JSON catalog.
#![cfg(feature = "storage")]

use serde_json::json;
use storefront_cache::Cache;
use storefront_commerce::prelude::*;

fn size(value: &str) -> VariantSelection {
    [("Size".to_string(), value.to_string())].into()
}

fn product_p() -> Product {
    serde_json::from_value(json!({
        "sku": "P",
        "name": "Product P",
        "price": 10,
        "specialPrice": 8,
        "imageUrls": ["https://img.example/p.jpg"],
        "stockLevel": 2
    }))
    .unwrap()
}

fn product_q() -> Product {
    serde_json::from_value(json!({
        "sku": "Q",
        "name": "Product Q",
        "price": 20,
        "hasVariants": true,
        "variantAttributes": [{ "name": "Size", "values": ["S", "M"] }],
        "variants": [
            { "sku": "Q-S", "attributes": { "Size": "S" }, "stockLevel": 5 },
            { "sku": "Q-M", "attributes": { "Size": "M" }, "stockLevel": 1, "additionalPrice": 2 }
        ]
    }))
    .unwrap()
}

fn jersey() -> Product {
    serde_json::from_value(json!({
        "sku": "JERSEY",
        "name": "Jersey",
        "price": 89.9,
        "stockLevel": 10,
        "customizationConfig": {
            "customizations": [{
                "id": "flocking",
                "name": "Flocking",
                "fields": [
                    {
                        "id": "player",
                        "inputType": "preset",
                        "presets": [
                            { "id": "a-5", "values": { "name": "A", "number": 5 }, "price": 15 }
                        ],
                        "allowCustomInput": true,
                        "customInputPrice": 17,
                        "targetFields": ["name", "number"]
                    },
                    { "id": "name", "inputType": "text" },
                    { "id": "number", "inputType": "number", "validation": { "min": 1, "max": 99 } }
                ]
            }]
        }
    }))
    .unwrap()
}

#[test]
fn test_special_price_product_with_stock_two() {
    let p = product_p();
    let mut cart = CartLedger::new();

    assert!(cart.add(&p, None, None));
    assert!(cart.add(&p, None, None));
    assert_eq!(cart.items()[0].quantity, 2);
    assert_eq!(cart.total_price(), Money::new(1600));

    assert!(!cart.add(&p, None, None));
    assert_eq!(cart.items()[0].quantity, 2);
}

#[test]
fn test_variant_surcharge_and_independent_sizes() {
    let q = product_q();
    assert_eq!(resolve_price(&q, &size("M")), Money::new(2200));

    let mut cart = CartLedger::new();
    assert!(cart.add(&q, Some(&size("M")), None));
    assert!(!cart.add(&q, Some(&size("M")), None));
    assert!(cart.add(&q, Some(&size("S")), None));

    let ids: Vec<_> = cart.items().iter().map(|i| i.cart_item_id.clone()).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(cart.items()[0].sku.as_str(), "Q-M");
    assert_eq!(cart.items()[1].sku.as_str(), "Q-S");
}

#[test]
fn test_flocking_preset_and_custom_are_separate_lines() {
    let product = jersey();
    let offered = resolve_customizations(&product, &VariantSelection::new());

    let preset = select_customizations(
        &offered,
        &[CustomizationInput::new("flocking").with("player", "a-5")],
    )
    .unwrap();
    let custom = select_customizations(
        &offered,
        &[CustomizationInput::new("flocking")
            .with("player", CUSTOM_INPUT)
            .with("name", "Zaugg")
            .with("number", "7")],
    )
    .unwrap();
    assert_eq!(preset[0].total_price, Money::new(1500));
    assert_eq!(custom[0].total_price, Money::new(1700));

    let mut cart = CartLedger::new();
    assert!(cart.add(&product, None, Some(&preset)));
    assert!(cart.add(&product, None, Some(&custom)));
    assert!(cart.add(&product, None, Some(&preset)));

    assert_eq!(cart.len(), 2);
    let preset_line = &cart.items()[0];
    assert_eq!(preset_line.quantity, 2);
    assert_eq!(preset_line.final_price, Some(Money::new(10490)));
    assert_eq!(cart.items()[1].final_price, Some(Money::new(10690)));
    assert_eq!(
        cart.total_price(),
        Money::new(10490 * 2 + 10690)
    );
}

#[test]
fn test_persistence_round_trip() {
    let cache = Cache::in_memory().with_namespace("storefront");
    let product = jersey();
    let offered = resolve_customizations(&product, &VariantSelection::new());
    let preset = select_customizations(
        &offered,
        &[CustomizationInput::new("flocking").with("player", "a-5")],
    )
    .unwrap();

    let mut cart = CartLedger::new();
    cart.add(&product, None, Some(&preset));
    cart.add(&product, None, Some(&preset));
    cart.add(&product_q(), Some(&size("S")), None);
    cart.save(&cache).unwrap();

    let restored = CartLedger::load(&cache);
    assert_eq!(restored.len(), cart.len());
    for (before, after) in cart.items().iter().zip(restored.items()) {
        assert_eq!(before.cart_item_id, after.cart_item_id);
        assert_eq!(before.final_price, after.final_price);
        assert_eq!(before.quantity, after.quantity);
    }
    assert_eq!(restored, cart);
}

#[test]
fn test_persisted_cart_is_a_plain_item_list() {
    let cache = Cache::in_memory();
    let mut cart = CartLedger::new();
    cart.add(&product_p(), None, None);
    cart.save(&cache).unwrap();

    let document = cache.load(CART_KEY).unwrap().unwrap();
    assert_eq!(document[0]["cartItemId"], "P");
    assert_eq!(document[0]["unitPrice"], 8.0);
    assert_eq!(document[0]["originalPrice"], 10.0);
}

#[test]
fn test_empty_persister_gives_empty_state() {
    let cache = Cache::in_memory();
    assert!(CartLedger::load(&cache).is_empty());
    assert!(ProductRepository::load(&cache).is_empty());
}

#[test]
fn test_repository_round_trip_through_directory_store() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Cache::open_dir(dir.path()).unwrap();

    let repository = ProductRepository::with_products(vec![product_p(), product_q()]);
    repository.decrement_stock("Q-S", 2).unwrap();
    repository.save(&cache).unwrap();

    let reopened = Cache::open_dir(dir.path()).unwrap();
    let restored = ProductRepository::load(&reopened);
    assert_eq!(restored.products().len(), 2);
    assert_eq!(
        restored.resolve("Q", &size("S")).unwrap().stock_level,
        3
    );
}
