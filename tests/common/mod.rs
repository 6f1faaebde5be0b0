#![allow(dead_code)]

use serde_json::{json, Value};

pub const ORDER_URL: &str = "http://api.x.io/orders/42";
pub const ITEMS_URL: &str = "http://api.x.io/orders/42/items";
pub const CUSTOMER_URL: &str = "http://api.x.io/customers/pj123";
pub const ADDRESS_URL: &str = "http://api.x.io/customers/pj123/address";

/// An order with a linked item collection and an embedded customer, who in
/// turn embeds an address.
pub fn order_payload() -> Value {
    json!({
        "class": ["order"],
        "properties": { "orderNumber": 42, "itemCount": 3, "status": "pending" },
        "entities": [
            {
                "class": ["items", "collection"],
                "rel": ["http://x.io/rels/order-items", "name:items"],
                "href": ITEMS_URL
            },
            {
                "class": ["info", "customer"],
                "rel": ["http://x.io/rels/customer", "name:customer"],
                "properties": { "customerId": "pj123", "name": "Peter Joseph" },
                "entities": [{
                    "class": ["address"],
                    "rel": ["name:address"],
                    "properties": { "city": "Springfield" },
                    "links": [{ "rel": ["self"], "href": ADDRESS_URL }]
                }],
                "links": [{ "rel": ["self"], "href": CUSTOMER_URL }]
            }
        ],
        "actions": [{
            "name": "add-item",
            "title": "Add Item",
            "method": "POST",
            "href": ITEMS_URL,
            "type": "application/json",
            "fields": [
                { "name": "orderNumber", "type": "hidden" },
                { "name": "productCode", "type": "text" },
                { "name": "quantity", "type": "number", "value": 1 }
            ]
        }],
        "links": [
            { "rel": ["self"], "href": ORDER_URL },
            { "rel": ["previous"], "href": "http://api.x.io/orders/41" },
            { "rel": ["next"], "href": "http://api.x.io/orders/43" }
        ]
    })
}

pub fn order_with(properties: Value) -> Value {
    let mut payload = order_payload();
    payload["properties"] = properties;
    payload
}

pub fn items_payload() -> Value {
    json!({
        "class": ["items", "collection"],
        "properties": { "offset": 0 },
        "entities": [
            { "properties": { "id": "i1", "sku": "WIDGET" }, "href": format!("{ITEMS_URL}/i1") },
            { "properties": { "id": "i2", "sku": "GADGET" }, "href": format!("{ITEMS_URL}/i2") }
        ],
        "links": [{ "rel": ["self"], "href": ITEMS_URL }]
    })
}

pub fn customer_payload() -> Value {
    json!({
        "class": ["info", "customer"],
        "properties": { "customerId": "pj123", "name": "Peter Joseph", "vip": true },
        "links": [{ "rel": ["self"], "href": CUSTOMER_URL }]
    })
}

/// The minimal collection: `/a` with members `/a/1` and `/a/2`.
pub fn collection_payload() -> Value {
    json!({
        "class": ["collection"],
        "entities": [
            { "properties": { "id": 1 }, "links": [{ "rel": ["self"], "href": "/a/1" }] },
            { "properties": { "id": 2 }, "links": [{ "rel": ["self"], "href": "/a/2" }] }
        ],
        "links": [{ "rel": ["self"], "href": "/a" }]
    })
}

pub fn error_payload(message: &str) -> String {
    json!({
        "class": ["error"],
        "properties": { "message": message, "code": 404 }
    })
    .to_string()
}
