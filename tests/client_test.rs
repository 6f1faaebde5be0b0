mod common;

use common::*;
use serde_json::{json, Map};
use siren_resolver::clients::SirenClient;
use siren_resolver::entity::AutoFetch;
use siren_resolver::runtime::ClientConfig;
use siren_resolver::transport::mock::MockTransport;
use siren_resolver::transport::Transport;
use std::sync::Arc;

fn client(config: ClientConfig) -> (SirenClient, MockTransport) {
    let mock = MockTransport::new();
    let transport: Arc<dyn Transport> = Arc::new(mock.clone());
    (SirenClient::new(config, transport), mock)
}

#[tokio::test]
async fn test_resolve_entity_by_name() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io/"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());

    let order = client
        .resolve_entity("orders/42")
        .await
        .expect("Failed to resolve order");

    assert_eq!(order.url(), ORDER_URL);
    assert!(client.store().exists(ORDER_URL));
    mock.verify();
}

#[tokio::test]
async fn test_default_headers_reach_the_transport() {
    let config = ClientConfig::new("http://api.x.io")
        .with_header("Accept", "application/vnd.siren+json");
    let (client, mock) = client(config);
    mock.expect_get(ORDER_URL).return_ok(order_payload());

    client.resolve(ORDER_URL).await.unwrap();

    assert_eq!(
        mock.calls()[0].headers,
        vec![("Accept".to_string(), "application/vnd.siren+json".to_string())]
    );
}

#[tokio::test]
async fn test_follow_link_by_rel() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());
    mock.expect_get("http://api.x.io/orders/43").return_ok(json!({
        "class": ["order"],
        "properties": { "orderNumber": 43 },
        "links": [{ "rel": ["self"], "href": "http://api.x.io/orders/43" }]
    }));

    let order = client.resolve(ORDER_URL).await.unwrap();
    let next = client.follow(&order, "next").await.unwrap().expect("next order");
    let up = client.follow(&order, "up").await.unwrap();

    assert_eq!(next.property("orderNumber"), Some(json!(43)));
    assert!(up.is_none());
    mock.verify();
}

#[tokio::test]
async fn test_refresh_replaces_cached_entity() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());
    mock.expect_get(ORDER_URL)
        .return_ok(order_with(json!({ "orderNumber": 42, "status": "shipped" })));

    let order = client.resolve(ORDER_URL).await.unwrap();
    let fresh = client.refresh(&order).await.unwrap();

    assert_eq!(fresh.property("status"), Some(json!("shipped")));
    assert!(client.store().get(ORDER_URL).unwrap().ptr_eq(&fresh));
    assert!(client.resolve(ORDER_URL).await.unwrap().ptr_eq(&fresh));
    assert_eq!(mock.call_count(ORDER_URL), 2);
}

#[tokio::test]
async fn test_chain_from_resolved_entity() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());

    let order = client.resolve(ORDER_URL).await.unwrap();
    let address = client
        .resolve_chain_from(&order, "customer#address")
        .await
        .unwrap();

    assert_eq!(address.property("city"), Some(json!("Springfield")));
    assert_eq!(mock.total_calls(), 1);
}

#[tokio::test]
async fn test_config_auto_fetch_applies_to_session() {
    let config = ClientConfig::new("http://api.x.io").with_auto_fetch(AutoFetch::Linked);
    let (client, mock) = client(config);
    mock.expect_get(ORDER_URL).return_ok(order_payload());
    mock.expect_get(ITEMS_URL).return_ok(items_payload());

    let order = client.resolve(ORDER_URL).await.unwrap();

    assert!(!order.sub_entity("items").unwrap().is_linked());
    assert!(client.store().exists(ITEMS_URL));
    mock.verify();
}

#[tokio::test]
async fn test_invoke_through_session() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());
    mock.expect("POST", ITEMS_URL)
        .return_ok(order_with(json!({ "orderNumber": 42, "itemCount": 4 })));

    let order = client.resolve(ORDER_URL).await.unwrap();
    let mut attributes = Map::new();
    attributes.insert("productCode".into(), json!("GADGET"));
    client.invoke(&order, "add-item", attributes).await.unwrap();

    assert_eq!(order.property("itemCount"), Some(json!(4)));
    assert_eq!(
        client.store().get(ORDER_URL).unwrap().property("itemCount"),
        Some(json!(4))
    );
    assert_eq!(
        mock.calls()[1].body,
        Some(json!({ "orderNumber": 42, "productCode": "GADGET", "quantity": 1 }))
    );
}

#[tokio::test]
async fn test_clones_share_the_session_cache() {
    let (client, mock) = client(ClientConfig::new("http://api.x.io"));
    mock.expect_get(ORDER_URL).return_ok(order_payload());
    let other = client.clone();

    let (a, b) = tokio::join!(client.resolve(ORDER_URL), other.resolve(ORDER_URL));

    assert!(a.unwrap().ptr_eq(&b.unwrap()));
    assert_eq!(mock.total_calls(), 1);
}
