//! Cart and checkout flows through the storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use yakimoto_core::checkout::{DeliveryMethod, PaymentMethod};
use yakimoto_core::Price;
use yakimoto_integration_tests::{
    CLIENT_SECRET, FakeBackend, browser, judo_category, judogi, location, spawn_storefront,
};

async fn setup() -> (FakeBackend, String, reqwest::Client) {
    let backend = FakeBackend::start(vec![judogi()], vec![judo_category()]).await;
    let shop = spawn_storefront(&backend.url).await;
    (backend, shop, browser())
}

async fn add_to_cart(client: &reqwest::Client, shop: &str, size: &str, quantity: &str) {
    let response = client
        .post(format!("{shop}/cart/add"))
        .form(&[
            ("product_id", "7"),
            ("size", size),
            ("quantity", quantity),
            ("return_to", "/cart"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/cart"));
}

async fn cart_count(client: &reqwest::Client, shop: &str) -> String {
    client
        .get(format!("{shop}/cart/count"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_same_product_and_size_share_a_line() {
    let (_backend, shop, client) = setup().await;

    add_to_cart(&client, &shop, "130", "1").await;
    add_to_cart(&client, &shop, "130", "1").await;

    assert!(cart_count(&client, &shop).await.contains(">2</span>"));
    let page = client
        .get(format!("{shop}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Judogi Yakimoto Kids"));
    // One line of two at 500 kr
    assert!(page.contains("1000 kr"));
}

#[tokio::test]
async fn test_blank_update_quantity_keeps_the_line() {
    let (_backend, shop, client) = setup().await;
    add_to_cart(&client, &shop, "130", "2").await;

    let response = client
        .post(format!("{shop}/cart/update"))
        .form(&[("product_id", "7"), ("size", "130"), ("quantity", "")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/cart"));

    let page = client
        .get(format!("{shop}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Ange antal som ett heltal, 0 eller mer."));
    assert!(cart_count(&client, &shop).await.contains(">2</span>"));
}

#[tokio::test]
async fn test_quantity_is_capped_at_stock() {
    let (_backend, shop, client) = setup().await;

    // Size 130 has 3 online and 1 at the club
    add_to_cart(&client, &shop, "130", "10").await;

    let page = client
        .get(format!("{shop}/cart"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Endast 4 st finns i lager för storlek 130."));
    assert!(cart_count(&client, &shop).await.contains(">4</span>"));
}

#[tokio::test]
async fn test_missing_size_is_refused() {
    let (_backend, shop, client) = setup().await;

    add_to_cart(&client, &shop, "", "1").await;
    assert!(cart_count(&client, &shop).await.contains(">0</span>"));
}

#[tokio::test]
async fn test_swish_order_reaches_backend_and_clears_cart() {
    let (backend, shop, client) = setup().await;
    add_to_cart(&client, &shop, "130", "2").await;

    let response = client
        .post(format!("{shop}/checkout"))
        .form(&[
            ("firstName", "Anna"),
            ("lastName", "Svensson"),
            ("email", "anna@example.se"),
            ("phone", "070-123 45 67"),
            ("deliveryMethod", "pickup"),
            ("payment", "swish"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/checkout/complete"));

    {
        let data = backend.data().await;
        assert_eq!(data.orders.len(), 1);
        let order = &data.orders[0];
        assert_eq!(order.payment, PaymentMethod::Swish);
        assert_eq!(order.delivery_method, DeliveryMethod::Pickup);
        assert_eq!(order.total, Price::from_kronor(1000));
        assert_eq!(order.items[0].selected_size, "130");
        assert_eq!(order.items[0].quantity, 2);
    }

    let complete = client
        .get(format!("{shop}/checkout/complete"))
        .send()
        .await
        .unwrap();
    assert_eq!(complete.status(), StatusCode::OK);
    assert!(complete.text().await.unwrap().contains("Tack för din beställning!"));

    // The confirmation is shown once
    let again = client
        .get(format!("{shop}/checkout/complete"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&again), Some("/"));
    assert!(cart_count(&client, &shop).await.contains(">0</span>"));
}

#[tokio::test]
async fn test_invalid_customer_is_not_sent() {
    let (backend, shop, client) = setup().await;
    add_to_cart(&client, &shop, "130", "1").await;

    let response = client
        .post(format!("{shop}/checkout"))
        .form(&[
            ("firstName", "Anna"),
            ("lastName", ""),
            ("email", "not-an-email"),
            ("phone", "070-123 45 67"),
            ("deliveryMethod", "postnord"),
            ("payment", "bankgiro"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = response.text().await.unwrap();
    assert!(page.contains("Efternamn krävs"));
    assert!(page.contains("Ogiltig e-postadress"));
    assert!(backend.data().await.orders.is_empty());
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let (_backend, shop, client) = setup().await;

    let response = client.get(format!("{shop}/checkout")).send().await.unwrap();
    assert_eq!(location(&response), Some("/cart"));
}

#[tokio::test]
async fn test_card_payment_intent_and_confirmation() {
    let (backend, shop, client) = setup().await;
    add_to_cart(&client, &shop, "130", "1").await;

    let customer = json!({
        "firstName": "Erik",
        "lastName": "Lind",
        "email": "erik@example.se",
        "phone": "+46 70 765 43 21",
        "deliveryMethod": "postnord",
        "payment": "stripe"
    });

    let intent: Value = client
        .post(format!("{shop}/checkout/payment-intent"))
        .json(&customer)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(intent["client_secret"], CLIENT_SECRET);
    assert_eq!(
        backend.data().await.payment_intents[0].payment,
        PaymentMethod::Stripe
    );

    let mut confirmation = customer.clone();
    confirmation["payment_intent_id"] = json!("pi_test_123");
    let confirmed: Value = client
        .post(format!("{shop}/checkout/confirm"))
        .json(&confirmation)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(confirmed["redirect"], "/checkout/complete");

    let data = backend.data().await;
    assert_eq!(data.confirmations.len(), 1);
    assert_eq!(data.confirmations[0]["payment_intent_id"], "pi_test_123");
}

#[tokio::test]
async fn test_payment_intent_needs_a_cart() {
    let (backend, shop, client) = setup().await;

    let response = client
        .post(format!("{shop}/checkout/payment-intent"))
        .json(&json!({
            "firstName": "Erik",
            "lastName": "Lind",
            "email": "erik@example.se",
            "phone": "0707654321",
            "deliveryMethod": "pickup",
            "payment": "stripe"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.data().await.payment_intents.is_empty());
}
