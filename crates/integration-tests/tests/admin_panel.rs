//! Admin login, session expiry, and stock moves.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::StatusCode;
use yakimoto_core::ProductId;
use yakimoto_core::inventory::Location;
use yakimoto_integration_tests::{
    ADMIN_PASSWORD, FakeBackend, browser, judo_category, judogi, location, spawn_admin,
};

async fn setup() -> (FakeBackend, String, reqwest::Client) {
    let backend = FakeBackend::start(vec![judogi()], vec![judo_category()]).await;
    let admin = spawn_admin(&backend.url).await;
    (backend, admin, browser())
}

async fn log_in(client: &reqwest::Client, admin: &str) {
    let response = client
        .post(format!("{admin}/auth/login"))
        .form(&[("password", ADMIN_PASSWORD), ("remember_me", "on")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/products"));
}

async fn page(client: &reqwest::Client, url: String) -> String {
    client.get(url).send().await.unwrap().text().await.unwrap()
}

#[tokio::test]
async fn test_wrong_password_stays_on_login() {
    let (backend, admin, client) = setup().await;

    let response = client
        .post(format!("{admin}/auth/login"))
        .form(&[("password", "fel")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("Fel lösenord."));
    assert!(backend.data().await.token.is_none());

    let products = client.get(format!("{admin}/products")).send().await.unwrap();
    assert_eq!(location(&products), Some("/auth/login"));
}

#[tokio::test]
async fn test_login_accepts_fractional_expiry() {
    let (backend, admin, client) = setup().await;
    log_in(&client, &admin).await;

    let token = backend.data().await.token.clone().unwrap();
    let payload = token.split('.').nth(1).unwrap();
    let claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();
    assert!(claims["exp"].is_f64());

    let products = client.get(format!("{admin}/products")).send().await.unwrap();
    assert_eq!(products.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_shows_stock_per_location() {
    let (_backend, admin, client) = setup().await;
    log_in(&client, &admin).await;

    let list = page(&client, format!("{admin}/products")).await;
    assert!(list.contains("Judogi Yakimoto Kids"));
    assert!(list.contains("Webbshop"));
    assert!(list.contains("Klubben"));
    assert!(list.contains("3 st"));

    // A logged-in admin skips the login form
    let login = client.get(format!("{admin}/auth/login")).send().await.unwrap();
    assert_eq!(location(&login), Some("/products"));
}

#[tokio::test]
async fn test_move_inventory_between_locations() {
    let (backend, admin, client) = setup().await;
    log_in(&client, &admin).await;

    let response = client
        .post(format!("{admin}/products/7/move-inventory"))
        .form(&[
            ("size", "130"),
            ("quantity", "2"),
            ("from_location", "online"),
            ("to_location", "club"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/products"));

    {
        let data = backend.data().await;
        assert_eq!(data.moves.len(), 1);
        let (id, movement) = &data.moves[0];
        assert_eq!(*id, ProductId::new(7));
        assert_eq!(movement.quantity, 2);
        assert_eq!(movement.from_location, Location::Online);
        assert_eq!(movement.to_location, Location::Club);
        let stock = data.products[0].sizes.get("130").copied().unwrap();
        assert_eq!((stock.online, stock.club), (1, 3));
    }

    let list = page(&client, format!("{admin}/products")).await;
    assert!(list.contains("Flyttade 2 st av storlek 130 från Webbshop till Klubben."));
}

#[tokio::test]
async fn test_overdrawn_move_is_refused_before_backend() {
    let (backend, admin, client) = setup().await;
    log_in(&client, &admin).await;

    // Size 140 has nothing online
    client
        .post(format!("{admin}/products/7/move-inventory"))
        .form(&[
            ("size", "140"),
            ("quantity", "1"),
            ("from_location", "online"),
            ("to_location", "club"),
        ])
        .send()
        .await
        .unwrap();

    assert!(backend.data().await.moves.is_empty());
    let list = page(&client, format!("{admin}/products")).await;
    assert!(list.contains("alert-error"));
}

#[tokio::test]
async fn test_rejected_token_logs_out() {
    let (backend, admin, client) = setup().await;
    log_in(&client, &admin).await;
    backend.revoke_tokens().await;

    let response = client
        .get(format!("{admin}/maintenance"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login"));

    let login = page(&client, format!("{admin}/auth/login")).await;
    assert!(login.contains("Sessionen har gått ut. Logga in igen."));

    // The token is gone from the session, not just refused once
    let products = client.get(format!("{admin}/products")).send().await.unwrap();
    assert_eq!(location(&products), Some("/auth/login"));
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (_backend, admin, client) = setup().await;
    log_in(&client, &admin).await;

    let response = client
        .post(format!("{admin}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), Some("/auth/login"));

    let login = page(&client, format!("{admin}/auth/login")).await;
    assert!(login.contains("Du är utloggad."));
    let products = client.get(format!("{admin}/products")).send().await.unwrap();
    assert_eq!(location(&products), Some("/auth/login"));
}
