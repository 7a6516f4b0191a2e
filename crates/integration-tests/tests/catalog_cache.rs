//! Catalog caching in the storefront backend client.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use yakimoto_core::ProductId;
use yakimoto_core::inventory::Location;
use yakimoto_integration_tests::{FakeBackend, judo_category, judogi};
use yakimoto_storefront::backend::BackendClient;
use yakimoto_storefront::config::BackendConfig;

fn client(backend: &FakeBackend) -> BackendClient {
    BackendClient::new(&BackendConfig {
        api_url: backend.url.clone(),
        timeout: Duration::from_secs(5),
        cache_ttl: Duration::from_secs(300),
    })
    .unwrap()
}

#[tokio::test]
async fn test_fresh_product_sees_current_stock_without_filling_cache() {
    let backend = FakeBackend::start(vec![judogi()], vec![judo_category()]).await;
    let client = client(&backend);
    let id = ProductId::new(7);

    assert_eq!(client.fresh_product(id).await.unwrap().sizes.quantity("130"), 4);

    backend.data().await.products[0]
        .sizes
        .set_quantity("130", 0, Location::Online);

    // Nothing was cached by the fresh read, so the cached read fetches too
    assert_eq!(client.product(id).await.unwrap().sizes.quantity("130"), 1);
    assert_eq!(client.fresh_product(id).await.unwrap().sizes.quantity("130"), 1);

    backend.data().await.products[0]
        .sizes
        .set_quantity("130", 5, Location::Club);

    // The cached read keeps its entry until the TTL, the fresh one does not
    assert_eq!(client.product(id).await.unwrap().sizes.quantity("130"), 1);
    assert_eq!(client.fresh_product(id).await.unwrap().sizes.quantity("130"), 5);
}
