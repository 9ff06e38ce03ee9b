use std::sync::Arc;
use std::time::Duration;

use pagetally_client::{FetchClient, FetchConfig, FetchError};
use pagetally_core::{CachingInterceptor, InvokeError, KeyValueStore, MemoryStore};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn interceptor(store: MemoryStore, ttl: Duration) -> CachingInterceptor<FetchClient> {
    interceptor_with(FetchConfig::default(), store, ttl)
}

fn interceptor_with(
    config: FetchConfig,
    store: MemoryStore,
    ttl: Duration,
) -> CachingInterceptor<FetchClient> {
    let client = FetchClient::new(config).unwrap();
    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    CachingInterceptor::new(store, client, ttl)
}

#[tokio::test]
async fn second_call_within_ttl_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>fresh</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let cache = interceptor(store.clone(), Duration::from_secs(10));
    let url = format!("{}/article", server.uri());

    assert_eq!(cache.invoke(&url).await.unwrap(), "<p>fresh</p>");
    assert_eq!(cache.request_count(&url).await.unwrap(), 0);

    assert_eq!(cache.invoke(&url).await.unwrap(), "<p>fresh</p>");
    assert_eq!(cache.request_count(&url).await.unwrap(), 1);

    // Stored under the raw key, not the canonical URL.
    let cached = store.get(&format!("cached:{url}")).await.unwrap();
    assert_eq!(cached.as_deref(), Some(b"<p>fresh</p>".as_slice()));
}

#[tokio::test]
async fn error_status_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(2)
        .mount(&server)
        .await;

    let cache = interceptor(MemoryStore::new(), Duration::from_secs(10));
    let url = server.uri();

    for expected_count in 1..=2 {
        match cache.invoke(&url).await {
            Err(InvokeError::Fetch(FetchError::Status { status, .. })) => {
                assert_eq!(status, 500);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(cache.request_count(&url).await.unwrap(), expected_count);
    }
}

#[tokio::test]
async fn error_status_is_cached_when_allowed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let config = FetchConfig {
        error_on_status: false,
        ..FetchConfig::default()
    };
    let cache = interceptor_with(config, MemoryStore::new(), Duration::from_secs(10));
    let url = server.uri();

    assert_eq!(cache.invoke(&url).await.unwrap(), "boom");
    assert_eq!(cache.request_count(&url).await.unwrap(), 0);

    assert_eq!(cache.invoke(&url).await.unwrap(), "boom");
    assert_eq!(cache.request_count(&url).await.unwrap(), 1);
}

#[tokio::test]
async fn expired_entry_is_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v"))
        .expect(2)
        .mount(&server)
        .await;

    let cache = interceptor(MemoryStore::new(), Duration::from_millis(150));
    let url = server.uri();

    cache.invoke(&url).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    cache.invoke(&url).await.unwrap();

    assert_eq!(cache.request_count(&url).await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_key_counts_but_fails() {
    let cache = interceptor(MemoryStore::new(), Duration::from_secs(10));

    let err = cache.invoke("   ").await.unwrap_err();
    assert!(matches!(err, InvokeError::Fetch(FetchError::InvalidUrl(_))));
    assert_eq!(cache.request_count("   ").await.unwrap(), 1);
}
