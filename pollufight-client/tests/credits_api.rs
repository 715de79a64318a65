//! Credit ledger integration tests against a stubbed document store

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pollufight_client::{ClientConfig, ClientError, CreditLedgerClient};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        store_base_url: server.uri(),
        ..Default::default()
    }
}

/// A fresh user gets the documented default, then an
/// increment lands on top of it.
#[tokio::test]
async fn test_get_or_create_seeds_default_then_increment() {
    let server = MockServer::start().await;

    // First read misses; every read after seeding sees the record.
    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/user_42"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/user_42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"credits": 0})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/user_42"))
        .and(body_json(serde_json::json!({"credits": 0})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/db/pollufight/credits/user_42/increment"))
        .and(body_json(serde_json::json!({"amount": 100})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"credits": 100})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();

    assert_eq!(client.get_or_create("user_42").await.unwrap(), 0);
    assert_eq!(client.increment("user_42", 100).await.unwrap(), 100);
}

#[tokio::test]
async fn test_get_or_create_seeds_configured_default() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/wallet_user"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/wallet_user"))
        .and(body_json(serde_json::json!({"credits": 150})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    // The wallet variant's seed, picked via configuration
    let config = ClientConfig {
        default_credits: 150,
        ..config_for(&server)
    };
    let client = CreditLedgerClient::new(&config).unwrap();

    assert_eq!(client.get_or_create("wallet_user").await.unwrap(), 150);
}

/// Decrement below zero clamps the persisted balance
/// at zero, never writing a negative value.
#[tokio::test]
async fn test_decrement_clamps_at_zero() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/user_42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"credits": 100})),
        )
        .mount(&server)
        .await;
    // Only a clamped write matches; a write of -400 would fail the test.
    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/user_42"))
        .and(body_json(serde_json::json!({"credits": 0})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.decrement("user_42", 500).await.unwrap(), 0);
}

#[tokio::test]
async fn test_decrement_partial_spend() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/user_42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"credits": 100})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/user_42"))
        .and(body_json(serde_json::json!({"credits": 70})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.decrement("user_42", 30).await.unwrap(), 70);
}

#[tokio::test]
async fn test_decrement_absent_user_is_validation_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    let err = client.decrement("ghost", 1).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_decrement_negative_amount_rejected_without_network() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    let err = client.decrement("user_42", -10).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_increment_creates_record_for_absent_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/db/pollufight/credits/newcomer"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/newcomer"))
        .and(body_json(serde_json::json!({"credits": 25})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.increment("newcomer", 25).await.unwrap(), 25);
}

#[tokio::test]
async fn test_set_clamps_at_zero() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/db/pollufight/credits/user_42"))
        .and(body_json(serde_json::json!({"credits": 0})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = CreditLedgerClient::new(&config_for(&server)).unwrap();
    assert_eq!(client.set("user_42", -5).await.unwrap(), 0);
}
