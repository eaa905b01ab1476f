//! HTTP identity provider client tests against a stubbed provider API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic_platform::domain::Role;
use clinic_platform::identity::{
    AccountUpdate, HttpIdentityProvider, HttpIdentityProviderConfig, IdentityError,
    IdentityProvider,
};

async fn provider(server: &MockServer) -> HttpIdentityProvider {
    let config = HttpIdentityProviderConfig {
        base_url: server.uri(),
        api_key: "test-key".to_string(),
        issuer: "clinic-test".to_string(),
        signing_key_pem: None,
        request_timeout: Duration::from_secs(5),
    };
    HttpIdentityProvider::new(config).expect("provider")
}

fn error_body(code: &str) -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({ "error": { "message": code } }))
}

#[tokio::test]
async fn create_account_returns_local_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "email": "p@x.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "localId": "uid-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let id = idp.create_account("p@x.com", Some("pw")).await.unwrap();
    assert_eq!(id, "uid-123");
}

#[tokio::test]
async fn create_account_maps_email_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(error_body("EMAIL_EXISTS"))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let err = idp.create_account("p@x.com", Some("pw")).await.unwrap_err();
    assert!(matches!(err, IdentityError::EmailExists));
}

#[tokio::test]
async fn verify_token_parses_claims_and_role() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "tok-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "localId": "uid-1",
                "email": "d@x.com",
                "customAttributes": "{\"role\":\"doctor\"}"
            }]
        })))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let claims = idp.verify_token("tok-1").await.unwrap();
    assert_eq!(claims.subject_id, "uid-1");
    assert_eq!(claims.email, "d@x.com");
    assert_eq!(claims.role_claim, Some(Role::Doctor));
}

#[tokio::test]
async fn verify_token_without_attributes_has_no_claim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "localId": "uid-1", "email": "p@x.com" }]
        })))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let claims = idp.verify_token("tok-1").await.unwrap();
    assert_eq!(claims.role_claim, None);
}

#[tokio::test]
async fn verify_token_maps_expiry_and_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "tok-old" })))
        .respond_with(error_body("TOKEN_EXPIRED"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "tok-unknown" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "users": [] })))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    assert!(matches!(idp.verify_token("tok-old").await.unwrap_err(), IdentityError::Expired));
    assert!(matches!(idp.verify_token("tok-unknown").await.unwrap_err(), IdentityError::Invalid));
}

#[tokio::test]
async fn find_by_email_treats_not_found_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:lookup"))
        .respond_with(error_body("EMAIL_NOT_FOUND"))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    assert_eq!(idp.find_by_email("ghost@x.com").await.unwrap(), None);
}

#[tokio::test]
async fn set_role_claim_sends_encoded_attributes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:update"))
        .and(body_partial_json(json!({
            "localId": "uid-1",
            "customAttributes": "{\"role\":\"admin\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    idp.set_role_claim("uid-1", Role::Admin).await.unwrap();
}

#[tokio::test]
async fn update_account_skips_empty_updates() {
    // No mock mounted: an outgoing request would fail the test.
    let server = MockServer::start().await;
    let idp = provider(&server).await;

    idp.update_account("uid-1", &AccountUpdate::default()).await.unwrap();
}

#[tokio::test]
async fn delete_account_maps_user_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:delete"))
        .and(body_partial_json(json!({ "localId": "uid-gone" })))
        .respond_with(error_body("USER_NOT_FOUND"))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let err = idp.delete_account("uid-gone").await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound));
}

#[tokio::test]
async fn unknown_error_code_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(error_body("QUOTA_EXCEEDED"))
        .mount(&server)
        .await;

    let idp = provider(&server).await;
    let err = idp.create_account("p@x.com", None).await.unwrap_err();
    assert!(matches!(err, IdentityError::Transport(_)));
}
