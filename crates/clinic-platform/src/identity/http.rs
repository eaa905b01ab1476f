//! HTTP Identity Provider Client
//!
//! Client for an Identity-Toolkit style REST admin API. Account operations
//! are POSTs to `/v1/accounts:{method}` with the provider API key as a query
//! parameter; errors come back as `{"error": {"message": "CODE"}}`.
//!
//! Login tokens are minted locally as RS256 JWTs when a signing key is
//! configured; the provider exchanges them for a session during login.

use std::time::Duration;

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::domain::Role;
use crate::identity::{AccountUpdate, IdentityError, IdentityProvider, TokenClaims};

/// Audience for minted login tokens, fixed by the provider's token exchange
/// endpoint.
const LOGIN_TOKEN_AUDIENCE: &str =
    "https://identitytoolkit.googleapis.com/google.identity.identitytoolkit.v1.IdentityToolkit";

const LOGIN_TOKEN_TTL_SECS: i64 = 3600;

/// HTTP identity provider configuration
#[derive(Debug, Clone)]
pub struct HttpIdentityProviderConfig {
    /// Provider base URL
    pub base_url: String,
    /// Provider API key
    pub api_key: String,
    /// Issuer identity used when signing login tokens
    pub issuer: String,
    /// RSA private key (PEM) for login token minting. Password login is
    /// unavailable without it.
    pub signing_key_pem: Option<String>,
    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for HttpIdentityProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://identitytoolkit.googleapis.com".to_string(),
            api_key: String::new(),
            issuer: "clinic-booking".to_string(),
            signing_key_pem: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpIdentityProvider {
    config: HttpIdentityProviderConfig,
    client: reqwest::Client,
    signing_key: Option<EncodingKey>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<RemoteUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    /// JSON-encoded custom claims, e.g. `{"role":"patient"}`
    #[serde(default)]
    custom_attributes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorDetail {
    message: String,
}

/// Acknowledgement body; only deserialized to confirm well-formed JSON.
#[derive(Debug, Deserialize)]
struct Ack {}

#[derive(Debug, Serialize)]
struct LoginTokenClaims<'a> {
    iss: &'a str,
    sub: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    uid: &'a str,
}

/// Map a provider error code to a typed error. Codes may carry a suffix
/// (e.g. `EMAIL_EXISTS : detail`), so match on the leading token.
fn map_remote_error(code: &str) -> IdentityError {
    let head = code.split_whitespace().next().unwrap_or(code);
    match head {
        "TOKEN_EXPIRED" => IdentityError::Expired,
        "INVALID_ID_TOKEN" | "MISSING_ID_TOKEN" => IdentityError::Invalid,
        "USER_NOT_FOUND" | "EMAIL_NOT_FOUND" | "USER_DISABLED" => IdentityError::NotFound,
        "EMAIL_EXISTS" | "DUPLICATE_EMAIL" => IdentityError::EmailExists,
        _ => IdentityError::Transport(code.to_string()),
    }
}

impl HttpIdentityProvider {
    pub fn new(config: HttpIdentityProviderConfig) -> Result<Self, IdentityError> {
        let signing_key = match &config.signing_key_pem {
            Some(pem) => Some(
                EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| IdentityError::Transport(format!("invalid signing key: {}", e)))?,
            ),
            None => None,
        };

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        Ok(Self { config, client, signing_key })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, IdentityError> {
        let url = format!(
            "{}/v1/accounts:{}",
            self.config.base_url.trim_end_matches('/'),
            method
        );
        debug!(%url, "identity provider request");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| IdentityError::Transport(e.to_string()))
        } else {
            let code = response
                .json::<RemoteErrorBody>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            Err(map_remote_error(&code))
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn verify_token(&self, raw_token: &str) -> Result<TokenClaims, IdentityError> {
        let response: LookupResponse = self.post("lookup", json!({ "idToken": raw_token })).await?;

        let user = response.users.into_iter().next().ok_or(IdentityError::Invalid)?;

        let role_claim = user
            .custom_attributes
            .as_deref()
            .and_then(|attrs| serde_json::from_str::<serde_json::Value>(attrs).ok())
            .and_then(|v| v.get("role").and_then(|r| r.as_str()).and_then(Role::parse));

        Ok(TokenClaims {
            subject_id: user.local_id,
            email: user.email.unwrap_or_default(),
            role_claim,
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<String>, IdentityError> {
        match self
            .post::<LookupResponse>("lookup", json!({ "email": [email] }))
            .await
        {
            Ok(response) => Ok(response.users.into_iter().next().map(|u| u.local_id)),
            Err(IdentityError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_account(&self, email: &str, password: Option<&str>) -> Result<String, IdentityError> {
        let mut body = json!({ "email": email, "returnSecureToken": false });
        if let Some(password) = password {
            body["password"] = json!(password);
        }

        let response: SignUpResponse = self.post("signUp", body).await?;
        Ok(response.local_id)
    }

    async fn set_role_claim(&self, remote_id: &str, role: Role) -> Result<(), IdentityError> {
        let attributes = json!({ "role": role.as_str() }).to_string();
        self.post::<Ack>(
            "update",
            json!({ "localId": remote_id, "customAttributes": attributes }),
        )
        .await?;
        Ok(())
    }

    async fn update_account(&self, remote_id: &str, update: &AccountUpdate) -> Result<(), IdentityError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut body = json!({ "localId": remote_id });
        if let Some(ref email) = update.email {
            body["email"] = json!(email);
        }
        if let Some(ref password) = update.password {
            body["password"] = json!(password);
        }

        self.post::<Ack>("update", body).await?;
        Ok(())
    }

    async fn delete_account(&self, remote_id: &str) -> Result<(), IdentityError> {
        self.post::<Ack>("delete", json!({ "localId": remote_id })).await?;
        Ok(())
    }

    async fn mint_login_token(&self, remote_id: &str) -> Result<String, IdentityError> {
        let key = self
            .signing_key
            .as_ref()
            .ok_or_else(|| IdentityError::Transport("login token signing key not configured".to_string()))?;

        let now = chrono::Utc::now().timestamp();
        let claims = LoginTokenClaims {
            iss: &self.config.issuer,
            sub: &self.config.issuer,
            aud: LOGIN_TOKEN_AUDIENCE,
            iat: now,
            exp: now + LOGIN_TOKEN_TTL_SECS,
            uid: remote_id,
        };

        encode(&Header::new(Algorithm::RS256), &claims, key)
            .map_err(|e| IdentityError::Transport(e.to_string()))
    }
}
