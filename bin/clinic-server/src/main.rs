//! Clinic Booking Server
//!
//! Production server for the clinic booking REST APIs:
//! - Auth APIs: register, login, google-login, me, password reset, logout
//! - Admin APIs: doctor provisioning and management
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CLINIC_API_PORT` | `8080` | HTTP API port |
//! | `CLINIC_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `CLINIC_MONGO_DB` | `clinic_booking` | MongoDB database name |
//! | `CLINIC_IDP_BASE_URL` | `https://identitytoolkit.googleapis.com` | Identity provider base URL |
//! | `CLINIC_IDP_API_KEY` | - | Identity provider API key |
//! | `CLINIC_IDP_ISSUER` | `clinic-booking` | Issuer for minted login tokens |
//! | `CLINIC_IDP_SIGNING_KEY_PATH` | - | RSA private key PEM for login tokens |
//! | `CLINIC_AUTHZ_POLICY` | `re-derive` | `re-derive` or `trust-claim` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::response::Json;
use axum::routing::get;
use axum::{Extension, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use clinic_platform::api::{
    auth_router, doctors_router, ApiDoc, AppState, AuthApiState, DoctorsState,
};
use clinic_platform::identity::{HttpIdentityProvider, HttpIdentityProviderConfig, IdentityProvider};
use clinic_platform::repository::{UserRepository, UserStore};
use clinic_platform::service::{
    AccountService, LogMailSender, PasswordResetService, PasswordService, RederivePolicy,
    RolePolicy, TokenVerifier, TrustClaimPolicy,
};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting Clinic Booking Server");

    let api_port: u16 = env_or_parse("CLINIC_API_PORT", 8080);
    let mongo_url = env_or("CLINIC_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("CLINIC_MONGO_DB", "clinic_booking");

    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(&db));
    info!("Repositories initialized");

    // Identity provider client
    let signing_key_pem = match std::env::var("CLINIC_IDP_SIGNING_KEY_PATH") {
        Ok(path) => Some(
            std::fs::read_to_string(&path)
                .with_context(|| format!("reading signing key from {}", path))?,
        ),
        Err(_) => None,
    };
    let idp_config = HttpIdentityProviderConfig {
        base_url: env_or("CLINIC_IDP_BASE_URL", "https://identitytoolkit.googleapis.com"),
        api_key: env_or("CLINIC_IDP_API_KEY", ""),
        issuer: env_or("CLINIC_IDP_ISSUER", "clinic-booking"),
        signing_key_pem,
        request_timeout: Duration::from_secs(30),
    };
    let idp: Arc<dyn IdentityProvider> = Arc::new(
        HttpIdentityProvider::new(idp_config).map_err(|e| anyhow::anyhow!(e.to_string()))?,
    );

    // Authorization policy is a startup decision, injected everywhere.
    let policy_name = env_or("CLINIC_AUTHZ_POLICY", "re-derive");
    let policy: Arc<dyn RolePolicy> = match policy_name.as_str() {
        "trust-claim" => Arc::new(TrustClaimPolicy),
        "re-derive" => Arc::new(RederivePolicy::new(users.clone())),
        other => anyhow::bail!("unknown authorization policy: {}", other),
    };
    info!(policy = policy.name(), "authorization policy selected");

    let verifier = Arc::new(TokenVerifier::new(idp.clone()));
    let passwords = Arc::new(PasswordService::new());
    let accounts = AccountService::new(users.clone(), idp.clone(), passwords.clone());
    let reset = PasswordResetService::new(
        users.clone(),
        idp.clone(),
        Arc::new(LogMailSender),
        passwords,
    );
    info!("Services initialized");

    let app_state = AppState { verifier, policy };
    let auth_state = AuthApiState {
        accounts: accounts.clone(),
        reset,
        users: users.clone(),
    };
    let doctors_state = DoctorsState { accounts, users };

    let app = Router::new()
        .nest("/auth", auth_router(auth_state))
        .nest("/admin/doctors", doctors_router(doctors_state))
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Clinic Booking Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
