//! astro-insight HTTP Server
//!
//! Axum-based server exposing the chart, analysis, checkout and payment
//! verification endpoints the reading flow relies on. Runs fully in demo
//! mode when neither OpenAI nor Stripe credentials are configured: analysis
//! requests return canned readings and checkout falls back to mock
//! sessions.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use astro_core::CompletionProvider;
use astro_payments::{CheckoutService, PaymentConfig, PaymentVerifier};
use astro_reading::{AnalysisEngine, ChartGenerator};

use crate::handlers::{
    ai_analysis, create_chart, create_checkout_session, health_check, stripe_webhook,
    verify_payment,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Initialize completion provider
    let provider: Option<Arc<dyn CompletionProvider>> =
        match astro_runtime::OpenAiProvider::from_env()? {
            Some(provider) => Some(Arc::new(provider)),
            None => None,
        };

    match &provider {
        Some(provider) => match provider.health_check().await {
            Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ {} not reachable - fallback chain will fail", provider.name());
            }
        },
        None => {
            tracing::warn!("⚠ OPENAI_API_KEY not set - serving mock analyses (demo mode)");
        }
    }

    let engine = Arc::new(AnalysisEngine::new(provider.clone()));

    // Initialize payments
    let payment_config = PaymentConfig::from_env();
    let stripe_configured = payment_config.secret_key.is_some();
    let webhook_secret = payment_config.webhook_secret.clone();

    if stripe_configured {
        tracing::info!("✓ Stripe configured ({:?} mode)", payment_config.mode);
    } else {
        tracing::warn!("⚠ Stripe not configured - checkout will use mock sessions");
        tracing::warn!("  Set STRIPE_SECRET_KEY_TEST or STRIPE_SECRET_KEY_LIVE in .env");
    }

    let checkout = Arc::new(CheckoutService::new(payment_config.clone()));
    let verifier = Arc::new(PaymentVerifier::new(payment_config));

    // Build application state
    let state = AppState {
        provider,
        charts: ChartGenerator::with_table(),
        engine,
        checkout,
        verifier,
        stripe_configured,
        webhook_secret,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & info
        .route("/health", get(health_check))
        // Reading API
        .route("/api/chart", post(create_chart))
        .route("/api/ai-analysis", post(ai_analysis))
        // Payments
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/verify-payment", post(verify_payment))
        .route("/webhook/stripe", post(stripe_webhook))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 astro-insight server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                      - Health check");
    tracing::info!("  POST /api/chart                   - Calculate birth chart");
    tracing::info!("  POST /api/ai-analysis             - Generate AI reading");
    tracing::info!("  POST /api/create-checkout-session - Create checkout session");
    tracing::info!("  POST /api/verify-payment          - Verify paid status");
    tracing::info!("  POST /webhook/stripe              - Stripe webhook");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
