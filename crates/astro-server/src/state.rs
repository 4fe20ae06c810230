//! Application State

use std::sync::Arc;

use astro_core::CompletionProvider;
use astro_payments::{CheckoutService, PaymentVerifier};
use astro_reading::{AnalysisEngine, ChartGenerator};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Completion provider (None when running in demo mode)
    pub provider: Option<Arc<dyn CompletionProvider>>,

    /// Chart generator
    pub charts: ChartGenerator,

    /// Analysis engine with the model fallback chain
    pub engine: Arc<AnalysisEngine>,

    /// Checkout session service (mock fallback built in)
    pub checkout: Arc<CheckoutService>,

    /// Payment verifier
    pub verifier: Arc<PaymentVerifier>,

    /// Whether Stripe credentials are configured
    pub stripe_configured: bool,

    /// Webhook signing secret (None disables the webhook route)
    pub webhook_secret: Option<String>,
}
