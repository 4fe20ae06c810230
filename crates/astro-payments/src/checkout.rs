//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach for one-time reading
//! purchases, with an unconditional mock-session fallback when no usable
//! credentials are available.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use stripe::{
    CheckoutSession as StripeSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, Currency,
};

use crate::catalog::Plan;
use crate::config::{PaymentConfig, PaymentCredentials};
use crate::error::{PaymentError, Result};

/// Prefix carried by locally synthesized session ids
pub const MOCK_SESSION_PREFIX: &str = "test_session_";

/// Placeholder Stripe substitutes with the real session id in success URLs
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Whether a session is hosted by the provider or synthesized locally
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Real,
    Mock,
}

impl SessionKind {
    pub fn is_mock(&self) -> bool {
        matches!(self, SessionKind::Mock)
    }
}

/// A checkout session ready for redirect
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Session id, re-presented by the provider on the success redirect
    pub id: String,

    /// URL to redirect the user to
    pub url: String,

    /// Explicit real/mock tag
    pub kind: SessionKind,

    /// Plan being purchased
    pub plan: Plan,
}

/// Stripe client wrapper for hosted checkout
pub struct StripeCheckout {
    client: Client,
}

impl StripeCheckout {
    /// Create a new Stripe checkout client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
        }
    }

    /// Create a hosted checkout session for a one-time plan purchase.
    ///
    /// Returns a URL to redirect the user to Stripe's hosted checkout page.
    pub async fn create_checkout_session(
        &self,
        plan: Plan,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        let pricing = plan.pricing();

        let mut params = CreateCheckoutSession::new();
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.mode = Some(CheckoutSessionMode::Payment);

        // Metadata for webhook/verification correlation
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("productName".to_string(), pricing.name.clone());
        metadata.insert("productType".to_string(), plan.product_type());
        params.metadata = Some(metadata);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            quantity: Some(1),
            price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(pricing.cents),
                product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: pricing.name.clone(),
                    description: Some(pricing.description.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }]);

        let session = StripeSession::create(&self.client, params)
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
            kind: SessionKind::Real,
            plan,
        })
    }

    /// Get the underlying Stripe client
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Checkout session service: real hosted sessions when credentials allow,
/// mock sessions otherwise.
pub struct CheckoutService {
    config: PaymentConfig,
}

impl CheckoutService {
    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    /// Create a session for the named product.
    ///
    /// The only error that escapes is `UnknownProduct`; every provider
    /// failure degrades to a mock session so missing billing configuration
    /// never blocks the flow.
    pub async fn create_session(
        &self,
        product_name: &str,
        success_url: &str,
        cancel_url: &str,
        credentials: Option<&PaymentCredentials>,
    ) -> Result<CheckoutSession> {
        let plan = Plan::from_product_name(product_name)
            .ok_or_else(|| PaymentError::UnknownProduct(product_name.to_string()))?;

        let Some(secret_key) = self.config.resolve_secret_key(credentials) else {
            tracing::warn!(product = %product_name, "Stripe not configured, using mock session");
            return Ok(Self::mock_session(plan, success_url));
        };

        let stripe = StripeCheckout::new(secret_key);
        match stripe
            .create_checkout_session(plan, success_url, cancel_url)
            .await
        {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(error = %e, "Checkout session creation failed, using mock session");
                Ok(Self::mock_session(plan, success_url))
            }
        }
    }

    /// Synthesize a mock session whose URL resolves straight to the success
    /// route with the id substituted.
    fn mock_session(plan: Plan, success_url: &str) -> CheckoutSession {
        let suffix: String = uuid::Uuid::new_v4().simple().to_string()[..9].to_string();
        let id = format!("{}{}_{}", MOCK_SESSION_PREFIX, Utc::now().timestamp_millis(), suffix);

        let url = if success_url.contains(SESSION_ID_PLACEHOLDER) {
            success_url.replace(SESSION_ID_PLACEHOLDER, &id)
        } else if success_url.contains('?') {
            format!("{}&session_id={}", success_url, id)
        } else {
            format!("{}?session_id={}", success_url, id)
        };

        CheckoutSession {
            id,
            url,
            kind: SessionKind::Mock,
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_product_rejected_without_provider_call() {
        let service = CheckoutService::new(PaymentConfig::default());
        let err = service
            .create_session("Nonexistent Plan", "http://localhost/success", "http://localhost", None)
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::UnknownProduct(_)));
    }

    #[tokio::test]
    async fn test_mock_session_without_credentials() {
        let service = CheckoutService::new(PaymentConfig::default());
        let session = service
            .create_session(
                "Basic Reading",
                "http://localhost/payment-success?session_id={CHECKOUT_SESSION_ID}",
                "http://localhost/pricing",
                None,
            )
            .await
            .unwrap();

        assert_eq!(session.kind, SessionKind::Mock);
        assert!(session.id.starts_with(MOCK_SESSION_PREFIX));
        assert!(session.url.contains(&session.id));
        assert!(!session.url.contains(SESSION_ID_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_mock_session_appends_query_param() {
        let service = CheckoutService::new(PaymentConfig::default());
        let session = service
            .create_session("Detailed Analysis", "http://localhost/payment-success", "http://localhost", None)
            .await
            .unwrap();

        assert!(session.url.contains("?session_id=test_session_"));
        assert_eq!(session.plan, Plan::Detailed);
    }
}
