//! Payment Verification
//!
//! Confirms paid status for a checkout session on return from the hosted
//! redirect. Mock sessions short-circuit without a network call; real
//! sessions are retrieved from Stripe.

use serde::{Deserialize, Serialize};
use stripe::{CheckoutSession as StripeSession, CheckoutSessionPaymentStatus, Client};

use crate::checkout::{SessionKind, MOCK_SESSION_PREFIX};
use crate::config::{PaymentConfig, PaymentCredentials};
use crate::error::{PaymentError, Result};

/// A session id plus its real/mock classification.
///
/// The redirect back from checkout only carries a raw id string, so the tag
/// has to be re-derived exactly once at that boundary; everything downstream
/// matches on the tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRef {
    pub id: String,
    pub kind: SessionKind,
}

impl SessionRef {
    pub fn new(id: impl Into<String>, kind: SessionKind) -> Self {
        Self { id: id.into(), kind }
    }

    /// Classify a raw session id from the redirect query parameter
    pub fn classify(id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = if id.starts_with(MOCK_SESSION_PREFIX) {
            SessionKind::Mock
        } else {
            SessionKind::Real
        };
        Self { id, kind }
    }
}

/// Result of verifying a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedPayment {
    pub id: String,
    pub paid: bool,
    pub payment_status: String,
    pub customer_email: Option<String>,
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

impl VerifiedPayment {
    /// Placeholder result for mock sessions and demo-mode bypass
    fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            paid: true,
            payment_status: "paid".into(),
            customer_email: Some("test@example.com".into()),
            product_name: Some("Test Product".into()),
            product_type: Some("test".into()),
            amount_total: Some(1900),
            currency: Some("usd".into()),
        }
    }
}

/// Verifies paid status against Stripe, honoring the demo-mode policy
pub struct PaymentVerifier {
    config: PaymentConfig,
}

impl PaymentVerifier {
    pub fn new(config: PaymentConfig) -> Self {
        Self { config }
    }

    /// Verify a session.
    ///
    /// Mock sessions are paid by construction. Real sessions are retrieved
    /// from Stripe when credentials exist; without credentials the result
    /// depends on `require_verification`: bypass (demo mode) when unset,
    /// hard failure when set.
    pub async fn verify(
        &self,
        session: &SessionRef,
        credentials: Option<&PaymentCredentials>,
    ) -> Result<VerifiedPayment> {
        if session.kind.is_mock() {
            tracing::debug!(session_id = %session.id, "Mock session, skipping provider verification");
            return Ok(VerifiedPayment::placeholder(&session.id));
        }

        let Some(secret_key) = self.config.resolve_secret_key(credentials) else {
            if self.config.require_verification {
                return Err(PaymentError::VerificationFailed(
                    "payment credentials not configured".into(),
                ));
            }
            tracing::warn!(
                session_id = %session.id,
                "Stripe not configured, treating payment as verified"
            );
            return Ok(VerifiedPayment::placeholder(&session.id));
        };

        let client = Client::new(secret_key);
        let session_id = session
            .id
            .parse()
            .map_err(|_| PaymentError::SessionNotFound(session.id.clone()))?;

        let retrieved = StripeSession::retrieve(&client, &session_id, &[])
            .await
            .map_err(|e| PaymentError::Stripe(e.to_string()))?;

        let paid = retrieved.payment_status == CheckoutSessionPaymentStatus::Paid;
        let metadata = retrieved.metadata.unwrap_or_default();

        Ok(VerifiedPayment {
            id: retrieved.id.to_string(),
            paid,
            payment_status: retrieved.payment_status.to_string(),
            customer_email: retrieved.customer_details.and_then(|d| d.email),
            product_name: metadata.get("productName").cloned(),
            product_type: metadata.get("productType").cloned(),
            amount_total: retrieved.amount_total,
            currency: retrieved.currency.map(|c| c.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_mock_id() {
        let session = SessionRef::classify("test_session_1700000000000_ab12cd34e");
        assert_eq!(session.kind, SessionKind::Mock);

        let session = SessionRef::classify("cs_test_a1b2c3");
        assert_eq!(session.kind, SessionKind::Real);
    }

    #[tokio::test]
    async fn test_mock_session_verifies_without_network() {
        let verifier = PaymentVerifier::new(PaymentConfig::default());
        let session = SessionRef::classify("test_session_1700000000000_ab12cd34e");

        let verified = verifier.verify(&session, None).await.unwrap();
        assert!(verified.paid);
        assert_eq!(verified.payment_status, "paid");
        assert_eq!(verified.customer_email.as_deref(), Some("test@example.com"));
    }

    #[tokio::test]
    async fn test_demo_bypass_without_credentials() {
        let verifier = PaymentVerifier::new(PaymentConfig::default());
        let session = SessionRef::new("cs_test_a1b2c3", SessionKind::Real);

        let verified = verifier.verify(&session, None).await.unwrap();
        assert!(verified.paid);
    }

    #[tokio::test]
    async fn test_require_verification_hardens_bypass() {
        let config = PaymentConfig {
            require_verification: true,
            ..Default::default()
        };
        let verifier = PaymentVerifier::new(config);
        let session = SessionRef::new("cs_test_a1b2c3", SessionKind::Real);

        let err = verifier.verify(&session, None).await.unwrap_err();
        assert!(matches!(err, PaymentError::VerificationFailed(_)));
    }
}
