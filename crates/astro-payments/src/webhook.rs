//! Stripe Webhook Handling
//!
//! Verifies the `stripe-signature` header (HMAC-SHA256 over
//! `"{timestamp}.{payload}"`) and parses the handful of event types the
//! checkout flow cares about.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age of a signed payload, in seconds
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Parsed webhook event
#[derive(Clone, Debug)]
pub enum WebhookEvent {
    /// Checkout completed - payment captured for a reading
    CheckoutCompleted {
        session_id: String,
        customer_email: Option<String>,
        product_name: Option<String>,
        product_type: Option<String>,
    },

    /// Payment intent succeeded
    PaymentSucceeded { payment_intent_id: String },

    /// Payment intent failed
    PaymentFailed {
        payment_intent_id: String,
        failure_message: Option<String>,
    },

    /// Unhandled event type
    Other { event_type: String },
}

/// Verify a Stripe webhook signature.
///
/// Header format: `t=<unix>,v1=<hex hmac>[,v1=...]`. The signed payload is
/// `"{t}.{body}"`. Rejects stale timestamps outside the tolerance window.
pub fn verify_signature(payload: &str, signature_header: &str, secret: &str) -> Result<()> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| PaymentError::WebhookSignature("missing timestamp".into()))?;
    if candidates.is_empty() {
        return Err(PaymentError::WebhookSignature("missing v1 signature".into()));
    }

    let age = (Utc::now().timestamp() - timestamp).abs();
    if age > SIGNATURE_TOLERANCE_SECS {
        return Err(PaymentError::WebhookSignature(format!(
            "timestamp outside tolerance ({age}s)"
        )));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    for candidate in candidates {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PaymentError::WebhookSignature(e.to_string()))?;
        mac.update(signed_payload.as_bytes());
        if mac.verify_slice(&expected).is_ok() {
            return Ok(());
        }
    }

    Err(PaymentError::WebhookSignature("no matching v1 signature".into()))
}

/// Verify the signature and parse the event payload
pub fn parse_event(payload: &str, signature_header: &str, secret: &str) -> Result<WebhookEvent> {
    verify_signature(payload, signature_header, secret)?;

    let raw: RawEvent =
        serde_json::from_str(payload).map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

    let event = match raw.event_type.as_str() {
        "checkout.session.completed" => {
            let object = raw.data.object;
            WebhookEvent::CheckoutCompleted {
                session_id: object.id,
                customer_email: object.customer_details.and_then(|d| d.email),
                product_name: object.metadata.get("productName").cloned(),
                product_type: object.metadata.get("productType").cloned(),
            }
        }
        "payment_intent.succeeded" => WebhookEvent::PaymentSucceeded {
            payment_intent_id: raw.data.object.id,
        },
        "payment_intent.payment_failed" => {
            let object = raw.data.object;
            WebhookEvent::PaymentFailed {
                payment_intent_id: object.id,
                failure_message: object
                    .last_payment_error
                    .and_then(|e| e.message),
            }
        }
        other => WebhookEvent::Other {
            event_type: other.to_string(),
        },
    };

    Ok(event)
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: RawObject,
}

#[derive(Deserialize)]
struct RawObject {
    id: String,
    #[serde(default)]
    metadata: std::collections::HashMap<String, String>,
    #[serde(default)]
    customer_details: Option<RawCustomerDetails>,
    #[serde(default)]
    last_payment_error: Option<RawPaymentError>,
}

#[derive(Deserialize)]
struct RawCustomerDetails {
    email: Option<String>,
}

#[derive(Deserialize)]
struct RawPaymentError {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &str, secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = r#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_123"}}}"#;
        let header = sign(payload, "whsec_test", Utc::now().timestamp());

        let event = parse_event(payload, &header, "whsec_test").unwrap();
        assert!(matches!(
            event,
            WebhookEvent::PaymentSucceeded { payment_intent_id } if payment_intent_id == "pi_123"
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = r#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_123"}}}"#;
        let header = sign(payload, "whsec_test", Utc::now().timestamp());

        let err = verify_signature("{\"tampered\":true}", &header, "whsec_test").unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = "{}";
        let header = sign(payload, "whsec_test", Utc::now().timestamp() - 3600);

        let err = verify_signature(payload, &header, "whsec_test").unwrap_err();
        assert!(matches!(err, PaymentError::WebhookSignature(_)));
    }

    #[test]
    fn test_checkout_completed_parsed() {
        let payload = r#"{
            "type": "checkout.session.completed",
            "data": {"object": {
                "id": "cs_test_123",
                "metadata": {"productName": "Basic Reading", "productType": "basicreading"},
                "customer_details": {"email": "jane@example.com"}
            }}
        }"#;
        let header = sign(payload, "whsec_test", Utc::now().timestamp());

        match parse_event(payload, &header, "whsec_test").unwrap() {
            WebhookEvent::CheckoutCompleted {
                session_id,
                customer_email,
                product_name,
                ..
            } => {
                assert_eq!(session_id, "cs_test_123");
                assert_eq!(customer_email.as_deref(), Some("jane@example.com"));
                assert_eq!(product_name.as_deref(), Some("Basic Reading"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
