//! Payment Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Product name does not resolve to a configured product
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Checkout session could not be found at the provider
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Payment verification failed or is unavailable
    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Stripe(_))
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Stripe(_) => "Payment processing failed. Please try again.",
            PaymentError::UnknownProduct(_) => "The selected plan is not available.",
            PaymentError::SessionNotFound(_) => "Payment session not found.",
            PaymentError::VerificationFailed(_) => "Payment could not be verified.",
            PaymentError::Config(_) => "Service configuration error.",
            _ => "An error occurred processing your request.",
        }
    }
}
