//! # astro-payments
//!
//! Stripe hosted checkout, payment verification and the reading product
//! catalog for astro-insight.
//!
//! ## Checkout flow (Hosted)
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │  Your Site  │────▶│  Stripe Hosted  │────▶│  Your Site  │
//! │ (checkout)  │     │  Checkout Page  │     │  (success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//! ```
//!
//! The user is redirected to Stripe's hosted page and returns to the success
//! route with a `session_id` query parameter.
//!
//! ## Mock sessions
//!
//! When no Stripe credentials are configured (or the provider errors during
//! session creation), `CheckoutService` falls back to a locally synthesized
//! session so the flow can complete end-to-end without billing configuration.
//! Mock sessions are tagged explicitly via [`SessionKind`]; downstream code
//! matches on the tag instead of sniffing id strings. The one place raw ids
//! re-enter the system (the provider redirect back to the success route)
//! classifies the id exactly once via [`SessionRef::classify`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use astro_payments::{CheckoutService, PaymentConfig};
//!
//! let service = CheckoutService::new(PaymentConfig::from_env());
//! let session = service
//!     .create_session("Basic Reading", success_url, cancel_url, None)
//!     .await?;
//! // Redirect user to: session.url
//! ```

mod catalog;
mod checkout;
mod config;
mod error;
mod verify;
mod webhook;

pub use catalog::{Plan, ProductPricing};
pub use checkout::{CheckoutService, CheckoutSession, SessionKind, StripeCheckout};
pub use config::{PaymentConfig, PaymentCredentials, StripeMode};
pub use error::{PaymentError, Result};
pub use verify::{PaymentVerifier, SessionRef, VerifiedPayment};
pub use webhook::{parse_event, verify_signature, WebhookEvent};
