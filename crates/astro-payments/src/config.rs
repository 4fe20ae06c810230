//! Payment Configuration
//!
//! Credentials resolve in two layers: explicit per-request credentials (the
//! admin screen can exercise test keys without touching the server env), then
//! process environment. Absence of both is not an error: the checkout
//! service degrades to mock sessions and the verifier to demo-mode bypass.

use serde::{Deserialize, Serialize};

/// Which Stripe key set is active
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeMode {
    #[default]
    Test,
    Live,
}

impl StripeMode {
    fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "live" => StripeMode::Live,
            _ => StripeMode::Test,
        }
    }
}

/// Credentials supplied with a request, overriding the environment
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCredentials {
    #[serde(default)]
    pub mode: StripeMode,

    #[serde(default)]
    pub test_secret_key: Option<String>,

    #[serde(default)]
    pub live_secret_key: Option<String>,
}

impl PaymentCredentials {
    /// The secret key matching the requested mode, if usable
    pub fn secret_key(&self) -> Option<&str> {
        let key = match self.mode {
            StripeMode::Test => self.test_secret_key.as_deref(),
            StripeMode::Live => self.live_secret_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Process-wide payment configuration
#[derive(Clone, Debug, Default)]
pub struct PaymentConfig {
    pub mode: StripeMode,

    /// Secret key for the active mode
    pub secret_key: Option<String>,

    /// Webhook signing secret
    pub webhook_secret: Option<String>,

    /// When set, absent credentials fail verification instead of the
    /// demo-mode bypass. Must be enabled for any real-money deployment.
    pub require_verification: bool,
}

impl PaymentConfig {
    /// Read configuration from environment variables
    pub fn from_env() -> Self {
        let mode = std::env::var("STRIPE_MODE")
            .map(|m| StripeMode::from_str(&m))
            .unwrap_or_default();

        let key_var = match mode {
            StripeMode::Test => "STRIPE_SECRET_KEY_TEST",
            StripeMode::Live => "STRIPE_SECRET_KEY_LIVE",
        };
        let secret_key = std::env::var(key_var).ok().filter(|k| !k.trim().is_empty());

        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let require_verification = std::env::var("STRIPE_REQUIRE_VERIFICATION")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            mode,
            secret_key,
            webhook_secret,
            require_verification,
        }
    }

    /// Pick the effective secret key: explicit credentials win over the
    /// environment.
    pub fn resolve_secret_key<'a>(
        &'a self,
        credentials: Option<&'a PaymentCredentials>,
    ) -> Option<&'a str> {
        credentials
            .and_then(PaymentCredentials::secret_key)
            .or(self.secret_key.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_pick_mode_key() {
        let creds = PaymentCredentials {
            mode: StripeMode::Live,
            test_secret_key: Some("sk_test_x".into()),
            live_secret_key: Some("sk_live_y".into()),
        };
        assert_eq!(creds.secret_key(), Some("sk_live_y"));
    }

    #[test]
    fn test_blank_key_is_unusable() {
        let creds = PaymentCredentials {
            mode: StripeMode::Test,
            test_secret_key: Some("   ".into()),
            live_secret_key: None,
        };
        assert_eq!(creds.secret_key(), None);
    }

    #[test]
    fn test_explicit_credentials_override_env() {
        let config = PaymentConfig {
            secret_key: Some("sk_env".into()),
            ..Default::default()
        };
        let creds = PaymentCredentials {
            mode: StripeMode::Test,
            test_secret_key: Some("sk_req".into()),
            live_secret_key: None,
        };
        assert_eq!(config.resolve_secret_key(Some(&creds)), Some("sk_req"));
        assert_eq!(config.resolve_secret_key(None), Some("sk_env"));
    }
}
