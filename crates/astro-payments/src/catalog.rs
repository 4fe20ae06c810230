//! Reading Product Catalog
//!
//! The three purchasable reading plans and their one-time prices.

use serde::{Deserialize, Serialize};

/// Purchasable reading plans
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Basic,
    Detailed,
    Comprehensive,
}

impl Plan {
    pub fn as_str(&self) -> &str {
        match self {
            Plan::Basic => "basic",
            Plan::Detailed => "detailed",
            Plan::Comprehensive => "comprehensive",
        }
    }

    /// Resolve a display name to a plan, case- and whitespace-insensitive.
    ///
    /// "Basic Reading", "basic reading" and "BasicReading" all resolve to
    /// `Plan::Basic`; anything else is `None`.
    pub fn from_product_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "basicreading" | "basic" => Some(Plan::Basic),
            "detailedanalysis" | "detailed" => Some(Plan::Detailed),
            "comprehensivereading" | "comprehensive" => Some(Plan::Comprehensive),
            _ => None,
        }
    }

    /// Get pricing for this plan
    pub fn pricing(&self) -> ProductPricing {
        match self {
            Plan::Basic => ProductPricing {
                name: "Basic Reading".into(),
                description: "Discover your core personality and life path".into(),
                cents: 999,
            },
            Plan::Detailed => ProductPricing {
                name: "Detailed Analysis".into(),
                description: "Deep dive into your soul's journey".into(),
                cents: 1999,
            },
            Plan::Comprehensive => ProductPricing {
                name: "Comprehensive Reading".into(),
                description: "Complete relationship compatibility analysis".into(),
                cents: 2999,
            },
        }
    }

    /// Compact product tag used in session metadata (e.g. "basicreading")
    pub fn product_type(&self) -> String {
        self.pricing()
            .name
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pricing().name)
    }
}

/// Pricing information for a plan
#[derive(Clone, Debug)]
pub struct ProductPricing {
    pub name: String,
    pub description: String,
    /// One-time price in USD cents
    pub cents: i64,
}

impl ProductPricing {
    /// Human-readable price, e.g. "$9.99"
    pub fn display_price(&self) -> String {
        format!("${:.2}", self.cents as f64 / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_pricing() {
        assert_eq!(Plan::Basic.pricing().cents, 999);
        assert_eq!(Plan::Detailed.pricing().cents, 1999);
        assert_eq!(Plan::Comprehensive.pricing().cents, 2999);
    }

    #[test]
    fn test_product_name_resolution() {
        assert_eq!(Plan::from_product_name("Basic Reading"), Some(Plan::Basic));
        assert_eq!(Plan::from_product_name("  detailed ANALYSIS "), Some(Plan::Detailed));
        assert_eq!(
            Plan::from_product_name("ComprehensiveReading"),
            Some(Plan::Comprehensive)
        );
        assert_eq!(Plan::from_product_name("Nonexistent Plan"), None);
    }

    #[test]
    fn test_product_type_tag() {
        assert_eq!(Plan::Basic.product_type(), "basicreading");
        assert_eq!(Plan::Comprehensive.product_type(), "comprehensivereading");
    }

    #[test]
    fn test_display_price() {
        assert_eq!(Plan::Basic.pricing().display_price(), "$9.99");
    }
}
