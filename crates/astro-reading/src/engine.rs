//! Analysis Engine
//!
//! Drives reading generation through an ordered model fallback chain:
//! prefer the best model with a generous token budget, degrade both
//! together as availability drops. With no provider configured the engine
//! bypasses the network entirely and serves the canned demo report.

use std::sync::Arc;

use astro_core::{CompletionProvider, GenerationOptions, Message, TokenUsage};
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::{ReadingError, Result};
use crate::mock;
use crate::model::{AnalysisResult, ChartPayload, Tier};
use crate::prompt;

/// Token budgets for one model, per analysis tier
#[derive(Clone, Copy, Debug)]
pub struct TierBudgets {
    pub basic: u32,
    pub detailed: u32,
    pub comprehensive: u32,
}

impl TierBudgets {
    pub fn for_tier(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Basic => self.basic,
            Tier::Detailed => self.detailed,
            Tier::Comprehensive => self.comprehensive,
        }
    }
}

/// One rung of the fallback ladder: a model and its per-tier budgets
#[derive(Clone, Debug)]
pub struct ModelCandidate {
    pub model: String,
    pub budgets: TierBudgets,
}

impl ModelCandidate {
    pub fn new(model: impl Into<String>, budgets: TierBudgets) -> Self {
        Self {
            model: model.into(),
            budgets,
        }
    }
}

/// The default three-rung ladder. Budgets shrink with each fallback step so
/// cost degrades together with model quality.
pub fn default_chain() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new(
            "gpt-4o",
            TierBudgets {
                basic: 4000,
                detailed: 6000,
                comprehensive: 8000,
            },
        ),
        ModelCandidate::new(
            "gpt-4",
            TierBudgets {
                basic: 2500,
                detailed: 4000,
                comprehensive: 6000,
            },
        ),
        ModelCandidate::new(
            "gpt-3.5-turbo",
            TierBudgets {
                basic: 2000,
                detailed: 3000,
                comprehensive: 4000,
            },
        ),
    ]
}

/// Per-1K-token rates (input, output) in USD for a model. Unrecognized
/// models bill at the primary model's rates.
fn model_rates(model: &str) -> (Decimal, Decimal) {
    match model {
        "gpt-4" => (dec!(0.03), dec!(0.06)),
        "gpt-4-1106-preview" => (dec!(0.01), dec!(0.03)),
        "gpt-3.5-turbo" | "gpt-3.5-turbo-1106" => (dec!(0.001), dec!(0.002)),
        // gpt-4o and everything unrecognized
        _ => (dec!(0.005), dec!(0.015)),
    }
}

/// Estimate the provider cost of a completion, rounded to 2 decimal places
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> Decimal {
    let (input_rate, output_rate) = model_rates(model);
    let thousand = dec!(1000);

    let input_cost = Decimal::from(usage.prompt_tokens) / thousand * input_rate;
    let output_cost = Decimal::from(usage.completion_tokens) / thousand * output_rate;

    (input_cost + output_cost).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A generated analysis plus whether it came from demo mode
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub analysis: AnalysisResult,
    pub mock: bool,
}

/// Generates readings via the fallback chain, or demo reports without a
/// provider.
pub struct AnalysisEngine {
    provider: Option<Arc<dyn CompletionProvider>>,
    chain: Vec<ModelCandidate>,
}

impl AnalysisEngine {
    /// Engine with the default ladder. `None` provider means demo mode.
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self::with_chain(provider, default_chain())
    }

    pub fn with_chain(
        provider: Option<Arc<dyn CompletionProvider>>,
        chain: Vec<ModelCandidate>,
    ) -> Self {
        Self { provider, chain }
    }

    /// Whether the engine serves canned demo reports
    pub fn is_demo(&self) -> bool {
        self.provider.is_none()
    }

    /// Generate a reading for the tier.
    ///
    /// Comprehensive always requires a partner chart, demo mode included.
    /// Fails with `CompletionUnavailable` only when a provider exists and
    /// every rung of the ladder has failed.
    pub async fn analyze(
        &self,
        chart: &ChartPayload,
        partner: Option<&ChartPayload>,
        tier: Tier,
    ) -> Result<AnalysisOutcome> {
        let request = prompt::build_prompt(chart, partner, tier)?;

        let Some(provider) = &self.provider else {
            tracing::info!(tier = %tier, "No completion provider configured, using mock analysis");
            return Ok(AnalysisOutcome {
                analysis: Self::assemble(
                    chart,
                    tier,
                    mock::mock_report(chart, partner, tier),
                    mock::mock_model(tier),
                    None,
                ),
                mock: true,
            });
        };

        let messages = [Message::system(prompt::SYSTEM_PROMPT), Message::user(request)];

        let mut last_error = String::from("no models configured");
        for candidate in &self.chain {
            let options = GenerationOptions {
                model: candidate.model.clone(),
                temperature: 0.7,
                max_tokens: candidate.budgets.for_tier(tier),
            };

            match provider.complete(&messages, &options).await {
                Ok(completion) => {
                    tracing::info!(model = %completion.model, tier = %tier, "Analysis generated");
                    return Ok(AnalysisOutcome {
                        analysis: Self::assemble(
                            chart,
                            tier,
                            completion.content,
                            completion.model,
                            completion.usage,
                        ),
                        mock: false,
                    });
                }
                Err(e) => {
                    tracing::warn!(model = %candidate.model, error = %e, "Model failed, trying next");
                    last_error = e.to_string();
                }
            }
        }

        Err(ReadingError::CompletionUnavailable(last_error))
    }

    fn assemble(
        chart: &ChartPayload,
        tier: Tier,
        content: String,
        model: String,
        usage: Option<TokenUsage>,
    ) -> AnalysisResult {
        AnalysisResult {
            id: format!("analysis_{}", Utc::now().timestamp_millis()),
            birth_chart_id: chart.id.clone(),
            analysis_type: tier,
            content,
            generated_at: Utc::now(),
            cost: usage.as_ref().map(|u| estimate_cost(&model, u)),
            tokens_used: usage.map(|u| u.total_tokens),
            model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartGenerator;
    use crate::model::BirthSubject;
    use astro_core::error::{CoreError, Result as CoreResult};
    use astro_core::provider::Completion;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn chart() -> ChartPayload {
        let subject = BirthSubject {
            name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            time: "12:00".into(),
            latitude: 42.6977,
            longitude: 23.3219,
            location: "Sofia, Bulgaria".into(),
        };
        ChartGenerator::with_table().generate(&subject)
    }

    /// Provider that fails for every model except the ones listed
    struct ScriptedProvider {
        succeed_for: Vec<&'static str>,
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            if self.succeed_for.contains(&options.model.as_str()) {
                Ok(Completion {
                    content: "## Core Personality\n\nGenerated.".into(),
                    model: options.model.clone(),
                    usage: Some(TokenUsage {
                        prompt_tokens: 1000,
                        completion_tokens: 2000,
                        total_tokens: 3000,
                    }),
                })
            } else {
                Err(CoreError::ProviderUnavailable(options.model.clone()))
            }
        }
    }

    #[tokio::test]
    async fn test_demo_mode_bypasses_network() {
        let engine = AnalysisEngine::new(None);
        assert!(engine.is_demo());

        let outcome = engine.analyze(&chart(), None, Tier::Detailed).await.unwrap();
        assert!(outcome.mock);
        assert_eq!(outcome.analysis.model, "gpt-4-mock-detailed");
        assert_eq!(outcome.analysis.analysis_type, Tier::Detailed);
        assert!(outcome.analysis.cost.is_none());
    }

    #[tokio::test]
    async fn test_fallback_ladder_reaches_tertiary() {
        let provider = Arc::new(ScriptedProvider {
            succeed_for: vec!["gpt-3.5-turbo"],
        });
        let engine = AnalysisEngine::new(Some(provider));

        let outcome = engine.analyze(&chart(), None, Tier::Basic).await.unwrap();
        assert!(!outcome.mock);
        assert_eq!(outcome.analysis.model, "gpt-3.5-turbo");

        // Cost uses the tertiary model's rate row:
        // 1000/1000*0.001 + 2000/1000*0.002 = 0.005 -> 0.01 rounded
        assert_eq!(outcome.analysis.cost, Some(dec!(0.01)));
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_unavailable() {
        let provider = Arc::new(ScriptedProvider { succeed_for: vec![] });
        let engine = AnalysisEngine::new(Some(provider));

        let err = engine.analyze(&chart(), None, Tier::Basic).await.unwrap_err();
        assert!(matches!(err, ReadingError::CompletionUnavailable(_)));
    }

    #[tokio::test]
    async fn test_comprehensive_without_partner_fails_even_in_demo_mode() {
        let engine = AnalysisEngine::new(None);
        let err = engine
            .analyze(&chart(), None, Tier::Comprehensive)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadingError::MissingPartnerData));
    }

    #[test]
    fn test_cost_table() {
        let usage = TokenUsage {
            prompt_tokens: 2000,
            completion_tokens: 1000,
            total_tokens: 3000,
        };

        // gpt-4: 2*0.03 + 1*0.06 = 0.12
        assert_eq!(estimate_cost("gpt-4", &usage), dec!(0.12));
        // gpt-4o: 2*0.005 + 1*0.015 = 0.03 (also the unknown-model default)
        assert_eq!(estimate_cost("gpt-4o", &usage), dec!(0.03));
        assert_eq!(estimate_cost("some-future-model", &usage), dec!(0.03));
    }

    #[test]
    fn test_budgets_scale_down_the_ladder() {
        let chain = default_chain();
        for tier in [Tier::Basic, Tier::Detailed, Tier::Comprehensive] {
            for pair in chain.windows(2) {
                assert!(pair[0].budgets.for_tier(tier) > pair[1].budgets.for_tier(tier));
            }
        }
    }
}
