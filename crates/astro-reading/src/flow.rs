//! Fulfillment Flow
//!
//! The ordered control flow that takes a user from "plan selected" to
//! "reading in hand": plan pick → birth form → checkout handoff → return
//! with a session id → verification → analysis → delivery.
//!
//! State accumulates in a [`FlowContext`](crate::session::FlowContext)
//! persisted at every transition boundary. Guards check the store before
//! every dependent transition; missing prior-step data routes the user to
//! the earliest step that can supply it, never to an error page. Only
//! payment and analysis failures are terminal aborts.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use astro_payments::{CheckoutService, CheckoutSession, PaymentVerifier, Plan, SessionRef};

use crate::chart::ChartGenerator;
use crate::engine::AnalysisEngine;
use crate::error::{ReadingError, Result};
use crate::model::{AnalysisResult, BirthBundle, BirthSubject, PartnerBundle};
use crate::session::{FlowContext, FlowId, FlowStore};

/// Flow states, in order. `PaymentVerified` and `AnalysisGenerated` are
/// transient within the success transition; persisted snapshots only land
/// on the durable states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowState {
    PlanSelected,
    BirthDataCollected,
    CheckoutInitiated,
    PaymentVerified,
    AnalysisGenerated,
    Delivered,
    Aborted(String),
}

impl FlowState {
    /// Derive the durable state of a stored context
    pub fn of(context: &FlowContext) -> Self {
        if let Some(reason) = &context.aborted {
            return FlowState::Aborted(reason.clone());
        }
        if context.analysis.is_some() {
            return FlowState::Delivered;
        }
        if context.checkout.is_some() {
            return FlowState::CheckoutInitiated;
        }
        if context.bundle.is_some() {
            return FlowState::BirthDataCollected;
        }
        FlowState::PlanSelected
    }
}

/// The page a guard failure routes the user back to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStep {
    PlanSelection,
    BirthForm,
    Checkout,
    Success,
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowStep::PlanSelection => "plan selection",
            FlowStep::BirthForm => "birth details",
            FlowStep::Checkout => "checkout",
            FlowStep::Success => "success",
        };
        write!(f, "{name}")
    }
}

/// Orchestrates the checkout-and-fulfillment flow end to end
pub struct FulfillmentFlow {
    store: Arc<dyn FlowStore>,
    charts: ChartGenerator,
    checkout: Arc<CheckoutService>,
    verifier: Arc<PaymentVerifier>,
    engine: Arc<AnalysisEngine>,
}

impl FulfillmentFlow {
    pub fn new(
        store: Arc<dyn FlowStore>,
        charts: ChartGenerator,
        checkout: Arc<CheckoutService>,
        verifier: Arc<PaymentVerifier>,
        engine: Arc<AnalysisEngine>,
    ) -> Self {
        Self {
            store,
            charts,
            checkout,
            verifier,
            engine,
        }
    }

    /// Current durable state of a flow, if it exists
    pub fn state(&self, id: &FlowId) -> Result<Option<FlowState>> {
        Ok(self.store.load(id)?.map(|ctx| FlowState::of(&ctx)))
    }

    /// Load the raw context (for rendering)
    pub fn context(&self, id: &FlowId) -> Result<Option<FlowContext>> {
        self.store.load(id)
    }

    /// `∅ → PlanSelected`: the user picks one of the three plans.
    ///
    /// Re-picking resets any earlier flow under the same id.
    pub fn select_plan(&self, id: &FlowId, product_name: &str) -> Result<FlowContext> {
        let plan = Plan::from_product_name(product_name).ok_or_else(|| {
            astro_payments::PaymentError::UnknownProduct(product_name.to_string())
        })?;

        let context = FlowContext::new(plan);
        self.store.save(id, &context)?;

        tracing::info!(flow = %id, plan = %plan, "Plan selected");
        Ok(context)
    }

    /// `PlanSelected → BirthDataCollected`: the user submits the birth form.
    ///
    /// Generates the primary chart, and the partner chart iff the selected
    /// plan is the comprehensive tier. Comprehensive without partner fields
    /// is rejected with `MissingPartnerData` and persists nothing.
    pub fn submit_birth_data(
        &self,
        id: &FlowId,
        subject: BirthSubject,
        partner: Option<BirthSubject>,
    ) -> Result<FlowContext> {
        let mut context = self
            .store
            .load(id)?
            .ok_or(ReadingError::MissingPrecondition(FlowStep::PlanSelection))?;

        let subject = sanitized(subject);
        subject.validate()?;

        let partner = if context.analysis_type.requires_partner() {
            let partner = partner.ok_or(ReadingError::MissingPartnerData)?;
            let partner = sanitized(partner);
            partner.validate()?;
            Some(partner)
        } else {
            None
        };

        let chart = self.charts.generate(&subject);
        let partner = partner.map(|subject| {
            let chart = self.charts.generate(&subject);
            PartnerBundle { subject, chart }
        });

        context.bundle = Some(BirthBundle {
            subject,
            chart,
            partner,
        });
        context.analysis = None;
        context.aborted = None;
        context.touch();
        self.store.save(id, &context)?;

        tracing::info!(flow = %id, "Birth data collected");
        Ok(context)
    }

    /// `BirthDataCollected → CheckoutInitiated`: hand off to checkout.
    ///
    /// Returns the session whose `url` the caller redirects to, real or
    /// mock, tagged either way.
    pub async fn begin_checkout(
        &self,
        id: &FlowId,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession> {
        let mut context = self
            .store
            .load(id)?
            .ok_or(ReadingError::MissingPrecondition(FlowStep::PlanSelection))?;

        if context.bundle.is_none() {
            return Err(ReadingError::MissingPrecondition(FlowStep::BirthForm));
        }

        let session = self
            .checkout
            .create_session(&context.selected_plan, success_url, cancel_url, None)
            .await?;

        context.checkout = Some(session.clone());
        context.touch();
        self.store.save(id, &context)?;

        tracing::info!(flow = %id, session = %session.id, kind = ?session.kind, "Checkout initiated");
        Ok(session)
    }

    /// `CheckoutInitiated → … → Delivered`: return from checkout with the
    /// provider's `session_id` query parameter.
    ///
    /// Mock sessions skip verification. Generation is at-most-once: an
    /// already-delivered flow returns its stored reading without touching
    /// the verifier or the engine.
    pub async fn complete_checkout(
        &self,
        id: &FlowId,
        returned_session_id: &str,
    ) -> Result<AnalysisResult> {
        let mut context = self
            .store
            .load(id)?
            .ok_or(ReadingError::MissingPrecondition(FlowStep::BirthForm))?;

        let Some(bundle) = context.bundle.clone() else {
            return Err(ReadingError::MissingPrecondition(FlowStep::BirthForm));
        };

        // Re-entrancy: reloads after delivery are served from the store
        if let Some(analysis) = &context.analysis {
            tracing::debug!(flow = %id, "Reading already delivered, skipping regeneration");
            return Ok(analysis.clone());
        }

        // The stored checkout decides mock vs real; prefix classification is
        // the fallback for ids we never saw (provider-substituted ones)
        let session = match &context.checkout {
            Some(stored) if stored.id == returned_session_id => {
                SessionRef::new(&stored.id, stored.kind)
            }
            _ => SessionRef::classify(returned_session_id),
        };

        if session.kind.is_mock() {
            tracing::debug!(flow = %id, "Mock session, skipping payment verification");
        } else {
            let verified = self.verifier.verify(&session, None).await;
            match verified {
                Ok(payment) if payment.paid => {}
                outcome => {
                    let reason = "payment verification failed".to_string();
                    if let Err(e) = &outcome {
                        tracing::warn!(flow = %id, error = %e, "Payment verification failed");
                    }
                    context.aborted = Some(reason.clone());
                    context.touch();
                    self.store.save(id, &context)?;
                    return Err(ReadingError::Aborted(reason));
                }
            }
        }

        // PaymentVerified → AnalysisGenerated; all-or-nothing per attempt
        let partner_chart = bundle.partner.as_ref().map(|p| &p.chart);
        let outcome = self
            .engine
            .analyze(&bundle.chart, partner_chart, context.analysis_type)
            .await;

        match outcome {
            Ok(outcome) => {
                context.analysis = Some(outcome.analysis.clone());
                context.aborted = None;
                context.touch();
                self.store.save(id, &context)?;

                tracing::info!(flow = %id, model = %outcome.analysis.model, "Reading delivered");
                Ok(outcome.analysis)
            }
            Err(e) => {
                context.aborted = Some(e.user_message());
                context.touch();
                self.store.save(id, &context)?;
                Err(e)
            }
        }
    }
}

fn sanitized(subject: BirthSubject) -> BirthSubject {
    BirthSubject {
        name: BirthSubject::sanitize(&subject.name),
        location: BirthSubject::sanitize(&subject.location),
        ..subject
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::sections_for;
    use crate::session::MemoryFlowStore;
    use astro_core::error::Result as CoreResult;
    use astro_core::provider::{Completion, CompletionProvider, GenerationOptions};
    use astro_core::Message;
    use astro_payments::{PaymentConfig, SessionKind};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jane() -> BirthSubject {
        BirthSubject {
            name: "Jane Doe".into(),
            date: NaiveDate::from_ymd_opt(1990, 5, 15).unwrap(),
            time: "12:00".into(),
            latitude: 42.6977,
            longitude: 23.3219,
            location: "Sofia, Bulgaria".into(),
        }
    }

    fn partner() -> BirthSubject {
        BirthSubject {
            name: "Alex Doe".into(),
            date: NaiveDate::from_ymd_opt(1988, 11, 2).unwrap(),
            time: "08:45".into(),
            latitude: 42.6977,
            longitude: 23.3219,
            location: "Sofia, Bulgaria".into(),
        }
    }

    fn demo_flow() -> FulfillmentFlow {
        flow_with_engine(AnalysisEngine::new(None))
    }

    fn flow_with_engine(engine: AnalysisEngine) -> FulfillmentFlow {
        FulfillmentFlow::new(
            Arc::new(MemoryFlowStore::new()),
            ChartGenerator::with_table(),
            Arc::new(CheckoutService::new(PaymentConfig::default())),
            Arc::new(PaymentVerifier::new(PaymentConfig::default())),
            Arc::new(engine),
        )
    }

    /// Provider that always succeeds and counts invocations
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionProvider for CountingProvider {
        fn name(&self) -> &str {
            "Counting"
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Completion {
                content: "Generated reading.".into(),
                model: options.model.clone(),
                usage: None,
            })
        }
    }

    /// Provider that always fails
    struct DownProvider;

    #[async_trait]
    impl CompletionProvider for DownProvider {
        fn name(&self) -> &str {
            "Down"
        }

        async fn health_check(&self) -> CoreResult<bool> {
            Ok(false)
        }

        async fn complete(
            &self,
            _messages: &[Message],
            options: &GenerationOptions,
        ) -> CoreResult<Completion> {
            Err(astro_core::CoreError::ProviderUnavailable(
                options.model.clone(),
            ))
        }
    }

    #[tokio::test]
    async fn test_end_to_end_detailed_demo() {
        let flow = demo_flow();
        let id = FlowId::new();

        flow.select_plan(&id, "Detailed Analysis").unwrap();
        flow.submit_birth_data(&id, jane(), None).unwrap();

        let session = flow
            .begin_checkout(
                &id,
                "http://localhost/payment-success?session_id={CHECKOUT_SESSION_ID}",
                "http://localhost/pricing",
            )
            .await
            .unwrap();
        assert_eq!(session.kind, SessionKind::Mock);
        assert!(session.url.contains(&session.id));

        let analysis = flow.complete_checkout(&id, &session.id).await.unwrap();
        assert_eq!(analysis.analysis_type, crate::model::Tier::Detailed);
        for section in sections_for(crate::model::Tier::Detailed) {
            assert!(
                analysis.content.contains(section.title),
                "missing section {}",
                section.title
            );
        }

        assert_eq!(flow.state(&id).unwrap(), Some(FlowState::Delivered));
    }

    #[tokio::test]
    async fn test_delivery_is_at_most_once() {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let flow = flow_with_engine(AnalysisEngine::new(Some(provider.clone())));
        let id = FlowId::new();

        flow.select_plan(&id, "Basic Reading").unwrap();
        flow.submit_birth_data(&id, jane(), None).unwrap();
        let session = flow
            .begin_checkout(&id, "http://localhost/success", "http://localhost")
            .await
            .unwrap();

        let first = flow.complete_checkout(&id, &session.id).await.unwrap();
        let second = flow.complete_checkout(&id, &session.id).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(first.content, second.content);
    }

    #[tokio::test]
    async fn test_comprehensive_requires_partner_and_persists_nothing() {
        let flow = demo_flow();
        let id = FlowId::new();

        flow.select_plan(&id, "Comprehensive Reading").unwrap();
        let err = flow.submit_birth_data(&id, jane(), None).unwrap_err();
        assert!(matches!(err, ReadingError::MissingPartnerData));

        let context = flow.context(&id).unwrap().unwrap();
        assert!(context.bundle.is_none());
        assert_eq!(FlowState::of(&context), FlowState::PlanSelected);

        // With partner fields the transition goes through and both charts land
        let context = flow.submit_birth_data(&id, jane(), Some(partner())).unwrap();
        let bundle = context.bundle.unwrap();
        assert!(bundle.partner.is_some());
    }

    #[tokio::test]
    async fn test_lower_tier_ignores_partner_fields() {
        let flow = demo_flow();
        let id = FlowId::new();

        flow.select_plan(&id, "Basic Reading").unwrap();
        let context = flow.submit_birth_data(&id, jane(), Some(partner())).unwrap();
        assert!(context.bundle.unwrap().partner.is_none());
    }

    #[tokio::test]
    async fn test_guards_route_backward() {
        let flow = demo_flow();
        let id = FlowId::new();

        let err = flow.submit_birth_data(&id, jane(), None).unwrap_err();
        assert_eq!(err.route_back(), Some(FlowStep::PlanSelection));

        flow.select_plan(&id, "Basic Reading").unwrap();
        let err = flow
            .begin_checkout(&id, "http://localhost/success", "http://localhost")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReadingError::MissingPrecondition(FlowStep::BirthForm)
        ));
    }

    #[tokio::test]
    async fn test_unknown_plan_rejected() {
        let flow = demo_flow();
        let err = flow.select_plan(&FlowId::new(), "Nonexistent Plan").unwrap_err();
        assert!(matches!(
            err,
            ReadingError::Payment(astro_payments::PaymentError::UnknownProduct(_))
        ));
    }

    #[tokio::test]
    async fn test_analysis_failure_aborts_with_route_back() {
        let flow = flow_with_engine(AnalysisEngine::new(Some(Arc::new(DownProvider))));
        let id = FlowId::new();

        flow.select_plan(&id, "Basic Reading").unwrap();
        flow.submit_birth_data(&id, jane(), None).unwrap();
        let session = flow
            .begin_checkout(&id, "http://localhost/success", "http://localhost")
            .await
            .unwrap();

        let err = flow.complete_checkout(&id, &session.id).await.unwrap_err();
        assert!(matches!(err, ReadingError::CompletionUnavailable(_)));
        assert_eq!(err.route_back(), Some(FlowStep::BirthForm));

        match flow.state(&id).unwrap() {
            Some(FlowState::Aborted(_)) => {}
            other => panic!("expected aborted state, got {other:?}"),
        }

        // Resubmitting the birth form clears the abort
        flow.submit_birth_data(&id, jane(), None).unwrap();
        assert_eq!(
            flow.state(&id).unwrap(),
            Some(FlowState::BirthDataCollected)
        );
    }

    #[tokio::test]
    async fn test_success_page_without_data_routes_to_birth_form() {
        let flow = demo_flow();
        let err = flow
            .complete_checkout(&FlowId::new(), "test_session_123_abc")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReadingError::MissingPrecondition(FlowStep::BirthForm)
        ));
    }
}
