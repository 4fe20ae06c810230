//! # astro-reading
//!
//! Birth charts, tiered AI readings and the checkout fulfillment flow.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      FulfillmentFlow                              │
//! │                                                                   │
//! │  PlanSelected → BirthDataCollected → CheckoutInitiated            │
//! │       → PaymentVerified → AnalysisGenerated → Delivered           │
//! │                                                                   │
//! │  ┌───────────┐ ┌─────────┐ ┌──────────────┐ ┌────────────────┐   │
//! │  │   Chart   │ │ Prompt  │ │   Analysis   │ │   FlowStore     │   │
//! │  │ Generator │ │ Builder │ │    Engine    │ │  (per-flow ctx) │   │
//! │  └───────────┘ └─────────┘ └──────────────┘ └────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The flow accumulates state in one typed [`session::FlowContext`],
//! persisted at every transition boundary. Checkout and verification come
//! from `astro-payments`; text generation goes through
//! `astro_core::CompletionProvider` with a sequential model fallback chain.

pub mod chart;
pub mod engine;
pub mod error;
pub mod export;
pub mod flow;
pub mod mock;
pub mod model;
pub mod prompt;
pub mod session;

pub use chart::{ChartGenerator, Ephemeris, TableEphemeris};
pub use engine::{AnalysisEngine, AnalysisOutcome, ModelCandidate, TierBudgets};
pub use error::{ReadingError, Result};
pub use export::{HtmlReportExporter, ReportExporter};
pub use flow::{FlowState, FlowStep, FulfillmentFlow};
pub use model::{
    AnalysisResult, Aspect, BirthBundle, BirthSubject, ChartPayload, HouseCusp, PartnerBundle,
    Planet, PlanetPosition, Tier, ZodiacSign,
};
pub use session::{FlowContext, FlowId, FlowStore, MemoryFlowStore};
