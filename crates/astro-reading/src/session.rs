//! Flow Session Store
//!
//! The checkout flow's accumulated state lives in one explicit, typed
//! context object persisted at every transition boundary, the server-side
//! equivalent of tab-scoped browser storage. Stores are single-writer per
//! flow id by construction: one user drives one flow.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use astro_payments::{CheckoutSession, Plan};

use crate::error::{ReadingError, Result};
use crate::model::{AnalysisResult, BirthBundle, Tier};

/// Unique flow identifier, one per user checkout journey
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(String);

impl FlowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The accumulated state of one checkout flow.
///
/// Fields fill in strictly forward: plan at selection, bundle at the birth
/// form, checkout at handoff, analysis at delivery. `aborted` marks the
/// terminal failure state; resubmitting the birth form clears it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowContext {
    /// Display name of the selected plan, e.g. "Detailed Analysis"
    pub selected_plan: String,

    /// Analysis tier the plan purchases
    pub analysis_type: Tier,

    /// Chart bundle from the birth form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BirthBundle>,

    /// Checkout session from the payment handoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<CheckoutSession>,

    /// The generated reading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,

    /// Terminal failure reason, if the flow aborted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FlowContext {
    /// Fresh context for a selected plan
    pub fn new(plan: Plan) -> Self {
        let now = Utc::now();
        Self {
            selected_plan: plan.to_string(),
            analysis_type: Tier::from_plan(plan),
            bundle: None,
            checkout: None,
            analysis: None,
            aborted: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Persistence for flow contexts
pub trait FlowStore: Send + Sync {
    /// Save or replace a context
    fn save(&self, id: &FlowId, context: &FlowContext) -> Result<()>;

    /// Load a context by flow id
    fn load(&self, id: &FlowId) -> Result<Option<FlowContext>>;

    /// Delete a context
    fn delete(&self, id: &FlowId) -> Result<()>;
}

/// In-memory flow store (per-process; fine for the stateless-server model
/// where each instance owns its flows)
pub struct MemoryFlowStore {
    flows: RwLock<HashMap<FlowId, FlowContext>>,
}

impl Default for MemoryFlowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFlowStore {
    pub fn new() -> Self {
        Self {
            flows: RwLock::new(HashMap::new()),
        }
    }
}

impl FlowStore for MemoryFlowStore {
    fn save(&self, id: &FlowId, context: &FlowContext) -> Result<()> {
        let mut flows = self
            .flows
            .write()
            .map_err(|e| ReadingError::State(e.to_string()))?;
        flows.insert(id.clone(), context.clone());
        Ok(())
    }

    fn load(&self, id: &FlowId) -> Result<Option<FlowContext>> {
        let flows = self
            .flows
            .read()
            .map_err(|e| ReadingError::State(e.to_string()))?;
        Ok(flows.get(id).cloned())
    }

    fn delete(&self, id: &FlowId) -> Result<()> {
        let mut flows = self
            .flows
            .write()
            .map_err(|e| ReadingError::State(e.to_string()))?;
        flows.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_round_trip() {
        let store = MemoryFlowStore::new();
        let id = FlowId::new();
        let context = FlowContext::new(Plan::Basic);

        store.save(&id, &context).unwrap();

        let loaded = store.load(&id).unwrap().unwrap();
        assert_eq!(loaded.selected_plan, "Basic Reading");
        assert_eq!(loaded.analysis_type, Tier::Basic);
        assert!(loaded.bundle.is_none());

        store.delete(&id).unwrap();
        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn test_missing_flow_is_none() {
        let store = MemoryFlowStore::new();
        assert!(store.load(&FlowId::new()).unwrap().is_none());
    }
}
