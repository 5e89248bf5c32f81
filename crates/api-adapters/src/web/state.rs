use std::sync::Arc;

use domains::{ReviewRepository, ScoreEvents, ScoringRules, ToolRepository, UserRepository};
use services::{ReviewLedgerService, TrustScoreService, VerdictService};

use crate::metrics::Metrics;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<ReviewLedgerService>,
    pub trust: Arc<TrustScoreService>,
    pub verdicts: Arc<VerdictService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Wires every service over a single store that implements all three
    /// repository ports.
    pub fn from_store<S>(store: Arc<S>, events: Arc<dyn ScoreEvents>, rules: &ScoringRules) -> Self
    where
        S: UserRepository + ReviewRepository + ToolRepository + 'static,
    {
        Self {
            ledger: Arc::new(ReviewLedgerService::new(
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            trust: Arc::new(TrustScoreService::new(
                store.clone(),
                store.clone(),
                events.clone(),
                rules.trust.clone(),
            )),
            verdicts: Arc::new(VerdictService::new(
                store.clone(),
                store,
                events,
                rules.verdict.clone(),
            )),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
