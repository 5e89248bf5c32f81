//! Prometheus counters for the scoring core, rendered in OpenMetrics text.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct VoteLabels {
    pub vote_type: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct VerdictLabels {
    /// `keep`, `try`, `stop`, or `none` for insufficient data.
    pub verdict: String,
}

pub struct Metrics {
    registry: Registry,
    pub votes_cast: Family<VoteLabels, Counter>,
    pub trust_recalculations: Counter,
    pub verdict_recalculations: Family<VerdictLabels, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("breaktool");

        let votes_cast = Family::<VoteLabels, Counter>::default();
        registry.register(
            "votes_cast",
            "Votes recorded in the review ledger",
            votes_cast.clone(),
        );

        let trust_recalculations = Counter::default();
        registry.register(
            "trust_recalculations",
            "Trust score recalculations",
            trust_recalculations.clone(),
        );

        let verdict_recalculations = Family::<VerdictLabels, Counter>::default();
        registry.register(
            "verdict_recalculations",
            "Tool verdict recalculations by resulting verdict",
            verdict_recalculations.clone(),
        );

        Self {
            registry,
            votes_cast,
            trust_recalculations,
            verdict_recalculations,
        }
    }

    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
