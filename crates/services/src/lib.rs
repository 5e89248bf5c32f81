//! # services
//!
//! Business logic of the scoring core: the review ledger, the trust score
//! engine and the verdict aggregator. Everything here talks to storage
//! through the `domains` port traits only.

pub mod review_ledger;
pub mod trust_score;
pub mod verdict;
pub mod weighting;

pub use review_ledger::ReviewLedgerService;
pub use trust_score::TrustScoreService;
pub use verdict::VerdictService;
