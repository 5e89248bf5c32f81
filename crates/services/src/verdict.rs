//! # Verdict Aggregator
//!
//! Turns a tool's reviews into a `keep` / `try` / `stop` consensus,
//! weighting each review by its author's persisted trust score.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, DomainResult, ReviewKind, ReviewRepository, Role, ScoreBreakdown, ScoreEvent,
    ScoreEvents, ScoredReview, ToolRepository, ToolVerdict, ToolVerdictSummary, Verdict,
    VerdictReading, VerdictRules, TRUST_SCORE_MAX, TRUST_SCORE_MIN,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::weighting::{effective_sample_size, mean_of_present, round2, weighted_mean};

/// Outcome of aggregating one tool's reviews, before it is stamped and saved.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictComputation {
    pub verdict: Option<Verdict>,
    pub confidence: f64,
    /// Reviews that carried an overall score.
    pub review_count: i64,
    pub scores: ScoreBreakdown,
}

/// Weight of one review.
///
/// Linear in the author's trust score from `min_review_weight` at 0 to 1.0
/// at 100, scaled up for expert reviews and verified-tester authors, and
/// never above `max_review_weight`.
pub fn review_weight(rules: &VerdictRules, review: &ScoredReview) -> f64 {
    let trust = f64::from(review.reviewer_trust_score.clamp(TRUST_SCORE_MIN, TRUST_SCORE_MAX))
        / f64::from(TRUST_SCORE_MAX);
    let mut weight = rules.min_review_weight + (1.0 - rules.min_review_weight) * trust;
    if review.kind == ReviewKind::Expert {
        weight *= rules.expert_review_multiplier;
    }
    if review.reviewer_role == Role::VerifiedTester {
        weight *= rules.trusted_role_multiplier;
    }
    weight.min(rules.max_review_weight)
}

/// Maps an overall mean onto the three verdicts.
/// `[keep_threshold, ∞)` is keep, `(-∞, stop_threshold)` is stop, the rest is try.
pub fn classify(rules: &VerdictRules, overall_mean: f64) -> Verdict {
    if overall_mean >= rules.keep_threshold {
        Verdict::Keep
    } else if overall_mean < rules.stop_threshold {
        Verdict::Stop
    } else {
        Verdict::Try
    }
}

/// Evidence strength in [0, 1].
///
/// The count component `f(k) = min(k, S) / S` grows linearly up to the
/// saturation point `S`. Concentration only discounts the step contributed
/// by the newest review, so the result stays within `[f(n-1), f(n)]` and
/// never drops when a review is added below saturation.
pub fn confidence(rules: &VerdictRules, weights: &[f64]) -> f64 {
    if weights.is_empty() {
        return 0.0;
    }
    let n = weights.len() as f64;
    let saturation = f64::from(rules.confidence_saturation_reviews);
    let count_factor = |k: f64| k.min(saturation) / saturation;
    let concentration = (effective_sample_size(weights) / n).clamp(0.0, 1.0);
    let discount = 1.0 - rules.concentration_penalty * (1.0 - concentration);
    let floor = count_factor(n - 1.0);
    floor + (count_factor(n) - floor) * discount
}

pub fn aggregate(rules: &VerdictRules, reviews: &[ScoredReview]) -> VerdictComputation {
    let weighted: Vec<(&ScoredReview, f64)> = reviews
        .iter()
        .map(|r| (r, review_weight(rules, r)))
        .collect();

    let mean_of = |pick: fn(&ScoredReview) -> Option<f64>| {
        weighted_mean(weighted.iter().filter_map(|(r, w)| pick(r).map(|s| (s, *w)))).map(round2)
    };
    let scores = ScoreBreakdown {
        overall: mean_of(|r| r.overall_score),
        value: mean_of(|r| r.value_score),
        usage: mean_of(|r| r.usage_score),
        integration: mean_of(|r| r.integration_score),
    };

    let overall_weights: Vec<f64> = weighted
        .iter()
        .filter(|(r, _)| r.overall_score.is_some())
        .map(|(_, w)| *w)
        .collect();

    VerdictComputation {
        verdict: scores.overall.map(|mean| classify(rules, mean)),
        confidence: round2(confidence(rules, &overall_weights)),
        review_count: overall_weights.len() as i64,
        scores,
    }
}

pub struct VerdictService {
    tools: Arc<dyn ToolRepository>,
    reviews: Arc<dyn ReviewRepository>,
    events: Arc<dyn ScoreEvents>,
    rules: VerdictRules,
}

impl VerdictService {
    pub fn new(
        tools: Arc<dyn ToolRepository>,
        reviews: Arc<dyn ReviewRepository>,
        events: Arc<dyn ScoreEvents>,
        rules: VerdictRules,
    ) -> Self {
        Self {
            tools,
            reviews,
            events,
            rules,
        }
    }

    /// Recomputes verdict, confidence and trust-weighted scores from the
    /// current review set and overwrites the tool's persisted fields.
    #[instrument(skip(self))]
    pub async fn calculate_tool_verdict(&self, tool_id: Uuid) -> DomainResult<ToolVerdict> {
        let tool = self
            .tools
            .find_tool(tool_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Tool", tool_id))?;

        let reviews = self.reviews.scored_reviews_for_tool(tool_id).await?;
        let computed = aggregate(&self.rules, &reviews);
        debug!(reviews = reviews.len(), ?computed, "verdict computed");

        let result = ToolVerdict {
            tool_id,
            verdict: computed.verdict,
            confidence: computed.confidence,
            review_count: computed.review_count,
            scores: computed.scores,
            calculated_at: Utc::now(),
        };
        self.tools.save_verdict(&result).await?;

        if tool.verdict != result.verdict {
            info!(previous = ?tool.verdict, current = ?result.verdict, "verdict changed");
            self.events.publish(ScoreEvent::VerdictChanged {
                tool_id,
                previous: tool.verdict,
                current: result.verdict,
            });
        }

        Ok(result)
    }

    /// Last persisted verdict. Never recomputes.
    #[instrument(skip(self))]
    pub async fn get_tool_verdict(&self, tool_id: Uuid) -> DomainResult<VerdictReading> {
        self.tools
            .find_tool(tool_id)
            .await?
            .map(|tool| tool.verdict_reading())
            .ok_or_else(|| DomainError::not_found("Tool", tool_id))
    }

    #[instrument(skip(self))]
    pub async fn get_all_tool_verdicts(&self) -> DomainResult<Vec<ToolVerdictSummary>> {
        let tools = self.tools.list_tools().await?;
        Ok(tools.iter().map(|tool| tool.summary()).collect())
    }

    /// Unweighted means of the four sub-scores, written to the tool's
    /// aggregate columns. The verdict is left as it was.
    #[instrument(skip(self))]
    pub async fn recalculate_tool_scores(&self, tool_id: Uuid) -> DomainResult<ScoreBreakdown> {
        if self.tools.find_tool(tool_id).await?.is_none() {
            return Err(DomainError::not_found("Tool", tool_id));
        }
        let reviews = self.reviews.list_reviews_for_tool(tool_id).await?;
        let scores = ScoreBreakdown {
            overall: mean_of_present(reviews.iter().map(|r| r.overall_score)).map(round2),
            value: mean_of_present(reviews.iter().map(|r| r.value_score)).map(round2),
            usage: mean_of_present(reviews.iter().map(|r| r.usage_score)).map(round2),
            integration: mean_of_present(reviews.iter().map(|r| r.integration_score)).map(round2),
        };
        self.tools.save_scores(tool_id, &scores).await?;
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockReviewRepository, MockScoreEvents, MockToolRepository, Tool};

    fn review(trust: i32, overall: Option<f64>) -> ScoredReview {
        ScoredReview {
            review_id: Uuid::new_v4(),
            kind: ReviewKind::Community,
            overall_score: overall,
            value_score: None,
            usage_score: None,
            integration_score: None,
            reviewer_trust_score: trust,
            reviewer_role: Role::User,
        }
    }

    #[test]
    fn thresholds_partition_without_gap() {
        let rules = VerdictRules::default();
        assert_eq!(classify(&rules, 10.0), Verdict::Keep);
        assert_eq!(classify(&rules, rules.keep_threshold), Verdict::Keep);
        assert_eq!(classify(&rules, rules.keep_threshold - 0.001), Verdict::Try);
        assert_eq!(classify(&rules, rules.stop_threshold), Verdict::Try);
        assert_eq!(classify(&rules, rules.stop_threshold - 0.001), Verdict::Stop);
        assert_eq!(classify(&rules, 0.0), Verdict::Stop);
    }

    #[test]
    fn weight_grows_with_trust_and_is_capped() {
        let rules = VerdictRules::default();
        let mut last = 0.0;
        for trust in (0..=100).step_by(5) {
            let w = review_weight(&rules, &review(trust, Some(5.0)));
            assert!(w >= last);
            last = w;
        }
        assert!((review_weight(&rules, &review(0, None)) - rules.min_review_weight).abs() < 1e-9);

        let mut expert = review(100, Some(5.0));
        expert.kind = ReviewKind::Expert;
        expert.reviewer_role = Role::VerifiedTester;
        assert!(review_weight(&rules, &expert) <= rules.max_review_weight);

        let capped = VerdictRules {
            max_review_weight: 1.5,
            ..VerdictRules::default()
        };
        assert_eq!(review_weight(&capped, &expert), 1.5);
    }

    #[test]
    fn out_of_range_trust_is_clamped_before_weighting() {
        let rules = VerdictRules::default();
        assert_eq!(
            review_weight(&rules, &review(250, None)),
            review_weight(&rules, &review(100, None))
        );
    }

    #[test]
    fn high_trust_review_pulls_the_mean() {
        let rules = VerdictRules::default();
        let computed = aggregate(&rules, &[review(90, Some(9.0)), review(10, Some(3.0))]);
        let mean = computed.scores.overall.unwrap();
        assert!(mean > 6.0 && mean < 9.0);
        assert_eq!(mean, 7.96);
        assert_eq!(computed.verdict, Some(Verdict::Try));
        assert_eq!(computed.review_count, 2);
    }

    #[test]
    fn no_reviews_is_insufficient_data() {
        let computed = aggregate(&VerdictRules::default(), &[]);
        assert_eq!(computed.verdict, None);
        assert_eq!(computed.confidence, 0.0);
        assert_eq!(computed.review_count, 0);
        assert_eq!(computed.scores, ScoreBreakdown::default());
    }

    #[test]
    fn reviews_without_overall_score_do_not_produce_a_verdict() {
        let mut only_value = review(50, None);
        only_value.value_score = Some(6.0);
        let computed = aggregate(&VerdictRules::default(), &[only_value]);
        assert_eq!(computed.verdict, None);
        assert_eq!(computed.confidence, 0.0);
        assert_eq!(computed.scores.value, Some(6.0));
    }

    #[test]
    fn confidence_rises_with_count_until_saturation() {
        let rules = VerdictRules::default();
        let mut last = 0.0;
        for n in 1..=rules.confidence_saturation_reviews as usize {
            let c = confidence(&rules, &vec![0.5; n]);
            assert!(c > last, "confidence did not rise at n={n}");
            last = c;
        }
        assert_eq!(last, 1.0);
        assert_eq!(confidence(&rules, &vec![0.5; 40]), 1.0);
    }

    #[test]
    fn concentrated_weight_lowers_confidence() {
        let rules = VerdictRules::default();
        let even = confidence(&rules, &[1.0, 1.0, 1.0, 1.0]);
        let skewed = confidence(&rules, &[2.0, 0.1, 0.1, 0.1]);
        assert!(skewed < even);
    }

    #[test]
    fn heavy_review_after_light_ones_does_not_lower_confidence() {
        let rules = VerdictRules::default();
        let light: Vec<ScoredReview> = (0..5).map(|_| review(0, Some(5.0))).collect();
        let before = aggregate(&rules, &light);

        let mut heavy = review(100, Some(9.0));
        heavy.kind = ReviewKind::Expert;
        heavy.reviewer_role = Role::VerifiedTester;
        let mut with_heavy = light.clone();
        with_heavy.push(heavy);
        let after = aggregate(&rules, &with_heavy);

        assert_eq!(before.confidence, 0.5);
        assert!(after.confidence >= before.confidence);
        assert!(after.confidence <= 0.6);
        assert_eq!(after.review_count, 6);
    }

    #[test]
    fn confidence_never_drops_as_reviews_accumulate() {
        let rules = VerdictRules::default();
        let mut weights = Vec::new();
        let mut last = 0.0;
        for w in [0.1, 2.0, 0.1, 0.1, 1.9, 0.1, 0.1, 0.1, 2.0, 0.1, 0.1, 0.1] {
            weights.push(w);
            let c = confidence(&rules, &weights);
            assert!(c >= last, "confidence fell to {c} from {last} at n={}", weights.len());
            assert!((0.0..=1.0).contains(&c));
            last = c;
        }
    }

    fn service(
        tools: MockToolRepository,
        reviews: MockReviewRepository,
        events: MockScoreEvents,
    ) -> VerdictService {
        VerdictService::new(
            Arc::new(tools),
            Arc::new(reviews),
            Arc::new(events),
            VerdictRules::default(),
        )
    }

    #[tokio::test]
    async fn calculate_saves_and_announces_new_verdict() {
        let tool = Tool::new("Notion", "notion");
        let tool_id = tool.id;

        let mut tools = MockToolRepository::new();
        tools
            .expect_find_tool()
            .returning(move |_| Ok(Some(tool.clone())));
        tools
            .expect_save_verdict()
            .withf(|v| v.verdict == Some(Verdict::Keep))
            .times(1)
            .returning(|_| Ok(()));

        let mut reviews = MockReviewRepository::new();
        reviews
            .expect_scored_reviews_for_tool()
            .returning(|_| Ok(vec![review(80, Some(9.0)), review(60, Some(8.5))]));

        let mut events = MockScoreEvents::new();
        events
            .expect_publish()
            .withf(|e| {
                matches!(
                    e,
                    ScoreEvent::VerdictChanged { previous: None, current: Some(Verdict::Keep), .. }
                )
            })
            .times(1)
            .return_const(());

        let result = service(tools, reviews, events)
            .calculate_tool_verdict(tool_id)
            .await
            .unwrap();
        assert_eq!(result.verdict, Some(Verdict::Keep));
        assert_eq!(result.review_count, 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_not_found() {
        let mut tools = MockToolRepository::new();
        tools.expect_find_tool().returning(|_| Ok(None));
        tools.expect_save_verdict().never();

        let err = service(tools, MockReviewRepository::new(), MockScoreEvents::new())
            .calculate_tool_verdict(Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Tool", .. }));
    }

    #[tokio::test]
    async fn listing_uses_a_single_bulk_read() {
        let mut tools = MockToolRepository::new();
        tools
            .expect_list_tools()
            .times(1)
            .returning(|| Ok(vec![Tool::new("A", "a"), Tool::new("B", "b")]));
        tools.expect_find_tool().never();

        let summaries = service(tools, MockReviewRepository::new(), MockScoreEvents::new())
            .get_all_tool_verdicts()
            .await
            .unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.verdict.is_none()));
    }
}
