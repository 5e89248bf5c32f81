//! Shared fixtures for the integration suites: a fully wired scoring core
//! over the in-memory store, plus helpers to build users, tools, reviews and
//! votes in a few lines.

use std::sync::Arc;

use domains::{
    NewReview, Review, ReviewKind, Role, ScoringRules, Tool, ToolRepository, User,
    UserRepository, VoteType,
};
use services::{ReviewLedgerService, TrustScoreService, VerdictService};
use storage_adapters::{BroadcastEvents, MemoryStore};
use uuid::Uuid;

pub struct Scenario {
    pub store: Arc<MemoryStore>,
    pub events: Arc<BroadcastEvents>,
    pub ledger: Arc<ReviewLedgerService>,
    pub trust: Arc<TrustScoreService>,
    pub verdicts: Arc<VerdictService>,
    pub rules: ScoringRules,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self::with_rules(ScoringRules::default())
    }

    pub fn with_rules(rules: ScoringRules) -> Self {
        let store = Arc::new(MemoryStore::new());
        let events = Arc::new(BroadcastEvents::new(64));
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
                store.clone(),
                events.clone(),
                rules.verdict.clone(),
            )),
            store,
            events,
            rules,
        }
    }

    pub async fn user(&self, id: &str, role: Role) -> User {
        let user = User::new(id, role);
        self.store.upsert_user(&user).await.unwrap();
        user
    }

    pub async fn verified_tester(&self, id: &str) -> User {
        let mut user = User::new(id, Role::VerifiedTester);
        user.is_verified_tester = true;
        self.store.upsert_user(&user).await.unwrap();
        user
    }

    /// Creates `count` plain users named `{prefix}-{n}` and returns their ids.
    pub async fn crowd(&self, prefix: &str, count: usize) -> Vec<String> {
        let mut ids = Vec::with_capacity(count);
        for n in 0..count {
            let id = format!("{prefix}-{n}");
            self.user(&id, Role::User).await;
            ids.push(id);
        }
        ids
    }

    pub async fn tool(&self, slug: &str) -> Tool {
        let tool = Tool::new(slug.to_uppercase(), slug);
        self.store.create_tool(&tool).await.unwrap();
        tool
    }

    pub async fn review(&self, tool_id: Uuid, author: &str, overall: f64) -> Review {
        self.review_of_kind(tool_id, author, overall, ReviewKind::Community)
            .await
    }

    pub async fn review_of_kind(
        &self,
        tool_id: Uuid,
        author: &str,
        overall: f64,
        kind: ReviewKind,
    ) -> Review {
        self.ledger
            .submit_review(NewReview {
                tool_id,
                user_id: author.to_string(),
                overall_score: Some(overall),
                value_score: None,
                usage_score: None,
                integration_score: None,
                kind,
                content: None,
            })
            .await
            .unwrap()
    }

    pub async fn vote_all<S: AsRef<str>>(&self, review_id: Uuid, voters: &[S], vote: VoteType) {
        for voter in voters {
            self.ledger
                .cast_vote(review_id, voter.as_ref(), vote.as_str())
                .await
                .unwrap();
        }
    }

    #[cfg(feature = "web-axum")]
    pub fn router(&self) -> axum::Router {
        use api_adapters::web::{build_router, AppState};
        use api_adapters::Metrics;

        build_router(AppState {
            ledger: self.ledger.clone(),
            trust: self.trust.clone(),
            verdicts: self.verdicts.clone(),
            metrics: Arc::new(Metrics::new()),
        })
    }
}

#[cfg(feature = "web-axum")]
pub mod http {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use serde_json::Value;
    use tower::ServiceExt;

    pub use api_adapters::web::USER_ID_HEADER;

    pub async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    pub fn post(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }
}
