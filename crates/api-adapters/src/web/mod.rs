//! # Axum adapter
//!
//! JSON routes over the scoring services.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::routing::{get, post};
use axum::Router;

pub use error::{ApiError, ApiResult};
pub use extract::{AuthenticatedUser, USER_ID_HEADER};
pub use state::AppState;

use handlers::{reviews, trust, verdicts};

/// All routes, without middleware. See [`middleware::apply`].
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/api/reviews", post(reviews::submit_review))
        .route("/api/reviews/{review_id}/votes", post(reviews::cast_vote))
        .route("/api/reviews/{review_id}/bookmark", post(reviews::toggle_bookmark))
        .route("/api/tools/{tool_id}/reviews", get(reviews::list_reviews))
        .route(
            "/api/users/{user_id}/trust-score",
            get(trust::get_trust_score).post(trust::calculate_trust_score),
        )
        .route(
            "/api/tools/{tool_id}/verdict",
            get(verdicts::get_tool_verdict).post(verdicts::calculate_tool_verdict),
        )
        .route("/api/tools/{tool_id}/scores", post(verdicts::recalculate_tool_scores))
        .route("/api/verdicts", get(verdicts::list_tool_verdicts))
        .with_state(state)
}

/// Routes wrapped in the standard middleware stack.
pub fn build_router(state: AppState) -> Router {
    middleware::apply(routes(state))
}
