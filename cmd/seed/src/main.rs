//! Seeds a development database with demo users, tools and reviews, then
//! computes trust scores and verdicts so the read endpoints have data.
//!
//! Re-running is safe: users are upserted and tools whose slug already
//! exists are skipped along with their reviews.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use configs::Settings;
use domains::{
    NewReview, ReviewKind, Role, Tool, ToolRepository, User, UserRepository, VoteType,
};
use secrecy::ExposeSecret;
use services::{ReviewLedgerService, TrustScoreService, VerdictService};
use storage_adapters::{BroadcastEvents, PgStore};
use tracing::info;

struct DemoUser {
    id: &'static str,
    role: Role,
    verified_tester: bool,
}

const USERS: &[DemoUser] = &[
    DemoUser { id: "alice", role: Role::VerifiedTester, verified_tester: true },
    DemoUser { id: "bob", role: Role::User, verified_tester: false },
    DemoUser { id: "carol", role: Role::User, verified_tester: false },
    DemoUser { id: "dmitri", role: Role::Vendor, verified_tester: false },
    DemoUser { id: "erin", role: Role::Admin, verified_tester: false },
];

/// (author, overall, value, usage, integration, kind)
type DemoReview = (&'static str, f64, f64, f64, f64, ReviewKind);

const TOOLS: &[(&str, &str, &[DemoReview])] = &[
    (
        "Linear",
        "linear",
        &[
            ("alice", 9.0, 8.5, 9.5, 8.0, ReviewKind::Expert),
            ("bob", 8.5, 8.0, 9.0, 7.5, ReviewKind::Community),
            ("carol", 9.5, 9.0, 9.0, 9.0, ReviewKind::Community),
        ],
    ),
    (
        "Zapier",
        "zapier",
        &[
            ("alice", 6.5, 5.0, 7.0, 8.5, ReviewKind::Expert),
            ("bob", 7.0, 6.0, 7.5, 8.0, ReviewKind::Community),
            ("erin", 5.5, 4.5, 6.0, 7.0, ReviewKind::Community),
        ],
    ),
    (
        "LegacyCRM",
        "legacycrm",
        &[
            ("alice", 2.5, 3.0, 2.0, 1.5, ReviewKind::Expert),
            ("carol", 3.0, 2.5, 3.5, 2.0, ReviewKind::Community),
        ],
    ),
    ("Newcomer", "newcomer", &[]),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let settings = Settings::load().context("loading configuration")?;
    let url = settings
        .database
        .url
        .as_ref()
        .context("database.url is required for seeding")?;

    let store = Arc::new(
        PgStore::connect(url.expose_secret(), settings.database.max_connections)
            .await
            .context("connecting to postgres")?,
    );
    store.migrate().await.context("running migrations")?;

    let events = Arc::new(BroadcastEvents::new(16));
    let ledger = ReviewLedgerService::new(store.clone(), store.clone(), store.clone());
    let trust = TrustScoreService::new(
        store.clone(),
        store.clone(),
        events.clone(),
        settings.scoring.trust.clone(),
    );
    let verdicts = VerdictService::new(
        store.clone(),
        store.clone(),
        events,
        settings.scoring.verdict.clone(),
    );

    for demo in USERS {
        let mut user = User::new(demo.id, demo.role);
        user.is_verified_tester = demo.verified_tester;
        store.upsert_user(&user).await?;
    }
    info!(count = USERS.len(), "users upserted");

    let existing: HashSet<String> = store
        .list_tools()
        .await?
        .into_iter()
        .map(|t| t.slug)
        .collect();

    for (name, slug, reviews) in TOOLS {
        if existing.contains(*slug) {
            info!(slug, "tool already present, skipping");
            continue;
        }
        let tool = Tool::new(*name, *slug);
        store.create_tool(&tool).await?;

        for (author, overall, value, usage, integration, kind) in reviews.iter() {
            let review = ledger
                .submit_review(NewReview {
                    tool_id: tool.id,
                    user_id: (*author).to_string(),
                    overall_score: Some(*overall),
                    value_score: Some(*value),
                    usage_score: Some(*usage),
                    integration_score: Some(*integration),
                    kind: *kind,
                    content: None,
                })
                .await?;

            // Everyone else finds positive reviews helpful.
            let vote = if *overall >= 5.0 { VoteType::Helpful } else { VoteType::NotHelpful };
            for voter in USERS.iter().filter(|u| u.id != *author) {
                ledger.cast_vote(review.id, voter.id, vote.as_str()).await?;
            }
        }
        info!(slug, reviews = reviews.len(), "tool seeded");
    }

    for demo in USERS {
        let score = trust.calculate_trust_score(demo.id).await?;
        info!(user = demo.id, score = score.score, "trust score");
    }

    for tool in store.list_tools().await? {
        verdicts.recalculate_tool_scores(tool.id).await?;
        let verdict = verdicts.calculate_tool_verdict(tool.id).await?;
        info!(
            slug = %tool.slug,
            verdict = ?verdict.verdict,
            confidence = verdict.confidence,
            "verdict"
        );
    }

    info!("seed complete");
    Ok(())
}
