//! Common test utilities for integration tests.
//!
//! Every context runs against its own in-memory SQLite database, so tests
//! need no external services and can run in parallel.

pub mod fixtures;

use axum::Router;
use axum_test::TestServer;
use chrono::Utc;

use vocab_backend::db::{ConceptRepository, SqliteRepository};
use vocab_backend::services::StudyService;
use vocab_backend::{build_router, AppState};
use vocab_core::PhasedSm2;

/// Daily goal used by every test context.
pub const TEST_DAILY_GOAL: u32 = 3;

/// Test context holding the shared application state.
pub struct TestContext {
    pub state: AppState,
    app: Router,
}

impl TestContext {
    /// Create a context with an empty dictionary.
    pub fn new() -> Self {
        let repository =
            SqliteRepository::open_in_memory().expect("Failed to open in-memory database");
        let study = StudyService::new(Box::new(PhasedSm2::default()), TEST_DAILY_GOAL, 0);
        let state = AppState::new(repository, study, 20);
        let app = build_router(state.clone());
        Self { state, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to start test server")
    }

    /// Insert dictionary entries `1..=count` directly, without selecting them.
    pub fn seed_concepts(&self, count: i64) {
        let repo = self.state.repository().expect("repository lock");
        for id in 1..=count {
            let (source, target) = fixtures::word_pair(id);
            repo.insert_concept(Some(id), &source, &target, Utc::now())
                .expect("Failed to insert concept");
        }
    }

    /// Insert and select dictionary entries `1..=count` through the API.
    pub async fn seed_selected(&self, server: &TestServer, count: i64) {
        self.seed_concepts(count);
        for id in 1..=count {
            server
                .post(&format!("/api/concepts/{}/selection", id))
                .await
                .assert_status_ok();
        }
    }
}
