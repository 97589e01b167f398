//! Scenario-test harness: a deterministic fixture bundling virtual time and
//! the `rpcp-paper` collaborator doubles, plus minimal in-memory stand-ins
//! for the store repositories so `tests/scenario_*.rs` files can exercise
//! full alert → action → plan → dex chains without a live Postgres.

pub mod alert_book;
pub mod fixture;
pub mod plan_store;
pub mod recovery;

pub use alert_book::InMemoryAlertBook;
pub use fixture::Fixture;
pub use plan_store::InMemoryPlanStore;
pub use recovery::{recover_pending_orders_against_dex, RecoveryReport};
