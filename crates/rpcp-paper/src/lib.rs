//! Deterministic in-memory doubles for the `rpcp-collab` collaborator
//! traits: no randomness, no wall-clock timestamps, idempotent submit,
//! `BTreeMap`-keyed storage for reproducible iteration order. Used by
//! `rpcp-testkit` scenario tests and by backtest/paper-trading runs of the
//! daemon.

pub mod dex;
pub mod market_data;
pub mod signer;

pub use dex::PaperDex;
pub use market_data::PaperMarketData;
pub use signer::PaperSigner;
