//! §6 "Collaborators consumed" — the external interfaces this system reads
//! from and writes through but never implements in depth: the on-chain
//! RPC/signer layer, the DEX swap router, and price discovery. Production
//! implementations live outside this workspace; `rpcp-paper` provides
//! deterministic test/backtest doubles.
//!
//! The router boundary shape (a thin trait isolating engine logic from the
//! concrete broker/venue) follows `BrokerAdapter` in the teacher's order
//! router: minimal methods, broker-agnostic request/response structs, no
//! strategy or risk logic leaking across the boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rpcp_schemas::{ExecutionOrder, Micros};

pub type CollabResult<T> = anyhow::Result<T>;

#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    pub closes: Vec<Micros>,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_mark(&self, symbol: &str) -> CollabResult<Micros>;
    async fn get_candles(
        &self,
        symbol: &str,
        interval_secs: u64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> CollabResult<PriceSeries>;
}

#[derive(Debug, Clone)]
pub struct SignHandle {
    pub tx_ref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    Confirmed,
    Pending,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct Receipt {
    pub tx_ref: String,
    pub status: ConfirmationStatus,
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn sign_and_send(&self, from: &str, tx: TxRequest) -> CollabResult<SignHandle>;
    async fn wait_for_confirmation(
        &self,
        handle: &SignHandle,
        timeout_secs: u64,
    ) -> CollabResult<Receipt>;
}

/// An opaque native-coin/asset transfer request, as submitted to the
/// signer. The signer presents a FIFO queue per `from` address and is the
/// single mutator of on-chain nonces (§5 "Shared-resource policy").
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub to: String,
    pub asset: String,
    pub amount: Micros,
    pub memo: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DexOrderStatus {
    Acknowledged,
    Filled,
    PartiallyFilled,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct DexHandle {
    pub tx_ref: String,
    pub status: DexOrderStatus,
}

/// Classifies a collaborator failure per §7's error taxonomy, so every
/// loop driver can apply the same retry/backoff or terminalization policy
/// without collaborator-specific error matching.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DexError {
    #[error("transient dex error: {0}")]
    Transient(String),
    #[error("non-retryable dex error: {0}")]
    NonRetryable(String),
}

#[async_trait]
pub trait DexExecutor: Send + Sync {
    async fn submit(&self, order: &ExecutionOrder) -> Result<DexHandle, DexError>;
    async fn cancel(&self, order: &ExecutionOrder) -> Result<(), DexError>;
}
