//! Persisted entity shapes — §3 DATA MODEL.
//!
//! These are plain data types shared by every crate that touches the store.
//! They carry no behavior beyond small invariant-preserving constructors;
//! the control-plane logic that produces and consumes them lives in
//! `rpcp-risk`, `rpcp-planner`, `rpcp-execution`, and `rpcp-funds`.

use crate::fixedpoint::Micros;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    pub fn from_signed_qty(qty: i64) -> Option<Side> {
        if qty > 0 {
            Some(Side::Long)
        } else if qty < 0 {
            Some(Side::Short)
        } else {
            None
        }
    }

    /// `true` if `qty`'s sign matches this side. Zero never matches.
    pub fn matches_qty(self, qty: i64) -> bool {
        matches!(Side::from_signed_qty(qty), Some(s) if s == self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Active,
    Closing,
    Closed,
}

/// An open exposure to one symbol.
///
/// Invariant: `sign(quantity) == side`, enforced by [`Position::new`] and
/// [`Position::apply_fill`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub strategy_id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: i64,
    pub avg_entry_price: Micros,
    pub mark: Micros,
    pub opened_at: DateTime<Utc>,
    pub status: PositionStatus,
    pub stop_loss_price: Option<Micros>,
    pub take_profit_price: Option<Micros>,
}

impl Position {
    pub fn new(
        strategy_id: impl Into<String>,
        symbol: impl Into<String>,
        quantity: i64,
        avg_entry_price: Micros,
        opened_at: DateTime<Utc>,
    ) -> Option<Self> {
        let side = Side::from_signed_qty(quantity)?;
        Some(Self {
            id: Uuid::new_v4(),
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            side,
            quantity,
            avg_entry_price,
            mark: avg_entry_price,
            opened_at,
            status: PositionStatus::Active,
            stop_loss_price: None,
            take_profit_price: None,
        })
    }

    /// `true` if `|quantity|` is at or below `dust`, i.e. effectively flat.
    pub fn is_dust(&self, dust: i64) -> bool {
        self.quantity.abs() <= dust
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitScope {
    Global,
}

/// A scope-keyed risk limits row. `scope` is one of `global`,
/// `portfolio:<id>`, or `strategy:<id>`; we model it as a plain string key
/// since the set of portfolio/strategy ids is open-ended, with `global`
/// available as a constant for the most common case.
pub const GLOBAL_SCOPE: &str = "global";

pub fn portfolio_scope(id: &str) -> String {
    format!("portfolio:{id}")
}

pub fn strategy_scope(id: &str) -> String {
    format!("strategy:{id}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskLimits {
    pub scope: String,
    pub max_position_size: Micros,
    pub max_portfolio_exposure_pct: Micros,
    pub max_daily_loss: Micros,
    pub max_drawdown_pct: Micros,
    pub max_leverage: Micros,
    pub default_stop_loss_pct: Micros,
    pub default_take_profit_pct: Micros,
    pub concentration_limit_pct: Micros,
    pub correlation_limit: Micros,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRisk {
    pub position_id: Uuid,
    pub size: Micros,
    pub var_1d: Micros,
    pub exposure_pct: Micros,
    pub mae_pct: Micros,
    pub mfe_pct: Micros,
    pub risk_score: Micros,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioRisk {
    pub scope: String,
    pub portfolio_value: Micros,
    pub total_var_1d: Micros,
    pub weighted_beta: Micros,
    pub concentration: Micros,
    pub correlation: Micros,
    pub drawdown_pct: Micros,
    pub sharpe: Micros,
    pub risk_score: Micros,
    pub assessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    PositionSize,
    Concentration,
    UnrealizedLoss,
    StrategyDailyLoss,
    PortfolioDrawdown,
    Correlation,
    Liquidity,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Position,
    Portfolio,
    Strategy,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    PositionReduce,
    PositionClose,
    StrategyPause,
    EmergencyStop,
    NotifyOnly,
}

/// A triggered threshold event. Never deleted; resolution is a monotonic
/// update (§3 invariant: "a resolved alert remains resolved").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAlert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub current_value: Micros,
    pub limit_value: Micros,
    pub message: String,
    pub recommended_action: Option<ActionKind>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
    /// Times this (kind, entity, limit bucket) key has refreshed within its
    /// cooldown window, per §4.5 "Alert dedup and cooldown".
    pub refresh_count: u32,
    /// Consecutive ticks the observed value has sat back inside the limit
    /// by the hysteresis margin. Reset to 0 on any re-breach.
    pub inside_limit_ticks: u32,
}

impl RiskAlert {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Resolve the alert. No-op if already resolved — resolution is
    /// monotonic and must never be undone or re-timestamped.
    pub fn resolve(&mut self, at: DateTime<Utc>, by: impl Into<String>) {
        if self.resolved_at.is_none() {
            self.resolved_at = Some(at);
            self.resolved_by = Some(by.into());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

/// An intent to mitigate a breach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAction {
    pub id: Uuid,
    pub kind: ActionKind,
    pub triggering_alert_id: Uuid,
    pub parameters: serde_json::Value,
    pub status: ActionStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl PlanStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanStatus::Completed | PlanStatus::Failed | PlanStatus::Cancelled | PlanStatus::Expired
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanStrategy {
    Sequential,
    Parallel,
    Staggered,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: Uuid,
    pub risk_action_id: Uuid,
    pub plan_type: ActionKind,
    pub strategy_id: String,
    pub position_id: Option<Uuid>,
    pub orders: Vec<ExecutionOrder>,
    pub status: PlanStatus,
    pub dispatch_strategy: PlanStrategy,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub result: Option<String>,
}

impl ExecutionPlan {
    /// `true` once every order has reached a terminal execution status.
    pub fn all_orders_terminal(&self) -> bool {
        self.orders.iter().all(|o| o.status.is_terminal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    MarketSell,
    MarketBuy,
    Cancel,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderExecStatus {
    Pending,
    Submitted,
    Filled,
    PartiallyFilled,
    Cancelled,
    Failed,
}

impl OrderExecStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderExecStatus::Filled | OrderExecStatus::Cancelled | OrderExecStatus::Failed
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOrder {
    /// Deterministic from `(plan_id, order_index)` — see `rpcp-execution`'s
    /// `derive_order_id`. Never randomly generated.
    pub id: Uuid,
    pub plan_id: Uuid,
    pub order_index: u32,
    pub order_type: OrderType,
    pub symbol: String,
    pub side: Side,
    pub amount: i64,
    pub limit_price: Option<Micros>,
    pub stop_price: Option<Micros>,
    pub time_in_force: TimeInForce,
    pub reduce_only: bool,
    pub strategy_id: String,
    pub position_id: Option<Uuid>,
    pub status: OrderExecStatus,
    pub tx_ref: Option<String>,
    pub filled_amount: i64,
    pub avg_price: Option<Micros>,
    pub fees: Micros,
    pub retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletGroup {
    Hot,
    Warm,
    Cold,
    Treasury,
    Strategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub wallet_address: String,
    pub wallet_group: WalletGroup,
    pub asset: String,
    pub balance: Micros,
    pub quote_value: Micros,
    pub below_gas_threshold: bool,
    pub above_sweep_threshold: bool,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundJobStatus {
    Pending,
    Executing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceTrade {
    pub asset: String,
    pub side: Side,
    pub amount: Micros,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FundJobKind {
    GasTopUp {
        target_wallet: String,
        amount: Micros,
    },
    Sweep {
        source_wallet: String,
        target_wallet: String,
        asset: String,
        amount: Micros,
    },
    Rebalance {
        wallet_group: WalletGroup,
        trades: Vec<RebalanceTrade>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundJob {
    pub id: Uuid,
    pub kind: FundJobKind,
    pub status: FundJobStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub tx_ref: Option<String>,
    pub dry_run: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsAlert {
    pub id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub wallet_address: String,
    pub asset: String,
    pub current_value: Micros,
    pub limit_value: Micros,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}
