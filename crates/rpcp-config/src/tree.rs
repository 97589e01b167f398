//! The typed configuration tree enumerated in §6 "Configuration (enumerated)".

use rpcp_schemas::Micros;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub assessment_interval_ms: u64,
    pub default_risk_limits: DefaultRiskLimits,
    pub auto_action_enabled: bool,
    pub emergency_stop_enabled: bool,
    pub var_confidence_level: f64,
    pub lookback_days: u32,
    pub correlation_threshold: f64,
    pub liquidity_threshold: f64,
    pub max_concurrent_actions: u32,
    /// Open Question (a): cooldown window for alert dedup, default 5 min.
    #[serde(default = "default_cooldown_secs")]
    pub alert_cooldown_secs: u64,
    /// Open Question (a): hysteresis margin (fraction of the limit) and the
    /// number of consecutive in-bounds ticks required before auto-resolving
    /// an alert.
    #[serde(default = "default_hysteresis_margin")]
    pub hysteresis_margin_pct: f64,
    #[serde(default = "default_hysteresis_ticks")]
    pub hysteresis_ticks: u32,
}

fn default_cooldown_secs() -> u64 {
    300
}
fn default_hysteresis_margin() -> f64 {
    0.05
}
fn default_hysteresis_ticks() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRiskLimits {
    pub max_position_size: Micros,
    pub max_portfolio_exposure_pct: Micros,
    pub max_daily_loss: Micros,
    pub max_drawdown_pct: Micros,
    pub max_leverage: Micros,
    pub stop_loss_pct: Micros,
    pub take_profit_pct: Micros,
    pub concentration_limit_pct: Micros,
    pub correlation_limit: Micros,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    Fixed,
    Percentage,
    Volatility,
    Kelly,
    RiskParity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    pub method: SizingMethod,
    pub base_size: Micros,
    pub max_size: Micros,
    pub portfolio_percentage: f64,
    pub volatility_lookback: u32,
    pub kelly_lookback: u32,
    pub risk_free_rate: f64,
    pub max_leverage: Micros,
    pub size_multiplier: f64,
    /// Per-trade risk cap percentage used to derive the stop-distance clamp
    /// in step 2 of §4.4's sizing contract.
    pub per_trade_risk_pct: f64,
    pub min_size: Micros,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryExitConfig {
    pub max_pyramid_levels: u32,
    pub pyramid_scale_factor: f64,
    pub entry_spacing_pct: f64,
    pub partial_exit_levels: Vec<f64>,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub time_exit_hours: Option<f64>,
    pub max_hold_time_hours: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubLoopConfig {
    pub check_interval_ms: u64,
    pub max_concurrent: u32,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsConfig {
    pub min_gas: Micros,
    pub max_gas: Micros,
    pub sweep_min: Micros,
    pub leaving_amount: Micros,
    pub rebalance_target: BTreeMap<String, f64>,
    pub tolerance_band: f64,
    pub treasury_address: String,
    pub managed_wallet_groups: Vec<String>,
    pub supported_assets: Vec<String>,
    pub balance_check_interval_ms: u64,
    pub gas_drip: SubLoopConfig,
    pub sweeper: SubLoopConfig,
    pub rebalancer: SubLoopConfig,
    #[serde(default = "default_min_rebalance_value_usd")]
    pub min_rebalance_value_usd: Micros,
    #[serde(default = "default_max_single_trade_usd")]
    pub max_single_trade_usd: Micros,
}

fn default_min_rebalance_value_usd() -> Micros {
    Micros::from_units(50)
}
fn default_max_single_trade_usd() -> Micros {
    Micros::from_units(10_000)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcpConfig {
    pub risk: RiskConfig,
    pub sizing: SizingConfig,
    pub entry_exit: EntryExitConfig,
    pub funds: FundsConfig,
    /// Minimum meaningful trade size below which a position is treated as
    /// closed/dust (§3 glossary "Dust").
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: i64,
    /// Plan TTL in seconds, default 30 min (§4.7).
    #[serde(default = "default_plan_ttl_secs")]
    pub plan_ttl_secs: i64,
    /// Per-order RPC timeout in seconds, default 60s (§5).
    #[serde(default = "default_order_rpc_timeout_secs")]
    pub order_rpc_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_order_retries: u32,
}

fn default_dust_threshold() -> i64 {
    1
}
fn default_plan_ttl_secs() -> i64 {
    30 * 60
}
fn default_order_rpc_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    3
}
