//! §4.8 "Balance-Snapshot loop": quotes a wallet/asset balance and marks the
//! two threshold flags the other three loops read. Pure; the driver owns
//! the enumerate-wallets/quote-price/append-row wiring.

use chrono::{DateTime, Utc};
use rpcp_config::tree::FundsConfig;
use rpcp_schemas::entities::{BalanceSnapshot, WalletGroup};
use rpcp_schemas::Micros;

/// Builds one annotated snapshot row. `native_asset` names the asset that
/// pays gas on this wallet's chain; only that asset is eligible for
/// `below_gas_threshold`, and `max_gas`/`min_gas` apply only to it.
pub fn annotate(
    wallet_address: &str,
    wallet_group: WalletGroup,
    asset: &str,
    native_asset: &str,
    balance: Micros,
    quote_value: Micros,
    config: &FundsConfig,
    observed_at: DateTime<Utc>,
) -> BalanceSnapshot {
    let is_native = asset == native_asset;
    let below_gas_threshold = is_native && balance < config.min_gas;
    let above_sweep_threshold = !is_native && quote_value > config.sweep_min;

    BalanceSnapshot {
        wallet_address: wallet_address.to_string(),
        wallet_group,
        asset: asset.to_string(),
        balance,
        quote_value,
        below_gas_threshold,
        above_sweep_threshold,
        observed_at,
    }
}
