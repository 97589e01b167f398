//! C8 Funds Controller: three independent loops over a shared
//! Balance-Snapshot feed — gas-drip, sweeper, rebalancer — plus the
//! snapshot annotation step they all read from. Each planning function only
//! decides; the driver that owns the collaborator connections applies the
//! resulting job.

pub mod gas_drip;
pub mod rebalancer;
pub mod sweeper;
pub mod wallet_snapshot;

pub use gas_drip::plan_gas_top_up;
pub use rebalancer::plan_rebalance;
pub use sweeper::plan_sweep;
pub use wallet_snapshot::annotate;
