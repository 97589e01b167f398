//! Deterministic DEX execution double.
//!
//! Submit accepts immediately (`DexOrderStatus::Acknowledged`) and does not
//! auto-generate fills, following the teacher's paper broker design: a
//! fill is a distinct event from submission, so tests that need one call
//! `apply_fill` explicitly rather than relying on a hidden fill simulator.
//! `tx_ref` is derived from the order id alone, so resubmitting the same
//! order (same `(plan_id, order_index)`) is a no-op that returns the
//! existing handle unmutated.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rpcp_collab::{DexError, DexExecutor, DexHandle, DexOrderStatus};
use rpcp_schemas::entities::ExecutionOrder;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct PaperDex {
    handles: Mutex<BTreeMap<Uuid, DexHandle>>,
}

impl PaperDex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutates a previously-submitted order's status, e.g. to simulate a
    /// fill. Test/fixture setup only; returns `false` if the order was
    /// never submitted.
    pub fn apply_fill(&self, order_id: Uuid, status: DexOrderStatus) -> bool {
        let mut handles = self.handles.lock().unwrap();
        match handles.get_mut(&order_id) {
            Some(handle) => {
                handle.status = status;
                true
            }
            None => false,
        }
    }

    pub fn handle_for(&self, order_id: Uuid) -> Option<DexHandle> {
        self.handles.lock().unwrap().get(&order_id).cloned()
    }
}

#[async_trait]
impl DexExecutor for PaperDex {
    async fn submit(&self, order: &ExecutionOrder) -> Result<DexHandle, DexError> {
        let mut handles = self.handles.lock().unwrap();
        if let Some(existing) = handles.get(&order.id) {
            return Ok(existing.clone());
        }
        let handle = DexHandle {
            tx_ref: format!("paper:dex:submit:{}", order.id),
            status: DexOrderStatus::Acknowledged,
        };
        handles.insert(order.id, handle.clone());
        Ok(handle)
    }

    async fn cancel(&self, order: &ExecutionOrder) -> Result<(), DexError> {
        let mut handles = self.handles.lock().unwrap();
        match handles.get_mut(&order.id) {
            Some(handle) if handle.status == DexOrderStatus::Filled => {
                Err(DexError::NonRetryable(format!("order {} already filled", order.id)))
            }
            Some(handle) => {
                handle.status = DexOrderStatus::Cancelled;
                Ok(())
            }
            // Cancelling an order that was never (or no longer) tracked is a
            // no-op, matching the teacher's idempotent cancel-on-missing-order.
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_schemas::entities::{OrderExecStatus, OrderType, Side, TimeInForce};
    use rpcp_schemas::Micros;

    fn order(id: Uuid) -> ExecutionOrder {
        ExecutionOrder {
            id,
            plan_id: Uuid::new_v4(),
            order_index: 0,
            order_type: OrderType::MarketSell,
            symbol: "BTC-USD".into(),
            side: Side::Short,
            amount: Micros::from_units(1).raw(),
            limit_price: None,
            stop_price: None,
            time_in_force: TimeInForce::Ioc,
            reduce_only: true,
            strategy_id: "s1".into(),
            position_id: None,
            status: OrderExecStatus::Pending,
            tx_ref: None,
            filled_amount: 0,
            avg_price: None,
            fees: Micros::ZERO,
            retries: 0,
        }
    }

    #[tokio::test]
    async fn submit_is_idempotent_on_the_same_order_id() {
        let dex = PaperDex::new();
        let id = Uuid::new_v4();
        let h1 = dex.submit(&order(id)).await.unwrap();
        let h2 = dex.submit(&order(id)).await.unwrap();
        assert_eq!(h1.tx_ref, h2.tx_ref);
    }

    #[tokio::test]
    async fn distinct_orders_get_distinct_tx_refs() {
        let dex = PaperDex::new();
        let h1 = dex.submit(&order(Uuid::new_v4())).await.unwrap();
        let h2 = dex.submit(&order(Uuid::new_v4())).await.unwrap();
        assert_ne!(h1.tx_ref, h2.tx_ref);
    }

    #[tokio::test]
    async fn cancel_on_unknown_order_is_a_noop() {
        let dex = PaperDex::new();
        assert!(dex.cancel(&order(Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_after_submit_marks_cancelled() {
        let dex = PaperDex::new();
        let id = Uuid::new_v4();
        dex.submit(&order(id)).await.unwrap();
        dex.cancel(&order(id)).await.unwrap();
        assert_eq!(dex.handle_for(id).unwrap().status, DexOrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_after_fill_is_rejected() {
        let dex = PaperDex::new();
        let id = Uuid::new_v4();
        dex.submit(&order(id)).await.unwrap();
        dex.apply_fill(id, DexOrderStatus::Filled);
        assert!(dex.cancel(&order(id)).await.is_err());
    }
}
