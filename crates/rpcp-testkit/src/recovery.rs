//! Restart-reconciliation primitive for scenario tests: resubmit whatever
//! the dex doesn't already have, once, then ack, generalized from a flat
//! outbox shape to the `(plan, order)` dispatch model. Submit is
//! idempotent on `order.id` (see [`rpcp_paper::PaperDex`]), so replaying a
//! pending order against the dex after a simulated crash converges to the
//! same state whether or not the crash happened before or after the first
//! submit actually reached the dex.

use rpcp_collab::DexExecutor;
use rpcp_schemas::entities::OrderExecStatus;

use crate::plan_store::InMemoryPlanStore;

#[derive(Debug, Clone, Default)]
pub struct RecoveryReport {
    pub inspected: usize,
    pub resubmitted: usize,
}

pub async fn recover_pending_orders_against_dex(
    store: &mut InMemoryPlanStore,
    plan_id: uuid::Uuid,
    dex: &dyn DexExecutor,
) -> anyhow::Result<RecoveryReport> {
    let mut report = RecoveryReport::default();

    let pending_indices: Vec<u32> = match store.get(plan_id) {
        Some(plan) => plan
            .orders
            .iter()
            .filter(|o| o.status == OrderExecStatus::Pending)
            .map(|o| o.order_index)
            .collect(),
        None => return Ok(report),
    };

    for index in pending_indices {
        report.inspected += 1;
        let order = store
            .get(plan_id)
            .and_then(|p| p.orders.iter().find(|o| o.order_index == index))
            .cloned()
            .expect("order present: collected from this same plan above");

        dex.submit(&order).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;
        store.mark_order_status(plan_id, index, OrderExecStatus::Submitted);
        report.resubmitted += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rpcp_paper::PaperDex;
    use rpcp_schemas::entities::{ActionKind, ExecutionOrder, ExecutionPlan, OrderType, PlanStatus, PlanStrategy, Side, TimeInForce};
    use rpcp_schemas::Micros;
    use uuid::Uuid;

    fn plan_with_one_pending_order() -> ExecutionPlan {
        let plan_id = Uuid::new_v4();
        ExecutionPlan {
            id: plan_id,
            risk_action_id: Uuid::new_v4(),
            plan_type: ActionKind::PositionClose,
            strategy_id: "s1".into(),
            position_id: None,
            orders: vec![ExecutionOrder {
                id: Uuid::new_v4(),
                plan_id,
                order_index: 0,
                order_type: OrderType::MarketSell,
                symbol: "ETH".into(),
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
            }],
            status: PlanStatus::Executing,
            dispatch_strategy: PlanStrategy::Sequential,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::minutes(30),
            result: None,
        }
    }

    #[tokio::test]
    async fn recovery_submits_pending_order_and_marks_it_submitted() {
        let plan = plan_with_one_pending_order();
        let plan_id = plan.id;
        let mut store = InMemoryPlanStore::new();
        store.insert(plan);
        let dex = PaperDex::new();

        let report = recover_pending_orders_against_dex(&mut store, plan_id, &dex).await.unwrap();
        assert_eq!(report.resubmitted, 1);
        assert_eq!(store.get(plan_id).unwrap().orders[0].status, OrderExecStatus::Submitted);
    }

    #[tokio::test]
    async fn recovery_on_unknown_plan_is_a_noop() {
        let mut store = InMemoryPlanStore::new();
        let dex = PaperDex::new();
        let report = recover_pending_orders_against_dex(&mut store, Uuid::new_v4(), &dex).await.unwrap();
        assert_eq!(report.inspected, 0);
    }
}
