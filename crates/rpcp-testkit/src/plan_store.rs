//! In-memory stand-in for `rpcp-store::repo::plans`, scoped to what
//! scenario tests need: insert a plan, look up its non-terminal orders, and
//! mark order/plan status. Grounded on the same `FakeBroker` minimal-fake
//! idiom as [`crate::alert_book::InMemoryAlertBook`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rpcp_schemas::entities::{ExecutionPlan, OrderExecStatus, PlanStatus};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryPlanStore {
    plans: BTreeMap<Uuid, ExecutionPlan>,
}

impl InMemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, plan: ExecutionPlan) {
        self.plans.insert(plan.id, plan);
    }

    pub fn get(&self, plan_id: Uuid) -> Option<&ExecutionPlan> {
        self.plans.get(&plan_id)
    }

    pub fn mark_order_status(&mut self, plan_id: Uuid, order_index: u32, status: OrderExecStatus) {
        if let Some(plan) = self.plans.get_mut(&plan_id) {
            if let Some(order) = plan.orders.iter_mut().find(|o| o.order_index == order_index) {
                order.status = status;
            }
        }
    }

    pub fn mark_plan_status(&mut self, plan_id: Uuid, status: PlanStatus) {
        if let Some(plan) = self.plans.get_mut(&plan_id) {
            plan.status = status;
        }
    }

    /// Plans in `Pending`/`Executing` whose `expires_at` is before `now`,
    /// mirroring `repo::plans::expire_overdue_plans`'s selection.
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<Uuid> {
        self.plans
            .values()
            .filter(|p| matches!(p.status, PlanStatus::Pending | PlanStatus::Executing) && p.expires_at < now)
            .map(|p| p.id)
            .collect()
    }

    pub fn expire_overdue(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let ids = self.overdue(now);
        for id in &ids {
            self.mark_plan_status(*id, PlanStatus::Expired);
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpcp_schemas::entities::{ActionKind, PlanStrategy};

    fn plan(expires_at: DateTime<Utc>) -> ExecutionPlan {
        ExecutionPlan {
            id: Uuid::new_v4(),
            risk_action_id: Uuid::new_v4(),
            plan_type: ActionKind::PositionClose,
            strategy_id: "s1".into(),
            position_id: None,
            orders: vec![],
            status: PlanStatus::Pending,
            dispatch_strategy: PlanStrategy::Sequential,
            created_at: Utc::now(),
            expires_at,
            result: None,
        }
    }

    #[test]
    fn expire_overdue_flips_only_expired_pending_plans() {
        let now = Utc::now();
        let mut store = InMemoryPlanStore::new();
        let fresh = plan(now + chrono::Duration::minutes(30));
        let stale = plan(now - chrono::Duration::minutes(1));
        let fresh_id = fresh.id;
        let stale_id = stale.id;
        store.insert(fresh);
        store.insert(stale);

        let expired = store.expire_overdue(now);
        assert_eq!(expired, vec![stale_id]);
        assert_eq!(store.get(fresh_id).unwrap().status, PlanStatus::Pending);
        assert_eq!(store.get(stale_id).unwrap().status, PlanStatus::Expired);
    }
}
