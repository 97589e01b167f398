//! §4.7 "Plan construction per action kind". Pure: turns a `RiskAction`
//! plus the position/order context it needs into an `ExecutionPlan`. The
//! caller (store-reading driver) supplies that context and persists the
//! result inside a `txn`.

use chrono::{DateTime, Duration, Utc};
use rpcp_schemas::entities::{
    ActionKind, ExecutionOrder, ExecutionPlan, OrderExecStatus, OrderType, PlanStrategy, RiskAction, Side,
    TimeInForce,
};
use rpcp_schemas::Micros;
use uuid::Uuid;

use crate::id_map::derive_order_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanBuildError {
    MissingContext(&'static str),
}

impl std::fmt::Display for PlanBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingContext(what) => write!(f, "missing context for plan build: {what}"),
        }
    }
}

impl std::error::Error for PlanBuildError {}

#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub position_id: Uuid,
    pub strategy_id: String,
    pub symbol: String,
    /// Signed quantity — sign gives the position's side.
    pub quantity: Micros,
}

#[derive(Debug, Clone)]
pub struct OpenOrderRef {
    pub position_id: Option<Uuid>,
    pub symbol: String,
}

/// The facts `build_plan` needs beyond the triggering action, supplied by
/// the caller per action kind.
#[derive(Debug, Clone)]
pub enum PlanContext {
    PositionReduce { position: OpenPosition, reduction_fraction: f64 },
    PositionClose { position: OpenPosition },
    StrategyPause { strategy_id: String, open_orders: Vec<OpenOrderRef> },
    EmergencyStop {
        open_orders: Vec<OpenOrderRef>,
        positions: Vec<OpenPosition>,
        dust_threshold: Micros,
    },
}

fn reduce_only_order(plan_id: Uuid, index: usize, position: &OpenPosition, fraction: f64) -> ExecutionOrder {
    let side = if position.quantity.is_negative() { Side::Long } else { Side::Short };
    let order_type = if side == Side::Long { OrderType::MarketBuy } else { OrderType::MarketSell };
    let amount = position.quantity.abs() * fraction;
    ExecutionOrder {
        id: derive_order_id(plan_id, index),
        plan_id,
        order_index: index as u32,
        order_type,
        symbol: position.symbol.clone(),
        side,
        amount: amount.raw(),
        limit_price: None,
        stop_price: None,
        time_in_force: TimeInForce::Ioc,
        reduce_only: true,
        strategy_id: position.strategy_id.clone(),
        position_id: Some(position.position_id),
        status: OrderExecStatus::Pending,
        tx_ref: None,
        filled_amount: 0,
        avg_price: None,
        fees: Micros::ZERO,
        retries: 0,
    }
}

fn cancel_order(plan_id: Uuid, index: usize, target: &OpenOrderRef, strategy_id: &str) -> ExecutionOrder {
    ExecutionOrder {
        id: derive_order_id(plan_id, index),
        plan_id,
        order_index: index as u32,
        order_type: OrderType::Cancel,
        symbol: target.symbol.clone(),
        side: Side::Long,
        amount: 0,
        limit_price: None,
        stop_price: None,
        time_in_force: TimeInForce::Ioc,
        reduce_only: false,
        strategy_id: strategy_id.to_string(),
        position_id: target.position_id,
        status: OrderExecStatus::Pending,
        tx_ref: None,
        filled_amount: 0,
        avg_price: None,
        fees: Micros::ZERO,
        retries: 0,
    }
}

pub fn build_plan(
    action: &RiskAction,
    context: PlanContext,
    now: DateTime<Utc>,
    ttl_secs: i64,
) -> Result<ExecutionPlan, PlanBuildError> {
    let plan_id = Uuid::new_v4();
    let expires_at = now + Duration::seconds(ttl_secs);

    let (strategy_id, position_id, orders, dispatch_strategy) = match (action.kind, context) {
        (ActionKind::PositionReduce, PlanContext::PositionReduce { position, reduction_fraction }) => {
            let order = reduce_only_order(plan_id, 0, &position, reduction_fraction);
            (position.strategy_id.clone(), Some(position.position_id), vec![order], PlanStrategy::Sequential)
        }
        (ActionKind::PositionClose, PlanContext::PositionClose { position }) => {
            let order = reduce_only_order(plan_id, 0, &position, 1.0);
            (position.strategy_id.clone(), Some(position.position_id), vec![order], PlanStrategy::Sequential)
        }
        (ActionKind::StrategyPause, PlanContext::StrategyPause { strategy_id, open_orders }) => {
            let orders = open_orders
                .iter()
                .enumerate()
                .map(|(i, o)| cancel_order(plan_id, i, o, &strategy_id))
                .collect();
            (strategy_id, None, orders, PlanStrategy::Parallel)
        }
        (
            ActionKind::EmergencyStop,
            PlanContext::EmergencyStop { open_orders, positions, dust_threshold },
        ) => {
            let mut orders = Vec::new();
            // Cancels first, then closes — closes run in parallel with a
            // concurrency cap (§4.7), enforced by the order-driving loop,
            // not by this builder; the cancel/close split is carried by
            // order_type and relative position in the list.
            for o in &open_orders {
                let idx = orders.len();
                orders.push(cancel_order(plan_id, idx, o, "*"));
            }
            for p in positions.iter().filter(|p| p.quantity.abs().raw() > dust_threshold.raw()) {
                let idx = orders.len();
                orders.push(reduce_only_order(plan_id, idx, p, 1.0));
            }
            ("*".to_string(), None, orders, PlanStrategy::Parallel)
        }
        _ => return Err(PlanBuildError::MissingContext("action kind and context mismatch")),
    };

    Ok(ExecutionPlan {
        id: plan_id,
        risk_action_id: action.id,
        plan_type: action.kind,
        strategy_id,
        position_id,
        orders,
        status: rpcp_schemas::entities::PlanStatus::Pending,
        dispatch_strategy,
        created_at: now,
        expires_at,
        result: None,
    })
}
