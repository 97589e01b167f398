//! Per-order execution state machine: an explicit legal-transition table,
//! idempotent replay keyed by an optional event id so restart-driven
//! reapplication of the same event log converges to the same state.

use rpcp_schemas::entities::OrderExecStatus;
use rpcp_schemas::Micros;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Submitted,
    PartialFill { delta_qty: Micros },
    Fill { delta_qty: Micros },
    CancelAck,
    Failed { retryable: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: OrderExecStatus,
    pub event: String,
}

impl std::fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal order transition: {:?} + {}", self.from, self.event)
    }
}

impl std::error::Error for IllegalTransition {}

/// Tracks one order's execution lifecycle plus the set of already-applied
/// event ids, for idempotent replay on restart.
#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    pub status: Option<OrderExecStatus>,
    pub filled_qty: Micros,
    applied: HashSet<String>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self {
            status: Some(OrderExecStatus::Pending),
            filled_qty: Micros::ZERO,
            applied: HashSet::new(),
        }
    }

    /// Rehydrate from a persisted status after restart (§4.7 "reloads
    /// non-terminal plans and continues from their persisted order
    /// statuses").
    pub fn from_persisted(status: OrderExecStatus, filled_qty: Micros) -> Self {
        Self {
            status: Some(status),
            filled_qty,
            applied: HashSet::new(),
        }
    }

    pub fn apply(&mut self, event: &OrderEvent, event_id: Option<&str>) -> Result<(), IllegalTransition> {
        if let Some(id) = event_id {
            if self.applied.contains(id) {
                return Ok(());
            }
        }
        self.do_transition(event)?;
        if let Some(id) = event_id {
            self.applied.insert(id.to_string());
        }
        Ok(())
    }

    fn do_transition(&mut self, event: &OrderEvent) -> Result<(), IllegalTransition> {
        use OrderEvent::*;
        use OrderExecStatus::*;

        let current = self.status.unwrap_or(Pending);

        match (current, event) {
            (Pending, Submitted) => self.status = Some(Submitted),

            (Submitted | PartiallyFilled, PartialFill { delta_qty }) => {
                self.filled_qty = self.filled_qty.saturating_add(*delta_qty);
                self.status = Some(PartiallyFilled);
            }

            (Submitted | PartiallyFilled, Fill { delta_qty }) => {
                self.filled_qty = self.filled_qty.saturating_add(*delta_qty);
                self.status = Some(Filled);
            }

            // Late-duplicate fill on an already-terminal order: no-op.
            (Filled | Cancelled | Failed, Fill { .. } | PartialFill { .. }) => {}

            (Submitted | PartiallyFilled, CancelAck) => self.status = Some(Cancelled),

            (Pending | Submitted | PartiallyFilled, OrderEvent::Failed { .. }) => {
                self.status = Some(OrderExecStatus::Failed);
            }

            (state, ev) => {
                return Err(IllegalTransition {
                    from: state,
                    event: format!("{ev:?}"),
                });
            }
        }

        Ok(())
    }
}
