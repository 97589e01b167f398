//! Internal order-id derivation and the internal→tx-ref mapping, grounded
//! on the `BrokerOrderMap` idiom: never fabricate an id you don't hold, and
//! keep the map bounded by deregistering on terminal status.

use std::collections::HashMap;
use uuid::Uuid;

/// §4.7 idempotency: every order id is deterministic from `(plan_id,
/// order_index)` — a v5 (namespace + name) UUID, so re-deriving the same
/// pair always yields the same id and a restarted driver reconstructs
/// identical ids without a side channel.
pub fn derive_order_id(plan_id: Uuid, order_index: usize) -> Uuid {
    let name = format!("{plan_id}:{order_index}");
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Maps an internal order id to the DEX-assigned transaction reference.
/// Not `Sync`; callers needing concurrent access wrap it themselves.
#[derive(Clone, Debug, Default)]
pub struct OrderRefMap {
    map: HashMap<Uuid, String>,
}

impl OrderRefMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, internal_id: Uuid, tx_ref: impl Into<String>) {
        self.map.insert(internal_id, tx_ref.into());
    }

    pub fn tx_ref(&self, internal_id: Uuid) -> Option<&str> {
        self.map.get(&internal_id).map(|s| s.as_str())
    }

    pub fn deregister(&mut self, internal_id: Uuid) {
        self.map.remove(&internal_id);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_plan_and_index_derive_the_same_id() {
        let plan_id = Uuid::new_v4();
        assert_eq!(derive_order_id(plan_id, 2), derive_order_id(plan_id, 2));
    }

    #[test]
    fn different_index_derives_different_id() {
        let plan_id = Uuid::new_v4();
        assert_ne!(derive_order_id(plan_id, 0), derive_order_id(plan_id, 1));
    }

    #[test]
    fn ref_map_round_trips_and_deregisters() {
        let mut m = OrderRefMap::new();
        let id = Uuid::new_v4();
        m.register(id, "tx-abc");
        assert_eq!(m.tx_ref(id), Some("tx-abc"));
        m.deregister(id);
        assert_eq!(m.tx_ref(id), None);
    }
}
