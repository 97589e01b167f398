//! C7 Execution Planner/Executor: turns a `RiskAction` into an
//! `ExecutionPlan`, tracks each order through its DEX lifecycle, and
//! classifies errors for retry.

pub mod id_map;
pub mod plan_builder;
pub mod retry;
pub mod state_machine;
