//! Interview drives: scheduling, live statuses and outcomes.
//!
//! `models` and `machines` are pure. `actions` are the public operations and
//! own the load/apply/save cycle; `effects` and `jobs` hold everything that
//! happens after a write.

pub mod actions;
pub mod effects;
pub mod jobs;
pub mod machines;
pub mod models;
pub mod store;

#[cfg(test)]
pub mod testing;
