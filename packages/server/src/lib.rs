// Interview Drive Engine - Core
//
// Schedules interviews for hiring drives, keeps participant statuses and
// outcomes current, and runs the deferred work that re-triggers scheduling.
//
// Pure engines live in domains/drives/machines; everything with I/O goes
// through kernel::ServerDeps.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
