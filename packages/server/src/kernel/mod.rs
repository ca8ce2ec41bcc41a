//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod notifications;
pub mod test_dependencies;
pub mod traits;

pub use deps::{connect, ServerDeps};
pub use notifications::{LoggingNotifier, NotificationDispatcher};
pub use test_dependencies::TestDependencies;
pub use traits::*;
