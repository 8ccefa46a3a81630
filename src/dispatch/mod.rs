//! Per-user serialization and command dispatch

pub mod dispatcher;
pub mod locks;
pub mod queue;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use locks::{LockStats, SectionGuard, UserLocks, UserTicket};
pub use queue::{spawn_workers, BackgroundJob, BackgroundQueue, JobReceiver};
