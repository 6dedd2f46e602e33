//! Execution resources for scan runs.
//!
//! Two independent bounds apply to every check execution:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ConcurrencyLimiter (one per run, size = max_workers)        │
//! │  Held for the whole check, including normalization          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BlockingPool (one per run, scoped per service)              │
//! │  Held while the synchronous check body runs                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The limiter is released as soon as a timed-out check is abandoned. The
//! pool slot stays occupied until the blocking closure actually returns, so
//! check bodies that ignore cancellation still count against the ceiling.

mod limiter;
mod pool;

pub use limiter::{ConcurrencyLimiter, LimiterError, LimiterPermit};
pub use pool::{BlockingPool, PoolError, PoolSlot};
