//! Batched, bounded-concurrency scan pipeline.
//!
//! # Architecture
//!
//! ```text
//! ScanRequest
//!   │
//!   ├─ build_context ──✗──► [init_error placeholder]
//!   │
//!   └─ global timeout ┬─ resolve services (explicit grouping | discovery × N, concurrent)
//!                     │
//!                     └─ for each service, in order:
//!                          service timeout ┬─ batch 1: check ∥ check ∥ check
//!                                          ├─ batch 2: check ∥ check
//!                                          └─ ...
//!                          each check: limiter permit → blocking pool → check timeout
//! ```
//!
//! Timeouts nest: a check timeout yields one placeholder for that check, a
//! service timeout replaces the whole service's results with one
//! placeholder, and the global timeout replaces the whole run's results
//! with one placeholder. Each level owns a child cancellation token that is
//! cancelled when its timeout fires, so cooperative checks stop promptly.
//!
//! # Key Components
//!
//! - [`ScanPipeline`] - Runs a request to completion
//! - [`ServiceRegistry`] - Observable map of services currently executing

mod check;
mod registry;
mod runner;
mod service;

pub use registry::{ExecutingService, RegistrationGuard, RunId, ServiceRegistry};
pub use runner::ScanPipeline;
