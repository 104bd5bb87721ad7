//! Scheduler harness, connector state, pipeline seam, and run auditing.

pub mod audit;
pub mod pipeline;
pub mod scheduler;
pub mod state;

pub use audit::{AuditSink, RunRow};
pub use pipeline::{Heartbeat, Pipeline, PipelineOutcome, RunContext};
pub use scheduler::Harness;
pub use state::ConnectorState;
