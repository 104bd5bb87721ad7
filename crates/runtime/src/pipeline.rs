//! The pipeline seam.
//!
//! A [`Pipeline`] is the unit of work the harness runs each cycle. Business
//! logic (feed fetching, enrichment, bundle construction) plugs in here; the
//! shell ships only [`Heartbeat`], which does nothing but prove the loop.

use crate::state::ConnectorState;
use courier_core::config::ConnectorConfig;
use courier_core::CourierResult;
use serde_json::{Map, Value};

/// Everything a pipeline may read during one run.
pub struct RunContext<'a> {
    pub config: &'a ConnectorConfig,
    pub work_id: &'a str,
    pub state: &'a ConnectorState,
}

/// What a pipeline hands back: a completion message for the work item and a
/// state delta to overlay on the stored state.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub message: String,
    pub state_delta: Map<String, Value>,
}

impl PipelineOutcome {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            state_delta: Map::new(),
        }
    }

    pub fn with_state(mut self, key: impl Into<String>, value: Value) -> Self {
        self.state_delta.insert(key.into(), value);
        self
    }
}

#[async_trait::async_trait]
pub trait Pipeline: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, ctx: RunContext<'_>) -> CourierResult<PipelineOutcome>;
}

/// No-op pipeline: records that the cycle ran and nothing else.
pub struct Heartbeat;

#[async_trait::async_trait]
impl Pipeline for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    async fn execute(&self, ctx: RunContext<'_>) -> CourierResult<PipelineOutcome> {
        tracing::debug!(work_id = ctx.work_id, "heartbeat cycle");
        Ok(PipelineOutcome::message("heartbeat: no pipeline configured"))
    }
}
