//! Polling harness: runs the pipeline on the configured cadence.
//!
//! Each cycle: load state -> initiate work -> pipeline -> merge + store
//! state -> close work. A pipeline failure marks the work item failed and
//! the loop continues; state is only written after a successful run. SIGINT
//! is honored between cycles, so an in-flight run always completes.

use crate::audit::{iso8601, AuditSink, RunRow};
use crate::pipeline::{Pipeline, RunContext};
use crate::state::ConnectorState;
use courier_core::config::ConnectorConfig;
use courier_core::error::{CourierError, CourierResult};
use courier_platform::PlatformApi;
use std::io::Write;
use std::time::{Duration, Instant, SystemTime};

/// Seconds until the next run is due.
///
/// First run (no `last_run`) is immediate. A `last_run` in the future
/// (platform clock skew, restored backup) clamps to one full interval
/// instead of sleeping for years.
fn seconds_until_due(now: u64, last_run: Option<u64>, run_every: u64) -> u64 {
    match last_run {
        None => 0,
        Some(last) if last > now => run_every,
        Some(last) => run_every.saturating_sub(now - last),
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// The connector harness: owns the platform client, the pipeline, and the
/// optional audit sink.
pub struct Harness {
    config: ConnectorConfig,
    platform: Box<dyn PlatformApi>,
    pipeline: Box<dyn Pipeline>,
    audit: Option<AuditSink<Box<dyn Write + Send>>>,
}

impl Harness {
    pub fn new(
        config: ConnectorConfig,
        platform: Box<dyn PlatformApi>,
        pipeline: Box<dyn Pipeline>,
    ) -> Self {
        Self {
            config,
            platform,
            pipeline,
            audit: None,
        }
    }

    /// Attach an NDJSON audit sink; one row is written per cycle.
    pub fn with_audit(mut self, sink: AuditSink<Box<dyn Write + Send>>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// Main loop. With `once`, runs a single cycle and returns.
    pub async fn run(&mut self, once: bool) -> CourierResult<()> {
        let version = self.platform.health_check().await?;
        tracing::info!(
            platform_version = %version,
            connector = %self.config.connector.name,
            kind = %self.config.connector.kind,
            pipeline = self.pipeline.name(),
            run_every = %self.config.connector.run_every,
            "harness starting"
        );

        let run_every = self.config.connector.run_every.as_secs();
        let state = self.load_state().await?;
        let mut wait = seconds_until_due(unix_now(), state.last_run(), run_every);

        loop {
            if wait > 0 && !once {
                tracing::info!(seconds = wait, "sleeping until next run");
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(wait)) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("shutdown requested, stopping");
                        break;
                    }
                }
            }

            let row = self.cycle().await;
            if let Some(sink) = self.audit.as_mut() {
                sink.write_row(&row)
                    .map_err(|e| CourierError::Internal(format!("Audit write failed: {e}")))?;
            }

            if once {
                break;
            }
            wait = run_every;
        }

        if let Some(sink) = self.audit.take() {
            let rows = sink
                .finish()
                .map_err(|e| CourierError::Internal(format!("Audit flush failed: {e}")))?;
            tracing::info!(rows, "audit sink closed");
        }

        Ok(())
    }

    /// One full cycle. Errors are folded into the returned row so the loop
    /// never dies on a bad run.
    async fn cycle(&mut self) -> RunRow {
        let started = unix_now();
        let t0 = Instant::now();
        let friendly_name = format!(
            "{} run @ {}",
            self.config.connector.name,
            iso8601(started)
        );
        tracing::info!(run = %friendly_name, "starting run");

        let mut row = RunRow {
            connector_id: self.config.connector.id.clone(),
            connector_name: self.config.connector.name.clone(),
            work_id: None,
            status: "failed".to_string(),
            message: String::new(),
            started_at: iso8601(started),
            duration_ms: 0,
        };

        let result = self.try_cycle(started, &friendly_name, &mut row).await;
        row.duration_ms = t0.elapsed().as_millis() as u64;

        match result {
            Ok(()) => {
                row.status = "processed".to_string();
                tracing::info!(
                    work_id = row.work_id.as_deref().unwrap_or("-"),
                    elapsed_ms = row.duration_ms,
                    "run complete"
                );
            }
            Err(e) => {
                row.message = e.to_string();
                tracing::error!(error = %e, elapsed_ms = row.duration_ms, "run failed");

                // Best-effort: don't strand the work item.
                if let Some(work_id) = row.work_id.clone() {
                    if let Err(close_err) =
                        self.platform.work_to_failed(&work_id, &row.message).await
                    {
                        tracing::warn!(
                            work_id = %work_id,
                            error = %close_err,
                            "failed to mark work as failed"
                        );
                    }
                }
            }
        }

        row
    }

    async fn try_cycle(
        &mut self,
        started: u64,
        friendly_name: &str,
        row: &mut RunRow,
    ) -> CourierResult<()> {
        let connector_id = self.config.connector.id.clone();

        let mut state = self.load_state().await?;
        tracing::info!(state = %state.to_value(), "loaded state");

        let work_id = self
            .platform
            .initiate_work(&connector_id, friendly_name)
            .await?;
        row.work_id = Some(work_id.clone());

        let outcome = self
            .pipeline
            .execute(RunContext {
                config: &self.config,
                work_id: &work_id,
                state: &state,
            })
            .await?;

        state.merge(outcome.state_delta);
        state.stamp_last_run(started);
        tracing::info!(state = %state.to_value(), "storing new state");
        self.platform
            .set_connector_state(&connector_id, &state.to_value())
            .await?;

        let message = format!(
            "{} connector successfully run: {}",
            self.config.connector.name, outcome.message
        );
        self.platform.work_to_processed(&work_id, &message).await?;
        row.message = message;

        Ok(())
    }

    async fn load_state(&self) -> CourierResult<ConnectorState> {
        let value = self.platform.connector_state(&self.config.connector.id).await?;
        ConnectorState::from_value(value)
    }
}
