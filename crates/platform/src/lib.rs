//! Platform API abstraction and the OpenCTI GraphQL client.

pub mod graphql;

use courier_core::CourierResult;

pub use graphql::OpenCtiClient;

/// Abstraction over the platform calls the runtime needs.
///
/// Everything a connector shell asks of OpenCTI: liveness, durable connector
/// state, and the work lifecycle around each run.
#[async_trait::async_trait]
pub trait PlatformApi: Send + Sync {
    /// Returns the platform version if the API is reachable.
    async fn health_check(&self) -> CourierResult<String>;

    /// Durable connector state stored by the platform, if any.
    async fn connector_state(
        &self,
        connector_id: &str,
    ) -> CourierResult<Option<serde_json::Value>>;

    /// Replaces the stored connector state.
    async fn set_connector_state(
        &self,
        connector_id: &str,
        state: &serde_json::Value,
    ) -> CourierResult<()>;

    /// Opens a work item for one run; returns its id.
    async fn initiate_work(
        &self,
        connector_id: &str,
        friendly_name: &str,
    ) -> CourierResult<String>;

    /// Closes a work item as successfully processed.
    async fn work_to_processed(&self, work_id: &str, message: &str) -> CourierResult<()>;

    /// Closes a work item as failed.
    async fn work_to_failed(&self, work_id: &str, message: &str) -> CourierResult<()>;
}
