//! GraphQL client for the OpenCTI platform API.
//!
//! Speaks the same operations the official connector helper uses: an
//! `about` liveness query, connector state read/write via ping, and the
//! work lifecycle mutations. Authentication is a bearer token; an optional
//! HTTP(S)/SOCKS proxy is applied to every request.

use crate::PlatformApi;
use courier_core::config::{OpenCtiSettings, ProxySettings};
use courier_core::error::{CourierError, CourierResult};
use serde::Deserialize;
use url::Url;

const QUERY_ABOUT: &str = r#"
query CourierAbout {
  about { version }
}"#;

const QUERY_CONNECTOR_STATE: &str = r#"
query CourierConnectorState($id: String!) {
  connector(id: $id) { id connector_state }
}"#;

const MUTATION_PING_CONNECTOR: &str = r#"
mutation CourierPingConnector($id: ID!, $state: String) {
  pingConnector(id: $id, state: $state) { id connector_state }
}"#;

const MUTATION_WORK_ADD: &str = r#"
mutation CourierWorkAdd($connectorId: String!, $friendlyName: String) {
  workAdd(connectorId: $connectorId, friendlyName: $friendlyName) { id }
}"#;

const MUTATION_WORK_TO_PROCESSED: &str = r#"
mutation CourierWorkToProcessed($id: ID!, $message: String, $inError: Boolean) {
  workEdit(id: $id) { toProcessed(message: $message, inError: $inError) }
}"#;

/// Client for one OpenCTI instance.
///
/// ```ignore
/// let client = OpenCtiClient::connect(&config.opencti, config.proxy.as_ref())?;
/// let version = client.health_check().await?;
/// ```
pub struct OpenCtiClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl OpenCtiClient {
    /// Builds the HTTP client (bearer auth, optional proxy) and resolves the
    /// `/graphql` endpoint. Does not hit the network; call
    /// [`PlatformApi::health_check`] for that.
    pub fn connect(
        settings: &OpenCtiSettings,
        proxy: Option<&ProxySettings>,
    ) -> CourierResult<Self> {
        let endpoint = settings.url.join("graphql").map_err(|e| {
            CourierError::Platform(format!("Invalid platform URL {}: {e}", settings.url))
        })?;

        let mut headers = reqwest::header::HeaderMap::new();
        let mut auth = reqwest::header::HeaderValue::from_str(&format!(
            "Bearer {}",
            settings.token
        ))
        .map_err(|e| CourierError::Platform(format!("Invalid platform token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);

        if let Some(p) = proxy {
            let proxy = reqwest::Proxy::all(p.proxy_url()).map_err(|e| {
                CourierError::Platform(format!("Invalid proxy configuration: {e}"))
            })?;
            builder = builder.proxy(proxy);
            tracing::info!(
                protocol = p.protocol.scheme(),
                ip = %p.ip,
                port = p.port,
                "outbound proxy enabled"
            );
        }

        let http = builder
            .build()
            .map_err(|e| CourierError::Platform(format!("Failed to build HTTP client: {e}")))?;

        tracing::info!(endpoint = %endpoint, "platform client ready");

        Ok(Self { http, endpoint })
    }

    /// Executes one GraphQL document and returns the `data` payload.
    async fn execute(
        &self,
        document: &str,
        variables: serde_json::Value,
    ) -> CourierResult<serde_json::Value> {
        let body = serde_json::json!({
            "query": document,
            "variables": variables,
        });

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| CourierError::Platform(format!("Platform request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::Platform(format!(
                "Platform returned HTTP {status}"
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|e| CourierError::Platform(format!("Failed to read response: {e}")))?;

        decode_envelope(&raw)
    }
}

// ---------------------------------------------------------------------------
// Envelope decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<serde_json::Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// Decodes a GraphQL response body: `errors` wins over `data`.
fn decode_envelope(raw: &str) -> CourierResult<serde_json::Value> {
    let envelope: Envelope = serde_json::from_str(raw)
        .map_err(|e| CourierError::Platform(format!("Malformed platform response: {e}")))?;

    if let Some(errors) = envelope.errors {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CourierError::Platform(format!("Platform error: {joined}")));
    }

    envelope
        .data
        .ok_or_else(|| CourierError::Platform("Platform response had no data".into()))
}

/// The platform stores connector state as a JSON-encoded string; decode it
/// back into a value. Null/empty means no state yet.
fn decode_state(node: &serde_json::Value) -> CourierResult<Option<serde_json::Value>> {
    match node {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => serde_json::from_str(s)
            .map(Some)
            .map_err(|e| CourierError::State(format!("Stored state is not valid JSON: {e}"))),
        other => Err(CourierError::State(format!(
            "Unexpected connector_state shape: {other}"
        ))),
    }
}

#[async_trait::async_trait]
impl PlatformApi for OpenCtiClient {
    async fn health_check(&self) -> CourierResult<String> {
        let data = self
            .execute(QUERY_ABOUT, serde_json::json!({}))
            .await?;

        let version = data["about"]["version"]
            .as_str()
            .ok_or_else(|| CourierError::Platform("about.version missing".into()))?
            .to_string();

        tracing::info!(version = %version, "platform healthy");
        Ok(version)
    }

    async fn connector_state(
        &self,
        connector_id: &str,
    ) -> CourierResult<Option<serde_json::Value>> {
        let data = self
            .execute(
                QUERY_CONNECTOR_STATE,
                serde_json::json!({ "id": connector_id }),
            )
            .await?;

        decode_state(&data["connector"]["connector_state"])
    }

    async fn set_connector_state(
        &self,
        connector_id: &str,
        state: &serde_json::Value,
    ) -> CourierResult<()> {
        let encoded = serde_json::to_string(state)
            .map_err(|e| CourierError::State(format!("Failed to encode state: {e}")))?;

        self.execute(
            MUTATION_PING_CONNECTOR,
            serde_json::json!({ "id": connector_id, "state": encoded }),
        )
        .await?;

        tracing::debug!(connector_id, "state stored");
        Ok(())
    }

    async fn initiate_work(
        &self,
        connector_id: &str,
        friendly_name: &str,
    ) -> CourierResult<String> {
        let data = self
            .execute(
                MUTATION_WORK_ADD,
                serde_json::json!({
                    "connectorId": connector_id,
                    "friendlyName": friendly_name,
                }),
            )
            .await?;

        let work_id = data["workAdd"]["id"]
            .as_str()
            .ok_or_else(|| CourierError::Platform("workAdd returned no id".into()))?
            .to_string();

        tracing::debug!(work_id = %work_id, friendly_name, "work initiated");
        Ok(work_id)
    }

    async fn work_to_processed(&self, work_id: &str, message: &str) -> CourierResult<()> {
        self.execute(
            MUTATION_WORK_TO_PROCESSED,
            serde_json::json!({ "id": work_id, "message": message, "inError": false }),
        )
        .await?;
        Ok(())
    }

    async fn work_to_failed(&self, work_id: &str, message: &str) -> CourierResult<()> {
        self.execute(
            MUTATION_WORK_TO_PROCESSED,
            serde_json::json!({ "id": work_id, "message": message, "inError": true }),
        )
        .await?;
        Ok(())
    }
}
