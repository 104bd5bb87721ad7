//! Durable connector state.
//!
//! The platform stores one JSON object per connector. The harness owns the
//! `last_run` key; everything else is opaque passthrough for pipeline
//! cursors, preserved across runs.

use courier_core::error::{CourierError, CourierResult};
use serde_json::{Map, Value};

pub const STATE_LAST_RUN: &str = "last_run";

/// Connector state as a JSON object with typed access to `last_run`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorState {
    inner: Map<String, Value>,
}

impl ConnectorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// From the platform's stored value. `None` means a first run; anything
    /// other than a JSON object is corrupt state.
    pub fn from_value(value: Option<Value>) -> CourierResult<Self> {
        match value {
            None => Ok(Self::default()),
            Some(Value::Object(inner)) => Ok(Self { inner }),
            Some(other) => Err(CourierError::State(format!(
                "Stored state must be a JSON object, got: {other}"
            ))),
        }
    }

    /// Unix timestamp of the last successful run, if any.
    pub fn last_run(&self) -> Option<u64> {
        self.inner.get(STATE_LAST_RUN).and_then(Value::as_u64)
    }

    pub fn stamp_last_run(&mut self, timestamp: u64) {
        self.inner
            .insert(STATE_LAST_RUN.to_string(), Value::from(timestamp));
    }

    /// Overlays a pipeline's state delta. Existing keys the delta does not
    /// mention are preserved.
    pub fn merge(&mut self, delta: Map<String, Value>) {
        for (key, value) in delta {
            self.inner.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_state_means_first_run() {
        let state = ConnectorState::from_value(None).unwrap();
        assert!(state.is_empty());
        assert_eq!(state.last_run(), None);
    }

    #[test]
    fn non_object_state_is_rejected() {
        assert!(ConnectorState::from_value(Some(json!("last_run=5"))).is_err());
        assert!(ConnectorState::from_value(Some(json!([1, 2]))).is_err());
    }

    #[test]
    fn merge_overlays_and_preserves_unknown_keys() {
        let mut state = ConnectorState::from_value(Some(json!({
            "last_run": 1_700_000_000_u64,
            "cursor": "page-3",
            "etag": "abc",
        })))
        .unwrap();

        let delta = match json!({ "cursor": "page-4" }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        state.merge(delta);
        state.stamp_last_run(1_700_000_600);

        assert_eq!(state.get("cursor").unwrap(), "page-4");
        assert_eq!(state.get("etag").unwrap(), "abc");
        assert_eq!(state.last_run(), Some(1_700_000_600));
    }

    #[test]
    fn last_run_ignores_non_numeric_values() {
        let state =
            ConnectorState::from_value(Some(json!({ "last_run": "yesterday" }))).unwrap();
        assert_eq!(state.last_run(), None);
    }
}
