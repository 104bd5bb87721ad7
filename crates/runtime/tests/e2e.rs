//! E2E integration tests — require a live OpenCTI instance.
//!
//! Run: `OPENCTI_URL=http://... OPENCTI_TOKEN=... cargo test -p courier-runtime -- --ignored`

use courier_core::config::{OpenCtiSettings, Resolver};
use courier_platform::{OpenCtiClient, PlatformApi};
use std::collections::HashMap;

fn settings_from_env() -> OpenCtiSettings {
    let env: HashMap<String, String> = std::env::vars().collect();
    let resolver = Resolver::new(env, serde_yaml::Value::Null);
    OpenCtiSettings {
        url: resolver
            .require("opencti.url")
            .expect("Set OPENCTI_URL to run E2E tests")
            .parse()
            .expect("OPENCTI_URL must be a URL"),
        token: resolver
            .require("opencti.token")
            .expect("Set OPENCTI_TOKEN to run E2E tests"),
    }
}

#[tokio::test]
#[ignore]
async fn health_check_against_live_platform() {
    let client = OpenCtiClient::connect(&settings_from_env(), None).expect("client build");

    let version = client.health_check().await.expect("health check failed");
    assert!(!version.is_empty());
    eprintln!("[e2e] platform version: {version}");
}

#[tokio::test]
#[ignore]
async fn work_lifecycle_round_trip() {
    let connector_id =
        std::env::var("CONNECTOR_ID").expect("Set CONNECTOR_ID to run E2E tests");
    let client = OpenCtiClient::connect(&settings_from_env(), None).expect("client build");

    let work_id = client
        .initiate_work(&connector_id, "courier e2e run")
        .await
        .expect("initiate_work failed");
    assert!(!work_id.is_empty());
    eprintln!("[e2e] opened work {work_id}");

    client
        .work_to_processed(&work_id, "courier e2e: closed")
        .await
        .expect("work_to_processed failed");
    eprintln!("[e2e] closed work {work_id}");
}

#[tokio::test]
#[ignore]
async fn connector_state_round_trip() {
    let connector_id =
        std::env::var("CONNECTOR_ID").expect("Set CONNECTOR_ID to run E2E tests");
    let client = OpenCtiClient::connect(&settings_from_env(), None).expect("client build");

    let marker = serde_json::json!({ "courier_e2e": true, "last_run": 1 });
    client
        .set_connector_state(&connector_id, &marker)
        .await
        .expect("set_connector_state failed");

    let stored = client
        .connector_state(&connector_id)
        .await
        .expect("connector_state failed")
        .expect("state should exist after write");
    assert_eq!(stored["courier_e2e"], true);
    eprintln!("[e2e] state round-trip ok");
}
