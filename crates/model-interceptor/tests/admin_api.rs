//! Management API over real sockets, sharing state with the interceptor.

mod common;

use common::{rule, Harness};
use model_interceptor::config::InterceptMode;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_and_root_links() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;
    let client = harness.direct_client();

    let health = client.get(harness.admin_url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let root: Value = client
        .get(harness.admin_url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(root["_links"]["config"]["href"]
        .as_str()
        .unwrap()
        .ends_with("/config"));
}

#[tokio::test]
async fn test_replaced_rules_apply_to_next_request() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;
    harness.write_content("llama.gguf", b"weights");
    let admin = harness.direct_client();

    let before = harness
        .proxied_client()
        .get("http://example.com/models/llama.gguf")
        .send()
        .await
        .unwrap();
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    let saved = admin
        .put(harness.admin_url("/config"))
        .json(&json!({
            "rules": [{
                "id": "llama",
                "title": "Llama weights",
                "sourceUrlPrefix": "http://example.com/models/",
                "target": "llama.gguf"
            }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);
    let saved: Value = saved.json().await.unwrap();
    assert_eq!(saved["message"], "Configuration saved successfully");

    let document: Value = admin
        .get(harness.admin_url("/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(document["rules"][0]["id"], "llama");
    assert_eq!(document["rules"][0]["ignoreQueryParams"], true);

    let after = harness
        .proxied_client()
        .get("http://example.com/models/llama.gguf")
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(after.bytes().await.unwrap().as_ref(), b"weights");
}

#[tokio::test]
async fn test_invalid_rules_are_rejected_and_not_saved() {
    let harness = Harness::start(
        InterceptMode::Path,
        vec![rule("keep", "http://example.com/models/", "llama.gguf")],
    )
    .await;
    let admin = harness.direct_client();

    let response = admin
        .put(harness.admin_url("/config"))
        .json(&json!({
            "rules": [{ "sourceUrlPrefix": "not a url", "target": "" }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid configuration data");
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);

    let document: Value = admin
        .get(harness.admin_url("/config"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(document["rules"][0]["id"], "keep");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;

    let response = harness
        .direct_client()
        .put(harness.admin_url("/config"))
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logs_list_intercepted_requests() {
    let harness = Harness::start(
        InterceptMode::Path,
        vec![rule("llama", "http://example.com/models/", "llama.gguf")],
    )
    .await;
    harness.write_content("llama.gguf", b"weights");
    let client = harness.proxied_client();

    client
        .get("http://example.com/models/llama.gguf")
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    client
        .get("http://unknown.example/x.bin")
        .send()
        .await
        .unwrap();
    harness.state.journal.flush().await;

    let logs: Vec<Value> = harness
        .direct_client()
        .get(harness.admin_url("/logs"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0]["requestUrl"], "http://unknown.example/x.bin");
    assert_eq!(logs[0]["status"], "error");
    assert_eq!(logs[1]["servedFile"], "llama.gguf");
    assert_eq!(logs[1]["status"], "success");
}

#[tokio::test]
async fn test_suggest_from_log_text() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;
    let client = harness.direct_client();

    let found: Value = client
        .post(harness.admin_url("/suggest"))
        .body("INFO downloading https://hub.example/org/models/llama/weights.bin ...")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found["found"], true);
    assert_eq!(found["suggestedRule"], "https://hub.example/org/models/llama/");

    let missing: Value = client
        .post(harness.admin_url("/suggest"))
        .body("nothing to see here")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing["found"], false);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;
    harness
        .proxied_client()
        .get("http://unknown.example/x.bin")
        .send()
        .await
        .unwrap();

    let response = harness
        .direct_client()
        .get(harness.admin_url("/metrics"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("interceptor_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_and_wrong_method() {
    let harness = Harness::start(InterceptMode::Path, vec![]).await;
    let client = harness.direct_client();

    let missing = client.get(harness.admin_url("/nope")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let wrong = client.delete(harness.admin_url("/config")).send().await.unwrap();
    assert_eq!(wrong.status(), StatusCode::METHOD_NOT_ALLOWED);
}
