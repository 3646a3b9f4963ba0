//! Rule document handlers.

use crate::admin_api::types::*;
use crate::error::StoreError;
use crate::rules::RuleDocument;
use crate::store::RuleStore;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use tracing::{error, info};

/// GET /config - the current rule document
pub async fn handle_get(store: &dyn RuleStore) -> Response<Full<Bytes>> {
    match store.load().await {
        Ok(document) => json_response(StatusCode::OK, &document),
        Err(e) => {
            error!("Failed to load rule document: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// PUT|POST /config - replace the whole rule document
pub async fn handle_replace(store: &dyn RuleStore, body: &[u8]) -> Response<Full<Bytes>> {
    let document: RuleDocument = match serde_json::from_slice(body) {
        Ok(document) => document,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("Invalid JSON: {e}"));
        }
    };

    match store.save(&document).await {
        Ok(()) => {
            info!("Rule document replaced ({} rules)", document.rules.len());
            json_response(
                StatusCode::OK,
                &MessageResponse {
                    message: "Configuration saved successfully".to_string(),
                },
            )
        }
        Err(StoreError::Validation(issues)) => json_response(
            StatusCode::BAD_REQUEST,
            &ValidationErrorResponse {
                message: "Invalid configuration data".to_string(),
                errors: issues,
            },
        ),
        Err(e) => {
            error!("Failed to save rule document: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::store::InMemoryRuleStore;
    use http_body_util::BodyExt;

    async fn body_json(resp: Response<Full<Bytes>>) -> serde_json::Value {
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_replace_then_get() {
        let store = InMemoryRuleStore::default();
        let body = br#"{"rules":[{"id":"r1","sourceUrlPrefix":"https://example.com/models/","localFilePath":"a.bin"}]}"#;

        let resp = handle_replace(&store, body).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = handle_get(&store).await;
        let json = body_json(resp).await;
        assert_eq!(json["rules"][0]["id"], "r1");
        assert_eq!(json["rules"][0]["target"], "a.bin");
        assert_eq!(json["rules"][0]["ignoreQueryParams"], true);
    }

    #[tokio::test]
    async fn test_invalid_rules_are_listed_and_document_kept() {
        let previous = RuleDocument::new(vec![Rule::new("https://example.com/", "keep.bin")]);
        let store = InMemoryRuleStore::new(previous.clone());
        let body = br#"{"rules":[
            {"id":"bad-prefix","sourceUrlPrefix":"not a url","target":"a.bin"},
            {"id":"ok","sourceUrlPrefix":"https://example.com/","target":"b.bin"},
            {"id":"no-target","sourceUrlPrefix":"https://example.com/","target":"  "}
        ]}"#;

        let resp = handle_replace(&store, body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        let errors = json["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0]["ruleId"], "bad-prefix");
        assert_eq!(errors[0]["field"], "sourceUrlPrefix");
        assert_eq!(errors[1]["ruleId"], "no-target");
        assert_eq!(errors[1]["field"], "target");

        assert_eq!(store.load().await.unwrap(), previous);
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let store = InMemoryRuleStore::default();
        let resp = handle_replace(&store, b"{not json").await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["errors"][0]["code"], "400");
    }
}
