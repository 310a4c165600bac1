// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Method handling, CORS, and health route tests

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use idol_name_proxy::{api::create_app, config::ProxyConfig, generation::GeminiConfig, AppState};
use serde_json::{json, Value};
use tower::util::ServiceExt;

fn unconfigured_app() -> Router {
    create_app(AppState::from_config(&ProxyConfig::default()).unwrap())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[cfg(test)]
mod method_routing_tests {
    use super::*;

    #[tokio::test]
    async fn test_plain_options_returns_ok_message() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/ai")
            .body(Body::empty())
            .unwrap();

        let response = unconfigured_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"message": "OK"}));
    }

    #[tokio::test]
    async fn test_cors_preflight_advertises_policy() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/ai")
            .header(header::ORIGIN, "https://idol-name.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,authorization")
            .body(Body::empty())
            .unwrap();

        let response = unconfigured_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        assert_eq!(headers.get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "86400");
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
    }

    #[tokio::test]
    async fn test_get_on_suggest_route_is_method_not_allowed() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/ai")
            .header(header::ORIGIN, "https://idol-name.example")
            .body(Body::empty())
            .unwrap();

        let response = unconfigured_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );

        let body = json_body(response).await;
        assert_eq!(body["error"], "Method not allowed");
        assert_eq!(body["errorType"], "method_not_allowed");
    }

    #[tokio::test]
    async fn test_put_and_delete_are_method_not_allowed() {
        for method in [Method::PUT, Method::DELETE] {
            let request = Request::builder()
                .method(method)
                .uri("/api/ai")
                .body(Body::empty())
                .unwrap();

            let response = unconfigured_app().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn test_health_reports_model_configuration() {
        let request = || {
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())
                .unwrap()
        };

        let response = unconfigured_app().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_configured"], false);

        let config = ProxyConfig {
            gemini: Some(GeminiConfig::new("test-key")),
            ..Default::default()
        };
        let app = create_app(AppState::from_config(&config).unwrap());
        let body = json_body(app.oneshot(request()).await.unwrap()).await;
        assert_eq!(body["model_configured"], true);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/other")
            .body(Body::empty())
            .unwrap();

        let response = unconfigured_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
