// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, HealthResponse, NameSuggestionService, SuggestNamesRequest};
use crate::identity::bearer_token;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NameSuggestionService>,
}

impl AppState {
    pub fn new(service: NameSuggestionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/ai",
            post(suggest_handler)
                .options(preflight_handler)
                .fallback(method_not_allowed_handler),
        )
        .route("/health", get(health_handler))
        // Static CORS headers on every response; OPTIONS reaches the route
        // handler instead of being answered by a preflight middleware
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_ORIGIN,
                    HeaderValue::from_static("*"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type, Authorization, X-Requested-With"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::ACCESS_CONTROL_MAX_AGE,
                    HeaderValue::from_static("86400"),
                )),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Name suggestion proxy listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn suggest_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SuggestNamesRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("[{}] Rejected request body: {}", request_id, rejection);
            return ApiErrorResponse::new(
                ApiError::InvalidRequest(rejection.body_text()),
                request_id,
            )
            .into_response();
        }
    };

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state
        .service
        .suggest(bearer_token(authorization), request)
        .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiErrorResponse::new(e, request_id).into_response(),
    }
}

async fn preflight_handler() -> impl IntoResponse {
    Json(json!({ "message": "OK" }))
}

async fn method_not_allowed_handler(method: Method) -> Response {
    ApiErrorResponse::new(
        ApiError::MethodNotAllowed(method.to_string()),
        Uuid::new_v4().to_string(),
    )
    .into_response()
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_configured: state.service.model_configured(),
    })
}

struct ApiErrorResponse {
    error: ApiError,
    request_id: String,
}

impl ApiErrorResponse {
    fn new(error: ApiError, request_id: String) -> Self {
        Self { error, request_id }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.error.to_response(Some(self.request_id));

        let mut response = (status, Json(body)).into_response();
        if let Some(seconds) = self.error.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
        }
        response
    }
}
