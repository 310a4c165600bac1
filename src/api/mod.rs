// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod service;

pub use errors::{ApiError, ErrorResponse, MISSING_API_KEY_MESSAGE, PARSE_FAILURE_MESSAGE};
pub use handlers::{HealthResponse, SuggestNamesRequest, SuggestNamesResponse};
pub use http_server::{create_app, start_server, AppState};
pub use service::NameSuggestionService;
