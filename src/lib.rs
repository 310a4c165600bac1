// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod generation;
pub mod identity;
pub mod quota;
pub mod storage;
pub mod version;

pub use api::{create_app, AppState, NameSuggestionService};
pub use bootstrap::{shared_state, BootstrapError};
pub use config::ProxyConfig;
pub use extraction::NameSuggestion;
pub use quota::{QuotaConfig, QuotaTracker};
