// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the idol name proxy

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "gemini-generation",
    "short-window-quota",
    "daily-quota",
    "jwt-identity",
    "file-call-records",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Idol Name Proxy v{} [{}]", VERSION_NUMBER, FEATURES.join(", "))
}
