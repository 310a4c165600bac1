// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-identity call quota (burst window + daily budget)

pub mod record;
pub mod tracker;

pub use record::{normalize, NativeTimestamp, StoredTimestamp};
pub use tracker::{
    local_day_start, prune, DenialReason, QuotaConfig, QuotaDecision, QuotaOutcome, QuotaTracker,
    MAX_SHORT_WINDOW_SECONDS,
};
