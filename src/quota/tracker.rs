// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Two-tier call quota per identity (trailing short window + local calendar day)

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::record::{normalize, StoredTimestamp};

/// Longest accepted burst window; records never outlive the local day anyway
pub const MAX_SHORT_WINDOW_SECONDS: u64 = 86_400;

fn default_short_window_seconds() -> u64 {
    60
}

fn default_short_window_limit() -> usize {
    3
}

fn default_daily_limit() -> usize {
    10
}

/// Quota limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Length of the trailing burst window in seconds
    #[serde(default = "default_short_window_seconds")]
    pub short_window_seconds: u64,
    /// Maximum calls inside the burst window
    #[serde(default = "default_short_window_limit")]
    pub short_window_limit: usize,
    /// Maximum calls since local midnight
    #[serde(default = "default_daily_limit")]
    pub daily_limit: usize,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            short_window_seconds: default_short_window_seconds(),
            short_window_limit: default_short_window_limit(),
            daily_limit: default_daily_limit(),
        }
    }
}

/// Which tier rejected the call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    ShortWindowExceeded,
    DailyWindowExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Admitted,
    Denied {
        reason: DenialReason,
        retry_after_secs: u64,
    },
}

impl QuotaDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, QuotaDecision::Admitted)
    }

    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            QuotaDecision::Admitted => None,
            QuotaDecision::Denied { reason, .. } => Some(*reason),
        }
    }
}

/// Result of a quota check: the decision plus the record list to persist
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaOutcome {
    pub decision: QuotaDecision,
    /// Day-pruned records, with `now` appended when admitted
    pub records: Vec<DateTime<Utc>>,
    /// Stored entries dropped by pruning, unreadable ones included
    pub pruned: usize,
}

impl QuotaOutcome {
    /// Whether the stored document differs from `records`
    pub fn needs_write(&self) -> bool {
        self.decision.is_admitted() || self.pruned > 0
    }

    pub fn to_stored(&self) -> Vec<StoredTimestamp> {
        self.records.iter().copied().map(StoredTimestamp::from).collect()
    }
}

/// Stateless quota evaluator. Persistence belongs to the caller.
#[derive(Debug, Clone)]
pub struct QuotaTracker {
    config: QuotaConfig,
}

impl QuotaTracker {
    /// Limits are clamped: the burst window to `1..=MAX_SHORT_WINDOW_SECONDS`
    /// and the burst limit to at least one call.
    pub fn new(mut config: QuotaConfig) -> Self {
        let window = config
            .short_window_seconds
            .clamp(1, MAX_SHORT_WINDOW_SECONDS);
        if window != config.short_window_seconds {
            warn!(
                "Short window of {}s out of range, using {}s",
                config.short_window_seconds, window
            );
            config.short_window_seconds = window;
        }
        if config.short_window_limit == 0 {
            warn!("Short window limit of 0 raised to 1");
            config.short_window_limit = 1;
        }
        Self { config }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Decide whether `identity` may make a call at `now`.
    ///
    /// `now` carries the deployment's time zone; the daily counter resets at
    /// local midnight in that zone.
    pub fn check<Tz: TimeZone>(
        &self,
        identity: &str,
        now: &DateTime<Tz>,
        stored: &[StoredTimestamp],
    ) -> QuotaOutcome {
        let normalized = normalize(stored);
        let mut records = prune(now, &normalized);
        let pruned = stored.len() - records.len();

        let now_utc = now.with_timezone(&Utc);
        let window = i64::try_from(self.config.short_window_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(1));
        let window_start = now_utc - window;

        let mut in_window: Vec<DateTime<Utc>> = records
            .iter()
            .copied()
            .filter(|ts| *ts > window_start)
            .collect();
        let calls_today = records.len();

        debug!(
            "Quota check for {}: {} in short window, {} today, {} pruned",
            identity,
            in_window.len(),
            calls_today,
            pruned
        );

        let decision = if in_window.len() >= self.config.short_window_limit {
            in_window.sort();
            // Oldest call that has to age out before the count drops below the limit
            let blocking = in_window[in_window.len() - self.config.short_window_limit];
            QuotaDecision::Denied {
                reason: DenialReason::ShortWindowExceeded,
                retry_after_secs: ceil_secs(blocking + window - now_utc),
            }
        } else if calls_today >= self.config.daily_limit {
            let retry_after_secs = next_local_day_start(now)
                .map(|next| ceil_secs(next - now_utc))
                .unwrap_or(1);
            QuotaDecision::Denied {
                reason: DenialReason::DailyWindowExceeded,
                retry_after_secs,
            }
        } else {
            records.push(now_utc);
            QuotaDecision::Admitted
        };

        QuotaOutcome {
            decision,
            records,
            pruned,
        }
    }
}

/// Keep only records after the start of `now`'s local calendar day
pub fn prune<Tz: TimeZone>(now: &DateTime<Tz>, records: &[DateTime<Utc>]) -> Vec<DateTime<Utc>> {
    let day_start = local_day_start(now);
    records
        .iter()
        .copied()
        .filter(|ts| *ts > day_start)
        .collect()
}

/// Local midnight of the day containing `now`, as a UTC instant
pub fn local_day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let tz = now.timezone();
    resolve_local_midnight(&tz, now.date_naive())
        // Day without a representable local time at all; fall back to now
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

fn next_local_day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let tz = now.timezone();
    let tomorrow = now.date_naive().succ_opt()?;
    resolve_local_midnight(&tz, tomorrow)
}

/// Earliest valid local instant on `date`. Midnight can fall inside a DST gap,
/// so probe forward in 15 minute steps.
fn resolve_local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=16).find_map(|step| {
        tz.from_local_datetime(&(midnight + Duration::minutes(15 * step)))
            .earliest()
            .map(|ts| ts.with_timezone(&Utc))
    })
}

fn ceil_secs(duration: Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0) as u64;
    ((millis + 999) / 1000).max(1)
}
