// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Call records as they come back from the document store
//!
//! Older documents hold a mix of native timestamp objects, epoch millis and
//! strings. Everything is normalized to `DateTime<Utc>` before counting.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Native timestamp object, as written by document stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTimestamp {
    #[serde(alias = "_seconds")]
    pub seconds: i64,
    #[serde(default, alias = "_nanoseconds")]
    pub nanos: u32,
}

/// A single stored call record in whichever shape the store returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredTimestamp {
    Native(NativeTimestamp),
    Millis(i64),
    Text(String),
    Unrecognized(serde_json::Value),
}

impl StoredTimestamp {
    /// Coerce to a UTC instant. `None` means the entry is unusable and
    /// counts as already expired.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            StoredTimestamp::Native(ts) => Utc.timestamp_opt(ts.seconds, ts.nanos).single(),
            StoredTimestamp::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            StoredTimestamp::Text(text) => parse_text(text),
            StoredTimestamp::Unrecognized(_) => None,
        }
    }
}

impl From<DateTime<Utc>> for StoredTimestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        StoredTimestamp::Native(NativeTimestamp {
            seconds: ts.timestamp(),
            nanos: ts.timestamp_subsec_nanos(),
        })
    }
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    if let Ok(ms) = text.parse::<i64>() {
        return Utc.timestamp_millis_opt(ms).single();
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Normalize a stored list, dropping entries that cannot be read
pub fn normalize(stored: &[StoredTimestamp]) -> Vec<DateTime<Utc>> {
    stored.iter().filter_map(StoredTimestamp::to_datetime).collect()
}
