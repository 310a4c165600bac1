// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Admission decisions for the two-tier quota

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use idol_name_proxy::quota::{
    local_day_start, prune, DenialReason, QuotaConfig, QuotaDecision, QuotaTracker,
    StoredTimestamp,
};

fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn at(hour: u32, minute: u32, second: u32) -> DateTime<FixedOffset> {
    kst()
        .with_ymd_and_hms(2025, 3, 14, hour, minute, second)
        .unwrap()
}

fn stored(times: &[DateTime<FixedOffset>]) -> Vec<StoredTimestamp> {
    times
        .iter()
        .map(|t| StoredTimestamp::from(t.with_timezone(&Utc)))
        .collect()
}

fn tracker() -> QuotaTracker {
    QuotaTracker::new(QuotaConfig::default())
}

#[cfg(test)]
mod tracker_scenario_tests {
    use super::*;

    #[test]
    fn test_first_call_is_admitted_and_recorded() {
        let now = at(15, 0, 0);
        let outcome = tracker().check("web-user", &now, &[]);

        assert_eq!(outcome.decision, QuotaDecision::Admitted);
        assert_eq!(outcome.records, vec![now.with_timezone(&Utc)]);
        assert!(outcome.needs_write());

        let just_after_midnight = at(0, 0, 1);
        let outcome = tracker().check("web-user", &just_after_midnight, &[]);
        assert_eq!(outcome.records, vec![just_after_midnight.with_timezone(&Utc)]);
    }

    #[test]
    fn test_three_recent_calls_block_the_fourth() {
        let now = at(15, 0, 0);
        let recent = vec![now - Duration::seconds(5); 3];
        let outcome = tracker().check("web-user", &now, &stored(&recent));

        assert_eq!(
            outcome.decision,
            QuotaDecision::Denied {
                reason: DenialReason::ShortWindowExceeded,
                retry_after_secs: 55,
            }
        );
        assert_eq!(outcome.records.len(), 3);
        assert!(!outcome.needs_write());
    }

    #[test]
    fn test_calls_older_than_the_window_do_not_count() {
        let now = at(15, 0, 0);
        let spaced = vec![
            now - Duration::seconds(61),
            now - Duration::seconds(60),
            now - Duration::seconds(30),
        ];
        let outcome = tracker().check("web-user", &now, &stored(&spaced));

        // Exactly 60 seconds old is outside the window
        assert!(outcome.decision.is_admitted());
        assert_eq!(outcome.records.len(), 4);
    }

    #[test]
    fn test_ten_calls_today_block_the_eleventh() {
        let now = at(15, 0, 0);
        let earlier: Vec<_> = (0..10).map(|i| at(9, i * 5, 0)).collect();
        let outcome = tracker().check("web-user", &now, &stored(&earlier));

        assert_eq!(
            outcome.decision,
            QuotaDecision::Denied {
                reason: DenialReason::DailyWindowExceeded,
                // Until 00:00 on the 15th
                retry_after_secs: 9 * 3600,
            }
        );
    }

    #[test]
    fn test_short_window_is_reported_before_daily() {
        let now = at(15, 0, 0);
        let mut calls: Vec<_> = (0..7).map(|i| at(10, i, 0)).collect();
        calls.extend(vec![now - Duration::seconds(10); 3]);
        let outcome = tracker().check("web-user", &now, &stored(&calls));

        assert_eq!(
            outcome.decision.reason(),
            Some(DenialReason::ShortWindowExceeded)
        );
    }

    #[test]
    fn test_daily_count_resets_after_local_midnight() {
        let yesterday: Vec<_> = (0..10)
            .map(|i| at(23, 50, 0) - Duration::days(1) + Duration::seconds(i * 30))
            .collect();
        let just_after_midnight = at(0, 0, 5);
        let outcome = tracker().check("web-user", &just_after_midnight, &stored(&yesterday));

        assert!(outcome.decision.is_admitted());
        assert_eq!(outcome.pruned, 10);
        assert_eq!(outcome.records, vec![just_after_midnight.with_timezone(&Utc)]);
    }

    #[test]
    fn test_denied_call_still_drops_stale_records() {
        let now = at(15, 0, 0);
        let mut calls = vec![now - Duration::seconds(1); 3];
        calls.push(at(8, 0, 0) - Duration::days(2));
        let mut records = stored(&calls);
        records.push(StoredTimestamp::Text("not a time".to_string()));

        let outcome = tracker().check("web-user", &now, &records);
        assert!(!outcome.decision.is_admitted());
        assert_eq!(outcome.pruned, 2);
        assert_eq!(outcome.records.len(), 3);
        assert!(outcome.needs_write());
    }

    #[test]
    fn test_prune_is_idempotent() {
        let now = at(12, 0, 0);
        let records: Vec<DateTime<Utc>> = [
            at(0, 0, 0),
            at(0, 0, 1),
            at(11, 59, 0),
            at(18, 0, 0) - Duration::days(1),
        ]
        .iter()
        .map(|t| t.with_timezone(&Utc))
        .collect();

        let once = prune(&now, &records);
        let twice = prune(&now, &once);
        assert_eq!(once, twice);
        // Midnight itself belongs to the previous day's records
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_day_start_follows_the_clock_time_zone() {
        // 23:30 UTC on the 13th is already the 14th in Seoul
        let utc_now = Utc.with_ymd_and_hms(2025, 3, 13, 23, 30, 0).unwrap();
        let seoul_now = utc_now.with_timezone(&kst());

        assert_eq!(
            local_day_start(&utc_now),
            Utc.with_ymd_and_hms(2025, 3, 13, 0, 0, 0).unwrap()
        );
        assert_eq!(
            local_day_start(&seoul_now),
            Utc.with_ymd_and_hms(2025, 3, 13, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_custom_limits_are_enforced() {
        let tracker = QuotaTracker::new(QuotaConfig {
            short_window_seconds: 10,
            short_window_limit: 1,
            daily_limit: 2,
        });
        let now = at(15, 0, 0);

        let outcome = tracker.check("alice", &now, &stored(&[now - Duration::seconds(4)]));
        assert_eq!(
            outcome.decision,
            QuotaDecision::Denied {
                reason: DenialReason::ShortWindowExceeded,
                retry_after_secs: 6,
            }
        );

        let outcome = tracker.check(
            "alice",
            &now,
            &stored(&[at(9, 0, 0), at(10, 0, 0)]),
        );
        assert_eq!(
            outcome.decision.reason(),
            Some(DenialReason::DailyWindowExceeded)
        );
    }
}
