// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-gap session grouping.
//!
//! [`SessionGrouper`] consumes a strictly increasing sequence of timestamps
//! and decides when a new session bucket starts. A bucket stays open while
//! consecutive events arrive within the gap threshold of the bucket's last
//! event; a longer idle period opens a new bucket keyed by the id of the
//! event that opened it.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use keepsake_core::types::{DAY_FORMAT, TIMESTAMP_FORMAT};
use keepsake_core::GrouperError;

/// Default idle gap after which a new bucket starts.
pub const DEFAULT_GAP_SECS: u64 = 600;

/// Signal emitted when an event opens a new bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Day label for the output directory.
    pub day: String,
    /// Id of the event that opened the bucket.
    pub group: i64,
}

/// The bucket currently receiving events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub day: NaiveDate,
    pub group: i64,
    /// Time of the last event folded into this bucket.
    pub end: NaiveDateTime,
}

impl Bucket {
    /// The bucket's own date rendered as a day label.
    pub fn day_label(&self) -> String {
        self.day.format(DAY_FORMAT).to_string()
    }
}

/// State machine partitioning timestamps into session buckets.
#[derive(Debug, Clone)]
pub struct SessionGrouper {
    gap: TimeDelta,
    last_time: Option<NaiveDateTime>,
    bucket: Option<Bucket>,
}

impl Default for SessionGrouper {
    fn default() -> Self {
        Self::with_gap_secs(DEFAULT_GAP_SECS)
    }
}

impl SessionGrouper {
    pub fn new(gap: TimeDelta) -> Self {
        Self {
            gap,
            last_time: None,
            bucket: None,
        }
    }

    pub fn with_gap_secs(secs: u64) -> Self {
        let gap = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self::new(gap)
    }

    /// Parses a `%Y-%m-%d %H-%M-%S` timestamp and feeds it to [`observe`](Self::observe).
    pub fn process(&mut self, timestamp: &str, id: i64) -> Result<Option<Boundary>, GrouperError> {
        let at = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(|e| {
            GrouperError::InvalidTimestamp {
                value: timestamp.to_string(),
                reason: e.to_string(),
            }
        })?;
        self.observe(at, id)
    }

    /// Folds one event into the grouping.
    ///
    /// Returns `Some` when the event opens a new bucket and `None` when it
    /// merges into the current one. State is left untouched on error.
    pub fn observe(&mut self, at: NaiveDateTime, id: i64) -> Result<Option<Boundary>, GrouperError> {
        if let Some(last) = self.last_time
            && at <= last
        {
            return Err(GrouperError::OutOfOrder { current: at, last });
        }
        self.last_time = Some(at);

        let Some(bucket) = self.bucket.as_mut() else {
            let bucket = Bucket {
                day: at.date(),
                group: id,
                end: at,
            };
            let boundary = Boundary {
                day: bucket.day_label(),
                group: id,
            };
            self.bucket = Some(bucket);
            return Ok(Some(boundary));
        };

        if at - bucket.end > self.gap {
            let new_day = at.date();
            // The label only moves forward when the calendar date changed;
            // otherwise the previous bucket's date is reported again.
            let label = if new_day != bucket.day {
                new_day
            } else {
                bucket.day
            };
            *bucket = Bucket {
                day: new_day,
                group: id,
                end: at,
            };
            Ok(Some(Boundary {
                day: label.format(DAY_FORMAT).to_string(),
                group: id,
            }))
        } else {
            bucket.end = at;
            Ok(None)
        }
    }

    pub fn current_bucket(&self) -> Option<&Bucket> {
        self.bucket.as_ref()
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.last_time
    }

    pub fn gap(&self) -> TimeDelta {
        self.gap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn boundary(day: &str, group: i64) -> Option<Boundary> {
        Some(Boundary {
            day: day.to_string(),
            group,
        })
    }

    #[test]
    fn first_event_opens_bucket() {
        let mut g = SessionGrouper::default();
        assert_eq!(g.observe(at(1, 10, 0, 0), 1).unwrap(), boundary("2024-01-01", 1));
        let bucket = g.current_bucket().unwrap();
        assert_eq!(bucket.group, 1);
        assert_eq!(bucket.end, at(1, 10, 0, 0));
    }

    #[test]
    fn documented_three_event_sequence() {
        let mut g = SessionGrouper::default();
        assert_eq!(
            g.process("2024-01-01 10-00-00", 1).unwrap(),
            boundary("2024-01-01", 1)
        );
        assert_eq!(g.process("2024-01-01 10-05-00", 2).unwrap(), None);
        assert_eq!(
            g.process("2024-01-01 10-20-01", 3).unwrap(),
            boundary("2024-01-01", 3)
        );
        assert_eq!(g.current_bucket().unwrap().group, 3);
    }

    #[test]
    fn gap_of_exactly_threshold_merges() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 10, 0, 0), 1).unwrap();
        assert_eq!(g.observe(at(1, 10, 10, 0), 2).unwrap(), None);
        assert_eq!(g.observe(at(1, 10, 20, 1), 3).unwrap(), boundary("2024-01-01", 3));
    }

    #[test]
    fn gap_is_measured_from_last_merged_event() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 10, 0, 0), 1).unwrap();
        g.observe(at(1, 10, 9, 0), 2).unwrap();
        // 18 minutes after the bucket opened but only 9 after its end.
        assert_eq!(g.observe(at(1, 10, 18, 0), 3).unwrap(), None);
        assert_eq!(g.current_bucket().unwrap().end, at(1, 10, 18, 0));
    }

    #[test]
    fn equal_timestamp_is_rejected() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 10, 0, 0), 1).unwrap();
        let err = g.observe(at(1, 10, 0, 0), 2).unwrap_err();
        assert!(matches!(err, GrouperError::OutOfOrder { .. }));
    }

    #[test]
    fn earlier_timestamp_is_rejected_without_touching_state() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 10, 0, 0), 1).unwrap();
        let before = g.current_bucket().cloned();

        let err = g.observe(at(1, 9, 0, 0), 2).unwrap_err();
        assert_eq!(
            err,
            GrouperError::OutOfOrder {
                current: at(1, 9, 0, 0),
                last: at(1, 10, 0, 0),
            }
        );
        assert_eq!(g.current_bucket().cloned(), before);
        assert_eq!(g.last_time(), Some(at(1, 10, 0, 0)));
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let mut g = SessionGrouper::default();
        let err = g.process("2024-01-01 10:00:00", 1).unwrap_err();
        assert!(matches!(err, GrouperError::InvalidTimestamp { .. }));
        assert!(g.current_bucket().is_none());
    }

    #[test]
    fn boundary_across_midnight_reports_new_day() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 23, 50, 0), 1).unwrap();
        assert_eq!(g.observe(at(2, 0, 5, 0), 2).unwrap(), boundary("2024-01-02", 2));
        assert_eq!(g.current_bucket().unwrap().day, at(2, 0, 0, 0).date());
    }

    #[test]
    fn merge_across_midnight_keeps_bucket_day() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 23, 58, 0), 1).unwrap();
        assert_eq!(g.observe(at(2, 0, 3, 0), 2).unwrap(), None);

        // The bucket still belongs to the day it opened on.
        let bucket = g.current_bucket().unwrap();
        assert_eq!(bucket.day, at(1, 0, 0, 0).date());
        assert_eq!(bucket.end, at(2, 0, 3, 0));

        // The next boundary sees the date change and reports the new day.
        assert_eq!(g.observe(at(2, 0, 30, 0), 3).unwrap(), boundary("2024-01-02", 3));
        assert_eq!(g.current_bucket().unwrap().day, at(2, 0, 0, 0).date());
    }

    #[test]
    fn same_day_boundary_reuses_previous_label_and_advances_bucket() {
        let mut g = SessionGrouper::default();
        g.observe(at(1, 8, 0, 0), 10).unwrap();
        let emitted = g.observe(at(1, 9, 0, 0), 11).unwrap().unwrap();

        // Emitted label and internal state are checked separately.
        assert_eq!(emitted.day, "2024-01-01");
        assert_eq!(emitted.group, 11);
        let bucket = g.current_bucket().unwrap();
        assert_eq!(bucket.group, 11);
        assert_eq!(bucket.end, at(1, 9, 0, 0));
        assert_eq!(bucket.day_label(), "2024-01-01");
    }

    #[test]
    fn custom_gap_is_honored() {
        let mut g = SessionGrouper::with_gap_secs(60);
        assert_eq!(g.gap(), TimeDelta::seconds(60));
        g.observe(at(1, 10, 0, 0), 1).unwrap();
        assert_eq!(g.observe(at(1, 10, 1, 0), 2).unwrap(), None);
        assert!(g.observe(at(1, 10, 2, 1), 3).unwrap().is_some());
    }

    proptest! {
        #[test]
        fn boundary_iff_gap_exceeds_threshold(
            steps in proptest::collection::vec(1i64..1_800, 1..60)
        ) {
            let mut g = SessionGrouper::default();
            let mut now = at(1, 0, 0, 0);
            prop_assert!(g.observe(now, 0).unwrap().is_some());

            for (i, step) in steps.iter().enumerate() {
                now += TimeDelta::seconds(*step);
                let emitted = g.observe(now, i as i64 + 1).unwrap();
                prop_assert_eq!(emitted.is_some(), *step > 600);
                prop_assert!(g.current_bucket().unwrap().end >= now);
            }
        }

        #[test]
        fn non_increasing_input_always_fails(back in 0i64..10_000) {
            let mut g = SessionGrouper::default();
            let start = at(15, 12, 0, 0);
            g.observe(start, 1).unwrap();
            let result = g.observe(start - TimeDelta::seconds(back), 2);
            let is_out_of_order = matches!(result, Err(GrouperError::OutOfOrder { .. }));
            prop_assert!(is_out_of_order);
        }
    }
}
