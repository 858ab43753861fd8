//! Recurrence rules and instance snapshots.
//!
//! [`occurs_on`] decides whether a pattern has an occurrence on a given
//! calendar date. It is a pure function of the date and the rule, and it is
//! the only definition of "occurrence" in the crate: the generator walks
//! dates one at a time and asks it. [`build_instance`] turns a matched date
//! into a task instance by copying the pattern's current fields.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{
    Frequency, RecurringPattern, TaskInstance, TaskStatus, DURATION_MINUTES_KEY,
    GENERATED_FROM_PATTERN_KEY,
};

/// Returns whether a rule anchored at `anchor` has an occurrence on `check`.
///
/// * daily: every `interval` days from the anchor.
/// * weekly without `by_day`: the anchor's weekday, every `interval` weeks.
/// * weekly with `by_day` (0=Monday..6=Sunday): listed weekdays, in weeks
///   counted from the anchor date (not calendar weeks) that are a multiple
///   of `interval`.
/// * monthly without `by_day`: the anchor's day of month every `interval`
///   months. No end-of-month clamping, so a 31st anchor skips short months.
/// * monthly with `by_day` (1..31): listed days of month, every `interval`
///   months.
/// * yearly: the anchor's month and day every `interval` years. A Feb 29
///   anchor only matches leap years.
///
/// Dates before the anchor never match. `by_day` values outside their range
/// are accepted and simply never match; an empty list behaves like no list.
pub fn occurs_on(
    check: NaiveDate,
    anchor: NaiveDate,
    frequency: Frequency,
    interval: i32,
    by_day: Option<&[i32]>,
) -> bool {
    if check < anchor || interval < 1 {
        return false;
    }
    let interval = i64::from(interval);
    let by_day = by_day.filter(|days| !days.is_empty());
    let days_diff = (check - anchor).num_days();

    match frequency {
        Frequency::Daily => days_diff % interval == 0,
        Frequency::Weekly => match by_day {
            None => days_diff % (interval * 7) == 0,
            Some(days) => {
                let weekday = check.weekday().num_days_from_monday() as i32;
                days.contains(&weekday) && (days_diff / 7) % interval == 0
            }
        },
        Frequency::Monthly => {
            let months_diff = months_between(anchor, check);
            match by_day {
                None => months_diff % interval == 0 && check.day() == anchor.day(),
                Some(days) => days.contains(&(check.day() as i32)) && months_diff % interval == 0,
            }
        }
        Frequency::Yearly => {
            let years_diff = i64::from(check.year() - anchor.year());
            years_diff % interval == 0 && check.month() == anchor.month() && check.day() == anchor.day()
        }
    }
}

#[inline]
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    i64::from(to.year() - from.year()) * 12 + (i64::from(to.month()) - i64::from(from.month()))
}

impl RecurringPattern {
    /// Whether this pattern's rule has an occurrence on `date`.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        occurs_on(
            date,
            self.anchor_date(),
            self.frequency,
            self.interval,
            self.by_day.as_deref(),
        )
    }
}

/// Matching dates in `from..=through`, in calendar order.
///
/// Ignores the pattern's activity flag, cursor and end date; it only
/// evaluates the rule.
pub fn occurrences_between(
    pattern: &RecurringPattern,
    from: NaiveDate,
    through: NaiveDate,
) -> impl Iterator<Item = NaiveDate> + '_ {
    from.iter_days()
        .take_while(move |date| *date <= through)
        .filter(move |date| pattern.occurs_on(*date))
}

/// Builds the instance a pattern produces for `occurrence_date`.
///
/// Title, description, assignee, creator and family are copied verbatim.
/// The due time is the occurrence date at the pattern's clock time, or
/// `None` when the pattern has no hour. Metadata is the pattern's map with
/// `generated_from_pattern` and `duration_minutes` written over it.
pub fn build_instance(
    pattern: &RecurringPattern,
    occurrence_date: NaiveDate,
    now: NaiveDateTime,
) -> TaskInstance {
    let mut metadata = pattern.metadata.clone();
    metadata.insert(GENERATED_FROM_PATTERN_KEY.to_string(), Value::Bool(true));
    metadata.insert(
        DURATION_MINUTES_KEY.to_string(),
        pattern.duration_minutes.map_or(Value::Null, Value::from),
    );

    TaskInstance {
        id: Uuid::now_v7(),
        family_id: pattern.family_id,
        pattern_id: Some(pattern.id),
        occurrence_date: Some(occurrence_date),
        title: pattern.title.clone(),
        description: pattern.description.clone(),
        assignee_id: pattern.default_assignee_id,
        created_by_id: pattern.created_by_id,
        status: TaskStatus::Todo,
        due_at: pattern.clock_time().map(|time| occurrence_date.and_time(time)),
        completed_at: None,
        metadata,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metadata;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_pattern() -> RecurringPattern {
        let start = date(2025, 1, 6).and_hms_opt(9, 30, 0).unwrap();
        RecurringPattern {
            id: Uuid::now_v7(),
            family_id: Uuid::now_v7(),
            title: "Take out the trash".to_string(),
            description: Some("Both bins".to_string()),
            frequency: Frequency::Weekly,
            interval: 1,
            by_day: Some(vec![6]),
            start_time_hour: Some(16),
            start_time_minute: None,
            duration_minutes: Some(15),
            start_date: start,
            end_date: None,
            default_assignee_id: Some(Uuid::now_v7()),
            created_by_id: Some(Uuid::now_v7()),
            is_active: true,
            last_generated_until: None,
            metadata: Metadata::new(),
            created_at: start,
            updated_at: start,
        }
    }

    mod occurrence_tests {
        use super::*;

        #[rstest]
        #[case::anchor_itself(date(2025, 1, 1), 2, true)]
        #[case::two_days_later(date(2025, 1, 3), 2, true)]
        #[case::off_interval(date(2025, 1, 2), 2, false)]
        #[case::across_month(date(2025, 2, 1), 3, true)]
        #[case::before_anchor(date(2024, 12, 30), 1, false)]
        fn test_daily(#[case] check: NaiveDate, #[case] interval: i32, #[case] expected: bool) {
            assert_eq!(
                occurs_on(check, date(2025, 1, 1), Frequency::Daily, interval, None),
                expected
            );
        }

        #[rstest]
        #[case::same_weekday_two_weeks(date(2025, 1, 20), true)]
        #[case::same_weekday_odd_week(date(2025, 1, 13), false)]
        #[case::other_weekday(date(2025, 1, 21), false)]
        fn test_weekly_without_selector(#[case] check: NaiveDate, #[case] expected: bool) {
            // 2025-01-06 is a Monday
            assert_eq!(
                occurs_on(check, date(2025, 1, 6), Frequency::Weekly, 2, None),
                expected
            );
        }

        #[rstest]
        #[case::wednesday_week_zero(date(2025, 1, 8), true)]
        #[case::monday_week_one(date(2025, 1, 13), false)]
        #[case::monday_week_two(date(2025, 1, 20), true)]
        #[case::unlisted_day(date(2025, 1, 7), false)]
        fn test_weekly_with_selector(#[case] check: NaiveDate, #[case] expected: bool) {
            assert_eq!(
                occurs_on(check, date(2025, 1, 6), Frequency::Weekly, 2, Some(&[0, 2])),
                expected
            );
        }

        #[test]
        fn test_weekly_weeks_count_from_anchor_not_calendar() {
            // Anchor on a Wednesday: the following Monday is still in week 0.
            let anchor = date(2025, 1, 8);
            assert!(occurs_on(date(2025, 1, 13), anchor, Frequency::Weekly, 2, Some(&[0])));
            assert!(!occurs_on(date(2025, 1, 20), anchor, Frequency::Weekly, 2, Some(&[0])));
            assert!(occurs_on(date(2025, 1, 27), anchor, Frequency::Weekly, 2, Some(&[0])));
        }

        #[test]
        fn test_monthly_without_selector_does_not_clamp() {
            let anchor = date(2025, 1, 31);
            assert!(!occurs_on(date(2025, 2, 28), anchor, Frequency::Monthly, 1, None));
            assert!(occurs_on(date(2025, 3, 31), anchor, Frequency::Monthly, 1, None));
            assert!(!occurs_on(date(2025, 4, 30), anchor, Frequency::Monthly, 1, None));
            assert!(occurs_on(date(2025, 5, 31), anchor, Frequency::Monthly, 1, None));
        }

        #[rstest]
        #[case::first_of_anchor_month(date(2025, 1, 1), true)]
        #[case::fifteenth_skipped_month(date(2025, 2, 15), false)]
        #[case::fifteenth_on_interval(date(2025, 3, 15), true)]
        #[case::unlisted_day(date(2025, 3, 2), false)]
        fn test_monthly_with_selector(#[case] check: NaiveDate, #[case] expected: bool) {
            assert_eq!(
                occurs_on(check, date(2025, 1, 1), Frequency::Monthly, 2, Some(&[1, 15])),
                expected
            );
        }

        #[test]
        fn test_yearly_leap_day_only_matches_leap_years() {
            let anchor = date(2024, 2, 29);
            assert!(!occurs_on(date(2025, 2, 28), anchor, Frequency::Yearly, 1, None));
            assert!(!occurs_on(date(2025, 3, 1), anchor, Frequency::Yearly, 1, None));
            assert!(occurs_on(date(2028, 2, 29), anchor, Frequency::Yearly, 1, None));
            assert!(occurs_on(date(2028, 2, 29), anchor, Frequency::Yearly, 2, None));
            assert!(!occurs_on(date(2028, 2, 29), anchor, Frequency::Yearly, 3, None));
        }

        #[rstest]
        #[case::weekday_seven(Frequency::Weekly, vec![7], date(2025, 1, 12))]
        #[case::negative_weekday(Frequency::Weekly, vec![-1], date(2025, 1, 12))]
        #[case::month_day_zero(Frequency::Monthly, vec![0], date(2025, 2, 1))]
        #[case::month_day_32(Frequency::Monthly, vec![32], date(2025, 1, 31))]
        fn test_out_of_range_selectors_never_match(
            #[case] frequency: Frequency,
            #[case] by_day: Vec<i32>,
            #[case] check: NaiveDate,
        ) {
            let anchor = date(2025, 1, 1);
            assert!(!occurs_on(check, anchor, frequency, 1, Some(&by_day)));
            for offset in 0..62 {
                let day = anchor + chrono::Duration::days(offset);
                assert!(!occurs_on(day, anchor, frequency, 1, Some(&by_day)));
            }
        }

        #[test]
        fn test_empty_selector_behaves_like_none() {
            let anchor = date(2025, 1, 6);
            assert!(occurs_on(date(2025, 1, 13), anchor, Frequency::Weekly, 1, Some(&[])));
            assert!(!occurs_on(date(2025, 1, 14), anchor, Frequency::Weekly, 1, Some(&[])));
        }

        #[test]
        fn test_zero_interval_never_matches() {
            assert!(!occurs_on(date(2025, 1, 1), date(2025, 1, 1), Frequency::Daily, 0, None));
        }

        #[test]
        fn test_occurrences_between_sundays() {
            let pattern = create_test_pattern();
            let dates: Vec<_> =
                occurrences_between(&pattern, date(2025, 1, 1), date(2025, 1, 31)).collect();
            assert_eq!(dates, vec![date(2025, 1, 12), date(2025, 1, 19), date(2025, 1, 26)]);
        }

        proptest! {
            #[test]
            fn prop_never_matches_before_anchor(
                offset in 1i64..2000,
                interval in 1i32..12,
                freq in prop_oneof![
                    Just(Frequency::Daily),
                    Just(Frequency::Weekly),
                    Just(Frequency::Monthly),
                    Just(Frequency::Yearly),
                ],
            ) {
                let anchor = date(2025, 6, 15);
                let check = anchor - chrono::Duration::days(offset);
                prop_assert!(!occurs_on(check, anchor, freq, interval, None));
            }

            #[test]
            fn prop_daily_unit_interval_matches_every_later_day(offset in 0i64..5000) {
                let anchor = date(2025, 6, 15);
                let check = anchor + chrono::Duration::days(offset);
                prop_assert!(occurs_on(check, anchor, Frequency::Daily, 1, None));
            }
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn test_build_instance_copies_pattern_fields() {
            let pattern = create_test_pattern();
            let now = date(2025, 1, 6).and_hms_opt(10, 0, 0).unwrap();
            let instance = build_instance(&pattern, date(2025, 1, 12), now);

            assert_eq!(instance.family_id, pattern.family_id);
            assert_eq!(instance.pattern_id, Some(pattern.id));
            assert_eq!(instance.occurrence_date, Some(date(2025, 1, 12)));
            assert_eq!(instance.title, pattern.title);
            assert_eq!(instance.description, pattern.description);
            assert_eq!(instance.assignee_id, pattern.default_assignee_id);
            assert_eq!(instance.created_by_id, pattern.created_by_id);
            assert_eq!(instance.status, TaskStatus::Todo);
            assert_eq!(instance.completed_at, None);
            assert_eq!(instance.created_at, now);
        }

        #[test]
        fn test_due_time_uses_clock_time_not_start_time() {
            let pattern = create_test_pattern();
            let now = pattern.start_date;
            let instance = build_instance(&pattern, date(2025, 1, 12), now);
            assert_eq!(instance.due_at, date(2025, 1, 12).and_hms_opt(16, 0, 0));
        }

        #[test]
        fn test_no_hour_means_no_due_time() {
            let mut pattern = create_test_pattern();
            pattern.start_time_hour = None;
            pattern.start_time_minute = Some(45);
            let instance = build_instance(&pattern, date(2025, 1, 12), pattern.start_date);
            assert_eq!(instance.due_at, None);
        }

        #[test]
        fn test_metadata_merge_preserves_unknown_keys_and_overrides_reserved() {
            let mut pattern = create_test_pattern();
            pattern.metadata.insert("room".to_string(), json!({"name": "kitchen", "floor": 1}));
            pattern.metadata.insert("generated_from_pattern".to_string(), json!("nope"));
            pattern.metadata.insert("duration_minutes".to_string(), json!(999));

            let instance = build_instance(&pattern, date(2025, 1, 12), pattern.start_date);

            assert_eq!(instance.metadata["room"], json!({"name": "kitchen", "floor": 1}));
            assert_eq!(instance.metadata["generated_from_pattern"], json!(true));
            assert_eq!(instance.metadata["duration_minutes"], json!(15));
            // The pattern's own map is left alone
            assert_eq!(pattern.metadata["duration_minutes"], json!(999));
        }

        #[test]
        fn test_missing_duration_is_recorded_as_null() {
            let mut pattern = create_test_pattern();
            pattern.duration_minutes = None;
            let instance = build_instance(&pattern, date(2025, 1, 12), pattern.start_date);
            assert_eq!(instance.metadata["duration_minutes"], Value::Null);
        }
    }
}
