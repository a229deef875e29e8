use chrono::{Datelike, Duration, NaiveDate, Weekday};
use recruit_weekly::core::week::{valid_week_keys_in_month, week_keys_in_month};
use recruit_weekly::{
    get_valid_weeks_in_month, is_cross_month_week, resolve_week, week_key_for_date, ReportError,
    WeekKey,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_june_2025() {
    let w1 = resolve_week(2025, 6, 1).unwrap();
    assert_eq!(w1.start, date(2025, 5, 31));
    assert_eq!(w1.end, date(2025, 6, 6));

    assert!(is_cross_month_week(2025, 6, 1).unwrap());
    assert!(!is_cross_month_week(2025, 6, 2).unwrap());
    assert_eq!(get_valid_weeks_in_month(2025, 6).unwrap(), vec![2, 3, 4, 5]);
}

#[test]
fn test_august_2025_first_full_week() {
    // Fri Aug 1 closes the week that began Sat Jul 26
    let w1 = resolve_week(2025, 8, 1).unwrap();
    assert_eq!(w1.start, date(2025, 7, 26));
    assert!(is_cross_month_week(2025, 8, 1).unwrap());

    let w2 = resolve_week(2025, 8, 2).unwrap();
    assert_eq!(w2.start, date(2025, 8, 2));
    assert_eq!(w2.end, date(2025, 8, 8));

    assert_eq!(get_valid_weeks_in_month(2025, 8).unwrap(), vec![2, 3, 4, 5, 6]);
    assert_eq!(week_key_for_date(date(2025, 8, 1)).unwrap().report_id(), "2025-07-W05");
}

#[test]
fn test_month_starting_on_saturday() {
    // Nov 1 2025 is a Saturday
    assert_eq!(date(2025, 11, 1).weekday(), Weekday::Sat);
    assert!(!is_cross_month_week(2025, 11, 1).unwrap());
    assert_eq!(get_valid_weeks_in_month(2025, 11).unwrap(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_weeks_are_saturday_to_friday() {
    for year in 2024..=2026 {
        for month in 1..=12 {
            for key in week_keys_in_month(year, month).unwrap() {
                let range = key.range();
                assert_eq!(range.start.weekday(), Weekday::Sat, "{}", key);
                assert_eq!(range.end - range.start, Duration::days(6), "{}", key);
            }
        }
    }
}

#[test]
fn test_valid_weeks_tile_the_calendar() {
    // Consecutive months' valid weeks cover every day exactly once
    let mut expected_start = valid_week_keys_in_month(2024, 1).unwrap()[0].range().start;
    assert_eq!(expected_start, date(2024, 1, 6));

    for year in 2024..=2026 {
        for month in 1..=12 {
            let valid = valid_week_keys_in_month(year, month).unwrap();
            assert!(valid.len() <= 5, "{}-{:02} has {} weeks", year, month, valid.len());
            for key in valid {
                let range = key.range();
                assert_eq!(range.start, expected_start, "{}", key);
                assert_eq!(week_key_for_date(range.start).unwrap(), key);
                assert_eq!(week_key_for_date(range.end).unwrap(), key);
                expected_start = range.end + Duration::days(1);
            }
        }
    }
}

#[test]
fn test_every_date_maps_into_its_week() {
    let mut day = date(2024, 1, 1);
    while day <= date(2026, 12, 31) {
        let key = week_key_for_date(day).unwrap();
        assert!(key.range().contains(day), "{} not in {}", day, key);
        assert!(!key.is_cross_month(), "{} mapped to cross-month {}", day, key);
        day += Duration::days(1);
    }
}

#[test]
fn test_invalid_input() {
    assert!(matches!(resolve_week(2025, 13, 1), Err(ReportError::InvalidMonth(13))));
    assert!(matches!(
        resolve_week(2025, 8, 0),
        Err(ReportError::InvalidWeekNumber { week: 0, .. })
    ));
    assert!(matches!(
        get_valid_weeks_in_month(2025, 0),
        Err(ReportError::InvalidMonth(0))
    ));
    assert!("2025-8-W2".parse::<WeekKey>().is_err());
}
