#![forbid(unsafe_code)]
use astreinte_ra::{Area, Horizon, Role, SchedError, SchedulerConfig};
use chrono::NaiveDate;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn default_quarter_has_77_days_and_308_shifts() {
    let horizon = SchedulerConfig::default().horizon().unwrap();
    let dates: Vec<_> = horizon.dates().collect();
    assert_eq!(dates.len(), 77);
    assert_eq!(dates.first(), Some(&d(2025, 9, 21)));
    assert_eq!(dates.last(), Some(&d(2025, 12, 13)));
    assert!(!dates.contains(&d(2025, 11, 24)));
    assert!(!dates.contains(&d(2025, 11, 30)));
    assert!(dates.contains(&d(2025, 11, 23)));
    assert!(dates.contains(&d(2025, 12, 1)));
    assert_eq!(horizon.shifts().len(), 308);
}

#[test]
fn shifts_follow_date_area_role_order() {
    let horizon = Horizon::new(d(2025, 10, 2), d(2025, 10, 3), None).unwrap();
    let shifts = horizon.shifts();
    assert_eq!(shifts.len(), 8);

    let expected = [
        (Area::Area1, Role::Primary),
        (Area::Area1, Role::Secondary),
        (Area::Area2, Role::Primary),
        (Area::Area2, Role::Secondary),
    ];
    for (day, chunk) in shifts.chunks(4).enumerate() {
        for (shift, (area, role)) in chunk.iter().zip(expected) {
            assert_eq!(shift.date, d(2025, 10, 2 + day as u32));
            assert_eq!(shift.area, area);
            assert_eq!(shift.role, role);
        }
    }
}

#[test]
fn start_after_end_is_rejected() {
    let err = Horizon::new(d(2025, 10, 5), d(2025, 10, 1), None).unwrap_err();
    assert!(matches!(err, SchedError::InvalidHorizon { .. }));
}

#[test]
fn single_day_horizon() {
    let horizon = Horizon::new(d(2025, 10, 1), d(2025, 10, 1), None).unwrap();
    assert_eq!(horizon.dates().count(), 1);
    assert_eq!(horizon.shifts().len(), 4);
}

#[test]
fn dates_can_be_iterated_twice() {
    let horizon = Horizon::new(d(2025, 10, 1), d(2025, 10, 10), Some((d(2025, 10, 4), d(2025, 10, 5)))).unwrap();
    let first: Vec<_> = horizon.dates().collect();
    let second: Vec<_> = horizon.dates().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 8);
}

#[test]
fn reversed_exclusion_excludes_nothing() {
    let horizon = Horizon::new(d(2025, 10, 1), d(2025, 10, 10), Some((d(2025, 10, 6), d(2025, 10, 3)))).unwrap();
    assert_eq!(horizon.dates().count(), 10);
    assert!(horizon.contains(d(2025, 10, 4)));
}

#[test]
fn exclusion_covering_everything_leaves_no_shift() {
    let horizon = Horizon::new(d(2025, 10, 1), d(2025, 10, 3), Some((d(2025, 9, 30), d(2025, 10, 3)))).unwrap();
    assert_eq!(horizon.dates().count(), 0);
    assert!(horizon.shifts().is_empty());
}
