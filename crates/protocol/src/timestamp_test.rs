//! Tests for the timestamper

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use crate::clock::ManualClock;
use crate::error::ProtocolError;
use crate::timestamp::{DEFAULT_UTC_OFFSET_HOURS, Timestamper};

fn fixed(clock: &ManualClock) -> Timestamper {
    Timestamper::new(Arc::new(clock.clone()), DEFAULT_UTC_OFFSET_HOURS).unwrap()
}

#[test]
fn test_applies_three_hour_offset() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap());
    assert_eq!(fixed(&clock).now(), "2025-01-15_13-30-45");
}

#[test]
fn test_offset_crosses_midnight() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 12, 31, 22, 0, 1).unwrap());
    assert_eq!(fixed(&clock).now(), "2025-01-01_01-00-01");
}

#[test]
fn test_output_is_filename_and_csv_safe() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 5, 9).unwrap());
    let ts = fixed(&clock).now();
    assert!(!ts.contains(':'));
    assert!(!ts.contains(','));
    assert!(!ts.contains(' '));
    assert!(!ts.contains('/'));
    assert_eq!(ts.len(), "YYYY-MM-DD_HH-MM-SS".len());
}

#[test]
fn test_pure_function_of_clock() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap());
    let ts = fixed(&clock);
    assert_eq!(ts.now(), ts.now());

    clock.advance(Duration::seconds(1));
    assert_eq!(ts.now(), "2025-01-15_13-30-46");
}

#[test]
fn test_sub_second_precision_is_truncated() {
    let at = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap() + Duration::milliseconds(999);
    let clock = ManualClock::new(at);
    assert_eq!(fixed(&clock).now(), "2025-01-15_13-30-45");
}

#[test]
fn test_custom_offset() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 45).unwrap());
    let utc = Timestamper::new(Arc::new(clock.clone()), 0).unwrap();
    assert_eq!(utc.now(), "2025-01-15_10-30-45");

    let west = Timestamper::new(Arc::new(clock), -5).unwrap();
    assert_eq!(west.now(), "2025-01-15_05-30-45");
}

#[test]
fn test_rejects_out_of_range_offset() {
    let clock = ManualClock::new(Utc::now());
    let err = Timestamper::new(Arc::new(clock), 24).unwrap_err();
    assert_eq!(err, ProtocolError::InvalidOffset { hours: 24 });
}

#[test]
fn test_system_timestamper_uses_default_offset() {
    let ts = Timestamper::system();
    assert_eq!(ts.offset().local_minus_utc(), 3 * 3600);
}
