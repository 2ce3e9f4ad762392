#![allow(dead_code, unused_imports)]

use std::time::Duration;

pub use keydag_test_utils::{
    delayed, failing_after, init_tracing, providing, with_timeout, FakeRenderer, Timeline,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// `{key: true}` for each key.
pub fn all_true(keys: &[&str]) -> keydag::Values {
    keys.iter()
        .map(|k| (k.to_string(), serde_json::Value::Bool(true)))
        .collect()
}

/// Assert `actual` is `expected_ms` give or take a millisecond of timer
/// rounding.
pub fn assert_at(actual: Duration, expected_ms: u64) {
    let ms = actual.as_millis() as i128;
    assert!(
        (ms - expected_ms as i128).abs() <= 1,
        "expected ~{expected_ms}ms, got {ms}ms"
    );
}
