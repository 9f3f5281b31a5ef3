//! The `timing` module provides std::time utilities

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn duration_as_ms(d: &Duration) -> u64 {
    (d.as_secs() * 1000) + (u64::from(d.subsec_nanos()) / 1_000_000)
}

pub fn duration_as_s(d: &Duration) -> f32 {
    d.as_secs() as f32 + (d.subsec_nanos() as f32 / 1_000_000_000.0)
}

/// Milliseconds since the unix epoch.
pub fn timestamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("create timestamp in timing");
    duration_as_ms(&now)
}

pub const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_as() {
        let d = Duration::new(1, 500_000_000);
        assert_eq!(duration_as_ms(&d), 1500);
        assert!((duration_as_s(&d) - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_timestamp_advances() {
        let a = timestamp();
        assert!(a > 0);
        assert!(timestamp() >= a);
    }
}
