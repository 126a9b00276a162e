use chrono::{DateTime, Duration, Utc};

pub mod validation;

/// Exclusive lower bound of a trailing window of `days` ending at `now`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_start_spans_days() {
        let now = Utc::now();
        let boundary = window_start(now, 30);

        assert_eq!(now - boundary, Duration::days(30));
        assert_eq!(window_start(now, 0), now);
    }
}
