use chrono::{DateTime, Utc};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current UTC time
pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// Latest of two optional timestamps. Used for monotonic high-water marks.
pub fn max_time(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_max_time() {
        let t = Utc::now();
        let later = t + Duration::seconds(1);
        assert_eq!(max_time(Some(t), Some(later)), Some(later));
        assert_eq!(max_time(Some(later), Some(t)), Some(later));
        assert_eq!(max_time(None, Some(t)), Some(t));
        assert_eq!(max_time(None, None), None);
    }
}
