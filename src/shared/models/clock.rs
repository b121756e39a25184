use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;
use serde_json::Value;
use std::sync::Mutex;

/// Wall clock that never hands out the same instant twice.
///
/// Two writes landing within the host clock's resolution (or a clock step
/// backwards) still get strictly increasing timestamps, so `updated_at`
/// always moves forward on a successful write.
#[derive(Debug, Default)]
pub struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut now = Utc::now();
        if let Some(previous) = *last {
            if now <= previous {
                now = previous + chrono::Duration::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}

/// RFC 3339 with a fixed nine-digit fraction, so stored values also sort
/// correctly as plain strings.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// `serialize_with` hook writing timestamps in the fixed-width form.
pub fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(at))
}

/// Document form of a timestamp.
pub fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(format_timestamp(&at))
}
