use chrono::Utc;

pub struct Clock;

impl Clock {
    pub fn now_millis() -> u64 {
        Utc::now().timestamp_millis() as u64
    }
}
