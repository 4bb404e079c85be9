use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A point in time as seconds plus nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Time {
    pub sec: i64,
    /// Always in `0..1_000_000_000`.
    pub nanosec: u32,
}

impl Time {
    pub const fn new(sec: i64, nanosec: u32) -> Self {
        Time { sec, nanosec }
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        let total = (secs * NANOS_PER_SEC as f64).round() as i64;
        Time {
            sec: total.div_euclid(NANOS_PER_SEC),
            nanosec: total.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }

    #[cfg(test)]
    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + f64::from(self.nanosec) * 1e-9
    }

    /// Seconds elapsed since `earlier`. Negative when the clock went backwards.
    pub fn seconds_since(&self, earlier: Time) -> f64 {
        let sec = (self.sec - earlier.sec) as f64;
        let nanos = (i64::from(self.nanosec) - i64::from(earlier.nanosec)) as f64;
        sec + nanos * 1e-9
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nanosec)
    }
}

/// Source of "now" for the control loop.
pub trait Clock {
    fn now(&self) -> Time;
}

/// Wall clock. Not monotonic: NTP steps can move it backwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Time::new(d.as_secs() as i64, d.subsec_nanos()),
            Err(before_epoch) => {
                let d = before_epoch.duration();
                Time::from_secs_f64(-d.as_secs_f64())
            }
        }
    }
}
