use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64); // ms since epoch, UTC

impl Timestamp {
    pub fn millis(self) -> i64 {
        self.0
    }

    /// Whole seconds until this timestamp, negative when already past.
    pub fn seconds_from(self, now_ms: i64) -> i64 {
        (self.0 - now_ms).div_euclid(1_000)
    }
}
