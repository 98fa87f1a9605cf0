use std::convert::TryInto;
use std::time::{Duration, SystemTime};

/// Returns the Unix time representation of "now" as a `Duration`.
pub fn now_unix() -> Duration {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}

/// Returns the current Unix time in seconds, as stored in the database.
pub fn now_epoch() -> i64 {
    now_unix().as_secs().try_into().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_matches_duration() {
        let before = now_unix().as_secs() as i64;
        let epoch = now_epoch();
        let after = now_unix().as_secs() as i64;
        assert!(before <= epoch && epoch <= after);
    }
}
