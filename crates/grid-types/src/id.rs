use std::fmt;

use serde::{Deserialize, Serialize};

/// Host identity as reported by a worker. Compared for equality only;
/// no resolution or normalization happens on this side.
pub type HostName = String;

/// Identifier of one addressable worker process within the pool.
///
/// Positive and unique for the pool's lifetime; zero is rejected at pool
/// construction. Ids are not reused while their worker is alive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_numeric() {
        let mut ids = vec![WorkerId(7), WorkerId(2), WorkerId(11)];
        ids.sort();
        assert_eq!(ids, vec![WorkerId(2), WorkerId(7), WorkerId(11)]);
    }

    #[test]
    fn display_is_raw_number() {
        assert_eq!(WorkerId(42).to_string(), "42");
    }
}
