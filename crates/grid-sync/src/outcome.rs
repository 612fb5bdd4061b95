//! Aggregate outcomes for fan-out/fan-in calls.

use grid_types::{GridError, WorkerId};

/// One failed sub-operation within a fan-out call.
#[derive(Debug)]
pub struct Failure {
    /// Worker whose sub-operation failed (the read side of a fetch).
    pub source: WorkerId,
    /// Worker whose copy was being written, when distinct from `source`
    /// (`None` when the controller itself held the destination).
    pub target: Option<WorkerId>,
    pub reason: GridError,
}

/// Outcome of a fan-out/fan-in call: the successful portion plus every
/// failed pair. Partial work is never discarded behind an opaque error.
#[derive(Debug)]
pub struct Partial<T> {
    pub value: T,
    pub failures: Vec<Failure>,
}

impl<T> Partial<T> {
    pub fn new(value: T, failures: Vec<Failure>) -> Self {
        Self { value, failures }
    }

    pub fn complete(value: T) -> Self {
        Self::new(value, Vec::new())
    }

    /// True when every sub-operation succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// True when a fan-out lost every sub-operation to a dead pool, the
/// condition the callers escalate to [`GridError::PoolUnavailable`].
pub(crate) fn total_failure(failures: &[Failure], attempted: usize) -> bool {
    attempted > 0
        && failures.len() == attempted
        && failures.iter().all(|f| {
            matches!(
                f.reason,
                GridError::Unreachable(_) | GridError::Timeout(_)
            )
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable(worker: u32) -> Failure {
        Failure {
            source: WorkerId(worker),
            target: None,
            reason: GridError::Unreachable(WorkerId(worker)),
        }
    }

    #[test]
    fn complete_has_no_failures() {
        let p = Partial::complete(42);
        assert!(p.is_complete());
        assert_eq!(p.value, 42);
    }

    #[test]
    fn total_failure_requires_every_attempt_dead() {
        let failures = vec![unreachable(1), unreachable(2)];
        assert!(total_failure(&failures, 2));
        assert!(!total_failure(&failures, 3));
        assert!(!total_failure(&[], 0));
    }

    #[test]
    fn non_transport_errors_are_not_total() {
        let failures = vec![Failure {
            source: WorkerId(1),
            target: None,
            reason: GridError::UnboundName {
                worker: WorkerId(1),
                name: "x".into(),
            },
        }];
        assert!(!total_failure(&failures, 1));
    }
}
