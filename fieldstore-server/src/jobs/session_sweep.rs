//! Periodic eviction of idle session tokens.

use std::sync::Arc;

use fieldstore_core::FieldstoreResult;

use super::periodic::SweepTask;
use crate::session::SessionTokenBin;

/// Sweeps expired records out of a [`SessionTokenBin`].
#[derive(Debug)]
pub struct SessionSweep {
    bin: Arc<SessionTokenBin>,
}

impl SessionSweep {
    pub fn new(bin: Arc<SessionTokenBin>) -> Self {
        Self { bin }
    }
}

impl SweepTask for SessionSweep {
    fn name(&self) -> &'static str {
        "session_sweep"
    }

    fn run_once(&self) -> FieldstoreResult<u64> {
        let removed = self.bin.sweep_expired();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = self.bin.active_sessions(),
                "Expired sessions removed"
            );
        }
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldstore_core::{ManualClock, UserSnapshot};
    use std::time::Duration;

    #[test]
    fn test_run_once_reports_removed_count() {
        let clock = Arc::new(ManualClock::starting_now());
        let bin = Arc::new(SessionTokenBin::new(clock.clone(), Duration::from_secs(60)));
        let sweep = SessionSweep::new(Arc::clone(&bin));

        bin.issue_token(UserSnapshot::new("a", "a@example.org")).unwrap();
        bin.issue_token(UserSnapshot::new("b", "b@example.org")).unwrap();
        assert_eq!(sweep.run_once().unwrap(), 0);

        clock.advance(Duration::from_secs(61));
        let fresh = bin.issue_token(UserSnapshot::new("c", "c@example.org")).unwrap();

        assert_eq!(sweep.run_once().unwrap(), 2);
        assert_eq!(bin.active_sessions(), 1);
        assert!(bin.get_user(&fresh).is_some());
        assert_eq!(sweep.name(), "session_sweep");
    }
}
