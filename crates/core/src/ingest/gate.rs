//! Incremental scan window.

/// Whether an input file falls inside the current scan window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    /// Modified before the previous run's window ended; already ingested.
    TooOld,
    /// Modified after this run started; possibly still being written.
    TooNew,
}

/// Modification-time bounds for one run, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub last_scan: i64,
    pub cutoff: i64,
}

impl ScanWindow {
    /// A window from the previous run's scan time (if any) to `cutoff`.
    pub fn new(last_scan: Option<i64>, cutoff: i64) -> Self {
        Self {
            last_scan: last_scan.unwrap_or(0),
            cutoff,
        }
    }

    /// Admit every file regardless of modification time.
    pub fn unbounded() -> Self {
        Self {
            last_scan: i64::MIN,
            cutoff: i64::MAX,
        }
    }

    pub fn admit(&self, mtime: i64) -> GateDecision {
        if mtime < self.last_scan {
            GateDecision::TooOld
        } else if mtime > self.cutoff {
            GateDecision::TooNew
        } else {
            GateDecision::Admit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        let window = ScanWindow::new(Some(100), 200);
        assert_eq!(window.admit(100), GateDecision::Admit);
        assert_eq!(window.admit(150), GateDecision::Admit);
        assert_eq!(window.admit(200), GateDecision::Admit);
        assert_eq!(window.admit(99), GateDecision::TooOld);
        assert_eq!(window.admit(201), GateDecision::TooNew);
    }

    #[test]
    fn test_first_run_admits_everything_up_to_cutoff() {
        let window = ScanWindow::new(None, 200);
        assert_eq!(window.admit(0), GateDecision::Admit);
        assert_eq!(window.admit(201), GateDecision::TooNew);
    }

    #[test]
    fn test_unbounded() {
        let window = ScanWindow::unbounded();
        assert_eq!(window.admit(i64::MIN), GateDecision::Admit);
        assert_eq!(window.admit(i64::MAX), GateDecision::Admit);
    }
}
