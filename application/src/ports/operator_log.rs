//! Operator-facing log port
//!
//! Roster reconciliation and context overflow produce messages a person
//! running the benchmark should see. They go through an injected handle
//! rather than a process-wide logger so each engine and roster builder can
//! be observed in isolation.

use tracing::{error, warn};

/// Write-only sink for operator warnings and errors.
pub trait OperatorLog: Send + Sync {
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards operator messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingOperatorLog;

impl OperatorLog for TracingOperatorLog {
    fn warning(&self, message: &str) {
        warn!(target: "playpen::operator", "{}", message);
    }

    fn error(&self, message: &str) {
        error!(target: "playpen::operator", "{}", message);
    }
}
