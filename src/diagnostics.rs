//! Warning and status sink for the resolution and correlation stages.
//!
//! Resolution problems degrade gracefully: each one is logged, counted,
//! and forgotten — unless strict mode is on, in which case the count is
//! converted into a single terminal error once the pipeline completes.

use indexmap::IndexMap;

use crate::error::{Result, RollupError};

/// Statistic names match the original report's assertion counters.
pub const STAT_FOUND: &str = "Found";
pub const STAT_SKIPPED: &str = "Skipped";
pub const STAT_MISSING_SUBJECT: &str = "Missing Subject";
pub const STAT_UNTESTED: &str = "Untested";

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: u32,
    stats: IndexMap<&'static str, u32>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a non-fatal problem. Every call counts toward strict mode.
    pub fn warn(&mut self, message: impl AsRef<str>) {
        self.warnings += 1;
        tracing::warn!("{}", message.as_ref());
    }

    /// Progress chatter; never counts toward strict mode.
    pub fn status(&self, message: impl AsRef<str>) {
        tracing::info!("{}", message.as_ref());
    }

    pub fn count(&mut self, stat: &'static str) {
        *self.stats.entry(stat).or_insert(0) += 1;
    }

    pub fn stat(&self, stat: &str) -> u32 {
        self.stats.get(stat).copied().unwrap_or(0)
    }

    pub fn warnings(&self) -> u32 {
        self.warnings
    }

    /// Log the accumulated assertion statistics, in insertion order.
    pub fn report_stats(&self) {
        for (stat, count) in &self.stats {
            tracing::info!(count, "assertions {}", stat);
        }
    }

    /// Strict-mode gate, run only after assembly has completed.
    pub fn finish(&self, strict: bool) -> Result<()> {
        if strict && self.warnings > 0 {
            return Err(RollupError::StrictMode {
                warnings: self.warnings,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn counts_warnings_and_stats() {
        let mut diag = Diagnostics::new();
        diag.warn("one");
        diag.warn("two");
        diag.count(STAT_SKIPPED);
        diag.count(STAT_SKIPPED);
        diag.count(STAT_FOUND);

        assert_eq!(diag.warnings(), 2);
        assert_eq!(diag.stat(STAT_SKIPPED), 2);
        assert_eq!(diag.stat(STAT_FOUND), 1);
        assert_eq!(diag.stat(STAT_UNTESTED), 0);
    }

    #[test]
    fn strict_mode_fails_only_with_warnings() {
        let mut diag = Diagnostics::new();
        assert!(diag.finish(true).is_ok());

        diag.warn("problem");
        assert!(diag.finish(false).is_ok());
        assert_matches!(
            diag.finish(true),
            Err(RollupError::StrictMode { warnings: 1 })
        );
    }
}
