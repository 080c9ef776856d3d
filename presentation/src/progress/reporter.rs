//! Spinner shown while a call runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress of one call at a time on stderr.
///
/// Purely cosmetic: the spinner ticks on its own thread and never touches
/// the result.
pub struct ProgressReporter {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    /// A reporter that never draws.
    pub fn hidden() -> Self {
        Self::new(false)
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    pub fn on_call_start(&self, tool: &str) {
        if !self.enabled {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(tool.to_string());
        pb.set_message("running...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(pb);
        }
    }

    pub fn on_call_complete(&self, success: bool) {
        let Some(pb) = self.bar.lock().ok().and_then(|mut slot| slot.take()) else {
            return;
        };
        if success {
            pb.finish_and_clear();
        } else {
            pb.abandon_with_message(format!("{}", "failed".red()));
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}
