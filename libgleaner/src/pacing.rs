//! Randomized pacing between platform calls.
//!
//! Every wait is drawn fresh from a configured window and scaled by a
//! global multiplier, so the engine never settles into a fixed cadence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::config::PacingConfig;

/// Cooperative shutdown flag shared between the signal handler thread and
/// the engine.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn new() -> Self {
        Shutdown(Arc::new(AtomicBool::new(false)))
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The four pause classes the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceClass {
    /// After each action call on a post
    Action,
    /// After all actions on a post
    Post,
    /// After each unfollow in a churn campaign
    Unfollow,
    /// Bracketing a churn campaign
    ChurnCycle,
}

/// Draws waits from the configured windows and performs the suspension.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
    shutdown: Shutdown,
}

impl Pacer {
    pub fn new(config: PacingConfig, shutdown: Shutdown) -> Self {
        Pacer { config, shutdown }
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Draw the scaled wait, in seconds, for one pause of the given class.
    pub fn draw(&self, class: PaceClass) -> u64 {
        let window = match class {
            PaceClass::Action => &self.config.per_action,
            PaceClass::Post => &self.config.per_post,
            PaceClass::Unfollow => &self.config.per_unfollow,
            PaceClass::ChurnCycle => &self.config.per_churn_cycle,
        };
        (window.draw() as f64 * self.config.multiplier).round() as u64
    }

    /// Suspend the task for a freshly drawn wait.
    ///
    /// The sleep runs in one-second slices so a pending shutdown cuts even
    /// multi-hour churn waits short.
    pub async fn pause(&self, class: PaceClass) {
        let secs = self.draw(class);
        if secs == 0 {
            return;
        }
        debug!(?class, secs, "pausing");
        for _ in 0..secs {
            if self.shutdown.is_triggered() {
                debug!(?class, "pause cut short by shutdown");
                return;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }
}
