//! Planner configuration

use thiserror::Error;

/// Default share of items that must change between successive MILP solutions.
pub const DEFAULT_SOLUTION_DIVERSITY_PERCENT: u8 = 30;

/// Default wall-clock cap for a single MILP solve, in milliseconds.
pub const DEFAULT_MAX_TIME_PER_SOLUTION_MS: u64 = 300;

/// Configuration errors, rejected when the planner is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Diversity percent must be within 1..=100.
    #[error("solution diversity percent must be between 1 and 100, got {0}")]
    DiversityPercentOutOfRange(u8),

    /// The per-solve time cap must be positive.
    #[error("per-solution time cap must be greater than zero")]
    ZeroTimeCap,
}

/// Tuning knobs for the bundle planner.
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Share of items (1..=100) of a prior solution's servings that the next
    /// MILP solution must assign differently.
    pub min_solution_diversity_percent: u8,

    /// Wall-clock cap for a single MILP solve, in milliseconds.
    pub max_time_per_solution_ms: u64,

    /// Emit per-iteration solver detail through `tracing`.
    pub enable_detailed_logging: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_solution_diversity_percent: DEFAULT_SOLUTION_DIVERSITY_PERCENT,
            max_time_per_solution_ms: DEFAULT_MAX_TIME_PER_SOLUTION_MS,
            enable_detailed_logging: false,
        }
    }
}

impl PlannerConfig {
    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a diversity percent outside 1..=100 or a
    /// zero time cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.min_solution_diversity_percent) {
            return Err(ConfigError::DiversityPercentOutOfRange(
                self.min_solution_diversity_percent,
            ));
        }

        if self.max_time_per_solution_ms == 0 {
            return Err(ConfigError::ZeroTimeCap);
        }

        Ok(())
    }
}
