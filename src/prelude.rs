//! Banquet prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    config::{ConfigError, PlannerConfig},
    constraints::{ConstraintModel, ConstraintViolation},
    items::Item,
    menu::{Diet, MenuEntry, Rating, expand_servings},
    planner::{BundleComparison, BundlePlanner, PlanError},
    request::{BundleRequest, DistributionTargets},
    scoring::{greedy_score, optimality_score},
    solution::{Bundle, BundleLine, BundleMetrics},
    solvers::{
        BundleSolver, CancelToken, NoSolutionReason, SolveContext, SolverError, SolverKind,
        SolverOutcome, brute_force::BruteForceSolver, greedy::GreedySolver, milp::MilpSolver,
    },
};
