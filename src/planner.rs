//! Bundle planner orchestration

use thiserror::Error;

use crate::{
    config::{ConfigError, PlannerConfig},
    items::Item,
    request::BundleRequest,
    solution::{Bundle, sort_by_score},
    solvers::{
        BundleSolver, CancelToken, NoSolutionReason, SolveContext, SolverError, SolverKind,
        brute_force::BruteForceSolver, greedy::GreedySolver, milp::MilpSolver,
    },
};

/// Errors surfaced to the caller of [`BundlePlanner::build`].
#[derive(Debug, Error)]
pub enum PlanError {
    /// No item in the menu has stock left.
    #[error("no items with available stock in the menu")]
    EmptyMenu,

    /// Wrapped solver failure
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Result of one build call: the ranked bundles plus solve metadata.
#[derive(Debug)]
pub struct BundleComparison {
    /// Bundles sorted by optimality score, best first
    pub solutions: Vec<Bundle>,

    /// Which solver produced them
    pub solver: SolverKind,

    /// Wall time of the whole build call, in milliseconds
    pub finding_time_ms: u64,

    /// Why `solutions` is empty, when it is
    pub no_solution_reason: Option<NoSolutionReason>,
}

/// Orchestrates bundle solves: filters the items, dispatches the chosen
/// solver, measures wall time and ranks the results.
///
/// Each build call is self-contained; the planner holds nothing mutable, so
/// concurrent calls are independent.
#[derive(Debug)]
pub struct BundlePlanner {
    config: PlannerConfig,
}

impl BundlePlanner {
    /// Creates a planner, rejecting invalid configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration fails validation.
    pub fn new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Creates a planner with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            config: PlannerConfig::default(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Produces up to `request.top_n` bundles with the chosen solver.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::EmptyMenu`] when no item has stock, and wraps
    /// internal solver failures; an infeasible request is not an error.
    pub fn build(
        &self,
        request: &BundleRequest,
        items: &[Item],
        kitchen_cap: i64,
        solver: SolverKind,
    ) -> Result<BundleComparison, PlanError> {
        self.build_with_cancel(request, items, kitchen_cap, solver, CancelToken::new())
    }

    /// [`BundlePlanner::build`] with a caller-held cancellation token.
    ///
    /// # Errors
    ///
    /// Same conditions as [`BundlePlanner::build`].
    pub fn build_with_cancel(
        &self,
        request: &BundleRequest,
        items: &[Item],
        kitchen_cap: i64,
        solver: SolverKind,
        cancel: CancelToken,
    ) -> Result<BundleComparison, PlanError> {
        let available: Vec<Item> = items
            .iter()
            .filter(|item| item.available_qty() > 0)
            .cloned()
            .collect();

        if available.is_empty() {
            return Err(PlanError::EmptyMenu);
        }

        let mut ctx = SolveContext::new(&available, request, kitchen_cap);
        ctx.cancel = cancel;

        tracing::debug!(
            %solver,
            items = available.len(),
            people = request.people,
            top_n = request.top_n,
            "building bundles"
        );

        let outcome = match solver {
            SolverKind::Milp => MilpSolver::new(&self.config).solve(&ctx)?,
            SolverKind::Greedy => GreedySolver::default().solve(&ctx)?,
            SolverKind::BruteForce => BruteForceSolver.solve(&ctx)?,
        };

        let mut solutions = outcome.bundles;
        sort_by_score(&mut solutions);

        let finding_time_ms = ctx.elapsed_ms();

        tracing::debug!(
            %solver,
            solutions = solutions.len(),
            finding_time_ms,
            "build finished"
        );

        Ok(BundleComparison {
            solutions,
            solver,
            finding_time_ms,
            no_solution_reason: outcome.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::menu::Diet;

    use super::*;

    fn meat(id: &str, price_cents: i64, available: i64) -> Item {
        Item::new(format!("{id}#1"), id, price_cents, Diet::Meat, available, 1)
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = PlannerConfig {
            min_solution_diversity_percent: 0,
            ..PlannerConfig::default()
        };

        assert!(BundlePlanner::new(config).is_err());
    }

    #[test]
    fn menu_without_stock_is_an_error() {
        let planner = BundlePlanner::with_defaults();
        let items = vec![meat("gone", 1000, 0)];
        let request = BundleRequest::new(2, 2000, 1);

        let result = planner.build(&request, &items, 100, SolverKind::Greedy);

        assert!(matches!(result, Err(PlanError::EmptyMenu)));
    }

    #[test]
    fn out_of_stock_items_never_reach_the_solver() -> TestResult {
        let planner = BundlePlanner::with_defaults();
        let items = vec![
            meat("gone", 100, 0),
            meat("brisket", 1000, 100),
            meat("ribs", 1200, 100),
        ];
        let request = BundleRequest::new(2, 2000, 1).require(Diet::Meat, 2);

        let comparison = planner.build(&request, &items, 100, SolverKind::Greedy)?;

        assert_eq!(comparison.solutions.len(), 1);
        assert_eq!(comparison.solutions[0].quantity_of("gone#1"), 0);
        assert!(comparison.solutions[0].total_servings() >= 2);

        Ok(())
    }

    #[test]
    fn solutions_are_ranked_best_first() -> TestResult {
        let planner = BundlePlanner::with_defaults();
        let items = vec![
            meat("brisket", 600, 30),
            meat("ribs", 700, 30),
            meat("wings", 800, 30),
        ];
        let request = BundleRequest::new(4, 2000, 3).require(Diet::Meat, 4);

        let comparison = planner.build(&request, &items, 100, SolverKind::Milp)?;

        let scores: Vec<i64> = comparison
            .solutions
            .iter()
            .map(|bundle| bundle.metrics.optimality_score)
            .collect();

        assert!(!scores.is_empty());
        assert!(scores.windows(2).all(|pair| pair[0] >= pair[1]));

        Ok(())
    }

    #[test]
    fn infeasible_requests_return_empty_with_a_reason() -> TestResult {
        let planner = BundlePlanner::with_defaults();
        let items = vec![meat("brisket", 1000, 1), meat("ribs", 1000, 1)];
        let request = BundleRequest::new(10, 2000, 1);

        let comparison = planner.build(&request, &items, 100, SolverKind::BruteForce)?;

        assert!(comparison.solutions.is_empty());
        assert_eq!(
            comparison.no_solution_reason,
            Some(NoSolutionReason::Infeasible)
        );

        Ok(())
    }

    #[test]
    fn pre_cancelled_builds_return_nothing() -> TestResult {
        let planner = BundlePlanner::with_defaults();
        let items = vec![meat("brisket", 1000, 100), meat("ribs", 1000, 100)];
        let request = BundleRequest::new(2, 2000, 1);

        let cancel = CancelToken::new();
        cancel.cancel();

        let comparison =
            planner.build_with_cancel(&request, &items, 100, SolverKind::Greedy, cancel)?;

        assert!(comparison.solutions.is_empty());

        Ok(())
    }
}
