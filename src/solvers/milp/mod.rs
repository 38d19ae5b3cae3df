//! MILP bundle solver
//!
//! Builds an integer model of the constraint contract, solves it, then
//! re-solves with a diversity cut against each accepted solution until the
//! requested number of bundles is collected or the model goes infeasible.

use std::time::{Duration, Instant};

use good_lp::{Expression, ResolutionError, Solution, SolverModel};

#[cfg(feature = "solver-highs")]
use good_lp::solvers::highs::highs as default_solver;
#[cfg(all(not(feature = "solver-highs"), feature = "solver-microlp"))]
use good_lp::solvers::microlp::microlp as default_solver;

use crate::{
    config::PlannerConfig,
    items::Item,
    menu::Diet,
    request::{DistributionTargets, floor_scaled},
    scoring::optimality_score,
    solution::Bundle,
    solvers::{
        BundleSolver, NoSolutionReason, SolveContext, SolverError, SolverOutcome,
        milp::state::{ConstraintRelation, MilpState, coefficient},
    },
};

pub(crate) mod state;

/// Objective scale for prices; large enough that rating bonuses only ever
/// break ties between equal-cost bundles.
pub const PRICE_OBJECTIVE_SCALE: i64 = 1000;

/// Above this many items, pairwise constraints are only emitted for pairs
/// that can both reach the minimum selected portion.
pub const PAIRWISE_ITEM_LIMIT: usize = 50;

/// The pairwise fairness bound is tightened to this fraction of the
/// validator's range, keeping the exact solutions comfortably inside it.
const PAIRWISE_TIGHTENING: f64 = 0.8;

/// Solver using Mixed Integer Linear Programming (MILP)
#[derive(Debug)]
pub struct MilpSolver {
    diversity_percent: i64,
    time_cap: Duration,
    detailed: bool,
}

impl MilpSolver {
    /// Creates a solver from validated planner configuration.
    #[must_use]
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            diversity_percent: i64::from(config.min_solution_diversity_percent),
            time_cap: Duration::from_millis(config.max_time_per_solution_ms),
            detailed: config.enable_detailed_logging,
        }
    }

    /// One solve against the accumulated diversity cuts.
    ///
    /// Returns `Ok(None)` when the model is infeasible.
    fn solve_once(
        &self,
        ctx: &SolveContext<'_>,
        priors: &[Vec<i64>],
    ) -> Result<Option<Vec<i64>>, SolverError> {
        let items = ctx.items;
        let request = ctx.request;
        let targets = DistributionTargets::for_group(request.people);

        let total_stock: i64 = items.iter().map(Item::available_qty).sum();
        let max_stock: i64 = items.iter().map(Item::available_qty).max().unwrap_or(0);

        let mut state = MilpState::new();

        // Quantity variables with linked selection booleans, and the cost
        // objective. Prices dominate; bonuses nudge ties toward popular and
        // well-rated items.
        let mut quantities = Vec::with_capacity(items.len());
        let mut selections = Vec::with_capacity(items.len());

        for item in items {
            let quantity = state.add_quantity_var(item.available_qty());
            let weight = item.price_cents() * PRICE_OBJECTIVE_SCALE - objective_bonus(item);
            state.add_objective_term(quantity, coefficient(weight)?);

            let selected = state.add_linked_selection(quantity, item.available_qty());

            quantities.push(quantity);
            selections.push(selected);
        }

        // Demand: enough servings for everyone.
        let servings: Expression = quantities.iter().copied().sum();
        state.add_geq(servings, request.people as f64);

        // Per-diet demand.
        for diet in Diet::ALL {
            let required = request.required(diet);

            if required == 0 {
                continue;
            }

            let diet_servings: Expression = items
                .iter()
                .zip(&quantities)
                .filter(|(item, _)| item.diet() == diet)
                .map(|(_, &quantity)| quantity)
                .sum();

            state.add_geq(diet_servings, required as f64);
        }

        // Budget.
        let mut cost = Expression::default();
        for (item, &quantity) in items.iter().zip(&quantities) {
            cost += quantity * coefficient(item.price_cents())?;
        }
        state.add_leq(cost, coefficient(request.budget_cents())?);

        // Kitchen capacity.
        let mut load = Expression::default();
        for (item, &quantity) in items.iter().zip(&quantities) {
            load += quantity * coefficient(item.load())?;
        }
        state.add_leq(load, coefficient(ctx.kitchen_cap)?);

        // Minimum variety.
        let selected_count: Expression = selections.iter().copied().sum();
        state.add_geq(selected_count, request.min_distinct_items() as f64);

        self.add_portion_bounds(&mut state, &quantities, &selections, targets, total_stock);
        self.add_pairwise_fairness(ctx, &mut state, &quantities, &selections, targets, max_stock);

        for prior in priors {
            self.add_diversity_cut(&mut state, &quantities, prior, max_stock);
        }

        if self.detailed {
            tracing::debug!(
                items = items.len(),
                priors = priors.len(),
                constraints = state.constraint_count(),
                "built MILP model"
            );
        }

        let (pb, objective, constraints) = state.into_parts();

        let mut model = pb.minimise(objective).using(default_solver);

        for constraint in constraints {
            model = match constraint.relation {
                ConstraintRelation::Leq => model.with(constraint.lhs.leq(constraint.rhs)),
                ConstraintRelation::Geq => model.with(constraint.lhs.geq(constraint.rhs)),
            };
        }

        match model.solve() {
            Ok(solution) => {
                let assignment = items
                    .iter()
                    .zip(&quantities)
                    .map(|(item, &quantity)| {
                        integral_quantity(solution.value(quantity), item.available_qty())
                    })
                    .collect::<Result<Vec<i64>, SolverError>>()?;

                Ok(Some(assignment))
            }
            Err(ResolutionError::Infeasible) => Ok(None),
            Err(other) => Err(other.into()),
        }
    }

    /// Portion bounds over total servings: the upper band is unconditional,
    /// the lower band only binds for selected items.
    fn add_portion_bounds(
        &self,
        state: &mut MilpState,
        quantities: &[good_lp::Variable],
        selections: &[good_lp::Variable],
        targets: DistributionTargets,
        total_stock: i64,
    ) {
        let min_pct = targets.min_portion_pct() as f64;
        let max_pct = targets.max_portion_pct() as f64;

        // Slack that disables the lower band when the item is unselected.
        let relaxation = min_pct * total_stock as f64;

        for (index, &quantity) in quantities.iter().enumerate() {
            // 100*x_i <= max_pct * T
            let mut upper = quantity * 100.0;
            for &other in quantities {
                upper += other * -max_pct;
            }
            state.add_leq(upper, 0.0);

            // 100*x_i >= min_pct * T - relaxation * (1 - y_i)
            let mut lower = quantity * 100.0;
            for &other in quantities {
                lower += other * -min_pct;
            }
            lower += selections[index] * -relaxation;
            state.add_geq(lower, -relaxation);
        }
    }

    /// Pairwise fairness between selected items, with the tightened bound.
    fn add_pairwise_fairness(
        &self,
        ctx: &SolveContext<'_>,
        state: &mut MilpState,
        quantities: &[good_lp::Variable],
        selections: &[good_lp::Variable],
        targets: DistributionTargets,
        max_stock: i64,
    ) {
        let items = ctx.items;
        let spread_limit = floor_scaled(
            targets.fairness_range * PAIRWISE_TIGHTENING,
            ctx.request.people,
        ) as f64;
        let relaxation = max_stock as f64;

        // With many items, only constrain pairs whose stocks can both reach
        // the minimum selected portion; other pairs can never be selected
        // together with their bands satisfied.
        let enforce_all = items.len() <= PAIRWISE_ITEM_LIMIT;
        let min_selected =
            (targets.min_portion * ctx.request.people as f64 - 1e-9).ceil() as i64;

        let mut skipped = 0usize;

        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                if !enforce_all
                    && (items[i].available_qty() < min_selected
                        || items[j].available_qty() < min_selected)
                {
                    skipped += 1;
                    continue;
                }

                let both = state.add_conjunction(selections[i], selections[j]);

                // |x_i - x_j| <= limit + relaxation * (1 - z)
                let mut forward = Expression::from(quantities[i]);
                forward += quantities[j] * -1.0;
                forward += both * relaxation;
                state.add_leq(forward, spread_limit + relaxation);

                let mut backward = Expression::from(quantities[j]);
                backward += quantities[i] * -1.0;
                backward += both * relaxation;
                state.add_leq(backward, spread_limit + relaxation);
            }
        }

        if skipped > 0 && self.detailed {
            tracing::debug!(skipped, "pairwise fairness constraints not emitted");
        }
    }

    /// Forces the next solution to assign at least a fraction of the prior
    /// solution's servings differently.
    ///
    /// Items absent from a solution count as quantity zero, so adding an item
    /// the prior skipped is itself a difference.
    fn add_diversity_cut(
        &self,
        state: &mut MilpState,
        quantities: &[good_lp::Variable],
        prior: &[i64],
        max_stock: i64,
    ) {
        let prior_total: i64 = prior.iter().sum();
        let required_diffs = crate::div_ceil_i64(prior_total * self.diversity_percent, 100).max(1);
        let relaxation = (max_stock + 1) as f64;

        let mut differing = Expression::default();

        for (&quantity, &prior_quantity) in quantities.iter().zip(prior) {
            let prior_value = prior_quantity as f64;

            // differs = 1 forces x away from the prior value; `above` picks
            // which side. Only the forcing direction is encoded, which is
            // all the cut needs.
            let differs = state.add_binary_var();
            let above = state.add_binary_var();

            // differs = 1, above = 1  =>  x >= prior + 1
            let mut ge = Expression::from(quantity);
            ge += differs * -relaxation;
            ge += above * -relaxation;
            state.add_geq(ge, prior_value + 1.0 - 2.0 * relaxation);

            // differs = 1, above = 0  =>  x <= prior - 1
            let mut le = Expression::from(quantity);
            le += differs * relaxation;
            le += above * -relaxation;
            state.add_leq(le, prior_value - 1.0 + relaxation);

            differing += differs;
        }

        state.add_geq(differing, required_diffs as f64);

        if self.detailed {
            tracing::debug!(required_diffs, prior_total, "added diversity cut");
        }
    }
}

impl BundleSolver for MilpSolver {
    fn solve(&self, ctx: &SolveContext<'_>) -> Result<SolverOutcome, SolverError> {
        let mut priors: Vec<Vec<i64>> = Vec::new();
        let mut bundles = Vec::new();
        let mut reason = None;

        for iteration in 0..ctx.request.top_n {
            if ctx.cancel.is_cancelled() {
                tracing::debug!(iteration, "MILP solve cancelled");
                break;
            }

            let solve_started = Instant::now();
            let assignment = self.solve_once(ctx, &priors)?;
            let timed_out = solve_started.elapsed() > self.time_cap;

            match assignment {
                Some(assignment) => {
                    let score = optimality_score(
                        ctx.items,
                        &assignment,
                        ctx.request,
                        ctx.kitchen_cap,
                    );

                    bundles.push(Bundle::from_quantities(
                        ctx.items,
                        &assignment,
                        ctx.request,
                        ctx.kitchen_cap,
                        score,
                        ctx.elapsed_ms(),
                    ));
                    priors.push(assignment);

                    if timed_out {
                        tracing::debug!(iteration, "MILP solve exceeded its time cap, stopping");
                        reason = Some(NoSolutionReason::TimedOut);
                        break;
                    }
                }
                None => {
                    reason = Some(if timed_out {
                        NoSolutionReason::TimedOut
                    } else {
                        NoSolutionReason::Infeasible
                    });
                    break;
                }
            }
        }

        let reason = bundles.is_empty().then(|| {
            reason.unwrap_or(NoSolutionReason::Infeasible)
        });

        Ok(SolverOutcome { bundles, reason })
    }
}

/// How far from a whole number a backend value may sit and still be
/// accepted as an integer quantity.
const INTEGRALITY_TOLERANCE: f64 = 1e-4;

/// Recover an integer quantity from a backend float.
///
/// The backend returns floats for integer variables; anything that does not
/// round-trip to a whole number within its bounds means the model or the
/// backend misbehaved, and silently rounding it would corrupt the bundle.
///
/// # Errors
///
/// Returns [`SolverError::InvariantViolation`] for a value that is not
/// integral within tolerance or lies outside `0..=available`.
fn integral_quantity(value: f64, available: i64) -> Result<i64, SolverError> {
    let rounded = value.round();

    if (value - rounded).abs() > INTEGRALITY_TOLERANCE {
        return Err(SolverError::InvariantViolation {
            message: "solver returned a non-integral quantity",
        });
    }

    let quantity = rounded as i64;

    if quantity < 0 || quantity > available {
        return Err(SolverError::InvariantViolation {
            message: "solver returned a quantity outside its stock bounds",
        });
    }

    Ok(quantity)
}

/// Objective bonus of an item: popularity, rating tier and a flat diversity
/// nudge. Always well below one cent on the price scale.
fn objective_bonus(item: &Item) -> i64 {
    let popularity_bonus = i64::from(item.is_popular());

    let rating_bonus = if item.is_highly_rated() {
        2
    } else {
        i64::from(item.has_good_rating())
    };

    popularity_bonus + rating_bonus + 1
}
