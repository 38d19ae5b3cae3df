//! Exhaustive backtracking bundle solver
//!
//! Recurses over items in a deliberate order, trying every quantity that
//! still fits the budget and the kitchen, and validates complete assignments
//! against the shared constraint model. Pruning on running cost, load and
//! remaining stock keeps the tree small enough for realistic menus.

use std::cmp::Ordering;

use crate::{
    constraints::ConstraintModel,
    items::Item,
    request::DistributionTargets,
    scoring::{TARGET_MAX_PORTION, TARGET_MIN_PORTION, optimality_score},
    solution::{Bundle, sort_by_score},
    solvers::{BundleSolver, SolveContext, SolverError, SolverOutcome},
};

/// Cap on servings of a single item in one bundle.
pub const MAX_ITEMS_PER_TYPE: i64 = 20;

/// Solver using exhaustive backtracking
#[derive(Debug)]
pub struct BruteForceSolver;

impl BundleSolver for BruteForceSolver {
    fn solve(&self, ctx: &SolveContext<'_>) -> Result<SolverOutcome, SolverError> {
        let order = search_order(ctx.items, ctx);

        // Leaf validation uses the portion band the scoring targets are
        // stated in, regardless of group size; only the fairness range
        // adapts. Recorded behaviour, kept as-is.
        let adaptive = DistributionTargets::for_group(ctx.request.people);
        let model = ConstraintModel::with_targets(
            ctx.items,
            ctx.request,
            ctx.kitchen_cap,
            DistributionTargets {
                min_portion: TARGET_MIN_PORTION,
                max_portion: TARGET_MAX_PORTION,
                fairness_range: adaptive.fairness_range,
            },
        );

        // Suffix sums of stock along the search order, for pruning branches
        // that can no longer reach the demanded servings.
        let mut reachable = vec![0i64; order.len() + 1];
        for (position, &index) in order.iter().enumerate().rev() {
            reachable[position] =
                reachable[position + 1] + ctx.items[index].available_qty().min(MAX_ITEMS_PER_TYPE);
        }

        let mut search = Search {
            ctx,
            model: &model,
            order: &order,
            reachable: &reachable,
            quantities: vec![0; ctx.items.len()],
            accepted: Vec::new(),
        };

        search.descend(0, 0, 0, 0);

        let mut bundles = search.accepted;
        sort_by_score(&mut bundles);

        Ok(SolverOutcome::found(bundles))
    }
}

/// Mutable state of one backtracking search.
struct Search<'a, 'b> {
    ctx: &'b SolveContext<'a>,
    model: &'b ConstraintModel<'b>,
    order: &'b [usize],
    reachable: &'b [i64],
    quantities: Vec<i64>,
    accepted: Vec<Bundle>,
}

impl Search<'_, '_> {
    /// Tries every quantity of the item at `position`, recursing on the rest.
    fn descend(&mut self, position: usize, served: i64, cost: i64, load: i64) {
        if self.ctx.cancel.is_cancelled() || self.accepted.len() >= self.ctx.request.top_n {
            return;
        }

        // The remaining items cannot serve everyone; no leaf below is valid.
        if served + self.reachable[position] < self.ctx.request.people {
            return;
        }

        if position == self.order.len() {
            self.accept_if_valid();
            return;
        }

        let index = self.order[position];
        let item = &self.ctx.items[index];
        let budget = self.ctx.request.budget_cents();

        let max_quantity = item
            .available_qty()
            .min((budget - cost) / item.price_cents())
            .min((self.ctx.kitchen_cap - load) / item.load())
            .min(MAX_ITEMS_PER_TYPE);

        for quantity in 0..=max_quantity {
            let next_cost = cost + quantity * item.price_cents();
            let next_load = load + quantity * item.load();

            // Higher quantities only cost and weigh more.
            if next_cost > budget || next_load > self.ctx.kitchen_cap {
                break;
            }

            self.quantities[index] = quantity;
            self.descend(position + 1, served + quantity, next_cost, next_load);
        }

        self.quantities[index] = 0;
    }

    /// Full validation at a complete assignment; pruning covered only the
    /// monotone constraints, the rest depend on the final totals.
    fn accept_if_valid(&mut self) {
        if !self.model.is_satisfied(&self.quantities) {
            return;
        }

        let score = optimality_score(
            self.ctx.items,
            &self.quantities,
            self.ctx.request,
            self.ctx.kitchen_cap,
        );

        self.accepted.push(Bundle::from_quantities(
            self.ctx.items,
            &self.quantities,
            self.ctx.request,
            self.ctx.kitchen_cap,
            score,
            self.ctx.elapsed_ms(),
        ));
    }
}

/// Required-diet items first, then popular items, then by rating descending.
fn search_order(items: &[Item], ctx: &SolveContext<'_>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();

    order.sort_by(|&a, &b| {
        let item_a = &items[a];
        let item_b = &items[b];

        let required_a = ctx.request.required(item_a.diet()) > 0;
        let required_b = ctx.request.required(item_b.diet()) > 0;

        required_b
            .cmp(&required_a)
            .then(item_b.is_popular().cmp(&item_a.is_popular()))
            .then(
                item_b
                    .rating()
                    .partial_cmp(&item_a.rating())
                    .unwrap_or(Ordering::Equal),
            )
    });

    order
}
