//! Randomized greedy bundle solver
//!
//! Builds each bundle in a single pass: diet requirements first, then free
//! fill until everyone is served, spreading servings across the pool one at
//! a time. A construction that ends outside the portion or fairness bands is
//! topped up toward balance, and every bundle is validated against the
//! shared constraint model before it is returned; a run that cannot produce
//! a valid bundle ends the solve. Runs once per requested solution with a
//! per-run seed so the orderings differ between runs but never between two
//! invocations with the same seed.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    constraints::{ConstraintModel, ConstraintViolation},
    menu::Diet,
    scoring::greedy_score,
    solution::Bundle,
    solvers::{BundleSolver, SolveContext, SolverError, SolverOutcome},
};

/// Default base seed; run `r` of a solve uses `seed + r`.
pub const DEFAULT_SEED: u64 = 0;

/// Upper bound of the per-item ordering jitter.
const JITTER_RANGE: u32 = 1024;

/// Why a single greedy run produced no bundle. Never surfaced to callers;
/// a failed run just ends the solve.
#[derive(Debug, PartialEq, Eq)]
enum RunFailure {
    /// A diet requirement could not be met from the eligible pool
    DietUnsatisfied(Diet),

    /// No item could take one more serving within budget and capacity
    NoEligibleItem,

    /// The construction could not be topped up into a valid bundle
    Unbalanced,
}

/// Solver using randomized greedy construction
#[derive(Debug)]
pub struct GreedySolver {
    seed: u64,
}

impl Default for GreedySolver {
    fn default() -> Self {
        Self { seed: DEFAULT_SEED }
    }
}

impl GreedySolver {
    /// Creates a solver with an explicit base seed.
    ///
    /// Two solvers with the same seed produce identical bundles for the same
    /// inputs; the core never seeds from the clock.
    #[must_use]
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// One construction pass with its own ordering jitter.
    fn construct(
        &self,
        ctx: &SolveContext<'_>,
        rng: &mut StdRng,
    ) -> Result<Vec<i64>, RunFailure> {
        let items = ctx.items;
        let order = jittered_order(ctx, rng);

        let mut pass = FillPass::new(ctx);

        // Dietary passes, always VEGAN -> VEGETARIAN -> MEAT. Each sweep
        // adds one serving per eligible item of the diet, so no single item
        // runs away from the portion band.
        for diet in Diet::ALL {
            let mut remaining = ctx.request.required(diet);

            while remaining > 0 {
                let mut progressed = false;

                for &index in &order {
                    if remaining == 0 {
                        break;
                    }

                    if items[index].diet() != diet || !pass.can_add(index) {
                        continue;
                    }

                    pass.add(index);
                    remaining -= 1;
                    progressed = true;
                }

                if !progressed {
                    return Err(RunFailure::DietUnsatisfied(diet));
                }
            }
        }

        // Free fill until everyone is served, in the same sweeping manner.
        while pass.served < ctx.request.people {
            let mut progressed = false;

            for &index in &order {
                if pass.served == ctx.request.people {
                    break;
                }

                if !pass.can_add(index) {
                    continue;
                }

                pass.add(index);
                progressed = true;
            }

            if !progressed {
                return Err(RunFailure::NoEligibleItem);
            }
        }

        let model = ConstraintModel::new(ctx.items, ctx.request, ctx.kitchen_cap);

        pass.balance(&order, &model)?;

        Ok(pass.quantities)
    }
}

impl BundleSolver for GreedySolver {
    fn solve(&self, ctx: &SolveContext<'_>) -> Result<SolverOutcome, SolverError> {
        let mut bundles = Vec::new();

        for run in 0..ctx.request.top_n {
            if ctx.cancel.is_cancelled() {
                tracing::debug!(run, "greedy solve cancelled");
                break;
            }

            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(run as u64));

            match self.construct(ctx, &mut rng) {
                Ok(quantities) => {
                    let score =
                        greedy_score(ctx.items, &quantities, ctx.request, ctx.kitchen_cap);

                    bundles.push(Bundle::from_quantities(
                        ctx.items,
                        &quantities,
                        ctx.request,
                        ctx.kitchen_cap,
                        score,
                        ctx.elapsed_ms(),
                    ));
                }
                Err(failure) => {
                    // Later runs face the same pool and budget; they will
                    // not succeed where this one failed.
                    tracing::debug!(run, ?failure, "greedy run failed, stopping");
                    break;
                }
            }
        }

        Ok(SolverOutcome::found(bundles))
    }
}

/// Running totals of one construction pass.
struct FillPass<'a> {
    ctx: &'a SolveContext<'a>,
    quantities: Vec<i64>,
    served: i64,
    cost: i64,
    load: i64,
}

impl<'a> FillPass<'a> {
    fn new(ctx: &'a SolveContext<'a>) -> Self {
        Self {
            ctx,
            quantities: vec![0; ctx.items.len()],
            served: 0,
            cost: 0,
            load: 0,
        }
    }

    /// Whether one more serving of the item fits stock, capacity and the
    /// budget. The budget grows with the people served so far (pay as you
    /// go) but never past the request's total.
    fn can_add(&self, index: usize) -> bool {
        let item = &self.ctx.items[index];
        let request = self.ctx.request;

        let allowance = (request.max_price_per_person_cents * (self.served + 1))
            .min(request.budget_cents());

        self.quantities[index] < item.available_qty()
            && self.load + item.load() <= self.ctx.kitchen_cap
            && self.cost + item.price_cents() <= allowance
    }

    fn add(&mut self, index: usize) {
        let item = &self.ctx.items[index];

        self.quantities[index] += 1;
        self.served += 1;
        self.cost += item.price_cents();
        self.load += item.load();
    }

    /// Tops the construction up until it passes the shared validator.
    ///
    /// Distribution shortfalls (portion band, quantity spread, variety) are
    /// repaired by adding one serving to the eligible item with the fewest
    /// servings, which only ever evens the bundle out. Any other violation,
    /// or running out of eligible items, fails the run.
    fn balance(
        &mut self,
        order: &[usize],
        model: &ConstraintModel<'_>,
    ) -> Result<(), RunFailure> {
        loop {
            match model.check(&self.quantities) {
                Ok(()) => return Ok(()),
                Err(
                    ConstraintViolation::PortionOutOfBand { .. }
                    | ConstraintViolation::UnevenDistribution { .. }
                    | ConstraintViolation::TooFewDistinctItems { .. },
                ) => {
                    let candidate = order
                        .iter()
                        .copied()
                        .filter(|&index| self.can_add(index))
                        .min_by_key(|&index| self.quantities[index]);

                    let Some(index) = candidate else {
                        return Err(RunFailure::Unbalanced);
                    };

                    self.add(index);
                }
                Err(_) => return Err(RunFailure::Unbalanced),
            }
        }
    }
}

/// Item indexes sorted by diet name, rating tier, popularity tier, price,
/// then a per-run jitter.
///
/// Diet-first grouping lets the dietary passes consume preferred items
/// first; the jitter produces distinct but still sensible orderings between
/// runs.
fn jittered_order(ctx: &SolveContext<'_>, rng: &mut StdRng) -> Vec<usize> {
    let jitter: Vec<u32> = ctx
        .items
        .iter()
        .map(|_| rng.gen_range(0..JITTER_RANGE))
        .collect();

    let mut order: Vec<usize> = (0..ctx.items.len()).collect();

    order.sort_by_key(|&index| {
        let item = &ctx.items[index];

        (
            item.diet().as_str(),
            u8::from(!item.is_highly_rated()),
            u8::from(!item.is_popular()),
            item.price_cents(),
            jitter[index],
        )
    });

    order
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{items::Item, menu::Rating, request::BundleRequest};

    use super::*;

    fn item(id: &str, price_cents: i64, diet: Diet, available: i64, load: i64) -> Item {
        Item::new(format!("{id}#1"), id, price_cents, diet, available, load)
    }

    #[test]
    fn fills_diet_requirements_in_fixed_order() -> TestResult {
        let items = vec![
            item("steak", 1500, Diet::Meat, 100, 3),
            item("quiche", 1200, Diet::Vegetarian, 100, 1),
            item("falafel", 1000, Diet::Vegan, 100, 2),
        ];
        let request = BundleRequest::new(3, 2000, 1)
            .require(Diet::Vegan, 1)
            .require(Diet::Vegetarian, 1)
            .require(Diet::Meat, 1);
        let ctx = SolveContext::new(&items, &request, 50);

        let outcome = GreedySolver::default().solve(&ctx)?;

        assert_eq!(outcome.bundles.len(), 1);

        let bundle = &outcome.bundles[0];
        assert_eq!(bundle.quantity_of("steak#1"), 1);
        assert_eq!(bundle.quantity_of("quiche#1"), 1);
        assert_eq!(bundle.quantity_of("falafel#1"), 1);

        Ok(())
    }

    #[test]
    fn every_returned_bundle_passes_the_shared_validator() -> TestResult {
        let items = vec![
            item("brisket", 1000, Diet::Meat, 100, 1),
            item("ribs", 1500, Diet::Meat, 100, 1),
        ];
        let request = BundleRequest::new(3, 2000, 2).require(Diet::Meat, 3);
        let ctx = SolveContext::new(&items, &request, 100);

        let outcome = GreedySolver::default().solve(&ctx)?;
        let model = ConstraintModel::new(&items, &request, 100);

        assert!(!outcome.bundles.is_empty());

        for bundle in &outcome.bundles {
            let quantities: Vec<i64> = items
                .iter()
                .map(|item| bundle.quantity_of(item.id()))
                .collect();

            assert_eq!(model.check(&quantities), Ok(()));
        }

        Ok(())
    }

    #[test]
    fn same_seed_reproduces_the_same_bundles() -> TestResult {
        let items = vec![
            item("brisket", 1000, Diet::Meat, 100, 1),
            item("ribs", 1000, Diet::Meat, 100, 1),
            item("wings", 1000, Diet::Meat, 100, 1),
        ];
        let request = BundleRequest::new(4, 2000, 3).require(Diet::Meat, 4);
        let ctx = SolveContext::new(&items, &request, 100);

        let first = GreedySolver::with_seed(7).solve(&ctx)?;
        let second = GreedySolver::with_seed(7).solve(&ctx)?;

        assert_eq!(first.bundles.len(), second.bundles.len());

        for (a, b) in first.bundles.iter().zip(&second.bundles) {
            assert_eq!(a.lines, b.lines);
        }

        Ok(())
    }

    #[test]
    fn cheapest_items_are_consumed_before_expensive_ones() -> TestResult {
        let items = vec![
            item("premium", 1900, Diet::Meat, 100, 1),
            item("value", 1000, Diet::Meat, 100, 1),
            item("mid", 1500, Diet::Meat, 100, 1),
        ];
        let request = BundleRequest::new(2, 2000, 1).require(Diet::Meat, 2);
        let ctx = SolveContext::new(&items, &request, 100);

        let outcome = GreedySolver::default().solve(&ctx)?;
        let bundle = &outcome.bundles[0];

        // Two servings from the two cheapest items; the most expensive one
        // is never reached.
        assert_eq!(bundle.quantity_of("value#1"), 1);
        assert_eq!(bundle.quantity_of("mid#1"), 1);
        assert_eq!(bundle.quantity_of("premium#1"), 0);

        Ok(())
    }

    #[test]
    fn highly_rated_items_come_before_cheaper_unrated_ones() -> TestResult {
        let famous = Item::with_votes(
            "famous#1",
            "famous",
            1500,
            Diet::Meat,
            100,
            1,
            Rating {
                upvote_count: 90,
                downvote_count: 10,
                review_count: 0,
            },
        );
        let items = vec![
            item("cheap", 1000, Diet::Meat, 100, 1),
            famous,
            item("mid", 1200, Diet::Meat, 100, 1),
        ];
        let request = BundleRequest::new(2, 2000, 1).require(Diet::Meat, 2);
        let ctx = SolveContext::new(&items, &request, 100);

        let outcome = GreedySolver::default().solve(&ctx)?;
        let bundle = &outcome.bundles[0];

        // The famous item sorts ahead of both plain items despite its
        // price, so it takes one of the two servings; the plain mid-priced
        // item goes unused.
        assert_eq!(bundle.quantity_of("famous#1"), 1);
        assert_eq!(bundle.quantity_of("cheap#1"), 1);
        assert_eq!(bundle.quantity_of("mid#1"), 0);

        Ok(())
    }

    #[test]
    fn lopsided_constructions_are_topped_up_to_balance() -> TestResult {
        // Three people from two items: the sweeps end at [2, 1], outside the
        // 50% portion cap, and the balance pass adds one more serving of the
        // smaller item.
        let items = vec![
            item("brisket", 1000, Diet::Meat, 100, 1),
            item("ribs", 1500, Diet::Meat, 100, 1),
        ];
        let request = BundleRequest::new(3, 2000, 1).require(Diet::Meat, 3);
        let ctx = SolveContext::new(&items, &request, 100);

        let outcome = GreedySolver::default().solve(&ctx)?;
        let bundle = &outcome.bundles[0];

        assert_eq!(bundle.quantity_of("brisket#1"), 2);
        assert_eq!(bundle.quantity_of("ribs#1"), 2);
        assert_eq!(bundle.metrics.total_cost_cents, 5000);

        Ok(())
    }

    #[test]
    fn unmeetable_diet_requirement_yields_no_bundles() -> TestResult {
        let items = vec![item("steak", 1500, Diet::Meat, 100, 1)];
        let request = BundleRequest::new(2, 2000, 2).require(Diet::Vegan, 1);
        let ctx = SolveContext::new(&items, &request, 100);

        let outcome = GreedySolver::default().solve(&ctx)?;

        assert!(outcome.bundles.is_empty());
        assert!(outcome.reason.is_some());

        Ok(())
    }

    #[test]
    fn kitchen_capacity_stops_the_fill() -> TestResult {
        let items = vec![
            item("stew", 100, Diet::Meat, 100, 10),
            item("roast", 100, Diet::Meat, 100, 10),
        ];
        let request = BundleRequest::new(5, 2000, 1);
        let ctx = SolveContext::new(&items, &request, 40);

        // Only four servings fit the kitchen; five people cannot be served.
        let outcome = GreedySolver::default().solve(&ctx)?;

        assert!(outcome.bundles.is_empty());

        Ok(())
    }
}
