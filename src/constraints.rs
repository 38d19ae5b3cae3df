//! Shared constraint model
//!
//! One pure validator describes what makes a bundle valid. The MILP solver
//! encodes the same rules as linear constraints, the brute-force solver
//! accepts leaves with it, and the test suite asserts through it, so the
//! solvers cannot drift apart on what "valid" means.

use thiserror::Error;

use crate::{
    items::Item,
    menu::Diet,
    request::{BundleRequest, DistributionTargets},
};

/// The first constraint a candidate bundle violates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// An item is assigned more servings than its stock.
    #[error("item {item} assigned {quantity} servings but only {available} in stock")]
    QuantityExceedsStock {
        /// Index of the item in the solve's item list
        item: usize,
        /// Assigned servings
        quantity: i64,
        /// Servings in stock
        available: i64,
    },

    /// Fewer total servings than people.
    #[error("{served} servings cannot feed {people} people")]
    DemandShortfall {
        /// Total servings in the bundle
        served: i64,
        /// Headcount
        people: i64,
    },

    /// A diet requirement is not met.
    #[error("{diet} needs {required} servings, bundle has {served}")]
    DietShortfall {
        /// The under-served diet
        diet: Diet,
        /// Servings of that diet in the bundle
        served: i64,
        /// Servings required
        required: i64,
    },

    /// The bundle costs more than the total budget.
    #[error("bundle costs {cost} cents, budget is {budget}")]
    OverBudget {
        /// Bundle cost in cents
        cost: i64,
        /// Total budget in cents
        budget: i64,
    },

    /// The bundle exceeds the kitchen's preparation capacity.
    #[error("bundle load {load} exceeds kitchen capacity {capacity}")]
    KitchenOverloaded {
        /// Total prep load of the bundle
        load: i64,
        /// Kitchen capacity
        capacity: i64,
    },

    /// Not enough distinct items.
    #[error("bundle has {distinct} distinct items, needs at least {minimum}")]
    TooFewDistinctItems {
        /// Distinct items selected
        distinct: i64,
        /// Required minimum
        minimum: i64,
    },

    /// A selected item's share of total servings is outside the portion band.
    #[error("item {item} has {quantity} of {total} servings, outside the portion band")]
    PortionOutOfBand {
        /// Index of the item in the solve's item list
        item: usize,
        /// Assigned servings
        quantity: i64,
        /// Total servings in the bundle
        total: i64,
    },

    /// Selected quantities spread further apart than the fairness range allows.
    #[error("quantity spread {spread} exceeds the fair-distribution limit {limit}")]
    UnevenDistribution {
        /// Max minus min quantity among selected items
        spread: i64,
        /// Allowed spread
        limit: i64,
    },
}

/// The validity contract for one solve.
///
/// Holds references to the immutable inputs plus the distribution targets in
/// force; quantities are checked against it as plain `&[i64]` slices aligned
/// with the item list.
#[derive(Debug)]
pub struct ConstraintModel<'a> {
    items: &'a [Item],
    request: &'a BundleRequest,
    kitchen_cap: i64,
    targets: DistributionTargets,
}

impl<'a> ConstraintModel<'a> {
    /// Creates the model with targets adapted to the request's group size.
    #[must_use]
    pub fn new(items: &'a [Item], request: &'a BundleRequest, kitchen_cap: i64) -> Self {
        Self::with_targets(
            items,
            request,
            kitchen_cap,
            DistributionTargets::for_group(request.people),
        )
    }

    /// Creates the model with explicit distribution targets.
    #[must_use]
    pub fn with_targets(
        items: &'a [Item],
        request: &'a BundleRequest,
        kitchen_cap: i64,
        targets: DistributionTargets,
    ) -> Self {
        Self {
            items,
            request,
            kitchen_cap,
            targets,
        }
    }

    /// The distribution targets this model enforces.
    #[must_use]
    pub const fn targets(&self) -> DistributionTargets {
        self.targets
    }

    /// Checks a quantity assignment against the full constraint set.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConstraintViolation`] found, in the order the
    /// constraints are listed on this type.
    pub fn check(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        self.check_stock(quantities)?;
        self.check_demand(quantities)?;
        self.check_diet_demand(quantities)?;
        self.check_budget(quantities)?;
        self.check_kitchen(quantities)?;
        self.check_variety(quantities)?;
        self.check_portions(quantities)?;
        self.check_distribution(quantities)?;

        Ok(())
    }

    /// Whether a quantity assignment satisfies the full constraint set.
    #[must_use]
    pub fn is_satisfied(&self, quantities: &[i64]) -> bool {
        self.check(quantities).is_ok()
    }

    fn check_stock(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        for (index, (item, &quantity)) in self.items.iter().zip(quantities).enumerate() {
            if quantity < 0 || quantity > item.available_qty() {
                return Err(ConstraintViolation::QuantityExceedsStock {
                    item: index,
                    quantity,
                    available: item.available_qty(),
                });
            }
        }

        Ok(())
    }

    fn check_demand(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let served: i64 = quantities.iter().sum();

        if served < self.request.people {
            return Err(ConstraintViolation::DemandShortfall {
                served,
                people: self.request.people,
            });
        }

        Ok(())
    }

    fn check_diet_demand(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        for diet in Diet::ALL {
            let required = self.request.required(diet);

            if required == 0 {
                continue;
            }

            let served: i64 = self
                .items
                .iter()
                .zip(quantities)
                .filter(|(item, _)| item.diet() == diet)
                .map(|(_, &quantity)| quantity)
                .sum();

            if served < required {
                return Err(ConstraintViolation::DietShortfall {
                    diet,
                    served,
                    required,
                });
            }
        }

        Ok(())
    }

    fn check_budget(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let cost = total_cost(self.items, quantities);
        let budget = self.request.budget_cents();

        if cost > budget {
            return Err(ConstraintViolation::OverBudget { cost, budget });
        }

        Ok(())
    }

    fn check_kitchen(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let load = total_load(self.items, quantities);

        if load > self.kitchen_cap {
            return Err(ConstraintViolation::KitchenOverloaded {
                load,
                capacity: self.kitchen_cap,
            });
        }

        Ok(())
    }

    fn check_variety(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let distinct = distinct_items(quantities);
        let minimum = self.request.min_distinct_items();

        if distinct < minimum {
            return Err(ConstraintViolation::TooFewDistinctItems { distinct, minimum });
        }

        Ok(())
    }

    fn check_portions(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let total: i64 = quantities.iter().sum();
        let min_pct = self.targets.min_portion_pct();
        let max_pct = self.targets.max_portion_pct();

        for (index, &quantity) in quantities.iter().enumerate() {
            if quantity == 0 {
                continue;
            }

            // Integer form of min_portion*total <= q <= max_portion*total,
            // identical to the MILP encoding.
            if 100 * quantity < min_pct * total || 100 * quantity > max_pct * total {
                return Err(ConstraintViolation::PortionOutOfBand {
                    item: index,
                    quantity,
                    total,
                });
            }
        }

        Ok(())
    }

    fn check_distribution(&self, quantities: &[i64]) -> Result<(), ConstraintViolation> {
        let selected: Vec<i64> = quantities.iter().copied().filter(|&q| q > 0).collect();

        let (Some(&min), Some(&max)) = (selected.iter().min(), selected.iter().max()) else {
            return Ok(());
        };

        let spread = max - min;
        let limit = self.targets.spread_limit(self.request.people);

        if spread > limit {
            return Err(ConstraintViolation::UnevenDistribution { spread, limit });
        }

        Ok(())
    }
}

/// Total cost in cents of a quantity assignment.
#[must_use]
pub fn total_cost(items: &[Item], quantities: &[i64]) -> i64 {
    items
        .iter()
        .zip(quantities)
        .map(|(item, &quantity)| item.price_cents() * quantity)
        .sum()
}

/// Total kitchen load of a quantity assignment.
#[must_use]
pub fn total_load(items: &[Item], quantities: &[i64]) -> i64 {
    items
        .iter()
        .zip(quantities)
        .map(|(item, &quantity)| item.load() * quantity)
        .sum()
}

/// Number of items with a positive quantity.
#[must_use]
pub fn distinct_items(quantities: &[i64]) -> i64 {
    quantities.iter().filter(|&&quantity| quantity > 0).count() as i64
}
