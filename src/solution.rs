//! Bundle solutions and their metrics

use smallvec::SmallVec;

use crate::{
    constraints::total_cost,
    items::Item,
    request::BundleRequest,
    scoring::{kitchen_load_percent, popular_items_percent},
};

/// One line of a bundle: an item and how many servings of it to order.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleLine {
    /// Item identifier
    pub item_id: String,

    /// Item display name
    pub name: String,

    /// Price of one serving, in cents
    pub price_cents: i64,

    /// Servings ordered
    pub quantity: i64,
}

/// Quality metrics of a bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleMetrics {
    /// Composite quality score, 0..=100
    pub optimality_score: i64,

    /// Total cost in cents
    pub total_cost_cents: i64,

    /// Total cost divided by headcount (integer division), in cents
    pub average_cost_per_person_cents: i64,

    /// Popular items as a percentage of distinct selected items
    pub popular_items_percent: f64,

    /// Bundle prep load as a percentage of kitchen capacity
    pub kitchen_load_percent: f64,

    /// Milliseconds into the solve when this bundle was found
    pub finding_time_ms: u64,
}

/// A valid bundle: the ordered lines plus computed metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// Selected items with positive quantities
    pub lines: SmallVec<[BundleLine; 10]>,

    /// Quality metrics
    pub metrics: BundleMetrics,
}

impl Bundle {
    /// Assembles a bundle from a quantity assignment aligned with `items`.
    ///
    /// Zero-quantity items are dropped; the score is supplied by the solver
    /// because greedy and exact solvers grade on different scales.
    #[must_use]
    pub fn from_quantities(
        items: &[Item],
        quantities: &[i64],
        request: &BundleRequest,
        kitchen_cap: i64,
        optimality_score: i64,
        finding_time_ms: u64,
    ) -> Self {
        let lines: SmallVec<[BundleLine; 10]> = items
            .iter()
            .zip(quantities)
            .filter(|&(_, &quantity)| quantity > 0)
            .map(|(item, &quantity)| BundleLine {
                item_id: item.id().to_string(),
                name: item.name().to_string(),
                price_cents: item.price_cents(),
                quantity,
            })
            .collect();

        let total_cost_cents = total_cost(items, quantities);

        let metrics = BundleMetrics {
            optimality_score,
            total_cost_cents,
            average_cost_per_person_cents: total_cost_cents / request.people,
            popular_items_percent: popular_items_percent(items, quantities),
            kitchen_load_percent: kitchen_load_percent(items, quantities, kitchen_cap),
            finding_time_ms,
        };

        Self { lines, metrics }
    }

    /// Total servings across all lines.
    #[must_use]
    pub fn total_servings(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Number of distinct items in the bundle.
    #[must_use]
    pub fn distinct_items(&self) -> i64 {
        self.lines.len() as i64
    }

    /// Servings of the item with the given id, zero when absent.
    #[must_use]
    pub fn quantity_of(&self, item_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|line| line.item_id == item_id)
            .map_or(0, |line| line.quantity)
    }
}

/// Sorts bundles by optimality score, best first.
pub fn sort_by_score(bundles: &mut [Bundle]) {
    bundles.sort_by(|a, b| b.metrics.optimality_score.cmp(&a.metrics.optimality_score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::Diet;

    fn items() -> Vec<Item> {
        vec![
            Item::new("ribs#1", "Ribs", 1000, Diet::Meat, 100, 1),
            Item::new("wings#1", "Wings", 1500, Diet::Meat, 100, 2),
            Item::new("salad#1", "Salad", 800, Diet::Vegan, 100, 1),
        ]
    }

    #[test]
    fn zero_quantity_items_are_dropped_from_lines() {
        let items = items();
        let request = BundleRequest::new(3, 2000, 1);

        let bundle = Bundle::from_quantities(&items, &[2, 0, 2], &request, 100, 75, 4);

        assert_eq!(bundle.lines.len(), 2);
        assert_eq!(bundle.quantity_of("ribs#1"), 2);
        assert_eq!(bundle.quantity_of("wings#1"), 0);
        assert_eq!(bundle.total_servings(), 4);
    }

    #[test]
    fn average_cost_uses_integer_division() {
        let items = items();
        let request = BundleRequest::new(3, 2000, 1);

        let bundle = Bundle::from_quantities(&items, &[2, 0, 2], &request, 100, 75, 0);

        // 2*1000 + 2*800 = 3600; 3600 / 3 people = 1200
        assert_eq!(bundle.metrics.total_cost_cents, 3600);
        assert_eq!(bundle.metrics.average_cost_per_person_cents, 1200);
    }

    #[test]
    fn bundles_sort_best_first() {
        let items = items();
        let request = BundleRequest::new(3, 2000, 1);

        let mut bundles = vec![
            Bundle::from_quantities(&items, &[1, 1, 1], &request, 100, 62, 0),
            Bundle::from_quantities(&items, &[2, 0, 2], &request, 100, 91, 0),
            Bundle::from_quantities(&items, &[2, 1, 1], &request, 100, 77, 0),
        ];

        sort_by_score(&mut bundles);

        let scores: Vec<i64> = bundles
            .iter()
            .map(|bundle| bundle.metrics.optimality_score)
            .collect();

        assert_eq!(scores, vec![91, 77, 62]);
    }
}
