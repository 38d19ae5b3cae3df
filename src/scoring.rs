//! Solution scoring
//!
//! One composite 0–100 score shared by the exact solvers, and a 60-base
//! score with a small efficiency bonus for greedy constructions. The two
//! scales are deliberately distinct: greedy scores live in 60..=80 so an
//! exact solution at 80+ is recognisably better without comparing optima.

use crate::{
    constraints::{distinct_items, total_cost, total_load},
    items::Item,
    request::{BundleRequest, MIN_DIFFERENT_ITEMS},
};

/// Weight of the cost-efficiency component.
pub const COST_EFFICIENCY_WEIGHT: f64 = 25.0;

/// Weight of the popular-items component.
pub const POPULAR_ITEMS_WEIGHT: f64 = 20.0;

/// Weight of the highly-rated-items component.
pub const HIGHLY_RATED_WEIGHT: f64 = 20.0;

/// Weight of the kitchen-efficiency component.
pub const KITCHEN_EFFICIENCY_WEIGHT: f64 = 15.0;

/// Weight of the distribution-fairness component.
pub const FAIRNESS_WEIGHT: f64 = 10.0;

/// Weight of the diversity component.
pub const DIVERSITY_WEIGHT: f64 = 10.0;

/// Base score of every greedy construction.
pub const GREEDY_BASE_SCORE: i64 = 60;

/// Portion share the fairness component measures quantity spread against.
pub const TARGET_MAX_PORTION: f64 = 0.50;

/// Lower edge of the portion band the fairness target belongs to.
pub const TARGET_MIN_PORTION: f64 = 0.10;

/// Composite 0–100 optimality score for an exact-solver bundle.
///
/// Scoring is pure: the same quantities always produce the same integer.
#[must_use]
pub fn optimality_score(
    items: &[Item],
    quantities: &[i64],
    request: &BundleRequest,
    kitchen_cap: i64,
) -> i64 {
    let raw = cost_efficiency(items, quantities, request)
        + popular_items(items, quantities)
        + highly_rated_items(items, quantities)
        + kitchen_efficiency(items, quantities, kitchen_cap)
        + distribution_fairness(quantities)
        + diversity(quantities, request);

    (raw.round() as i64).clamp(0, 100)
}

/// Greedy score: 60 base plus up to 20 efficiency bonus points
/// (budget 6, popular 5, highly rated 5, kitchen 4).
#[must_use]
pub fn greedy_score(
    items: &[Item],
    quantities: &[i64],
    request: &BundleRequest,
    kitchen_cap: i64,
) -> i64 {
    let bonus = cost_efficiency(items, quantities, request) / COST_EFFICIENCY_WEIGHT * 6.0
        + popular_items(items, quantities) / POPULAR_ITEMS_WEIGHT * 5.0
        + highly_rated_items(items, quantities) / HIGHLY_RATED_WEIGHT * 5.0
        + kitchen_efficiency(items, quantities, kitchen_cap) / KITCHEN_EFFICIENCY_WEIGHT * 4.0;

    (GREEDY_BASE_SCORE + bonus.round() as i64).clamp(GREEDY_BASE_SCORE, 80)
}

/// Rewards bundles that use the budget: `(cost / budget) * weight`, zero for
/// empty or over-budget bundles. Spending more scores higher; this is the
/// recorded behaviour of the system, not a bug to fix here.
fn cost_efficiency(items: &[Item], quantities: &[i64], request: &BundleRequest) -> f64 {
    let cost = total_cost(items, quantities);
    let budget = request.budget_cents();

    if cost <= 0 || budget <= 0 || cost > budget {
        return 0.0;
    }

    cost as f64 / budget as f64 * COST_EFFICIENCY_WEIGHT
}

fn popular_items(items: &[Item], quantities: &[i64]) -> f64 {
    fraction_of_selected(items, quantities, Item::is_popular) * POPULAR_ITEMS_WEIGHT
}

fn highly_rated_items(items: &[Item], quantities: &[i64]) -> f64 {
    fraction_of_selected(items, quantities, Item::is_highly_rated) * HIGHLY_RATED_WEIGHT
}

fn kitchen_efficiency(items: &[Item], quantities: &[i64], kitchen_cap: i64) -> f64 {
    let load_percent = kitchen_load_percent(items, quantities, kitchen_cap);

    if load_percent <= 0.0 || load_percent > 100.0 {
        return 0.0;
    }

    load_percent / 100.0 * KITCHEN_EFFICIENCY_WEIGHT
}

/// `weight * (1 - spread / TARGET_MAX_PORTION)` where spread is the gap
/// between the largest and smallest selected share of total servings.
fn distribution_fairness(quantities: &[i64]) -> f64 {
    let total: i64 = quantities.iter().sum();

    if total == 0 || distinct_items(quantities) < MIN_DIFFERENT_ITEMS {
        return 0.0;
    }

    let shares: Vec<f64> = quantities
        .iter()
        .filter(|&&quantity| quantity > 0)
        .map(|&quantity| quantity as f64 / total as f64)
        .collect();

    let max_share = shares.iter().copied().fold(f64::MIN, f64::max);
    let min_share = shares.iter().copied().fold(f64::MAX, f64::min);
    let spread = max_share - min_share;

    if spread > TARGET_MAX_PORTION {
        return 0.0;
    }

    FAIRNESS_WEIGHT * (1.0 - spread / TARGET_MAX_PORTION)
}

/// Rewards item variety relative to the group size: full weight at
/// `max(MIN_DIFFERENT_ITEMS, people / 5)` distinct items.
fn diversity(quantities: &[i64], request: &BundleRequest) -> f64 {
    let distinct = distinct_items(quantities);

    if distinct < MIN_DIFFERENT_ITEMS {
        return 0.0;
    }

    let target = (MIN_DIFFERENT_ITEMS as f64).max(request.people as f64 / 5.0);

    DIVERSITY_WEIGHT * (distinct as f64 / target).min(1.0)
}

/// Share of selected items matching a predicate, zero with no selection.
fn fraction_of_selected(items: &[Item], quantities: &[i64], matches: fn(&Item) -> bool) -> f64 {
    let distinct = distinct_items(quantities);

    if distinct == 0 {
        return 0.0;
    }

    let matching = items
        .iter()
        .zip(quantities)
        .filter(|&(item, &quantity)| quantity > 0 && matches(item))
        .count();

    matching as f64 / distinct as f64
}

/// Bundle load as a percentage of kitchen capacity.
#[must_use]
pub fn kitchen_load_percent(items: &[Item], quantities: &[i64], kitchen_cap: i64) -> f64 {
    if kitchen_cap <= 0 {
        return 0.0;
    }

    total_load(items, quantities) as f64 * 100.0 / kitchen_cap as f64
}

/// Selected items matching the popularity predicate, as a percentage of
/// distinct selected items.
#[must_use]
pub fn popular_items_percent(items: &[Item], quantities: &[i64]) -> f64 {
    fraction_of_selected(items, quantities, Item::is_popular) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{Diet, Rating};

    fn plain(id: &str, price_cents: i64, load: i64) -> Item {
        Item::new(format!("{id}#1"), id, price_cents, Diet::Meat, 100, load)
    }

    fn popular(id: &str, price_cents: i64) -> Item {
        Item::with_votes(
            format!("{id}#1"),
            id,
            price_cents,
            Diet::Meat,
            100,
            1,
            Rating {
                upvote_count: 180,
                downvote_count: 20,
                review_count: 40,
            },
        )
    }

    #[test]
    fn scoring_is_idempotent() {
        let items = vec![popular("ribs", 1000), plain("wings", 1500, 1)];
        let request = BundleRequest::new(4, 2000, 1);

        let first = optimality_score(&items, &[2, 2], &request, 100);
        let second = optimality_score(&items, &[2, 2], &request, 100);

        assert_eq!(first, second);
    }

    #[test]
    fn score_stays_within_bounds() {
        let items = vec![popular("ribs", 1000), popular("wings", 1000)];
        let request = BundleRequest::new(4, 1000, 1);

        let score = optimality_score(&items, &[2, 2], &request, 4);

        assert!((0..=100).contains(&score));
    }

    #[test]
    fn empty_bundle_scores_zero() {
        let items = vec![plain("ribs", 1000, 1)];
        let request = BundleRequest::new(4, 2000, 1);

        assert_eq!(optimality_score(&items, &[0], &request, 100), 0);
    }

    #[test]
    fn over_budget_bundles_get_no_cost_component() {
        let items = vec![plain("ribs", 5000, 1), plain("wings", 5000, 1)];
        let request = BundleRequest::new(2, 2000, 1);

        let over = cost_efficiency(&items, &[2, 2], &request);

        assert_eq!(over, 0.0);
    }

    #[test]
    fn spending_the_budget_scores_higher_than_saving_it() {
        // Recorded behaviour: the cost component is proportional to spend.
        let items = vec![plain("ribs", 1000, 1), plain("wings", 2000, 1)];
        let request = BundleRequest::new(4, 2000, 1);

        let cheap = cost_efficiency(&items, &[2, 1], &request);
        let expensive = cost_efficiency(&items, &[2, 3], &request);

        assert!(expensive > cheap);
    }

    #[test]
    fn perfectly_even_bundles_get_full_fairness_weight() {
        assert!((distribution_fairness(&[2, 2, 2]) - FAIRNESS_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn single_item_bundles_get_no_fairness_or_diversity() {
        let request = BundleRequest::new(4, 2000, 1);

        assert_eq!(distribution_fairness(&[4, 0]), 0.0);
        assert_eq!(diversity(&[4, 0], &request), 0.0);
    }

    #[test]
    fn diversity_target_scales_with_group_size() {
        // 20 people: target is 4 distinct items, 2 of 4 is half weight.
        let request = BundleRequest::new(20, 2000, 1);

        assert!((diversity(&[5, 5, 0, 0], &request) - DIVERSITY_WEIGHT / 2.0).abs() < 1e-9);
        assert!((diversity(&[5, 5, 5, 5], &request) - DIVERSITY_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn kitchen_component_zero_when_overloaded() {
        let items = vec![plain("stew", 1000, 10)];

        assert_eq!(kitchen_efficiency(&items, &[11], 100), 0.0);
        assert!(kitchen_efficiency(&items, &[10], 100) > 0.0);
    }

    #[test]
    fn greedy_scores_stay_in_their_band() {
        let items = vec![popular("ribs", 1000), popular("wings", 1000)];
        let request = BundleRequest::new(4, 1000, 1);

        let score = greedy_score(&items, &[2, 2], &request, 4);

        assert!((GREEDY_BASE_SCORE..=80).contains(&score));
    }

    #[test]
    fn greedy_bonus_rewards_budget_use_and_ratings() {
        let liked = vec![popular("ribs", 1000), popular("wings", 1000)];
        let bland = vec![plain("ribs", 1000, 1), plain("wings", 1000, 1)];
        let request = BundleRequest::new(4, 1000, 1);

        let liked_score = greedy_score(&liked, &[2, 2], &request, 4);
        let bland_score = greedy_score(&bland, &[2, 2], &request, 4);

        assert!(liked_score > bland_score);
    }
}
