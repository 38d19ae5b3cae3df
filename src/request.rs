//! Bundle requests and group-size-adaptive distribution targets

use rustc_hash::FxHashMap;

use crate::menu::Diet;

/// Minimum number of distinct items a bundle must contain, capped at the
/// group size for single-person requests.
pub const MIN_DIFFERENT_ITEMS: i64 = 2;

/// Group sizes up to this many people use the small-group distribution targets.
pub const SMALL_GROUP_LIMIT: i64 = 5;

/// A request for group meal bundles.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    /// Number of people to feed.
    pub people: i64,

    /// Budget per person, in cents.
    pub max_price_per_person_cents: i64,

    /// Servings required per diet. Diets absent from the map require nothing;
    /// the values need not sum to `people`, the remainder is filled freely.
    pub required_by_diet: FxHashMap<Diet, i64>,

    /// How many distinct bundles to produce.
    pub top_n: usize,
}

impl BundleRequest {
    /// Creates a request with no per-diet requirements.
    #[must_use]
    pub fn new(people: i64, max_price_per_person_cents: i64, top_n: usize) -> Self {
        Self {
            people,
            max_price_per_person_cents,
            required_by_diet: FxHashMap::default(),
            top_n,
        }
    }

    /// Adds a per-diet serving requirement.
    #[must_use]
    pub fn require(mut self, diet: Diet, servings: i64) -> Self {
        self.required_by_diet.insert(diet, servings);
        self
    }

    /// Total budget in cents: per-person budget times headcount.
    #[must_use]
    pub const fn budget_cents(&self) -> i64 {
        self.max_price_per_person_cents * self.people
    }

    /// Required servings for a diet, zero when the diet is not constrained.
    #[must_use]
    pub fn required(&self, diet: Diet) -> i64 {
        self.required_by_diet.get(&diet).copied().unwrap_or(0)
    }

    /// Minimum number of distinct items a valid bundle must contain.
    #[must_use]
    pub fn min_distinct_items(&self) -> i64 {
        MIN_DIFFERENT_ITEMS.min(self.people)
    }
}

/// Portion and fairness targets, adapted to the group size.
///
/// Small groups get wider per-item portion bands and a looser fairness range
/// than large ones; a 50% portion is fine for three people and absurd for
/// thirty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionTargets {
    /// Minimum share of total servings for each selected item.
    pub min_portion: f64,

    /// Maximum share of total servings for each selected item.
    pub max_portion: f64,

    /// Bound on max-minus-min quantity among selected items, as a fraction
    /// of the headcount.
    pub fairness_range: f64,
}

impl DistributionTargets {
    /// Targets for groups of up to [`SMALL_GROUP_LIMIT`] people.
    pub const SMALL_GROUP: Self = Self {
        min_portion: 0.10,
        max_portion: 0.50,
        fairness_range: 0.30,
    };

    /// Targets for larger groups.
    pub const LARGE_GROUP: Self = Self {
        min_portion: 0.05,
        max_portion: 0.25,
        fairness_range: 0.15,
    };

    /// Selects the targets for a group size.
    #[must_use]
    pub const fn for_group(people: i64) -> Self {
        if people <= SMALL_GROUP_LIMIT {
            Self::SMALL_GROUP
        } else {
            Self::LARGE_GROUP
        }
    }

    /// Minimum portion as integer percent points (floored).
    #[must_use]
    pub fn min_portion_pct(&self) -> i64 {
        as_whole_pct(self.min_portion)
    }

    /// Maximum portion as integer percent points (floored).
    #[must_use]
    pub fn max_portion_pct(&self) -> i64 {
        as_whole_pct(self.max_portion)
    }

    /// Largest allowed quantity spread among selected items for a headcount.
    #[must_use]
    pub fn spread_limit(&self, people: i64) -> i64 {
        floor_scaled(self.fairness_range, people)
    }
}

/// `fraction * 100`, floored, robust to binary-fraction noise.
pub(crate) fn as_whole_pct(fraction: f64) -> i64 {
    (fraction * 100.0 + 1e-9).floor() as i64
}

/// `fraction * scale`, floored, robust to binary-fraction noise.
pub(crate) fn floor_scaled(fraction: f64, scale: i64) -> i64 {
    (fraction * scale as f64 + 1e-9).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_person_times_headcount() {
        let request = BundleRequest::new(4, 2000, 1);

        assert_eq!(request.budget_cents(), 8000);
    }

    #[test]
    fn unconstrained_diets_require_nothing() {
        let request = BundleRequest::new(4, 2000, 1).require(Diet::Vegan, 2);

        assert_eq!(request.required(Diet::Vegan), 2);
        assert_eq!(request.required(Diet::Meat), 0);
    }

    #[test]
    fn min_distinct_items_caps_at_group_size() {
        assert_eq!(BundleRequest::new(1, 2000, 1).min_distinct_items(), 1);
        assert_eq!(BundleRequest::new(3, 2000, 1).min_distinct_items(), 2);
    }

    #[test]
    fn five_people_is_still_a_small_group() {
        assert_eq!(
            DistributionTargets::for_group(5),
            DistributionTargets::SMALL_GROUP
        );
        assert_eq!(
            DistributionTargets::for_group(6),
            DistributionTargets::LARGE_GROUP
        );
    }

    #[test]
    fn percent_points_survive_binary_fraction_noise() {
        assert_eq!(DistributionTargets::SMALL_GROUP.min_portion_pct(), 10);
        assert_eq!(DistributionTargets::SMALL_GROUP.max_portion_pct(), 50);
        assert_eq!(DistributionTargets::LARGE_GROUP.min_portion_pct(), 5);
        assert_eq!(DistributionTargets::LARGE_GROUP.max_portion_pct(), 25);
    }

    #[test]
    fn spread_limit_floors_the_scaled_range() {
        // 0.30 * 3 = 0.9 -> 0, 0.15 * 20 = 3.0 -> 3
        assert_eq!(DistributionTargets::SMALL_GROUP.spread_limit(3), 0);
        assert_eq!(DistributionTargets::LARGE_GROUP.spread_limit(20), 3);
    }
}
