//! Per-serving items

use crate::menu::{Diet, Rating};

/// Rating percentage above which an item counts as well rated.
pub const GOOD_RATING_THRESHOLD: f64 = 0.85;

/// Minimum vote total for an item to count as highly rated.
pub const HIGHLY_RATED_MIN_VOTES: u32 = 50;

/// Minimum vote total for an item to count as popular.
pub const POPULAR_MIN_VOTES: u32 = 100;

/// A single indivisible serving of a dish.
///
/// Produced by splitting a bulk menu entry; the solvers operate only on
/// these. Prices are integer cents, loads are integer prep units per serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: String,
    name: String,
    price_cents: i64,
    diet: Diet,
    available_qty: i64,
    load: i64,
    rating: Rating,
}

impl Item {
    /// Creates a new item without any votes.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        diet: Diet,
        available_qty: i64,
        load: i64,
    ) -> Self {
        Self::with_votes(
            id,
            name,
            price_cents,
            diet,
            available_qty,
            load,
            Rating::default(),
        )
    }

    /// Creates a new item with the given vote counts.
    pub fn with_votes(
        id: impl Into<String>,
        name: impl Into<String>,
        price_cents: i64,
        diet: Diet,
        available_qty: i64,
        load: i64,
        rating: Rating,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price_cents,
            diet,
            available_qty,
            load,
            rating,
        }
    }

    /// Stable identifier (`"{menu id}#{serving}"` for expanded items).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price of one serving, in cents.
    #[must_use]
    pub const fn price_cents(&self) -> i64 {
        self.price_cents
    }

    /// Dietary classification.
    #[must_use]
    pub const fn diet(&self) -> Diet {
        self.diet
    }

    /// Servings available in stock.
    #[must_use]
    pub const fn available_qty(&self) -> i64 {
        self.available_qty
    }

    /// Kitchen preparation load of one serving.
    #[must_use]
    pub const fn load(&self) -> i64 {
        self.load
    }

    /// Vote counts.
    #[must_use]
    pub const fn rating_counts(&self) -> Rating {
        self.rating
    }

    /// Total number of up and down votes.
    #[must_use]
    pub const fn vote_total(&self) -> u32 {
        self.rating.upvote_count + self.rating.downvote_count
    }

    /// Rating percentage in `[0, 1]`: upvotes over total votes, or 0 with no votes.
    #[must_use]
    pub fn rating(&self) -> f64 {
        let total = self.vote_total();

        if total == 0 {
            return 0.0;
        }

        f64::from(self.rating.upvote_count) / f64::from(total)
    }

    /// Whether the rating percentage reaches [`GOOD_RATING_THRESHOLD`].
    #[must_use]
    pub fn has_good_rating(&self) -> bool {
        self.rating() >= GOOD_RATING_THRESHOLD
    }

    /// Good rating backed by at least [`HIGHLY_RATED_MIN_VOTES`] votes.
    #[must_use]
    pub fn is_highly_rated(&self) -> bool {
        self.has_good_rating() && self.vote_total() >= HIGHLY_RATED_MIN_VOTES
    }

    /// Good rating backed by at least [`POPULAR_MIN_VOTES`] votes.
    #[must_use]
    pub fn is_popular(&self) -> bool {
        self.has_good_rating() && self.vote_total() >= POPULAR_MIN_VOTES
    }
}

/// Returns the lowest per-serving price in a list of items.
#[must_use]
pub fn cheapest_price(items: &[Item]) -> Option<i64> {
    items.iter().map(Item::price_cents).min()
}
