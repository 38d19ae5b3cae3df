//! Menu entries and serving-unit splitting

use std::fmt;

use crate::items::Item;

/// Dietary classification of a menu entry.
///
/// Diet requirements are always processed in the order
/// [`Diet::Vegan`], [`Diet::Vegetarian`], [`Diet::Meat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Diet {
    /// No animal products.
    Vegan,

    /// No meat or fish.
    Vegetarian,

    /// Contains meat or fish.
    Meat,
}

impl Diet {
    /// All diets, in processing order.
    pub const ALL: [Diet; 3] = [Diet::Vegan, Diet::Vegetarian, Diet::Meat];

    /// The diet's canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Diet::Vegan => "VEGAN",
            Diet::Vegetarian => "VEGETARIAN",
            Diet::Meat => "MEAT",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vote counts attached to a menu entry by the rating service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rating {
    /// Number of upvotes
    pub upvote_count: u32,

    /// Number of downvotes
    pub downvote_count: u32,

    /// Number of written reviews
    pub review_count: u32,
}

/// A bulk menu entry as provided by the menu service.
///
/// One entry describes a dish sold as a whole (a tray, a pot) that serves
/// `serves` people. The solvers never see bulk entries; they operate on the
/// per-serving [`Item`]s produced by [`expand_servings`].
#[derive(Debug, Clone)]
pub struct MenuEntry {
    /// Stable menu identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Bulk price in cents for the whole entry
    pub price_cents: i64,

    /// Servings per bulk unit
    pub serves: i64,

    /// Dietary classification
    pub diet: Diet,

    /// Bulk units in stock
    pub stock: i64,

    /// Kitchen preparation load per serving
    pub load: i64,

    /// Vote counts, when the rating service knows the entry
    pub rating: Option<Rating>,
}

/// Split bulk menu entries into per-serving items.
///
/// Each entry expands into `serves` distinct serving items with ids
/// `"{id}#{1..=serves}"`. The per-serving price is the bulk price divided by
/// `serves`, rounded up; the per-serving stock is the bulk stock divided by
/// `serves`, rounded down. Entries that cannot yield a whole serving
/// (`serves <= 0`, or per-serving stock of zero) contribute nothing.
#[must_use]
pub fn expand_servings(entries: &[MenuEntry]) -> Vec<Item> {
    let mut items = Vec::new();

    for entry in entries {
        if entry.serves <= 0 {
            tracing::debug!(id = %entry.id, "skipping menu entry with non-positive serving count");
            continue;
        }

        let price_per_serving = crate::div_ceil_i64(entry.price_cents, entry.serves);
        let stock_per_serving = entry.stock / entry.serves;

        if stock_per_serving == 0 {
            tracing::debug!(id = %entry.id, "skipping menu entry with no whole serving in stock");
            continue;
        }

        let rating = entry.rating.unwrap_or_default();

        for serving in 1..=entry.serves {
            items.push(Item::with_votes(
                format!("{}#{serving}", entry.id),
                entry.name.clone(),
                price_per_serving,
                entry.diet,
                stock_per_serving,
                entry.load,
                rating,
            ));
        }
    }

    items
}
