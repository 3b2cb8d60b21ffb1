//! Fractional sort keys.
//!
//! Inserting a card between two neighbours only assigns the new card a key
//! strictly between theirs, so siblings never need renumbering.
//!
//! Repeated midpoint insertion into the same gap halves the gap each time;
//! after roughly fifty halvings an `f64` can no longer represent a value
//! strictly between the neighbours. No rebalancing pass exists.
//! [`has_room`] reports when that floor has been reached.

/// Distance from a single neighbour when inserting at the head or tail.
pub const ORDER_STEP: f64 = 1000.0;

/// Key given to the first card of an empty list.
pub const INITIAL_ORDER: f64 = 10_000.0;

/// Compute a sort key for an item placed between `prev` and `next`.
///
/// - both present: arithmetic midpoint
/// - only `next` (head insertion): `next - 1000`
/// - only `prev` (tail insertion): `prev + 1000`
/// - neither (empty list): `10000`
pub fn order_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (Some(prev), Some(next)) => (prev + next) / 2.0,
        (None, Some(next)) => next - ORDER_STEP,
        (Some(prev), None) => prev + ORDER_STEP,
        (None, None) => INITIAL_ORDER,
    }
}

/// Whether a key strictly between `prev` and `next` is still representable.
///
/// Always true when either side is open.
pub fn has_room(prev: Option<f64>, next: Option<f64>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => {
            let mid = order_between(Some(prev), Some(next));
            let (low, high) = if prev <= next { (prev, next) } else { (next, prev) };
            low < mid && mid < high
        }
        _ => true,
    }
}
