//! Memo cell filling.

use once_cell::sync::OnceCell;

use crate::error::Outcome;

/// Returns the settled outcome of `cell`, computing it with `init` if needed,
/// and whether it was already settled.
///
/// The cell is filled under its lock, so concurrent first requests wait for a
/// single construction. `init` only ever runs a construction function over
/// inputs that are already resolved; it never resolves anything itself.
pub(crate) fn memoize<F>(cell: &OnceCell<Outcome>, init: F) -> (Outcome, bool)
where
    F: FnOnce() -> Outcome,
{
    if let Some(outcome) = cell.get() {
        return (outcome.clone(), true);
    }
    let mut ran = false;
    let outcome = cell.get_or_init(|| {
        ran = true;
        init()
    });
    (outcome.clone(), !ran)
}
