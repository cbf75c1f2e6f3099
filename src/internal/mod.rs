//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod memo;

pub(crate) use circular::ResolutionPath;
pub(crate) use memo::memoize;
