//! Declaration-site provenance carried into diagnostics.

use std::fmt;
use std::sync::Arc;

/// Where a binding, entry point or request was declared.
///
/// A location is a `{name, context}` pair: `name` identifies the declaring
/// site (a function, module or component name) and `context` adds free-form
/// detail such as `file:line`. Locations only ever appear in logs and error
/// messages; they play no part in resolving values.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Location};
///
/// let loc = Location::new("db::provide_pool", "src/db.rs:42");
/// assert_eq!(loc.to_string(), "db::provide_pool (src/db.rs:42)");
///
/// let here = location!("bootstrap");
/// assert_eq!(here.name(), "bootstrap");
/// assert!(here.context().contains(".rs:"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    name: Arc<str>,
    context: Arc<str>,
}

impl Location {
    pub fn new(name: impl Into<Arc<str>>, context: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
        }
    }

    /// A location with a name and no context.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, "")
    }

    /// Captures the caller's source position as context.
    #[track_caller]
    pub fn caller(name: impl Into<Arc<str>>) -> Self {
        let site = std::panic::Location::caller();
        Self::new(name, format!("{}:{}:{}", site.file(), site.line(), site.column()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.context.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} ({})", self.name, self.context)
        }
    }
}

/// Builds a [`Location`] for the current source position.
///
/// Without arguments the name is the enclosing module path.
#[macro_export]
macro_rules! location {
    () => {
        $crate::Location::new(module_path!(), concat!(file!(), ":", line!()))
    };
    ($name:expr) => {
        $crate::Location::new($name, concat!(file!(), ":", line!()))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_omits_empty_context() {
        assert_eq!(Location::named("config").to_string(), "config");
    }

    #[test]
    fn caller_records_this_file() {
        let loc = Location::caller("caller_site");
        assert!(loc.context().contains("location.rs"));
    }

    #[test]
    fn macro_defaults_to_module_path() {
        let loc = crate::location!();
        assert!(loc.name().ends_with("location::tests"));
    }
}
