//! Entry points: functions run once against resolved inputs.

use std::fmt;
use std::sync::Arc;

use crate::constructor::{IntoConstructor, IntoInfallible};
use crate::error::{BoxError, InvokeError};
use crate::location::Location;
use crate::registration::{Args, Input};
use crate::scope::Scope;

use super::{Container, ResolveContext};

type RunFn = Arc<dyn Fn(&Args<'_>) -> Result<(), BoxError> + Send + Sync>;

/// A function whose arguments are resolved from a container and which is
/// then called once. Its return value is discarded.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{location, EntryPoint, Group, Registrations};
/// use std::sync::Arc;
///
/// struct Port(u16);
/// struct Plugin(&'static str);
///
/// let mut regs = Registrations::new();
/// regs.supply(Port(8080), location!());
/// regs.group_supply(Plugin("auth"), location!());
/// let container = regs.build().unwrap();
///
/// let entry = EntryPoint::new(|port: Arc<Port>, plugins: Group<Plugin>| {
///     if plugins.is_empty() {
///         return Err("no plugins");
///     }
///     println!("listening on {} with {}", port.0, plugins[0].0);
///     Ok(())
/// });
/// container.invoke(&entry, &location!("main")).unwrap();
/// ```
#[derive(Clone)]
pub struct EntryPoint {
    inputs: Vec<Input>,
    run: RunFn,
}

impl EntryPoint {
    /// Entry point from a fallible function. Its error is returned by
    /// [`Container::invoke`] as [`InvokeError::Entry`].
    pub fn new<P, F>(f: F) -> Self
    where
        F: IntoConstructor<P>,
    {
        Self {
            inputs: F::inputs(),
            run: Arc::new(move |args: &Args<'_>| f.construct(args).map(drop)),
        }
    }

    pub fn from_fn<P, F>(f: F) -> Self
    where
        F: IntoInfallible<P>,
    {
        Self {
            inputs: F::inputs(),
            run: Arc::new(move |args: &Args<'_>| f.construct(args).map(drop)),
        }
    }

    pub fn from_raw<F>(inputs: Vec<Input>, run: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            inputs,
            run: Arc::new(run),
        }
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint").field("inputs", &self.inputs).finish()
    }
}

impl Container {
    /// Runs `entry` in the root scope.
    pub fn invoke(&self, entry: &EntryPoint, location: &Location) -> Result<(), InvokeError> {
        self.invoke_in(entry, self.root_scope(), location)
    }

    /// Resolves every input of `entry` in `scope`, then calls it.
    ///
    /// All inputs are attempted even after one fails, and every failure is
    /// reported together. The entry point does not run unless all of them
    /// resolve.
    pub fn invoke_in(&self, entry: &EntryPoint, scope: &Scope, location: &Location) -> Result<(), InvokeError> {
        self.inner
            .check_scope(scope)
            .map_err(|err| InvokeError::Dependencies {
                location: location.clone(),
                errors: vec![err],
            })?;

        let mut ctx = ResolveContext::new(&self.inner, scope);
        let mut values = Vec::with_capacity(entry.inputs.len());
        let mut errors = Vec::new();
        for input in &entry.inputs {
            match ctx.resolve_input(input, location) {
                Ok(value) => values.push(value),
                Err(err) => {
                    errors.push(err);
                    values.push(None);
                }
            }
        }

        if !errors.is_empty() {
            tracing::warn!(
                location = %location,
                errors = errors.len(),
                "entry point inputs failed to resolve"
            );
            return Err(InvokeError::Dependencies {
                location: location.clone(),
                errors,
            });
        }

        tracing::debug!(location = %location, scope = %scope.name(), "invoking entry point");
        let args = Args {
            inputs: &entry.inputs,
            values: &values,
            scope,
        };
        (entry.run)(&args).map_err(InvokeError::Entry)
    }
}
