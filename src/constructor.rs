//! Typed construction functions.
//!
//! Plain closures and fns become [`Provider`](crate::Provider)s and
//! [`EntryPoint`](crate::EntryPoint)s through the traits here. The argument
//! types of the function are its declared inputs, recorded as data when the
//! provider is created, and its return type is the output key.

use std::ops::Deref;
use std::sync::Arc;

use crate::error::{BoxError, DiResult};
use crate::key::TypeKey;
use crate::registration::{AnyValue, Args, Input};

/// A function argument that can be filled from a resolved input.
pub trait FromInput: Sized + 'static {
    /// The declared input for this argument type.
    fn input() -> Input;

    /// Extracts the argument from the resolved inputs.
    fn from_arg(args: &Args<'_>, index: usize) -> DiResult<Self>;
}

impl<T: Send + Sync + 'static> FromInput for Arc<T> {
    fn input() -> Input {
        Input::required(TypeKey::of::<T>())
    }

    fn from_arg(args: &Args<'_>, index: usize) -> DiResult<Self> {
        args.get::<T>(index)
    }
}

impl<T: Send + Sync + 'static> FromInput for Option<Arc<T>> {
    fn input() -> Input {
        Input::optional(TypeKey::of::<T>())
    }

    fn from_arg(args: &Args<'_>, index: usize) -> DiResult<Self> {
        args.optional::<T>(index)
    }
}

/// All members of a group binding for `T`, in registration order.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{location, Group, Provider, Registrations};
///
/// struct Route(&'static str);
/// struct Router { routes: Vec<&'static str> }
///
/// let mut regs = Registrations::new();
/// regs.group_supply(Route("/health"), location!());
/// regs.group_supply(Route("/users"), location!());
/// regs.provide(Provider::from_fn(location!(), |routes: Group<Route>| Router {
///     routes: routes.iter().map(|r| r.0).collect(),
/// }));
///
/// let container = regs.build().unwrap();
/// let router = container.get_root::<Router>(&location!()).unwrap();
/// assert_eq!(router.routes, vec!["/health", "/users"]);
/// ```
#[derive(Debug)]
pub struct Group<T>(Vec<Arc<T>>);

impl<T> Group<T> {
    pub fn into_inner(self) -> Vec<Arc<T>> {
        self.0
    }
}

impl<T> Deref for Group<T> {
    type Target = [Arc<T>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> IntoIterator for Group<T> {
    type Item = Arc<T>;
    type IntoIter = std::vec::IntoIter<Arc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<T: Send + Sync + 'static> FromInput for Group<T> {
    fn input() -> Input {
        Input::group(TypeKey::of::<T>())
    }

    fn from_arg(args: &Args<'_>, index: usize) -> DiResult<Self> {
        args.group::<T>(index).map(Group)
    }
}

/// A fallible function usable as a construction function.
///
/// Implemented for `Fn(A, B, ..) -> Result<O, E>` with up to eight
/// [`FromInput`] arguments and `E: Into<BoxError>`.
pub trait IntoConstructor<Params>: Send + Sync + 'static {
    fn inputs() -> Vec<Input>;
    fn output() -> TypeKey;
    fn construct(&self, args: &Args<'_>) -> Result<AnyValue, BoxError>;
}

/// An infallible function usable as a construction function.
///
/// Implemented for `Fn(A, B, ..) -> O` with up to eight [`FromInput`]
/// arguments.
pub trait IntoInfallible<Params>: Send + Sync + 'static {
    fn inputs() -> Vec<Input>;
    fn output() -> TypeKey;
    fn construct(&self, args: &Args<'_>) -> Result<AnyValue, BoxError>;
}

macro_rules! constructor_tuple ({ $($param:ident)* } => {
    impl<Func, Out, Fail, $($param,)*> IntoConstructor<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Result<Out, Fail> + Send + Sync + 'static,
        Out: Send + Sync + 'static,
        Fail: Into<BoxError>,
        $($param: FromInput,)*
    {
        fn inputs() -> Vec<Input> {
            vec![$($param::input(),)*]
        }

        fn output() -> TypeKey {
            TypeKey::of::<Out>()
        }

        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        fn construct(&self, args: &Args<'_>) -> Result<AnyValue, BoxError> {
            let mut index = 0;
            $(
                let $param = $param::from_arg(args, index)?;
                index += 1;
            )*
            let value = (self)($($param),*).map_err(Into::into)?;
            Ok(Arc::new(value))
        }
    }

    impl<Func, Out, $($param,)*> IntoInfallible<($($param,)*)> for Func
    where
        Func: Fn($($param),*) -> Out + Send + Sync + 'static,
        Out: Send + Sync + 'static,
        $($param: FromInput,)*
    {
        fn inputs() -> Vec<Input> {
            vec![$($param::input(),)*]
        }

        fn output() -> TypeKey {
            TypeKey::of::<Out>()
        }

        #[allow(non_snake_case, unused_mut, unused_variables, unused_assignments)]
        fn construct(&self, args: &Args<'_>) -> Result<AnyValue, BoxError> {
            let mut index = 0;
            $(
                let $param = $param::from_arg(args, index)?;
                index += 1;
            )*
            Ok(Arc::new((self)($($param),*)))
        }
    }
});

constructor_tuple! {}
constructor_tuple! { A }
constructor_tuple! { A B }
constructor_tuple! { A B C }
constructor_tuple! { A B C D }
constructor_tuple! { A B C D E }
constructor_tuple! { A B C D E F }
constructor_tuple! { A B C D E F G }
constructor_tuple! { A B C D E F G H }
