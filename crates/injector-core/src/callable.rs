//! Arity-generic adapters from Rust closures to member bodies.
//!
//! [`ConstructorFn`], [`MethodFn`] and [`SetterFn`] are implemented for
//! ordinary closures and function items with up to eight [`Param`]
//! parameters. The `Marker` type parameter only exists to keep the per-arity
//! impls apart; callers never name it.
//!
//! ```
//! use injector_core::ConstructorFn;
//!
//! fn params<M, F: ConstructorFn<M>>(_: &F) -> usize {
//!     F::param_types().len()
//! }
//!
//! assert_eq!(params(&|x: i32, y: i32| (x, y)), 2);
//! ```

use crate::error::{ArgPosition, InvokeError};
use crate::param::{Param, Raw};
use crate::static_type::StaticType;

/// Marker for methods taking `&Target`.
pub struct Shared;

/// Marker for methods taking `&mut Target`.
pub struct Exclusive;

/// A constructor callable from marshaled arguments.
pub trait ConstructorFn<Marker>: Send + Sync + 'static {
    /// The constructed value, or `Result` of it for fallible constructors.
    type Output: 'static;

    /// Parameter types in declaration order.
    fn param_types() -> Vec<StaticType>;

    /// Convert `args` and call the constructor.
    fn construct(&self, args: Vec<Raw>) -> Result<Self::Output, InvokeError>;
}

/// A method callable on a `Target` with marshaled arguments.
pub trait MethodFn<Target, Marker>: Send + Sync + 'static {
    /// The method's return value.
    type Output: 'static;

    /// Parameter types in declaration order, receiver excluded.
    fn param_types() -> Vec<StaticType>;

    /// Convert `args` and call the method on `target`.
    fn invoke_on(&self, target: &mut Target, args: Vec<Raw>)
    -> Result<Self::Output, InvokeError>;
}

/// A property setter callable on a `Target`.
pub trait SetterFn<Target, Marker>: Send + Sync + 'static {
    /// `()`, or `Result<(), E>` for fallible setters.
    type Output: 'static;

    /// The property type.
    fn param_type() -> StaticType;

    /// Convert `value` and assign it on `target`.
    fn assign(&self, target: &mut Target, value: Raw) -> Result<Self::Output, InvokeError>;
}

impl<Func, Target, Value, Out> SetterFn<Target, (Out, Value)> for Func
where
    Func: Fn(&mut Target, Value) -> Out + Send + Sync + 'static,
    Target: 'static,
    Value: Param,
    Out: 'static,
{
    type Output = Out;

    fn param_type() -> StaticType {
        Value::static_type()
    }

    fn assign(&self, target: &mut Target, value: Raw) -> Result<Out, InvokeError> {
        let value = Value::from_raw(value)
            .map_err(|err| InvokeError::conversion(ArgPosition::Value, err))?;
        Ok((self)(target, value))
    }
}

fn check_arity(expected: usize, actual: usize) -> Result<(), InvokeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(InvokeError::ArityMismatch { expected, actual })
    }
}

fn take_arg<P: Param>(
    args: &mut std::vec::IntoIter<Raw>,
    index: &mut usize,
) -> Result<P, InvokeError> {
    let position = *index;
    *index += 1;
    match args.next() {
        Some(raw) => P::from_raw(raw)
            .map_err(|err| InvokeError::conversion(ArgPosition::Argument(position), err)),
        None => Err(InvokeError::ArityMismatch {
            expected: position + 1,
            actual: position,
        }),
    }
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $(, $tail:ident)*) => { 1usize + count!($($tail),*) };
}

macro_rules! impl_callables {
    ($($param:ident),*) => {
        impl<Func, Out, $($param,)*> ConstructorFn<(Out, ($($param,)*))> for Func
        where
            Func: Fn($($param),*) -> Out + Send + Sync + 'static,
            Out: 'static,
            $($param: Param,)*
        {
            type Output = Out;

            fn param_types() -> Vec<StaticType> {
                vec![$($param::static_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn construct(&self, args: Vec<Raw>) -> Result<Out, InvokeError> {
                check_arity(count!($($param),*), args.len())?;
                let mut args = args.into_iter();
                let mut index = 0;
                $(let $param = take_arg::<$param>(&mut args, &mut index)?;)*
                Ok((self)($($param),*))
            }
        }

        impl<Func, Target, Out, $($param,)*> MethodFn<Target, (Shared, Out, ($($param,)*))> for Func
        where
            Func: Fn(&Target, $($param),*) -> Out + Send + Sync + 'static,
            Target: 'static,
            Out: 'static,
            $($param: Param,)*
        {
            type Output = Out;

            fn param_types() -> Vec<StaticType> {
                vec![$($param::static_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke_on(&self, target: &mut Target, args: Vec<Raw>) -> Result<Out, InvokeError> {
                check_arity(count!($($param),*), args.len())?;
                let mut args = args.into_iter();
                let mut index = 0;
                $(let $param = take_arg::<$param>(&mut args, &mut index)?;)*
                Ok((self)(&*target, $($param),*))
            }
        }

        impl<Func, Target, Out, $($param,)*> MethodFn<Target, (Exclusive, Out, ($($param,)*))> for Func
        where
            Func: Fn(&mut Target, $($param),*) -> Out + Send + Sync + 'static,
            Target: 'static,
            Out: 'static,
            $($param: Param,)*
        {
            type Output = Out;

            fn param_types() -> Vec<StaticType> {
                vec![$($param::static_type()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn invoke_on(&self, target: &mut Target, args: Vec<Raw>) -> Result<Out, InvokeError> {
                check_arity(count!($($param),*), args.len())?;
                let mut args = args.into_iter();
                let mut index = 0;
                $(let $param = take_arg::<$param>(&mut args, &mut index)?;)*
                Ok((self)(target, $($param),*))
            }
        }
    };
}

impl_callables!();
impl_callables!(A);
impl_callables!(A, B);
impl_callables!(A, B, C);
impl_callables!(A, B, C, D);
impl_callables!(A, B, C, D, E);
impl_callables!(A, B, C, D, E, F);
impl_callables!(A, B, C, D, E, F, G);
impl_callables!(A, B, C, D, E, F, G, H);
