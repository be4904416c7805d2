//! Boxed value-type instances.

use std::any::{Any, TypeId};
use std::fmt;

use crate::error::ConversionError;
use crate::static_type::short_type_name;

/// Object-safe view of a cloneable value.
///
/// Implemented for every `Clone + Send + Sync + 'static` type.
pub trait AnyValue: Any + Send + Sync {
    /// Clone into a fresh box.
    fn boxed_clone(&self) -> Box<dyn AnyValue>;
    /// View as `&dyn Any`.
    fn value_ref(&self) -> &dyn Any;
    /// View as `&mut dyn Any`.
    fn value_mut(&mut self) -> &mut dyn Any;
    /// Convert to `Box<dyn Any>` for by-value downcasting.
    fn into_boxed_any(self: Box<Self>) -> Box<dyn Any>;
    /// Short Rust type name.
    fn value_type_name(&self) -> &'static str;
}

impl<T: Any + Clone + Send + Sync> AnyValue for T {
    fn boxed_clone(&self) -> Box<dyn AnyValue> {
        Box::new(self.clone())
    }

    fn value_ref(&self) -> &dyn Any {
        self
    }

    fn value_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_boxed_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn value_type_name(&self) -> &'static str {
        short_type_name::<T>()
    }
}

/// A value-type instance in a generic container.
///
/// Cloning copies the value. Unboxing copies it out and only succeeds for
/// the exact type that was boxed.
pub struct BoxedValue {
    value: Box<dyn AnyValue>,
}

impl BoxedValue {
    /// Box `value`.
    pub fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
        }
    }

    /// Wrap an already boxed value.
    pub fn from_boxed(value: Box<dyn AnyValue>) -> Self {
        Self { value }
    }

    /// Rust type identity of the boxed value.
    pub fn type_id(&self) -> TypeId {
        (*self.value).value_ref().type_id()
    }

    /// Short Rust type name of the boxed value.
    pub fn type_name(&self) -> &'static str {
        (*self.value).value_type_name()
    }

    /// Check if the boxed value is exactly a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// Borrow the boxed value as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.value).value_ref().downcast_ref::<T>()
    }

    /// Mutably borrow the boxed value as `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        (*self.value).value_mut().downcast_mut::<T>()
    }

    /// Copy the boxed value out as `T`.
    pub fn unbox<T: Clone + 'static>(&self) -> Result<T, ConversionError> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| ConversionError::TypeMismatch {
                expected: short_type_name::<T>(),
                actual: self.type_name().to_string(),
            })
    }

    /// Take the boxed value out as `T`, or get the box back.
    pub fn into_inner<T: 'static>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.value.into_boxed_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!("type id checked before downcast"),
        }
    }

    /// Copy of the inner box, for passing by value to a member body.
    pub fn clone_inner(&self) -> Box<dyn AnyValue> {
        (*self.value).boxed_clone()
    }

    pub(crate) fn as_any_mut(&mut self) -> &mut dyn Any {
        (*self.value).value_mut()
    }
}

impl Clone for BoxedValue {
    fn clone(&self) -> Self {
        Self {
            value: self.clone_inner(),
        }
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoxedValue({})", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn unbox_exact_type() {
        let boxed = BoxedValue::new(Point { x: 1, y: 2 });
        assert!(boxed.is::<Point>());
        assert_eq!(boxed.type_name(), "Point");
        assert_eq!(boxed.unbox::<Point>().unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn unbox_wrong_type_fails() {
        let boxed = BoxedValue::new(5i32);
        let err = boxed.unbox::<i64>().unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { expected: "i64", .. }));
    }

    #[test]
    fn clone_copies_value() {
        let mut original = BoxedValue::new(Point { x: 1, y: 2 });
        let copy = original.clone();
        original.downcast_mut::<Point>().unwrap().x = 10;

        assert_eq!(copy.downcast_ref::<Point>().unwrap().x, 1);
        assert_eq!(original.downcast_ref::<Point>().unwrap().x, 10);
    }

    #[test]
    fn into_inner_returns_box_on_mismatch() {
        let boxed = BoxedValue::new(String::from("hi"));
        let boxed = boxed.into_inner::<i32>().unwrap_err();
        assert_eq!(boxed.into_inner::<String>().unwrap(), "hi");
    }
}
