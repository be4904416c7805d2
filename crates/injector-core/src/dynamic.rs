//! The generic value handle passed to and returned from injectors.

use std::fmt;

use crate::error::ConversionError;
use crate::object::{Object, ObjectRef, Ref};
use crate::static_type::short_type_name;
use crate::value::BoxedValue;

/// A type-erased value.
///
/// Every injector takes and returns `Dynamic`, so callers can drive members
/// of unrelated types the same way.
///
/// # Example
///
/// ```
/// use injector_core::Dynamic;
///
/// let value = Dynamic::from(42i32);
/// assert_eq!(value.unbox::<i32>().unwrap(), 42);
/// assert!(value.unbox::<String>().is_err());
/// assert!(Dynamic::Null.is_null());
/// ```
#[derive(Clone, Default)]
pub enum Dynamic {
    /// Null reference
    #[default]
    Null,
    /// Boxed value-type instance
    Value(BoxedValue),
    /// Shared reference-type instance
    Object(ObjectRef),
}

impl Dynamic {
    /// Box a value-type instance.
    pub fn value<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Dynamic::Value(BoxedValue::new(value))
    }

    /// Check if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// Name of the dynamic type, for diagnostics.
    ///
    /// Objects report their class name, boxed values their Rust type name.
    pub fn type_name(&self) -> &str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Value(value) => value.type_name(),
            Dynamic::Object(object) => object.class().name(),
        }
    }

    /// Get the boxed value, if this holds one.
    pub fn as_value(&self) -> Option<&BoxedValue> {
        match self {
            Dynamic::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Get the object handle, if this holds one.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Dynamic::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Copy the boxed value out as `T`.
    pub fn unbox<T: Clone + 'static>(&self) -> Result<T, ConversionError> {
        match self {
            Dynamic::Value(value) => value.unbox::<T>(),
            Dynamic::Null => Err(ConversionError::NullReference {
                target_type: short_type_name::<T>(),
            }),
            Dynamic::Object(object) => Err(ConversionError::TypeMismatch {
                expected: short_type_name::<T>(),
                actual: object.class().name().to_string(),
            }),
        }
    }

    /// Borrow the boxed value as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_value().and_then(BoxedValue::downcast_ref::<T>)
    }

    /// Mutably borrow the boxed value as `T`.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        match self {
            Dynamic::Value(value) => value.downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Get a typed handle if this holds a `T` or something derived from it.
    pub fn downcast<T: Object>(&self) -> Option<Ref<T>> {
        self.as_object().and_then(ObjectRef::downcast::<T>)
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Null => write!(f, "Null"),
            Dynamic::Value(value) => write!(f, "Value({})", value.type_name()),
            Dynamic::Object(object) => write!(f, "Object({})", object.class().name()),
        }
    }
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Dynamic {
                fn from(value: $ty) -> Self {
                    Dynamic::value(value)
                }
            }
        )*
    };
}

impl_from_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::value(value.to_string())
    }
}

impl From<BoxedValue> for Dynamic {
    fn from(value: BoxedValue) -> Self {
        Dynamic::Value(value)
    }
}

impl From<ObjectRef> for Dynamic {
    fn from(object: ObjectRef) -> Self {
        Dynamic::Object(object)
    }
}

impl<T: Object> From<Ref<T>> for Dynamic {
    fn from(object: Ref<T>) -> Self {
        Dynamic::Object(object.into_object())
    }
}

impl<T: Object> From<Option<Ref<T>>> for Dynamic {
    fn from(object: Option<Ref<T>>) -> Self {
        object.map_or(Dynamic::Null, Dynamic::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_box_and_unbox() {
        assert_eq!(Dynamic::from(7u8).unbox::<u8>().unwrap(), 7);
        assert_eq!(Dynamic::from(1.5f64).unbox::<f64>().unwrap(), 1.5);
        assert_eq!(Dynamic::from("hi").unbox::<String>().unwrap(), "hi");
        assert!(Dynamic::from(true).unbox::<bool>().unwrap());
    }

    #[test]
    fn unbox_is_exact() {
        let value = Dynamic::from(7i32);
        assert!(matches!(
            value.unbox::<i64>(),
            Err(ConversionError::TypeMismatch { expected: "i64", .. })
        ));
    }

    #[test]
    fn null_unbox_fails() {
        assert!(matches!(
            Dynamic::Null.unbox::<i32>(),
            Err(ConversionError::NullReference { target_type: "i32" })
        ));
        assert!(Dynamic::default().is_null());
    }

    #[test]
    fn type_names() {
        assert_eq!(Dynamic::Null.type_name(), "null");
        assert_eq!(Dynamic::from(1i32).type_name(), "i32");
        assert_eq!(Dynamic::from("x").type_name(), "String");
    }

    #[test]
    fn clone_copies_values() {
        let mut original = Dynamic::from(1i32);
        let copy = original.clone();
        *original.downcast_mut::<i32>().unwrap() = 2;
        assert_eq!(copy.unbox::<i32>().unwrap(), 1);
        assert_eq!(original.unbox::<i32>().unwrap(), 2);
    }
}
