//! Conversion from marshaled arguments to concrete parameter types.
//!
//! Injectors marshal each [`Dynamic`](crate::Dynamic) argument into a
//! [`Raw`] value that already matches the parameter's [`StaticType`]. Member
//! bodies then take ownership of their arguments through [`Param::from_raw`].

use std::fmt;

use crate::error::ConversionError;
use crate::object::{Object, ObjectRef, Ref};
use crate::static_type::{StaticType, short_type_name};
use crate::value::AnyValue;

/// A marshaled argument, owned by the call that receives it.
pub enum Raw {
    /// Copy of a boxed value-type instance
    Value(Box<dyn AnyValue>),
    /// Handle to a reference-type instance
    Object(ObjectRef),
    /// Null, only produced for nullable parameters
    Null,
}

impl Raw {
    /// Dynamic type name, for diagnostics.
    pub fn type_name(&self) -> &str {
        match self {
            Raw::Value(value) => (**value).value_type_name(),
            Raw::Object(object) => object.class().name(),
            Raw::Null => "null",
        }
    }

    /// The object handle, if this is a reference argument.
    pub fn object(&self) -> Option<&ObjectRef> {
        match self {
            Raw::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Take the value out as `T`.
    pub fn into_value<T: 'static>(self, name: &'static str) -> Result<T, ConversionError> {
        match self {
            Raw::Value(value) => {
                let actual = (*value).value_type_name();
                value
                    .into_boxed_any()
                    .downcast::<T>()
                    .map(|value| *value)
                    .map_err(|_| ConversionError::TypeMismatch {
                        expected: name,
                        actual: actual.to_string(),
                    })
            }
            Raw::Null => Err(ConversionError::NullReference { target_type: name }),
            Raw::Object(object) => Err(ConversionError::TypeMismatch {
                expected: name,
                actual: object.class().name().to_string(),
            }),
        }
    }

    /// Take the object out as `Ref<T>`, with `None` for null.
    pub fn into_nullable_object<T: Object>(self) -> Result<Option<Ref<T>>, ConversionError> {
        match self {
            Raw::Null => Ok(None),
            Raw::Object(object) => {
                let actual = object.class().name().to_string();
                Ref::try_from_object(object)
                    .map(Some)
                    .ok_or(ConversionError::TypeMismatch {
                        expected: short_type_name::<T>(),
                        actual,
                    })
            }
            Raw::Value(value) => Err(ConversionError::TypeMismatch {
                expected: short_type_name::<T>(),
                actual: (*value).value_type_name().to_string(),
            }),
        }
    }
}

impl fmt::Debug for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::Value(value) => write!(f, "Value({})", (**value).value_type_name()),
            Raw::Object(object) => write!(f, "Object({})", object.class().name()),
            Raw::Null => f.write_str("Null"),
        }
    }
}

/// Rust types usable as constructor, method and setter parameters.
///
/// Implemented for the primitives, `String`, [`Ref<T>`] and
/// `Option<Ref<T>>`. Register your own value types with
/// [`value_type!`](crate::value_type).
pub trait Param: Sized + Send + 'static {
    /// The static type marshaling must produce for this parameter.
    fn static_type() -> StaticType;

    /// Take ownership of a marshaled argument.
    fn from_raw(raw: Raw) -> Result<Self, ConversionError>;
}

macro_rules! impl_param_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Param for $ty {
                fn static_type() -> StaticType {
                    StaticType::value::<$ty>(stringify!($ty))
                }

                fn from_raw(raw: Raw) -> Result<Self, ConversionError> {
                    raw.into_value::<$ty>(stringify!($ty))
                }
            }
        )*
    };
}

impl_param_value!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
);

impl<T: Object> Param for Ref<T> {
    fn static_type() -> StaticType {
        StaticType::reference::<T>(false)
    }

    fn from_raw(raw: Raw) -> Result<Self, ConversionError> {
        match raw.into_nullable_object::<T>()? {
            Some(object) => Ok(object),
            None => Err(ConversionError::NullReference {
                target_type: short_type_name::<T>(),
            }),
        }
    }
}

impl<T: Object> Param for Option<Ref<T>> {
    fn static_type() -> StaticType {
        StaticType::reference::<T>(true)
    }

    fn from_raw(raw: Raw) -> Result<Self, ConversionError> {
        raw.into_nullable_object::<T>()
    }
}

/// Register a `Clone + Send + Sync` type as a value-type parameter.
///
/// ```
/// use injector_core::{value_type, Param};
///
/// #[derive(Clone)]
/// struct Point { x: i32, y: i32 }
/// value_type!(Point);
///
/// assert_eq!(Point::static_type().name(), "Point");
/// ```
#[macro_export]
macro_rules! value_type {
    ($ty:ty) => {
        $crate::value_type!($ty, stringify!($ty));
    };
    ($ty:ty, $name:expr) => {
        impl $crate::Param for $ty {
            fn static_type() -> $crate::StaticType {
                $crate::StaticType::value::<$ty>($name)
            }

            fn from_raw(raw: $crate::Raw) -> Result<Self, $crate::ConversionError> {
                raw.into_value::<$ty>($name)
            }
        }
    };
}

/// A tuple of parameter types, used to declare signatures without a body.
pub trait ParamList {
    /// Static types in declaration order.
    fn static_types() -> Vec<StaticType>;
}

macro_rules! impl_param_list {
    ($($param:ident),*) => {
        impl<$($param: Param),*> ParamList for ($($param,)*) {
            fn static_types() -> Vec<StaticType> {
                vec![$($param::static_type()),*]
            }
        }
    };
}

impl_param_list!();
impl_param_list!(A);
impl_param_list!(A, B);
impl_param_list!(A, B, C);
impl_param_list!(A, B, C, D);
impl_param_list!(A, B, C, D, E);
impl_param_list!(A, B, C, D, E, F);
impl_param_list!(A, B, C, D, E, F, G);
impl_param_list!(A, B, C, D, E, F, G, H);
