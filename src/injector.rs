//! Injector types.
//!
//! An injector is a named, shareable function value with one of three fixed
//! shapes. All three are `Send + Sync` and cheap to clone; clones share the
//! compiled call path.

use std::fmt;
use std::sync::Arc;

use injector_core::{Dynamic, InvokeError};

type ConstructorCall = dyn Fn(&[Dynamic]) -> Result<Dynamic, InvokeError> + Send + Sync;
type PropertyCall = dyn Fn(&mut Dynamic, &Dynamic) -> Result<(), InvokeError> + Send + Sync;
type MethodCall = dyn Fn(&mut Dynamic, &[Dynamic]) -> Result<(), InvokeError> + Send + Sync;

/// Creates instances from a generic argument slice.
#[derive(Clone)]
pub struct ConstructorInjector {
    name: Arc<str>,
    inner: Arc<ConstructorCall>,
}

impl ConstructorInjector {
    /// Wrap a constructor call path.
    pub fn new<F>(name: Arc<str>, f: F) -> Self
    where
        F: Fn(&[Dynamic]) -> Result<Dynamic, InvokeError> + Send + Sync + 'static,
    {
        Self {
            name,
            inner: Arc::new(f),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Construct an instance. Value types come back boxed, reference types
    /// as a new object handle.
    #[inline]
    pub fn invoke(&self, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
        (self.inner)(args)
    }
}

impl fmt::Debug for ConstructorInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInjector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Assigns a property on a generic target.
#[derive(Clone)]
pub struct PropertyInjector {
    name: Arc<str>,
    inner: Arc<PropertyCall>,
}

impl PropertyInjector {
    /// Wrap a setter call path.
    pub fn new<F>(name: Arc<str>, f: F) -> Self
    where
        F: Fn(&mut Dynamic, &Dynamic) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        Self {
            name,
            inner: Arc::new(f),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the property on `target` to `value`.
    ///
    /// Boxed value-type targets are updated in place.
    #[inline]
    pub fn invoke(&self, target: &mut Dynamic, value: &Dynamic) -> Result<(), InvokeError> {
        (self.inner)(target, value)
    }
}

impl fmt::Debug for PropertyInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInjector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Calls a method on a generic target, discarding its return value.
#[derive(Clone)]
pub struct MethodInjector {
    name: Arc<str>,
    inner: Arc<MethodCall>,
}

impl MethodInjector {
    /// Wrap a method call path.
    pub fn new<F>(name: Arc<str>, f: F) -> Self
    where
        F: Fn(&mut Dynamic, &[Dynamic]) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        Self {
            name,
            inner: Arc::new(f),
        }
    }

    /// Diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the method on `target`.
    #[inline]
    pub fn invoke(&self, target: &mut Dynamic, args: &[Dynamic]) -> Result<(), InvokeError> {
        (self.inner)(target, args)
    }
}

impl fmt::Debug for MethodInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInjector")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn injectors_are_send_sync() {
        assert_send_sync::<ConstructorInjector>();
        assert_send_sync::<PropertyInjector>();
        assert_send_sync::<MethodInjector>();
    }

    #[test]
    fn constructor_injector_calls_through() {
        let injector = ConstructorInjector::new(Arc::from("Sum"), |args: &[Dynamic]| {
            let total: i32 = args.iter().filter_map(|a| a.unbox::<i32>().ok()).sum();
            Ok(Dynamic::from(total))
        });
        let result = injector
            .invoke(&[Dynamic::from(2i32), Dynamic::from(3i32)])
            .unwrap();
        assert_eq!(result.unbox::<i32>().unwrap(), 5);
        assert_eq!(injector.name(), "Sum");
    }

    #[test]
    fn clones_share_call_path() {
        let bump = |target: &mut Dynamic, _: &[Dynamic]| -> Result<(), InvokeError> {
            if let Some(value) = target.downcast_mut::<i32>() {
                *value += 1;
            }
            Ok(())
        };
        let injector = MethodInjector::new(Arc::from("Bump"), bump);
        let copy = injector.clone();
        let mut target = Dynamic::from(0i32);
        injector.invoke(&mut target, &[]).unwrap();
        copy.invoke(&mut target, &[]).unwrap();
        assert_eq!(target.unbox::<i32>().unwrap(), 2);
        assert!(format!("{copy:?}").contains("Bump"));
    }

    #[test]
    fn property_injector_calls_through() {
        let injector =
            PropertyInjector::new(Arc::from("Assign"), |target: &mut Dynamic, value: &Dynamic| {
                *target = value.clone();
                Ok(())
            });
        let mut target = Dynamic::Null;
        injector.invoke(&mut target, &Dynamic::from("x")).unwrap();
        assert_eq!(target.unbox::<String>().unwrap(), "x");
    }
}
