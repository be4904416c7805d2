//! Reference-type instances and shared handles.
//!
//! Reference types implement [`Object`]. Inheritance is expressed by
//! composition: a derived type embeds its base and exposes it through
//! [`Object::base`] / [`Object::base_mut`]. A downcast to `T` walks that chain,
//! so a `Dog` that embeds an `Animal` converts to `Animal`.
//!
//! Instances live behind [`ObjectRef`], a reference-counted handle that also
//! carries the runtime [`ClassInfo`] used for virtual dispatch.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use crate::class::ClassInfo;
use crate::error::ConversionError;
use crate::static_type::short_type_name;

/// Access to `dyn Any` for trait objects.
pub trait AsAny: Any {
    /// View as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// View as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for reference types.
///
/// # Example
///
/// ```
/// use injector_core::Object;
///
/// struct Animal { name: String }
/// impl Object for Animal {}
///
/// struct Dog { animal: Animal, good: bool }
/// impl Object for Dog {
///     fn base(&self) -> Option<&dyn Object> { Some(&self.animal) }
///     fn base_mut(&mut self) -> Option<&mut dyn Object> { Some(&mut self.animal) }
/// }
/// ```
pub trait Object: AsAny + Send + Sync + 'static {
    /// The embedded base-class part, if this type derives from another.
    fn base(&self) -> Option<&dyn Object> {
        None
    }

    /// Mutable access to the embedded base-class part.
    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        None
    }

    /// Rust type name of the concrete object.
    fn object_type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Borrow `object` as `T`, walking up the base chain.
pub fn upcast_ref<T: Object>(object: &dyn Object) -> Option<&T> {
    match (*object).as_any().downcast_ref::<T>() {
        Some(found) => Some(found),
        None => object.base().and_then(upcast_ref::<T>),
    }
}

/// Mutably borrow `object` as `T`, walking up the base chain.
pub fn upcast_mut<T: Object>(object: &mut dyn Object) -> Option<&mut T> {
    if (*object).as_any().is::<T>() {
        return (*object).as_any_mut().downcast_mut::<T>();
    }
    object.base_mut().and_then(upcast_mut::<T>)
}

/// Type-erased [`upcast_mut`], used as a method receiver adapter.
pub(crate) fn upcast_any_mut<T: Object>(object: &mut dyn Object) -> Option<&mut dyn Any> {
    upcast_mut::<T>(object).map(|found| found as &mut dyn Any)
}

struct ObjectCell {
    class: Arc<ClassInfo>,
    value: RwLock<Box<dyn Object>>,
}

/// Shared handle to a reference-type instance.
///
/// Cloning the handle shares the instance. The class is checked against the
/// value on creation: the value must be exactly the class's Rust type and its
/// `base()` chain must mirror the class's base chain.
#[derive(Clone)]
pub struct ObjectRef {
    cell: Arc<ObjectCell>,
}

impl ObjectRef {
    /// Wrap `value` as an instance of `class`.
    pub fn new<T: Object>(class: &Arc<ClassInfo>, value: T) -> Result<Self, ConversionError> {
        Self::from_boxed(class, Box::new(value))
    }

    /// Wrap an already boxed value as an instance of `class`.
    pub fn from_boxed(
        class: &Arc<ClassInfo>,
        value: Box<dyn Object>,
    ) -> Result<Self, ConversionError> {
        let object: &dyn Object = value.as_ref();
        let actual = object.object_type_name();

        if !class.kind().is_reference() || object_type_id(object) != ClassInfo::type_id(class) {
            return Err(ConversionError::ClassMismatch {
                class: class.name().to_string(),
                actual,
            });
        }
        if class.is_abstract() {
            return Err(ConversionError::AbstractClass {
                class: class.name().to_string(),
            });
        }
        if !base_chain_matches(object, class) {
            return Err(ConversionError::BaseChainMismatch {
                class: class.name().to_string(),
                actual,
            });
        }

        Ok(Self {
            cell: Arc::new(ObjectCell {
                class: Arc::clone(class),
                value: RwLock::new(value),
            }),
        })
    }

    /// The runtime class of this instance.
    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.cell.class
    }

    /// Check if this instance is a `type_id` or derives from it.
    pub fn is_instance_of(&self, type_id: TypeId) -> bool {
        self.cell.class.derives_from(type_id)
    }

    /// Check if this instance is a `T` or derives from it.
    pub fn is<T: Object>(&self) -> bool {
        self.is_instance_of(TypeId::of::<T>())
    }

    /// Get a typed handle if this instance is a `T` or derives from it.
    pub fn downcast<T: Object>(&self) -> Option<Ref<T>> {
        Ref::try_from_object(self.clone())
    }

    /// Check if two handles point at the same instance.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    pub(crate) fn lock_read(&self) -> RwLockReadGuard<'_, Box<dyn Object>> {
        self.cell.value.read()
    }

    pub(crate) fn lock_write(&self) -> RwLockWriteGuard<'_, Box<dyn Object>> {
        self.cell.value.write()
    }

    /// Write-lock this instance at a moment when every handle in `readers`
    /// can be read.
    ///
    /// A member body reads its reference arguments while the target stays
    /// locked. The target lock is only kept once all of them were readable
    /// under it, otherwise it is released and retried. Two calls that take
    /// each other as argument therefore never both hold their targets.
    ///
    /// `readers` must not contain this instance.
    pub(crate) fn lock_write_with(
        &self,
        readers: &[&ObjectRef],
    ) -> RwLockWriteGuard<'_, Box<dyn Object>> {
        debug_assert!(readers.iter().all(|reader| !reader.ptr_eq(self)));
        loop {
            let guard = self.cell.value.write();
            if readers
                .iter()
                .all(|reader| reader.cell.value.try_read().is_some())
            {
                return guard;
            }
            drop(guard);
            std::thread::yield_now();
        }
    }
}

/// `TypeId` of the concrete value behind `object`.
fn object_type_id(object: &dyn Object) -> TypeId {
    <dyn Any>::type_id(object.as_any())
}

fn base_chain_matches(object: &dyn Object, class: &ClassInfo) -> bool {
    let mut object = Some(object);
    let mut class = Some(class);
    loop {
        match (object, class) {
            (None, None) => return true,
            (Some(o), Some(c)) if object_type_id(o) == ClassInfo::type_id(c) => {
                object = o.base();
                class = c.base().map(|base| base.as_ref());
            }
            _ => return false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({})", self.cell.class.name())
    }
}

/// Typed handle to an instance of `T` or of a class derived from `T`.
///
/// This is the parameter type for reference-typed arguments; use
/// `Option<Ref<T>>` to accept null.
pub struct Ref<T: Object> {
    object: ObjectRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Object> Ref<T> {
    /// Wrap `object` if it is a `T` or derives from it.
    pub fn try_from_object(object: ObjectRef) -> Option<Self> {
        object.is::<T>().then_some(Self {
            object,
            _marker: PhantomData,
        })
    }

    /// Lock the instance for reading, viewed as `T`.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, T> {
        RwLockReadGuard::map(self.object.lock_read(), |value| {
            match upcast_ref::<T>(&**value) {
                Some(found) => found,
                None => unreachable!("Ref<{}> outlived its type check", short_type_name::<T>()),
            }
        })
    }

    /// Lock the instance for writing, viewed as `T`.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, T> {
        RwLockWriteGuard::map(self.object.lock_write(), |value| {
            match upcast_mut::<T>(&mut **value) {
                Some(found) => found,
                None => unreachable!("Ref<{}> outlived its type check", short_type_name::<T>()),
            }
        })
    }

    /// The untyped handle.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Convert back into the untyped handle.
    pub fn into_object(self) -> ObjectRef {
        self.object
    }
}

impl<T: Object> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            object: self.object.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Object> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ref<{}>({})",
            short_type_name::<T>(),
            self.object.class().name()
        )
    }
}
