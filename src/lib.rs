//! Dynamic injector synthesis.
//!
//! Given a descriptor for a constructor, property setter or method, an
//! [`InjectorFactory`] produces an injector: a function value with a fixed,
//! type-erased calling convention that behaves exactly like calling the
//! member directly. Argument conversion and dispatch mode are decided once,
//! when the injector is created.
//!
//! # Example
//!
//! ```
//! use injector::prelude::*;
//!
//! struct Animal { name: String }
//! impl Object for Animal {}
//!
//! struct Dog { animal: Animal }
//! impl Object for Dog {
//!     fn base(&self) -> Option<&dyn Object> { Some(&self.animal) }
//!     fn base_mut(&mut self) -> Option<&mut dyn Object> { Some(&mut self.animal) }
//! }
//!
//! let animal = ClassBuilder::<Animal>::reference_type("Animal")
//!     .virtual_method("rename", |a: &mut Animal, name: String| a.name = name)
//!     .build()?;
//! let dog = ClassBuilder::<Dog>::reference_type("Dog")
//!     .extends(&animal)
//!     .constructor(|name: String| Dog { animal: Animal { name } })
//!     .virtual_method("rename", |d: &mut Dog, name: String| d.animal.name = format!("{name}!"))
//!     .build()?;
//!
//! let factory = DynamicInjectorFactory::new();
//! let new_dog = factory.create_constructor_injector(&dog.constructors()[0])?;
//! let rename = factory.create_method_injector(animal.find_method("rename").unwrap())?;
//!
//! let mut rex = new_dog.invoke(&[Dynamic::from("Rex")])?;
//! rename.invoke(&mut rex, &[Dynamic::from("Max")])?;
//! assert_eq!(rex.downcast::<Animal>().unwrap().read().name, "Max!");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod factory;
mod injector;
mod marshal;
mod naming;
mod options;
mod plan;
mod reflection;

pub use factory::{DynamicInjectorFactory, InjectorFactory};
pub use injector::{ConstructorInjector, MethodInjector, PropertyInjector};
pub use options::{DEFAULT_NAME_PREFIX, InjectorOptions};
pub use reflection::ReflectionInjectorFactory;

pub use injector_core::{
    ArgPosition, BoxedValue, ClassBuilder, ClassEntry, ClassFlags, ClassInfo, ConstructorDef,
    ConversionError, Dispatch, Dynamic, InvokeError, MethodDef, Object, ObjectRef, Param,
    PropertyDef, Raw, Ref, RegistrationError, StaticType, SynthesisError, TypeHash, TypeKind,
    UnsupportedReason, value_type,
};

/// Common imports for registering classes and synthesizing injectors.
pub mod prelude {
    pub use crate::{
        ClassBuilder, ClassEntry, ConstructorInjector, Dynamic, DynamicInjectorFactory,
        InjectorFactory, InjectorOptions, InvokeError, MethodInjector, Object, ObjectRef,
        PropertyInjector, Ref, ReflectionInjectorFactory, SynthesisError, value_type,
    };
}
