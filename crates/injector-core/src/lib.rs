//! Core types for the dynamic injector.
//!
//! This crate is the introspection side of the injector: it describes Rust
//! types as classes with constructors, properties and methods, and provides
//! the type-erased value model every injector speaks.
//!
//! - [`Dynamic`]: the generic value handle (null, boxed value, object)
//! - [`ClassBuilder`] / [`ClassEntry`]: class registration and member
//!   descriptors
//! - [`ClassInfo`]: runtime class metadata and vtables
//! - [`Param`] / [`StaticType`]: parameter types and their marshaling targets
//! - [`TypeHash`]: deterministic identities for types, members and slots

mod builder;
mod callable;
mod class;
mod dynamic;
mod error;
mod member;
mod object;
mod param;
mod static_type;
pub mod type_hash;
mod type_kind;
mod value;

pub use builder::{ClassBuilder, ClassEntry};
pub use callable::{ConstructorFn, Exclusive, MethodFn, SetterFn, Shared};
pub use class::{ClassInfo, VirtualSlot};
pub use dynamic::Dynamic;
pub use error::{
    ArgPosition, ConversionError, InvokeError, RegistrationError, SynthesisError,
    UnsupportedReason,
};
pub use member::{
    ConstructorBody, ConstructorDef, Dispatch, Instance, MethodBody, MethodDef, PropertyDef,
    Receiver, ReturnType, SetterBody, UpcastFn,
};
pub use object::{AsAny, Object, ObjectRef, Ref, upcast_mut, upcast_ref};
pub use param::{Param, ParamList, Raw};
pub use static_type::{StaticType, short_type_name};
pub use type_hash::TypeHash;
pub use type_kind::{ClassFlags, TypeKind};
pub use value::{AnyValue, BoxedValue};
