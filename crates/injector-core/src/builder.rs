//! ClassBuilder for describing Rust types to the injector.
//!
//! ClassBuilder provides a fluent API for registering value types and
//! reference types with constructors, properties and methods. The result is
//! a [`ClassEntry`]: the runtime [`ClassInfo`] plus the member descriptors an
//! injector factory compiles.
//!
//! # Example
//!
//! ```
//! use injector_core::{ClassBuilder, Object, value_type};
//!
//! #[derive(Clone)]
//! struct Point { x: i32, y: i32 }
//! value_type!(Point);
//!
//! let point = ClassBuilder::<Point>::value_type("Point")
//!     .constructor(|x: i32, y: i32| Point { x, y })
//!     .property("x", |p: &mut Point, x: i32| p.x = x)
//!     .method("translate", |p: &mut Point, dx: i32, dy: i32| {
//!         p.x += dx;
//!         p.y += dy;
//!     })
//!     .build()?;
//!
//! struct Animal { name: String }
//! impl Object for Animal {}
//!
//! let animal = ClassBuilder::<Animal>::reference_type("Animal")
//!     .constructor(|name: String| Animal { name })
//!     .virtual_method("speak", |_: &Animal| "...".to_string())
//!     .build()?;
//!
//! assert_eq!(point.constructors().len(), 1);
//! assert!(animal.find_method("speak").is_some());
//! # Ok::<(), injector_core::RegistrationError>(())
//! ```

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::callable::{ConstructorFn, MethodFn, SetterFn};
use crate::class::{ClassInfo, VirtualSlot};
use crate::error::{ArgPosition, ConversionError, InvokeError, RegistrationError};
use crate::member::{
    ConstructorBody, ConstructorDef, Dispatch, Instance, MethodBody, MethodDef, PropertyDef,
    Receiver, ReturnType, SetterBody,
};
use crate::object::{Object, ObjectRef};
use crate::param::{Param, ParamList, Raw};
use crate::static_type::{StaticType, short_type_name};
use crate::type_hash::TypeHash;
use crate::type_kind::{ClassFlags, TypeKind};

struct PendingConstructor {
    params: Vec<StaticType>,
    body: ConstructorBody,
}

struct PendingProperty {
    name: String,
    property_type: StaticType,
    setter: Option<SetterBody>,
}

enum MethodKind {
    Direct(MethodBody),
    Virtual(MethodBody),
    Abstract,
}

struct PendingMethod {
    name: String,
    params: Vec<StaticType>,
    returns: Option<ReturnType>,
    kind: MethodKind,
}

impl PendingMethod {
    fn slot(&self) -> TypeHash {
        let hashes: Vec<TypeHash> = self.params.iter().map(StaticType::type_hash).collect();
        TypeHash::from_slot(&self.name, &hashes)
    }
}

/// Builder for a class and its members.
///
/// Created with [`ClassBuilder::value_type`] or
/// [`ClassBuilder::reference_type`]; finished with [`ClassBuilder::build`].
pub struct ClassBuilder<T: 'static> {
    /// Class name
    name: String,
    /// Value or reference
    kind: TypeKind,
    /// Abstract / sealed
    flags: ClassFlags,
    /// Base class, reference types only
    base: Option<Arc<ClassInfo>>,
    /// How member bodies reach a `T` inside a target
    receiver: Receiver,
    /// How a constructed `T` becomes an `Instance`
    wrap: fn(T) -> Instance,

    constructors: Vec<PendingConstructor>,
    properties: Vec<PendingProperty>,
    methods: Vec<PendingMethod>,
}

fn wrap_value<T: Clone + Send + Sync + 'static>(value: T) -> Instance {
    Instance::Value(Box::new(value))
}

fn wrap_object<T: Object>(value: T) -> Instance {
    Instance::Object(Box::new(value))
}

fn downcast_receiver<T: 'static>(receiver: &mut dyn Any) -> Result<&mut T, InvokeError> {
    receiver.downcast_mut::<T>().ok_or_else(|| {
        InvokeError::mismatch(
            ArgPosition::Target,
            short_type_name::<T>(),
            "incompatible receiver",
        )
    })
}

impl<T: Clone + Send + Sync + 'static> ClassBuilder<T> {
    /// Start a value type. Instances are copied in and out of `Dynamic`.
    pub fn value_type(name: impl Into<String>) -> Self {
        Self::new(name.into(), TypeKind::Value, Receiver::value::<T>(), wrap_value::<T>)
    }
}

impl<T: Object> ClassBuilder<T> {
    /// Start a reference type. Instances are shared through `ObjectRef`.
    pub fn reference_type(name: impl Into<String>) -> Self {
        Self::new(
            name.into(),
            TypeKind::Reference,
            Receiver::object::<T>(),
            wrap_object::<T>,
        )
    }

    /// Derive from `base`.
    ///
    /// `T` must embed the base type and return it from [`Object::base`].
    /// Inherited virtual slots are copied into this class's vtable and may be
    /// overridden with [`virtual_method`](Self::virtual_method).
    pub fn extends(mut self, base: &ClassEntry) -> Self {
        self.base = Some(Arc::clone(base.class()));
        self
    }
}

impl<T: 'static> ClassBuilder<T> {
    fn new(name: String, kind: TypeKind, receiver: Receiver, wrap: fn(T) -> Instance) -> Self {
        Self {
            name,
            kind,
            flags: ClassFlags::empty(),
            base: None,
            receiver,
            wrap,
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Mark the class abstract. It cannot be instantiated and may leave
    /// virtual slots without an implementation.
    pub fn abstract_class(mut self) -> Self {
        self.flags |= ClassFlags::ABSTRACT;
        self
    }

    /// Mark the class sealed. It cannot be used as a base class.
    pub fn sealed(mut self) -> Self {
        self.flags |= ClassFlags::SEALED;
        self
    }

    /// Register a constructor.
    pub fn constructor<M, F>(mut self, f: F) -> Self
    where
        F: ConstructorFn<M, Output = T>,
    {
        let wrap = self.wrap;
        let params = F::param_types();
        let body = ConstructorBody::new(self.kind, move |args| f.construct(args).map(wrap));
        self.constructors.push(PendingConstructor { params, body });
        self
    }

    /// Register a constructor that can fail.
    ///
    /// The error reaches the injector's caller as
    /// [`InvokeError::TargetFailure`].
    pub fn try_constructor<M, F, E>(mut self, f: F) -> Self
    where
        F: ConstructorFn<M, Output = Result<T, E>>,
        E: Into<anyhow::Error> + 'static,
    {
        let wrap = self.wrap;
        let params = F::param_types();
        let body = ConstructorBody::new(self.kind, move |args| {
            f.construct(args)?.map(wrap).map_err(InvokeError::target)
        });
        self.constructors.push(PendingConstructor { params, body });
        self
    }

    /// Register a writable property.
    pub fn property<M, F>(self, name: &str, setter: F) -> Self
    where
        F: SetterFn<T, M, Output = ()>,
    {
        let body = self.setter_body(move |target, value| setter.assign(target, value));
        self.push_property(name, F::param_type(), Some(body))
    }

    /// Register a writable property whose setter can fail.
    pub fn try_property<M, F, E>(self, name: &str, setter: F) -> Self
    where
        F: SetterFn<T, M, Output = Result<(), E>>,
        E: Into<anyhow::Error> + 'static,
    {
        let body = self.setter_body(move |target, value| {
            setter.assign(target, value)?.map_err(InvokeError::target)
        });
        self.push_property(name, F::param_type(), Some(body))
    }

    /// Register a property without a setter.
    pub fn read_only_property<V: Param>(self, name: &str) -> Self {
        self.push_property(name, V::static_type(), None)
    }

    /// Register a non-virtual method.
    ///
    /// Calls always run this body, even on derived instances that declare a
    /// method with the same signature.
    pub fn method<M, F>(self, name: &str, f: F) -> Self
    where
        F: MethodFn<T, M>,
    {
        let params = F::param_types();
        let returns = ReturnType::of::<F::Output>();
        let body = self.method_body(move |target, args| f.invoke_on(target, args).map(drop));
        self.push_method(name, params, returns, MethodKind::Direct(body))
    }

    /// Register a non-virtual method that can fail.
    pub fn try_method<M, F, R, E>(self, name: &str, f: F) -> Self
    where
        F: MethodFn<T, M, Output = Result<R, E>>,
        R: 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let params = F::param_types();
        let body = self.method_body(move |target, args| {
            f.invoke_on(target, args)?
                .map(drop)
                .map_err(InvokeError::target)
        });
        self.push_method(name, params, ReturnType::of::<R>(), MethodKind::Direct(body))
    }

    /// Register a virtual method, or override an inherited one.
    ///
    /// Calls select the implementation from the runtime class of the target.
    pub fn virtual_method<M, F>(self, name: &str, f: F) -> Self
    where
        F: MethodFn<T, M>,
    {
        let params = F::param_types();
        let returns = ReturnType::of::<F::Output>();
        let body = self.method_body(move |target, args| f.invoke_on(target, args).map(drop));
        self.push_method(name, params, returns, MethodKind::Virtual(body))
    }

    /// Register a virtual method that can fail.
    pub fn try_virtual_method<M, F, R, E>(self, name: &str, f: F) -> Self
    where
        F: MethodFn<T, M, Output = Result<R, E>>,
        R: 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let params = F::param_types();
        let body = self.method_body(move |target, args| {
            f.invoke_on(target, args)?
                .map(drop)
                .map_err(InvokeError::target)
        });
        self.push_method(name, params, ReturnType::of::<R>(), MethodKind::Virtual(body))
    }

    /// Declare a virtual method without an implementation.
    ///
    /// Only abstract classes may do this. `P` is the parameter tuple and `R`
    /// the return type:
    ///
    /// ```ignore
    /// builder.abstract_method::<(f64,), f64>("scale")
    /// ```
    pub fn abstract_method<P: ParamList, R: 'static>(self, name: &str) -> Self {
        self.push_method(
            name,
            P::static_types(),
            ReturnType::of::<R>(),
            MethodKind::Abstract,
        )
    }

    fn setter_body(
        &self,
        f: impl Fn(&mut T, Raw) -> Result<(), InvokeError> + Send + Sync + 'static,
    ) -> SetterBody {
        SetterBody::new(self.receiver, move |receiver: &mut dyn Any, value| {
            f(downcast_receiver::<T>(receiver)?, value)
        })
    }

    fn method_body(
        &self,
        f: impl Fn(&mut T, Vec<Raw>) -> Result<(), InvokeError> + Send + Sync + 'static,
    ) -> MethodBody {
        MethodBody::new(self.receiver, move |receiver: &mut dyn Any, args| {
            f(downcast_receiver::<T>(receiver)?, args)
        })
    }

    fn push_property(
        mut self,
        name: &str,
        property_type: StaticType,
        setter: Option<SetterBody>,
    ) -> Self {
        self.properties.push(PendingProperty {
            name: name.to_string(),
            property_type,
            setter,
        });
        self
    }

    fn push_method(
        mut self,
        name: &str,
        params: Vec<StaticType>,
        returns: Option<ReturnType>,
        kind: MethodKind,
    ) -> Self {
        self.methods.push(PendingMethod {
            name: name.to_string(),
            params,
            returns,
            kind,
        });
        self
    }

    /// Validate the registration and produce the class entry.
    pub fn build(self) -> Result<ClassEntry, RegistrationError> {
        let ClassBuilder {
            name,
            kind,
            flags,
            base,
            receiver: _,
            wrap: _,
            constructors,
            properties,
            methods,
        } = self;

        if flags.contains(ClassFlags::ABSTRACT | ClassFlags::SEALED) {
            return Err(RegistrationError::AbstractSealed { class: name });
        }
        if let Some(base) = &base {
            if base.kind().is_value() {
                return Err(RegistrationError::ValueTypeBase {
                    class: name,
                    base: base.name().to_string(),
                });
            }
            if base.is_sealed() {
                return Err(RegistrationError::SealedBase {
                    class: name,
                    base: base.name().to_string(),
                });
            }
        }

        let duplicate = |member: &str| RegistrationError::DuplicateMember {
            class: name.clone(),
            member: member.to_string(),
        };

        let mut vtable = base
            .as_ref()
            .map(|base| base.vtable().clone())
            .unwrap_or_default();
        let mut signatures = FxHashSet::default();
        for method in &methods {
            let slot = method.slot();
            if !signatures.insert(slot) {
                return Err(duplicate(&method.name));
            }
            match &method.kind {
                MethodKind::Direct(_) => {}
                MethodKind::Virtual(body) => {
                    vtable.insert(
                        slot,
                        VirtualSlot::new(method.name.clone(), name.clone(), Some(body.clone())),
                    );
                }
                MethodKind::Abstract => {
                    if !flags.contains(ClassFlags::ABSTRACT) {
                        return Err(RegistrationError::AbstractMethodOnConcreteClass {
                            class: name.clone(),
                            method: method.name.clone(),
                        });
                    }
                    vtable.insert(
                        slot,
                        VirtualSlot::new(method.name.clone(), name.clone(), None),
                    );
                }
            }
        }

        if !flags.contains(ClassFlags::ABSTRACT) {
            if let Some(slot) = vtable.values().find(|slot| slot.is_abstract()) {
                return Err(RegistrationError::UnimplementedAbstract {
                    class: name.clone(),
                    method: slot.name().to_string(),
                });
            }
        }

        let mut property_names = FxHashSet::default();
        for property in &properties {
            if !property_names.insert(property.name.as_str()) {
                return Err(duplicate(&property.name));
            }
        }

        let mut constructor_signatures = FxHashSet::default();
        for constructor in &constructors {
            let hashes: Vec<TypeHash> = constructor
                .params
                .iter()
                .map(StaticType::type_hash)
                .collect();
            if !constructor_signatures.insert(hashes) {
                return Err(duplicate(&name));
            }
        }

        let class = Arc::new(ClassInfo::new(
            name,
            std::any::TypeId::of::<T>(),
            kind,
            flags,
            base,
            vtable,
        ));

        let constructors = constructors
            .into_iter()
            .map(|c| ConstructorDef::new(Arc::clone(&class), c.params, c.body))
            .collect();
        let properties = properties
            .into_iter()
            .map(|p| PropertyDef::new(Arc::clone(&class), p.name, p.property_type, p.setter))
            .collect();
        let methods = methods
            .into_iter()
            .map(|m| {
                let slot = m.slot();
                let (dispatch, body) = match m.kind {
                    MethodKind::Direct(body) => (Dispatch::Direct, Some(body)),
                    MethodKind::Virtual(body) => (Dispatch::Virtual { slot }, Some(body)),
                    MethodKind::Abstract => (Dispatch::Virtual { slot }, None),
                };
                MethodDef::new(Arc::clone(&class), m.name, m.params, m.returns, dispatch, body)
            })
            .collect();

        Ok(ClassEntry {
            class,
            constructors,
            properties,
            methods,
        })
    }
}

/// A registered class and its member descriptors.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    class: Arc<ClassInfo>,
    constructors: Vec<ConstructorDef>,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
}

impl ClassEntry {
    /// Runtime class metadata.
    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    /// First constructor taking `arity` parameters.
    pub fn find_constructor(&self, arity: usize) -> Option<&ConstructorDef> {
        self.constructors.iter().find(|c| c.params().len() == arity)
    }

    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Methods declared on this class, inherited ones excluded.
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// First method declared on this class with the given name.
    pub fn find_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name() == name)
    }

    /// Wrap `value` as an instance of this class.
    pub fn instantiate<T: Object>(&self, value: T) -> Result<ObjectRef, ConversionError> {
        ObjectRef::new(&self.class, value)
    }
}
