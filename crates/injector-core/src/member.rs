//! Member bodies and descriptors.
//!
//! A body is the type-erased callable behind a constructor, setter or
//! method. A descriptor pairs a body with the metadata an injector needs:
//! declaring class, parameter types and dispatch mode. Descriptors are
//! produced by [`ClassBuilder`](crate::ClassBuilder) and only read by
//! injector factories.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::class::ClassInfo;
use crate::dynamic::Dynamic;
use crate::error::{ArgPosition, InvokeError};
use crate::object::{Object, ObjectRef};
use crate::param::Raw;
use crate::static_type::{StaticType, short_type_name};
use crate::type_hash::TypeHash;
use crate::type_kind::TypeKind;
use crate::value::{AnyValue, BoxedValue};

/// A freshly constructed instance, before it is wrapped in a [`Dynamic`].
pub enum Instance {
    /// Value-type result, boxed by the injector
    Value(Box<dyn AnyValue>),
    /// Reference-type result, wrapped in a new `ObjectRef`
    Object(Box<dyn Object>),
}

impl Instance {
    /// Kind of the produced instance.
    pub fn kind(&self) -> TypeKind {
        match self {
            Instance::Value(_) => TypeKind::Value,
            Instance::Object(_) => TypeKind::Reference,
        }
    }
}

/// Adapter from a locked object to the part a body operates on.
pub type UpcastFn = fn(&mut dyn Object) -> Option<&mut dyn Any>;

/// How a body reaches its receiver inside a [`Dynamic`] target.
#[derive(Clone, Copy)]
pub enum Receiver {
    /// Exact boxed value type, mutated in place
    Value {
        type_id: TypeId,
        name: &'static str,
    },
    /// Object or one of its base parts, under the object's write lock
    Object {
        upcast: UpcastFn,
        name: &'static str,
    },
}

impl Receiver {
    /// Receiver for a boxed `T`.
    pub fn value<T: 'static>() -> Self {
        Receiver::Value {
            type_id: TypeId::of::<T>(),
            name: short_type_name::<T>(),
        }
    }

    /// Receiver for the `T` part of an object.
    pub fn object<T: Object>() -> Self {
        Receiver::Object {
            upcast: crate::object::upcast_any_mut::<T>,
            name: short_type_name::<T>(),
        }
    }

    /// Kind of target this receiver accepts.
    pub fn kind(&self) -> TypeKind {
        match self {
            Receiver::Value { .. } => TypeKind::Value,
            Receiver::Object { .. } => TypeKind::Reference,
        }
    }

    /// Rust type name of the receiver.
    pub fn name(&self) -> &'static str {
        match self {
            Receiver::Value { name, .. } | Receiver::Object { name, .. } => name,
        }
    }

    /// Run `f` on the receiver inside `target`.
    ///
    /// Object targets stay write-locked while `f` runs. `linked` lists the
    /// object handles among the arguments `f` consumes. One that is the
    /// target itself fails with [`InvokeError::AliasedTarget`] before any
    /// lock is taken.
    pub fn apply<R>(
        &self,
        target: &mut Dynamic,
        linked: &[(ArgPosition, ObjectRef)],
        f: impl FnOnce(&mut dyn Any) -> Result<R, InvokeError>,
    ) -> Result<R, InvokeError> {
        match (self, target) {
            (Receiver::Value { type_id, .. }, Dynamic::Value(boxed))
                if BoxedValue::type_id(boxed) == *type_id =>
            {
                f(boxed.as_any_mut())
            }
            (Receiver::Object { upcast, name }, Dynamic::Object(object)) => {
                let object: &ObjectRef = object;
                if let Some((position, _)) = linked.iter().find(|(_, arg)| arg.ptr_eq(object)) {
                    return Err(InvokeError::AliasedTarget {
                        position: *position,
                    });
                }
                let readers: Vec<&ObjectRef> = linked.iter().map(|(_, arg)| arg).collect();
                let mut guard = object.lock_write_with(&readers);
                match upcast(&mut **guard) {
                    Some(receiver) => f(receiver),
                    None => Err(InvokeError::mismatch(
                        ArgPosition::Target,
                        *name,
                        object.class().name(),
                    )),
                }
            }
            (receiver, other) => Err(InvokeError::mismatch(
                ArgPosition::Target,
                receiver.name(),
                other.type_name(),
            )),
        }
    }
}

/// Object handles among `args`, with their positions.
fn linked_objects<'a>(
    args: impl IntoIterator<Item = (ArgPosition, &'a Raw)>,
) -> Vec<(ArgPosition, ObjectRef)> {
    args.into_iter()
        .filter_map(|(position, raw)| raw.object().map(|object| (position, object.clone())))
        .collect()
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Value { name, .. } => write!(f, "Receiver::Value({name})"),
            Receiver::Object { name, .. } => write!(f, "Receiver::Object({name})"),
        }
    }
}

type ConstructorCall = dyn Fn(Vec<Raw>) -> Result<Instance, InvokeError> + Send + Sync;
type SetterCall = dyn Fn(&mut dyn Any, Raw) -> Result<(), InvokeError> + Send + Sync;
type MethodCall = dyn Fn(&mut dyn Any, Vec<Raw>) -> Result<(), InvokeError> + Send + Sync;

/// Type-erased constructor.
#[derive(Clone)]
pub struct ConstructorBody {
    produces: TypeKind,
    call: Arc<ConstructorCall>,
}

impl ConstructorBody {
    /// Create a constructor body producing instances of `produces` kind.
    pub fn new<F>(produces: TypeKind, call: F) -> Self
    where
        F: Fn(Vec<Raw>) -> Result<Instance, InvokeError> + Send + Sync + 'static,
    {
        Self {
            produces,
            call: Arc::new(call),
        }
    }

    /// Kind of instance this body produces.
    pub fn produces(&self) -> TypeKind {
        self.produces
    }

    /// Construct from already marshaled arguments.
    pub fn construct(&self, args: Vec<Raw>) -> Result<Instance, InvokeError> {
        (self.call)(args)
    }
}

/// Type-erased property setter.
#[derive(Clone)]
pub struct SetterBody {
    receiver: Receiver,
    call: Arc<SetterCall>,
}

impl SetterBody {
    /// Create a setter body operating on `receiver`.
    pub fn new<F>(receiver: Receiver, call: F) -> Self
    where
        F: Fn(&mut dyn Any, Raw) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        Self {
            receiver,
            call: Arc::new(call),
        }
    }

    /// The receiver this setter expects.
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// Assign an already marshaled value on `target`.
    pub fn set(&self, target: &mut Dynamic, value: Raw) -> Result<(), InvokeError> {
        let linked = linked_objects([(ArgPosition::Value, &value)]);
        self.receiver
            .apply(target, &linked, |receiver| (self.call)(receiver, value))
    }
}

/// Type-erased method.
#[derive(Clone)]
pub struct MethodBody {
    receiver: Receiver,
    call: Arc<MethodCall>,
}

impl MethodBody {
    /// Create a method body operating on `receiver`.
    pub fn new<F>(receiver: Receiver, call: F) -> Self
    where
        F: Fn(&mut dyn Any, Vec<Raw>) -> Result<(), InvokeError> + Send + Sync + 'static,
    {
        Self {
            receiver,
            call: Arc::new(call),
        }
    }

    /// The receiver this method expects.
    pub fn receiver(&self) -> Receiver {
        self.receiver
    }

    /// Call on `target` with already marshaled arguments.
    pub fn call(&self, target: &mut Dynamic, args: Vec<Raw>) -> Result<(), InvokeError> {
        let linked = linked_objects(
            args.iter()
                .enumerate()
                .map(|(index, raw)| (ArgPosition::Argument(index), raw)),
        );
        self.receiver
            .apply(target, &linked, |receiver| (self.call)(receiver, args))
    }
}

/// How a method call selects its implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Look up `slot` in the runtime class's vtable
    Virtual { slot: TypeHash },
    /// Run the declared body
    Direct,
}

impl Dispatch {
    /// Check if this is virtual dispatch.
    pub fn is_virtual(&self) -> bool {
        matches!(self, Dispatch::Virtual { .. })
    }
}

/// Return type of a method, kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnType {
    name: &'static str,
}

impl ReturnType {
    /// Describe `T`, or `None` for `()`.
    pub fn of<T: 'static>() -> Option<Self> {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            return None;
        }
        Some(Self {
            name: short_type_name::<T>(),
        })
    }

    /// Type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

fn param_hashes(params: &[StaticType]) -> Vec<TypeHash> {
    params.iter().map(StaticType::type_hash).collect()
}

fn format_params(params: &[StaticType]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Constructor descriptor.
#[derive(Clone)]
pub struct ConstructorDef {
    declaring: Arc<ClassInfo>,
    params: Vec<StaticType>,
    body: ConstructorBody,
    hash: TypeHash,
}

impl ConstructorDef {
    /// Create a constructor descriptor.
    pub fn new(declaring: Arc<ClassInfo>, params: Vec<StaticType>, body: ConstructorBody) -> Self {
        let hash = TypeHash::from_constructor(declaring.type_hash(), &param_hashes(&params));
        Self {
            declaring,
            params,
            body,
            hash,
        }
    }

    pub fn declaring(&self) -> &Arc<ClassInfo> {
        &self.declaring
    }

    pub fn params(&self) -> &[StaticType] {
        &self.params
    }

    pub fn body(&self) -> &ConstructorBody {
        &self.body
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// `Point(i32, i32)`
    pub fn display_name(&self) -> String {
        format!("{}({})", self.declaring.name(), format_params(&self.params))
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("name", &self.display_name())
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Property descriptor.
#[derive(Clone)]
pub struct PropertyDef {
    declaring: Arc<ClassInfo>,
    name: String,
    property_type: StaticType,
    setter: Option<SetterBody>,
    hash: TypeHash,
}

impl PropertyDef {
    /// Create a property descriptor. A property without a setter is read-only.
    pub fn new(
        declaring: Arc<ClassInfo>,
        name: impl Into<String>,
        property_type: StaticType,
        setter: Option<SetterBody>,
    ) -> Self {
        let name = name.into();
        let hash = TypeHash::from_property(declaring.type_hash(), &name);
        Self {
            declaring,
            name,
            property_type,
            setter,
            hash,
        }
    }

    pub fn declaring(&self) -> &Arc<ClassInfo> {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> StaticType {
        self.property_type
    }

    pub fn setter(&self) -> Option<&SetterBody> {
        self.setter.as_ref()
    }

    pub fn is_read_only(&self) -> bool {
        self.setter.is_none()
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// `Point.x`
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.declaring.name(), self.name)
    }
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("name", &self.display_name())
            .field("type", &self.property_type)
            .field("read_only", &self.is_read_only())
            .finish_non_exhaustive()
    }
}

/// Method descriptor.
#[derive(Clone)]
pub struct MethodDef {
    declaring: Arc<ClassInfo>,
    name: String,
    params: Vec<StaticType>,
    returns: Option<ReturnType>,
    dispatch: Dispatch,
    body: Option<MethodBody>,
    hash: TypeHash,
}

impl MethodDef {
    /// Create a method descriptor.
    ///
    /// `body` is the declared implementation; abstract methods have none.
    pub fn new(
        declaring: Arc<ClassInfo>,
        name: impl Into<String>,
        params: Vec<StaticType>,
        returns: Option<ReturnType>,
        dispatch: Dispatch,
        body: Option<MethodBody>,
    ) -> Self {
        let name = name.into();
        let hash = TypeHash::from_method(declaring.type_hash(), &name, &param_hashes(&params));
        Self {
            declaring,
            name,
            params,
            returns,
            dispatch,
            body,
            hash,
        }
    }

    pub fn declaring(&self) -> &Arc<ClassInfo> {
        &self.declaring
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[StaticType] {
        &self.params
    }

    pub fn returns(&self) -> Option<ReturnType> {
        self.returns
    }

    pub fn dispatch(&self) -> Dispatch {
        self.dispatch
    }

    pub fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    pub fn hash(&self) -> TypeHash {
        self.hash
    }

    /// Vtable slot shared by every override of this method.
    pub fn slot(&self) -> TypeHash {
        TypeHash::from_slot(&self.name, &param_hashes(&self.params))
    }

    /// `Animal::speak(String)`
    pub fn display_name(&self) -> String {
        format!(
            "{}::{}({})",
            self.declaring.name(),
            self.name,
            format_params(&self.params)
        )
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.display_name())
            .field("returns", &self.returns.map(|r| r.name()))
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}
