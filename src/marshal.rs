//! Conversions between `Dynamic` values and the exact types members expect.
//!
//! Value types are unboxed: the argument must hold exactly the expected type
//! and the member receives a copy. Reference types are cast: the argument
//! must be an object of the expected class or a class derived from it, or
//! null when the parameter is nullable.

use std::sync::Arc;

use injector_core::{
    ArgPosition, BoxedValue, ClassInfo, ConversionError, Dynamic, Instance, InvokeError,
    MethodBody, ObjectRef, Raw, StaticType, TypeHash, TypeKind, VirtualSlot,
};

/// Precompiled conversion for one parameter.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Marshaler {
    Unbox(StaticType),
    Cast(StaticType),
}

impl Marshaler {
    pub(crate) fn for_type(ty: StaticType) -> Self {
        match ty.kind() {
            TypeKind::Value => Marshaler::Unbox(ty),
            TypeKind::Reference => Marshaler::Cast(ty),
        }
    }

    #[inline]
    pub(crate) fn marshal(
        &self,
        value: &Dynamic,
        position: ArgPosition,
    ) -> Result<Raw, InvokeError> {
        match self {
            Marshaler::Unbox(ty) => unbox(ty, value, position),
            Marshaler::Cast(ty) => cast(ty, value, position),
        }
    }
}

/// Convert `value` to `ty`, deciding the conversion from scratch.
pub(crate) fn marshal_value(
    ty: &StaticType,
    value: &Dynamic,
    position: ArgPosition,
) -> Result<Raw, InvokeError> {
    if ty.kind().is_value() {
        unbox(ty, value, position)
    } else {
        cast(ty, value, position)
    }
}

fn unbox(ty: &StaticType, value: &Dynamic, position: ArgPosition) -> Result<Raw, InvokeError> {
    match value {
        Dynamic::Value(boxed) if boxed.type_id() == ty.type_id() => {
            Ok(Raw::Value(boxed.clone_inner()))
        }
        other => Err(InvokeError::mismatch(position, ty.name(), other.type_name())),
    }
}

fn cast(ty: &StaticType, value: &Dynamic, position: ArgPosition) -> Result<Raw, InvokeError> {
    match value {
        Dynamic::Object(object) if object.is_instance_of(ty.type_id()) => {
            Ok(Raw::Object(object.clone()))
        }
        Dynamic::Null if ty.is_nullable() => Ok(Raw::Null),
        other => Err(InvokeError::mismatch(position, ty.name(), other.type_name())),
    }
}

pub(crate) fn check_arity(expected: usize, actual: usize) -> Result<(), InvokeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(InvokeError::ArityMismatch { expected, actual })
    }
}

/// Check that `target` is an instance of `class`.
pub(crate) fn check_target(class: &ClassInfo, target: &Dynamic) -> Result<(), InvokeError> {
    let fits = match (class.kind(), target) {
        (TypeKind::Value, Dynamic::Value(boxed)) => boxed.type_id() == class.type_id(),
        (TypeKind::Reference, Dynamic::Object(object)) => object.is_instance_of(class.type_id()),
        _ => false,
    };
    if fits {
        Ok(())
    } else {
        Err(InvokeError::mismatch(
            ArgPosition::Target,
            class.name(),
            target.type_name(),
        ))
    }
}

/// Turn a constructed instance into the generic result shape.
pub(crate) fn box_instance(
    class: &Arc<ClassInfo>,
    instance: Instance,
) -> Result<Dynamic, InvokeError> {
    match instance {
        Instance::Value(value) => {
            let boxed = BoxedValue::from_boxed(value);
            if boxed.type_id() != ClassInfo::type_id(class) {
                return Err(InvokeError::target(ConversionError::ClassMismatch {
                    class: class.name().to_string(),
                    actual: boxed.type_name(),
                }));
            }
            Ok(Dynamic::Value(boxed))
        }
        Instance::Object(object) => ObjectRef::from_boxed(class, object)
            .map(Dynamic::Object)
            .map_err(InvokeError::target),
    }
}

/// Find the implementation of `slot` on the runtime class of `target`.
pub(crate) fn resolve_virtual(
    slot: TypeHash,
    method: &str,
    target: &Dynamic,
) -> Result<MethodBody, InvokeError> {
    let Dynamic::Object(object) = target else {
        return Err(InvokeError::mismatch(
            ArgPosition::Target,
            "object",
            target.type_name(),
        ));
    };
    let class = object.class();
    class
        .resolve(slot)
        .and_then(VirtualSlot::body)
        .cloned()
        .ok_or_else(|| InvokeError::AbstractMethod {
            method: method.to_string(),
            class: class.name().to_string(),
        })
}
