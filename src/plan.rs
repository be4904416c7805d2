//! Marshal plans compiled from member descriptors.
//!
//! A plan resolves once everything a call needs: one [`Marshaler`] per
//! parameter, how to check the target, and how to dispatch. Every check runs
//! before the member body, so a rejected call never has side effects.

use std::sync::Arc;

use injector_core::{
    ArgPosition, ClassInfo, ConstructorBody, ConstructorDef, Dispatch, Dynamic, InvokeError,
    MethodBody, MethodDef, PropertyDef, Raw, SetterBody, StaticType, SynthesisError, TypeHash,
    TypeKind, UnsupportedReason,
};

use crate::marshal::{Marshaler, box_instance, check_arity, resolve_virtual};

/// Check that a constructor can be synthesized.
pub(crate) fn validate_constructor(def: &ConstructorDef) -> Result<(), SynthesisError> {
    let class = def.declaring();
    if class.is_abstract() {
        return Err(SynthesisError::unsupported(
            def.display_name(),
            UnsupportedReason::AbstractClass,
        ));
    }
    if def.body().produces() != class.kind() {
        return Err(SynthesisError::unsupported(
            def.display_name(),
            UnsupportedReason::KindMismatch,
        ));
    }
    Ok(())
}

/// Check that a property setter can be synthesized, returning the setter.
pub(crate) fn validate_property(def: &PropertyDef) -> Result<&SetterBody, SynthesisError> {
    let Some(setter) = def.setter() else {
        return Err(SynthesisError::unsupported(
            def.display_name(),
            UnsupportedReason::ReadOnlyProperty,
        ));
    };
    if setter.receiver().kind() != def.declaring().kind() {
        return Err(SynthesisError::unsupported(
            def.display_name(),
            UnsupportedReason::KindMismatch,
        ));
    }
    Ok(setter)
}

/// How a validated method reaches its implementation.
pub(crate) enum MethodTarget<'a> {
    /// The declared body, whatever the runtime class
    Direct(&'a MethodBody),
    /// Whatever fills `slot` in the runtime class's vtable
    Virtual(TypeHash),
}

/// Check that a method can be synthesized, returning how it dispatches.
pub(crate) fn validate_method(def: &MethodDef) -> Result<MethodTarget<'_>, SynthesisError> {
    let class = def.declaring();
    let reject = |reason| Err(SynthesisError::unsupported(def.display_name(), reason));

    if let Some(body) = def.body() {
        if body.receiver().kind() != class.kind() {
            return reject(UnsupportedReason::KindMismatch);
        }
    }

    match (def.dispatch(), def.body()) {
        (Dispatch::Direct, Some(body)) => Ok(MethodTarget::Direct(body)),
        (Dispatch::Direct, None) => reject(UnsupportedReason::AbstractMethod),
        (Dispatch::Virtual { .. }, _) if class.kind().is_value() => {
            reject(UnsupportedReason::VirtualOnValueType)
        }
        (Dispatch::Virtual { slot }, _) if class.resolve(slot).is_none() => {
            reject(UnsupportedReason::MissingVtableSlot)
        }
        (Dispatch::Virtual { slot }, _) => Ok(MethodTarget::Virtual(slot)),
    }
}

/// Arity check plus one marshaler per parameter.
#[derive(Debug, Clone)]
pub(crate) struct ArgumentPlan {
    marshalers: Box<[Marshaler]>,
}

impl ArgumentPlan {
    pub(crate) fn compile(params: &[StaticType]) -> Self {
        Self {
            marshalers: params.iter().copied().map(Marshaler::for_type).collect(),
        }
    }

    #[inline]
    pub(crate) fn marshal(&self, args: &[Dynamic]) -> Result<Vec<Raw>, InvokeError> {
        check_arity(self.marshalers.len(), args.len())?;
        self.marshalers
            .iter()
            .zip(args)
            .enumerate()
            .map(|(index, (marshaler, arg))| marshaler.marshal(arg, ArgPosition::Argument(index)))
            .collect()
    }
}

/// Unbox or cast check for the receiver of a setter or method.
#[derive(Debug, Clone)]
pub(crate) enum TargetPlan {
    /// Boxed value of exactly the declaring type
    Unbox(Arc<ClassInfo>),
    /// Object of the declaring class or a class derived from it
    Cast(Arc<ClassInfo>),
}

impl TargetPlan {
    pub(crate) fn compile(class: &Arc<ClassInfo>) -> Self {
        match class.kind() {
            TypeKind::Value => TargetPlan::Unbox(Arc::clone(class)),
            TypeKind::Reference => TargetPlan::Cast(Arc::clone(class)),
        }
    }

    #[inline]
    pub(crate) fn check(&self, target: &Dynamic) -> Result<(), InvokeError> {
        match (self, target) {
            (TargetPlan::Unbox(class), Dynamic::Value(boxed))
                if boxed.type_id() == ClassInfo::type_id(class) =>
            {
                Ok(())
            }
            (TargetPlan::Cast(class), Dynamic::Object(object))
                if object.is_instance_of(ClassInfo::type_id(class)) =>
            {
                Ok(())
            }
            (TargetPlan::Unbox(class) | TargetPlan::Cast(class), other) => Err(
                InvokeError::mismatch(ArgPosition::Target, class.name(), other.type_name()),
            ),
        }
    }
}

pub(crate) struct ConstructorPlan {
    class: Arc<ClassInfo>,
    args: ArgumentPlan,
    body: ConstructorBody,
}

impl ConstructorPlan {
    pub(crate) fn compile(def: &ConstructorDef) -> Result<Self, SynthesisError> {
        validate_constructor(def)?;
        Ok(Self {
            class: Arc::clone(def.declaring()),
            args: ArgumentPlan::compile(def.params()),
            body: def.body().clone(),
        })
    }

    pub(crate) fn invoke(&self, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
        let args = self.args.marshal(args)?;
        let instance = self.body.construct(args)?;
        box_instance(&self.class, instance)
    }
}

pub(crate) struct PropertyPlan {
    target: TargetPlan,
    value: Marshaler,
    setter: SetterBody,
}

impl PropertyPlan {
    pub(crate) fn compile(def: &PropertyDef) -> Result<Self, SynthesisError> {
        let setter = validate_property(def)?;
        Ok(Self {
            target: TargetPlan::compile(def.declaring()),
            value: Marshaler::for_type(def.property_type()),
            setter: setter.clone(),
        })
    }

    pub(crate) fn invoke(&self, target: &mut Dynamic, value: &Dynamic) -> Result<(), InvokeError> {
        self.target.check(target)?;
        let value = self.value.marshal(value, ArgPosition::Value)?;
        self.setter.set(target, value)
    }
}

enum DispatchPlan {
    Direct(MethodBody),
    Virtual { slot: TypeHash, method: Arc<str> },
}

pub(crate) struct MethodPlan {
    target: TargetPlan,
    args: ArgumentPlan,
    dispatch: DispatchPlan,
}

impl MethodPlan {
    pub(crate) fn compile(def: &MethodDef) -> Result<Self, SynthesisError> {
        let dispatch = match validate_method(def)? {
            MethodTarget::Direct(body) => DispatchPlan::Direct(body.clone()),
            MethodTarget::Virtual(slot) => DispatchPlan::Virtual {
                slot,
                method: Arc::from(def.name()),
            },
        };
        Ok(Self {
            target: TargetPlan::compile(def.declaring()),
            args: ArgumentPlan::compile(def.params()),
            dispatch,
        })
    }

    pub(crate) fn invoke(&self, target: &mut Dynamic, args: &[Dynamic]) -> Result<(), InvokeError> {
        self.target.check(target)?;
        let args = self.args.marshal(args)?;
        match &self.dispatch {
            DispatchPlan::Direct(body) => body.call(target, args),
            DispatchPlan::Virtual { slot, method } => {
                resolve_virtual(*slot, method, target)?.call(target, args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use injector_core::{ClassBuilder, Instance, Object, Param, TypeKind};

    #[derive(Debug, Clone, PartialEq)]
    struct Meter {
        reading: u32,
    }
    injector_core::value_type!(Meter);

    struct Sensor {
        label: String,
    }
    impl Object for Sensor {}

    fn meter_entry() -> injector_core::ClassEntry {
        ClassBuilder::<Meter>::value_type("Meter")
            .constructor(|reading: u32| Meter { reading })
            .property("reading", |m: &mut Meter, reading: u32| m.reading = reading)
            .read_only_property::<bool>("overflowed")
            .method("reset", |m: &mut Meter| m.reading = 0)
            .virtual_method("describe", |m: &Meter| m.reading.to_string())
            .build()
            .unwrap()
    }

    #[test]
    fn constructor_plan_boxes_values() {
        let entry = meter_entry();
        let plan = ConstructorPlan::compile(&entry.constructors()[0]).unwrap();
        let value = plan.invoke(&[Dynamic::from(7u32)]).unwrap();
        assert_eq!(value.unbox::<Meter>().unwrap(), Meter { reading: 7 });
    }

    #[test]
    fn constructor_plan_checks_arity_first() {
        let entry = meter_entry();
        let plan = ConstructorPlan::compile(&entry.constructors()[0]).unwrap();
        assert!(matches!(
            plan.invoke(&[]),
            Err(InvokeError::ArityMismatch {
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn kind_mismatch_rejected() {
        let entry = meter_entry();
        let def = ConstructorDef::new(
            Arc::clone(entry.class()),
            vec![],
            ConstructorBody::new(TypeKind::Reference, |_| {
                Ok(Instance::Object(Box::new(Sensor {
                    label: String::new(),
                })))
            }),
        );
        let err = ConstructorPlan::compile(&def).err().unwrap();
        assert_eq!(err.reason(), UnsupportedReason::KindMismatch);
    }

    #[test]
    fn read_only_property_rejected() {
        let entry = meter_entry();
        let err = PropertyPlan::compile(entry.find_property("overflowed").unwrap())
            .err()
            .unwrap();
        assert_eq!(err.reason(), UnsupportedReason::ReadOnlyProperty);
    }

    #[test]
    fn virtual_on_value_type_rejected() {
        let entry = meter_entry();
        let err = MethodPlan::compile(entry.find_method("describe").unwrap())
            .err()
            .unwrap();
        assert_eq!(err.reason(), UnsupportedReason::VirtualOnValueType);
    }

    #[test]
    fn missing_vtable_slot_rejected() {
        let sensor = ClassBuilder::<Sensor>::reference_type("Sensor")
            .build()
            .unwrap();
        let def = MethodDef::new(
            Arc::clone(sensor.class()),
            "poll",
            vec![],
            None,
            Dispatch::Virtual {
                slot: TypeHash::from_slot("poll", &[]),
            },
            None,
        );
        let err = MethodPlan::compile(&def).err().unwrap();
        assert_eq!(err.reason(), UnsupportedReason::MissingVtableSlot);
    }

    #[test]
    fn direct_method_without_body_rejected() {
        let sensor = ClassBuilder::<Sensor>::reference_type("Sensor")
            .build()
            .unwrap();
        let def = MethodDef::new(
            Arc::clone(sensor.class()),
            "poll",
            vec![String::static_type()],
            None,
            Dispatch::Direct,
            None,
        );
        let err = MethodPlan::compile(&def).err().unwrap();
        assert_eq!(err.reason(), UnsupportedReason::AbstractMethod);
        assert!(err.to_string().contains("Sensor::poll(String)"));
    }

    #[test]
    fn target_plan_follows_class_kind() {
        let meter = meter_entry();
        let sensor = ClassBuilder::<Sensor>::reference_type("Sensor")
            .build()
            .unwrap();
        let object = Dynamic::from(
            sensor
                .instantiate(Sensor {
                    label: String::new(),
                })
                .unwrap(),
        );
        let value = Dynamic::value(Meter { reading: 1 });

        let unbox = TargetPlan::compile(meter.class());
        assert!(matches!(unbox, TargetPlan::Unbox(_)));
        assert!(unbox.check(&value).is_ok());
        assert!(unbox.check(&object).unwrap_err().is_type_mismatch());

        let cast = TargetPlan::compile(sensor.class());
        assert!(matches!(cast, TargetPlan::Cast(_)));
        assert!(cast.check(&object).is_ok());
        assert!(cast.check(&value).unwrap_err().is_type_mismatch());
        assert!(cast.check(&Dynamic::Null).unwrap_err().to_string().contains("got null"));
    }

    #[test]
    fn method_plan_marshals_before_running() {
        let sensor = ClassBuilder::<Sensor>::reference_type("Sensor")
            .method("relabel", |s: &mut Sensor, label: String, _: u8| s.label = label)
            .build()
            .unwrap();
        let object = sensor
            .instantiate(Sensor {
                label: "a".to_string(),
            })
            .unwrap();
        let plan = MethodPlan::compile(sensor.find_method("relabel").unwrap()).unwrap();
        let mut target = Dynamic::from(object.clone());

        let err = plan
            .invoke(&mut target, &[Dynamic::from("b"), Dynamic::from("oops")])
            .unwrap_err();
        assert!(err.to_string().contains("argument 1"));
        assert_eq!(object.downcast::<Sensor>().unwrap().read().label, "a");

        plan.invoke(&mut target, &[Dynamic::from("b"), Dynamic::from(1u8)])
            .unwrap();
        assert_eq!(object.downcast::<Sensor>().unwrap().read().label, "b");
    }
}
