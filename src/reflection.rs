//! Naive per-call injector factory.
//!
//! [`ReflectionInjectorFactory`] validates a descriptor once, like
//! [`DynamicInjectorFactory`](crate::DynamicInjectorFactory), but keeps the
//! descriptor itself and works out conversions and dispatch again on every
//! call. It serves as the baseline in benchmarks and suits members that are
//! invoked too rarely to be worth compiling.

use tracing::debug;

use injector_core::{
    ArgPosition, ConstructorDef, Dispatch, Dynamic, InvokeError, MethodDef, PropertyDef, Raw,
    SetterBody, StaticType, SynthesisError,
};

use crate::factory::{InjectorFactory, log_rejected};
use crate::injector::{ConstructorInjector, MethodInjector, PropertyInjector};
use crate::marshal::{box_instance, check_arity, check_target, marshal_value, resolve_virtual};
use crate::naming::next_name;
use crate::options::InjectorOptions;
use crate::plan::{validate_constructor, validate_method, validate_property};

/// Factory whose injectors interpret the descriptor on each call.
#[derive(Debug, Clone, Default)]
pub struct ReflectionInjectorFactory {
    options: InjectorOptions,
}

impl ReflectionInjectorFactory {
    /// Create a factory with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with the given options.
    pub fn with_options(options: InjectorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InjectorOptions {
        &self.options
    }
}

fn marshal_args(params: &[StaticType], args: &[Dynamic]) -> Result<Vec<Raw>, InvokeError> {
    check_arity(params.len(), args.len())?;
    let mut raw = Vec::with_capacity(args.len());
    for (index, (ty, arg)) in params.iter().zip(args).enumerate() {
        raw.push(marshal_value(ty, arg, ArgPosition::Argument(index))?);
    }
    Ok(raw)
}

fn construct(def: &ConstructorDef, args: &[Dynamic]) -> Result<Dynamic, InvokeError> {
    let args = marshal_args(def.params(), args)?;
    let instance = def.body().construct(args)?;
    box_instance(def.declaring(), instance)
}

fn assign(
    def: &PropertyDef,
    setter: &SetterBody,
    target: &mut Dynamic,
    value: &Dynamic,
) -> Result<(), InvokeError> {
    check_target(def.declaring(), target)?;
    let value = marshal_value(&def.property_type(), value, ArgPosition::Value)?;
    setter.set(target, value)
}

fn call(def: &MethodDef, target: &mut Dynamic, args: &[Dynamic]) -> Result<(), InvokeError> {
    check_target(def.declaring(), target)?;
    let args = marshal_args(def.params(), args)?;
    let body = match def.dispatch() {
        Dispatch::Virtual { slot } => resolve_virtual(slot, def.name(), target)?,
        Dispatch::Direct => def.body().cloned().ok_or_else(|| InvokeError::AbstractMethod {
            method: def.name().to_string(),
            class: def.declaring().name().to_string(),
        })?,
    };
    body.call(target, args)
}

impl InjectorFactory for ReflectionInjectorFactory {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_constructor_injector(
        &self,
        def: &ConstructorDef,
    ) -> Result<ConstructorInjector, SynthesisError> {
        validate_constructor(def)
            .inspect_err(|err| log_rejected("constructor", &def.display_name(), err))?;
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            member = %def.display_name(),
            hash = %def.hash(),
            "created reflective constructor injector"
        );
        let def = def.clone();
        Ok(ConstructorInjector::new(name, move |args: &[Dynamic]| {
            construct(&def, args)
        }))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_property_injector(
        &self,
        def: &PropertyDef,
    ) -> Result<PropertyInjector, SynthesisError> {
        let setter = validate_property(def)
            .inspect_err(|err| log_rejected("property", &def.display_name(), err))?
            .clone();
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            member = %def.display_name(),
            hash = %def.hash(),
            "created reflective property injector"
        );
        let def = def.clone();
        Ok(PropertyInjector::new(
            name,
            move |target: &mut Dynamic, value: &Dynamic| assign(&def, &setter, target, value),
        ))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_method_injector(&self, def: &MethodDef) -> Result<MethodInjector, SynthesisError> {
        validate_method(def)
            .inspect_err(|err| log_rejected("method", &def.display_name(), err))?;
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            member = %def.display_name(),
            hash = %def.hash(),
            "created reflective method injector"
        );
        let def = def.clone();
        Ok(MethodInjector::new(
            name,
            move |target: &mut Dynamic, args: &[Dynamic]| call(&def, target, args),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use injector_core::{ClassBuilder, Object, UnsupportedReason};

    struct Counter {
        hits: u64,
    }
    impl Object for Counter {}

    fn counter() -> injector_core::ClassEntry {
        ClassBuilder::<Counter>::reference_type("Counter")
            .constructor(|| Counter { hits: 0 })
            .property("hits", |c: &mut Counter, hits: u64| c.hits = hits)
            .read_only_property::<u64>("limit")
            .virtual_method("hit", |c: &mut Counter, by: u64| c.hits += by)
            .build()
            .unwrap()
    }

    #[test]
    fn reflective_round_trip() {
        let entry = counter();
        let factory = ReflectionInjectorFactory::new();

        let ctor = factory
            .create_constructor_injector(&entry.constructors()[0])
            .unwrap();
        let hit = factory
            .create_method_injector(entry.find_method("hit").unwrap())
            .unwrap();
        let hits = factory
            .create_property_injector(entry.find_property("hits").unwrap())
            .unwrap();

        let mut target = ctor.invoke(&[]).unwrap();
        hit.invoke(&mut target, &[Dynamic::from(3u64)]).unwrap();
        hit.invoke(&mut target, &[Dynamic::from(4u64)]).unwrap();
        assert_eq!(target.downcast::<Counter>().unwrap().read().hits, 7);

        hits.invoke(&mut target, &Dynamic::from(1u64)).unwrap();
        assert_eq!(target.downcast::<Counter>().unwrap().read().hits, 1);
    }

    #[test]
    fn reflective_validation_matches() {
        let entry = counter();
        let err = ReflectionInjectorFactory::new()
            .create_property_injector(entry.find_property("limit").unwrap())
            .unwrap_err();
        assert_eq!(err.reason(), UnsupportedReason::ReadOnlyProperty);
    }

    #[test]
    fn reflective_arity_and_types() {
        let entry = counter();
        let factory = ReflectionInjectorFactory::new();
        let hit = factory
            .create_method_injector(entry.find_method("hit").unwrap())
            .unwrap();
        let mut target = factory
            .create_constructor_injector(&entry.constructors()[0])
            .unwrap()
            .invoke(&[])
            .unwrap();

        assert!(matches!(
            hit.invoke(&mut target, &[]),
            Err(InvokeError::ArityMismatch { .. })
        ));
        assert!(
            hit.invoke(&mut target, &[Dynamic::from("3")])
                .unwrap_err()
                .is_type_mismatch()
        );
    }
}
