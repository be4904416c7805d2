//! Injector factories.
//!
//! [`InjectorFactory`] is the seam between the synthesizer and whatever
//! decides which members to inject. [`DynamicInjectorFactory`] compiles each
//! descriptor into a marshal plan once; invoking the injector then runs the
//! plan without consulting the descriptor again.

use tracing::debug;

use injector_core::{ConstructorDef, Dynamic, MethodDef, PropertyDef, SynthesisError};

use crate::injector::{ConstructorInjector, MethodInjector, PropertyInjector};
use crate::naming::next_name;
use crate::options::InjectorOptions;
use crate::plan::{ConstructorPlan, MethodPlan, PropertyPlan};

/// Creates injectors from member descriptors.
///
/// Each call produces a new, independent injector. Factories neither cache
/// nor deduplicate; callers that want reuse keep the injector.
pub trait InjectorFactory {
    /// Synthesize an injector that runs the constructor described by `def`.
    fn create_constructor_injector(
        &self,
        def: &ConstructorDef,
    ) -> Result<ConstructorInjector, SynthesisError>;

    /// Synthesize an injector that assigns the property described by `def`.
    fn create_property_injector(&self, def: &PropertyDef)
    -> Result<PropertyInjector, SynthesisError>;

    /// Synthesize an injector that calls the method described by `def`.
    fn create_method_injector(&self, def: &MethodDef) -> Result<MethodInjector, SynthesisError>;
}

pub(crate) fn log_rejected(kind: &str, member: &str, err: &SynthesisError) {
    debug!(kind, member, reason = %err.reason(), "rejected injector synthesis");
}

/// Factory that compiles a marshal plan per descriptor.
///
/// # Example
///
/// ```
/// use injector::{ClassBuilder, DynamicInjectorFactory, Dynamic, InjectorFactory, value_type};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point { x: i32, y: i32 }
/// value_type!(Point);
///
/// let point = ClassBuilder::<Point>::value_type("Point")
///     .constructor(|x: i32, y: i32| Point { x, y })
///     .build()?;
///
/// let factory = DynamicInjectorFactory::new();
/// let ctor = factory.create_constructor_injector(&point.constructors()[0])?;
/// let value = ctor.invoke(&[Dynamic::from(1i32), Dynamic::from(2i32)])?;
/// assert_eq!(value.unbox::<Point>()?, Point { x: 1, y: 2 });
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DynamicInjectorFactory {
    options: InjectorOptions,
}

impl DynamicInjectorFactory {
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

impl InjectorFactory for DynamicInjectorFactory {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_constructor_injector(
        &self,
        def: &ConstructorDef,
    ) -> Result<ConstructorInjector, SynthesisError> {
        let plan = ConstructorPlan::compile(def)
            .inspect_err(|err| log_rejected("constructor", &def.display_name(), err))?;
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            class = def.declaring().name(),
            member = %def.display_name(),
            hash = %def.hash(),
            arity = def.params().len(),
            "synthesized constructor injector"
        );
        Ok(ConstructorInjector::new(name, move |args: &[Dynamic]| {
            plan.invoke(args)
        }))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_property_injector(
        &self,
        def: &PropertyDef,
    ) -> Result<PropertyInjector, SynthesisError> {
        let plan = PropertyPlan::compile(def)
            .inspect_err(|err| log_rejected("property", &def.display_name(), err))?;
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            class = def.declaring().name(),
            member = %def.display_name(),
            hash = %def.hash(),
            property_type = %def.property_type(),
            "synthesized property injector"
        );
        Ok(PropertyInjector::new(
            name,
            move |target: &mut Dynamic, value: &Dynamic| plan.invoke(target, value),
        ))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn create_method_injector(&self, def: &MethodDef) -> Result<MethodInjector, SynthesisError> {
        let plan = MethodPlan::compile(def)
            .inspect_err(|err| log_rejected("method", &def.display_name(), err))?;
        let name = next_name(&self.options);
        debug!(
            injector = %name,
            class = def.declaring().name(),
            member = %def.display_name(),
            hash = %def.hash(),
            arity = def.params().len(),
            returns = def.returns().map_or("()", |r| r.name()),
            dispatch = ?def.dispatch(),
            "synthesized method injector"
        );
        Ok(MethodInjector::new(
            name,
            move |target: &mut Dynamic, args: &[Dynamic]| plan.invoke(target, args),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use injector_core::{ClassBuilder, UnsupportedReason};

    #[derive(Debug, Clone, PartialEq)]
    struct Gauge {
        level: u8,
    }
    injector_core::value_type!(Gauge);

    fn gauge() -> injector_core::ClassEntry {
        ClassBuilder::<Gauge>::value_type("Gauge")
            .constructor(|level: u8| Gauge { level })
            .property("level", |g: &mut Gauge, level: u8| g.level = level)
            .read_only_property::<u8>("max")
            .method("drain", |g: &mut Gauge| g.level = 0)
            .build()
            .unwrap()
    }

    #[test]
    fn names_follow_options() {
        let factory = DynamicInjectorFactory::with_options(
            InjectorOptions::default().with_name_prefix("Gauge"),
        );
        let entry = gauge();
        let a = factory
            .create_constructor_injector(&entry.constructors()[0])
            .unwrap();
        let b = factory
            .create_constructor_injector(&entry.constructors()[0])
            .unwrap();
        assert!(a.name().starts_with("Gauge"));
        assert_ne!(a.name(), b.name());
    }

    #[test]
    fn property_injector_updates_boxed_target() {
        let entry = gauge();
        let injector = DynamicInjectorFactory::new()
            .create_property_injector(entry.find_property("level").unwrap())
            .unwrap();
        let mut target = Dynamic::value(Gauge { level: 1 });
        injector.invoke(&mut target, &Dynamic::from(9u8)).unwrap();
        assert_eq!(target.unbox::<Gauge>().unwrap(), Gauge { level: 9 });
    }

    #[test]
    fn rejection_is_reported() {
        let entry = gauge();
        let err = DynamicInjectorFactory::new()
            .create_property_injector(entry.find_property("max").unwrap())
            .unwrap_err();
        assert_eq!(err.reason(), UnsupportedReason::ReadOnlyProperty);
    }

    #[test]
    fn method_injector_runs() {
        let entry = gauge();
        let injector = DynamicInjectorFactory::new()
            .create_method_injector(entry.find_method("drain").unwrap())
            .unwrap();
        let mut target = Dynamic::value(Gauge { level: 5 });
        injector.invoke(&mut target, &[]).unwrap();
        assert_eq!(target.unbox::<Gauge>().unwrap().level, 0);
    }
}
