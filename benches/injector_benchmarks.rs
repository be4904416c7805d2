//! Invocation benchmarks.
//!
//! Each group compares three call paths for the same member:
//! - `direct`: plain Rust call on the concrete type
//! - `dynamic`: injector from `DynamicInjectorFactory` (plan compiled once)
//! - `reflection`: injector from `ReflectionInjectorFactory` (plan derived per call)
//!
//! ```bash
//! cargo bench --bench injector_benchmarks
//! ```

use criterion::{Criterion, criterion_group, criterion_main};
use injector::{
    ClassBuilder, ClassEntry, Dynamic, DynamicInjectorFactory, InjectorFactory, Object,
    ReflectionInjectorFactory, value_type,
};
use std::hint::black_box;

#[derive(Debug, Clone, PartialEq)]
struct Vec3 {
    x: f64,
    y: f64,
    z: f64,
}
value_type!(Vec3);

struct Body {
    position: Vec3,
    impulses: u64,
}

impl Object for Body {}

struct Rocket {
    body: Body,
    fuel: f64,
}

impl Object for Rocket {
    fn base(&self) -> Option<&dyn Object> {
        Some(&self.body)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.body)
    }
}

fn vec3_class() -> ClassEntry {
    ClassBuilder::<Vec3>::value_type("Vec3")
        .constructor(|x: f64, y: f64, z: f64| Vec3 { x, y, z })
        .build()
        .expect("Vec3 registers")
}

fn classes() -> (ClassEntry, ClassEntry) {
    let body = ClassBuilder::<Body>::reference_type("Body")
        .property("position", |b: &mut Body, position: Vec3| b.position = position)
        .virtual_method("push", |b: &mut Body, force: f64| {
            b.position.x += force;
            b.impulses += 1;
        })
        .build()
        .expect("Body registers");
    let rocket = ClassBuilder::<Rocket>::reference_type("Rocket")
        .extends(&body)
        .virtual_method("push", |r: &mut Rocket, force: f64| {
            r.fuel -= force;
            r.body.position.x += force;
            r.body.impulses += 1;
        })
        .build()
        .expect("Rocket registers");
    (body, rocket)
}

fn rocket() -> Rocket {
    Rocket {
        body: Body {
            position: Vec3 {
                x: 0.0,
                y: 0.0,
                z: 0.0,
            },
            impulses: 0,
        },
        fuel: 1.0e9,
    }
}

fn bench_constructors(c: &mut Criterion) {
    let vec3 = vec3_class();
    let def = &vec3.constructors()[0];
    let dynamic = DynamicInjectorFactory::new()
        .create_constructor_injector(def)
        .expect("dynamic constructor");
    let reflection = ReflectionInjectorFactory::new()
        .create_constructor_injector(def)
        .expect("reflective constructor");
    let args = [Dynamic::from(1.0f64), Dynamic::from(2.0f64), Dynamic::from(3.0f64)];

    let mut group = c.benchmark_group("constructor");
    group.bench_function("direct", |b| {
        b.iter(|| {
            black_box(Vec3 {
                x: black_box(1.0),
                y: black_box(2.0),
                z: black_box(3.0),
            })
        })
    });
    group.bench_function("dynamic", |b| {
        b.iter(|| dynamic.invoke(black_box(&args)).expect("construct"))
    });
    group.bench_function("reflection", |b| {
        b.iter(|| reflection.invoke(black_box(&args)).expect("construct"))
    });
    group.finish();
}

fn bench_virtual_methods(c: &mut Criterion) {
    let (body, rocket_class) = classes();
    let def = body.find_method("push").expect("push");
    let dynamic = DynamicInjectorFactory::new()
        .create_method_injector(def)
        .expect("dynamic method");
    let reflection = ReflectionInjectorFactory::new()
        .create_method_injector(def)
        .expect("reflective method");
    let args = [Dynamic::from(0.5f64)];

    let mut group = c.benchmark_group("virtual_method");
    group.bench_function("direct", |b| {
        let mut target = rocket();
        b.iter(|| {
            target.fuel -= black_box(0.5);
            target.body.position.x += 0.5;
            target.body.impulses += 1;
        })
    });
    group.bench_function("dynamic", |b| {
        let mut target = Dynamic::from(rocket_class.instantiate(rocket()).expect("rocket"));
        b.iter(|| dynamic.invoke(&mut target, black_box(&args)).expect("push"))
    });
    group.bench_function("reflection", |b| {
        let mut target = Dynamic::from(rocket_class.instantiate(rocket()).expect("rocket"));
        b.iter(|| reflection.invoke(&mut target, black_box(&args)).expect("push"))
    });
    group.finish();
}

fn bench_properties(c: &mut Criterion) {
    let (body, rocket_class) = classes();
    let def = body.find_property("position").expect("position");
    let dynamic = DynamicInjectorFactory::new()
        .create_property_injector(def)
        .expect("dynamic property");
    let reflection = ReflectionInjectorFactory::new()
        .create_property_injector(def)
        .expect("reflective property");
    let value = Dynamic::value(Vec3 {
        x: 1.0,
        y: 2.0,
        z: 3.0,
    });

    let mut group = c.benchmark_group("property");
    group.bench_function("dynamic", |b| {
        let mut target = Dynamic::from(rocket_class.instantiate(rocket()).expect("rocket"));
        b.iter(|| dynamic.invoke(&mut target, black_box(&value)).expect("set"))
    });
    group.bench_function("reflection", |b| {
        let mut target = Dynamic::from(rocket_class.instantiate(rocket()).expect("rocket"));
        b.iter(|| reflection.invoke(&mut target, black_box(&value)).expect("set"))
    });
    group.finish();
}

fn bench_synthesis(c: &mut Criterion) {
    let (body, _) = classes();
    let def = body.find_method("push").expect("push");
    let factory = DynamicInjectorFactory::new();

    c.bench_function("synthesize_method_injector", |b| {
        b.iter(|| factory.create_method_injector(black_box(def)).expect("synthesize"))
    });
}

criterion_group!(
    benches,
    bench_constructors,
    bench_virtual_methods,
    bench_properties,
    bench_synthesis
);
criterion_main!(benches);
