//! Shared fixtures for the integration tests.
//!
//! A small class zoo: a value type (`Point`), a reference hierarchy
//! (`Animal` with `Dog` and `Cat`), an abstract `Shape` and a plain
//! `Counter` used by the concurrency tests.

#![allow(dead_code)]

use injector::{ClassBuilder, ClassEntry, Object, Ref, value_type};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}
value_type!(Point);

pub fn point_class() -> ClassEntry {
    ClassBuilder::<Point>::value_type("Point")
        .constructor(|x: i32, y: i32| Point { x, y })
        .constructor(|| Point { x: 0, y: 0 })
        .property("x", |p: &mut Point, x: i32| p.x = x)
        .property("y", |p: &mut Point, y: i32| p.y = y)
        .read_only_property::<f64>("length")
        .method("translate", |p: &mut Point, dx: i32, dy: i32| {
            p.x += dx;
            p.y += dy;
        })
        .build()
        .expect("Point registers")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PetError {
    #[error("pet name must not be empty")]
    EmptyName,
    #[error("{0} tricks is more than any dog can learn")]
    TooManyTricks(u32),
}

pub struct Animal {
    pub name: String,
    pub said: Vec<String>,
    pub described_as: &'static str,
    pub friend: Option<String>,
}

impl Animal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            said: Vec::new(),
            described_as: "",
            friend: None,
        }
    }
}

impl Object for Animal {}

pub struct Dog {
    pub animal: Animal,
    pub tricks: u32,
}

impl Object for Dog {
    fn base(&self) -> Option<&dyn Object> {
        Some(&self.animal)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.animal)
    }
}

pub struct Cat {
    pub animal: Animal,
}

impl Object for Cat {
    fn base(&self) -> Option<&dyn Object> {
        Some(&self.animal)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.animal)
    }
}

pub struct Zoo {
    pub animal: ClassEntry,
    pub dog: ClassEntry,
    pub cat: ClassEntry,
}

pub fn zoo() -> Zoo {
    let animal = ClassBuilder::<Animal>::reference_type("Animal")
        .constructor(|name: String| Animal::new(name))
        .property("name", |a: &mut Animal, name: String| a.name = name)
        .read_only_property::<u32>("legs")
        .virtual_method("speak", |a: &mut Animal, times: u32| {
            for _ in 0..times {
                a.said.push("...".to_string());
            }
        })
        .method("describe", |a: &mut Animal| a.described_as = "animal")
        .method("befriend", |a: &mut Animal, friend: Option<Ref<Animal>>| {
            a.friend = friend.map(|f| f.read().name.clone());
        })
        .build()
        .expect("Animal registers");

    let dog = ClassBuilder::<Dog>::reference_type("Dog")
        .extends(&animal)
        .try_constructor(|name: String, tricks: u32| {
            if name.is_empty() {
                return Err(PetError::EmptyName);
            }
            if tricks > 100 {
                return Err(PetError::TooManyTricks(tricks));
            }
            Ok(Dog {
                animal: Animal::new(name),
                tricks,
            })
        })
        .try_property("tricks", |d: &mut Dog, tricks: u32| {
            if tricks > 100 {
                return Err(PetError::TooManyTricks(tricks));
            }
            d.tricks = tricks;
            Ok(())
        })
        .virtual_method("speak", |d: &mut Dog, times: u32| {
            for _ in 0..times {
                d.animal.said.push("woof".to_string());
            }
        })
        .method("describe", |d: &mut Dog| d.animal.described_as = "dog")
        .build()
        .expect("Dog registers");

    let cat = ClassBuilder::<Cat>::reference_type("Cat")
        .extends(&animal)
        .constructor(|name: String| Cat {
            animal: Animal::new(name),
        })
        .build()
        .expect("Cat registers");

    Zoo { animal, dog, cat }
}

pub fn dog(name: &str, tricks: u32) -> Dog {
    Dog {
        animal: Animal::new(name),
        tricks,
    }
}

pub struct Shape {
    pub sides: u32,
}

impl Object for Shape {}

pub fn shape_class() -> ClassEntry {
    ClassBuilder::<Shape>::reference_type("Shape")
        .abstract_class()
        .constructor(|sides: u32| Shape { sides })
        .abstract_method::<(u32,), ()>("scale")
        .build()
        .expect("Shape registers")
}

pub struct Counter {
    pub hits: u64,
    pub label: String,
}

impl Object for Counter {}

pub fn counter_class() -> ClassEntry {
    ClassBuilder::<Counter>::reference_type("Counter")
        .constructor(|label: String| Counter { hits: 0, label })
        .property("label", |c: &mut Counter, label: String| c.label = label)
        .virtual_method("hit", |c: &mut Counter, by: u64| c.hits += by)
        .build()
        .expect("Counter registers")
}
