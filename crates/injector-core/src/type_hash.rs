//! Deterministic hash-based identity for types and members.
//!
//! [`TypeHash`] is a 64-bit hash computed from names and signatures. It
//! identifies classes, constructors, properties, methods and vtable slots
//! without a registration-order dependent counter:
//!
//! - Same name = same hash (a class can be referenced before it is built)
//! - Parameter order matters for member hashes
//! - Vtable slots leave out the owner, so an override in a derived class
//!   lands on the same slot as the base declaration
//!
//! # Examples
//!
//! ```
//! use injector_core::TypeHash;
//!
//! let int_hash = TypeHash::from_name("i32");
//! assert_eq!(int_hash, TypeHash::from_name("i32"));
//!
//! let a = TypeHash::from_slot("speak", &[int_hash]);
//! let b = TypeHash::from_slot("speak", &[TypeHash::from_name("String")]);
//! assert_ne!(a, b);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Different entity kinds never share a hash even when they share a name.
pub mod hash_constants {
    /// Separator constant used when folding parameters into a hash
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for vtable slot hashes (owner independent)
    pub const SLOT: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for instance method hashes
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for property hashes
    pub const PROPERTY: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for constructor hashes
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Marker folded into a type hash to give its nullable form
    pub const NULLABLE: u64 = 0x6c8e9cf570932bd5;

    /// Parameter position mixing constants.
    /// Each parameter position gets a unique constant so parameter order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying a type or member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// The nullable form of this type.
    ///
    /// `Dog` and `Dog?` differ, so signatures that only differ in
    /// nullability get distinct slots.
    #[inline]
    pub const fn nullable(self) -> Self {
        TypeHash(self.0 ^ hash_constants::NULLABLE)
    }

    /// Create a vtable slot hash from a method name and its parameter types.
    ///
    /// The owner is not mixed in, so `Dog::speak(i32)` and
    /// `Animal::speak(i32)` share a slot.
    #[inline]
    pub fn from_slot(name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::SLOT ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Create a method hash from owner type, method name and parameter types.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, param_hashes: &[TypeHash]) -> Self {
        let seed = hash_constants::METHOD ^ owner.0 ^ xxh64(name.as_bytes(), 0);
        TypeHash(mix_params(seed, param_hashes))
    }

    /// Create a constructor hash from owner type and parameter types.
    ///
    /// Constructors don't have a name, so they're identified by owner + params.
    #[inline]
    pub fn from_constructor(owner: TypeHash, param_hashes: &[TypeHash]) -> Self {
        TypeHash(mix_params(hash_constants::CONSTRUCTOR ^ owner.0, param_hashes))
    }

    /// Create a property hash from owner type and property name.
    #[inline]
    pub fn from_property(owner: TypeHash, name: &str) -> Self {
        TypeHash(hash_constants::PROPERTY ^ owner.0 ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

// Order-sensitive fold of the parameter hashes.
fn mix_params(seed: u64, param_hashes: &[TypeHash]) -> u64 {
    let mut hash = seed;
    for (i, param) in param_hashes.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        hash = hash.wrapping_mul(hash_constants::SEP).wrapping_add(marker ^ param.0);
    }
    hash
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
