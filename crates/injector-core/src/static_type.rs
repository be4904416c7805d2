//! Static types of parameters and properties.

use std::any::TypeId;
use std::fmt;

use crate::object::Object;
use crate::type_hash::TypeHash;
use crate::type_kind::TypeKind;

/// The exact static type a parameter or property expects.
///
/// Marshaling converts a [`Dynamic`](crate::Dynamic) into this type before a
/// member body runs: value types by exact unboxing, reference types by a
/// base-chain aware downcast.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct StaticType {
    name: &'static str,
    type_hash: TypeHash,
    type_id: TypeId,
    kind: TypeKind,
    nullable: bool,
}

impl StaticType {
    /// A value type with the given display name.
    pub fn value<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            type_hash: TypeHash::from_name(name),
            type_id: TypeId::of::<T>(),
            kind: TypeKind::Value,
            nullable: false,
        }
    }

    /// A reference to `T` or a class derived from it.
    pub fn reference<T: Object>(nullable: bool) -> Self {
        let name = short_type_name::<T>();
        let type_hash = TypeHash::from_name(std::any::type_name::<T>());
        Self {
            name,
            type_hash: if nullable {
                type_hash.nullable()
            } else {
                type_hash
            },
            type_id: TypeId::of::<T>(),
            kind: TypeKind::Reference,
            nullable,
        }
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity hash, used for member and slot signatures.
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Rust type identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Value or reference.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether `Dynamic::Null` converts to this type.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl fmt::Debug for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StaticType({self})")
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

/// Rust type name without its module path.
///
/// Generic names are returned whole since their arguments carry paths too.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}
