//! Type kind and class flags.

use bitflags::bitflags;

/// Type kind determines how a value crosses the generic calling convention.
///
/// Value types are copied into and out of [`Dynamic`](crate::Dynamic)
/// containers; reference types travel as shared [`ObjectRef`](crate::ObjectRef)
/// handles and support single inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Copied on every boxing/unboxing, exact-type conversions only.
    Value,
    /// Shared handle, converts to any of its base classes.
    Reference,
}

impl TypeKind {
    /// Check if this is a value type.
    pub fn is_value(self) -> bool {
        matches!(self, TypeKind::Value)
    }

    /// Check if this is a reference type.
    pub fn is_reference(self) -> bool {
        matches!(self, TypeKind::Reference)
    }
}

bitflags! {
    /// Modifiers on a registered class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u8 {
        /// Cannot be instantiated; may leave virtual slots unimplemented.
        const ABSTRACT = 1 << 0;
        /// Cannot be used as a base class.
        const SEALED = 1 << 1;
    }
}
