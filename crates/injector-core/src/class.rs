//! Runtime class metadata.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::member::MethodBody;
use crate::type_hash::TypeHash;
use crate::type_kind::{ClassFlags, TypeKind};

/// One vtable entry.
#[derive(Clone)]
pub struct VirtualSlot {
    name: String,
    declared_by: String,
    body: Option<MethodBody>,
}

impl VirtualSlot {
    pub(crate) fn new(name: String, declared_by: String, body: Option<MethodBody>) -> Self {
        Self {
            name,
            declared_by,
            body,
        }
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class whose registration last filled this slot.
    pub fn declared_by(&self) -> &str {
        &self.declared_by
    }

    /// Implementation, or `None` while the slot is abstract.
    pub fn body(&self) -> Option<&MethodBody> {
        self.body.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }
}

impl fmt::Debug for VirtualSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualSlot")
            .field("name", &self.name)
            .field("declared_by", &self.declared_by)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}

/// Runtime class metadata.
///
/// Every [`ObjectRef`](crate::ObjectRef) carries the `ClassInfo` of its
/// concrete class. The vtable holds inherited slots with overrides applied,
/// so virtual dispatch is a single lookup.
pub struct ClassInfo {
    name: String,
    type_hash: TypeHash,
    type_id: TypeId,
    kind: TypeKind,
    flags: ClassFlags,
    base: Option<Arc<ClassInfo>>,
    vtable: FxHashMap<TypeHash, VirtualSlot>,
}

impl ClassInfo {
    pub(crate) fn new(
        name: String,
        type_id: TypeId,
        kind: TypeKind,
        flags: ClassFlags,
        base: Option<Arc<ClassInfo>>,
        vtable: FxHashMap<TypeHash, VirtualSlot>,
    ) -> Self {
        Self {
            type_hash: TypeHash::from_name(&name),
            name,
            type_id,
            kind,
            flags,
            base,
            vtable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Rust type identity of instances.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ABSTRACT)
    }

    pub fn is_sealed(&self) -> bool {
        self.flags.contains(ClassFlags::SEALED)
    }

    /// Direct base class.
    pub fn base(&self) -> Option<&Arc<ClassInfo>> {
        self.base.as_ref()
    }

    /// This class followed by its base classes, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &ClassInfo> {
        std::iter::successors(Some(self), |class| class.base.as_deref())
    }

    /// Check if this class is `type_id` or derives from it.
    pub fn derives_from(&self, type_id: TypeId) -> bool {
        self.ancestors().any(|class| class.type_id == type_id)
    }

    /// Look up a vtable slot.
    pub fn resolve(&self, slot: TypeHash) -> Option<&VirtualSlot> {
        self.vtable.get(&slot)
    }

    /// Number of virtual slots, inherited ones included.
    pub fn vtable_len(&self) -> usize {
        self.vtable.len()
    }

    pub(crate) fn vtable(&self) -> &FxHashMap<TypeHash, VirtualSlot> {
        &self.vtable
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("flags", &self.flags)
            .field("base", &self.base.as_ref().map(|b| b.name()))
            .field("vtable_len", &self.vtable.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassBuilder, Object};

    struct Shape;
    impl Object for Shape {}

    struct Circle {
        shape: Shape,
    }
    impl Object for Circle {
        fn base(&self) -> Option<&dyn Object> {
            Some(&self.shape)
        }
        fn base_mut(&mut self) -> Option<&mut dyn Object> {
            Some(&mut self.shape)
        }
    }

    #[test]
    fn ancestry() {
        let shape = ClassBuilder::<Shape>::reference_type("Shape").build().unwrap();
        let circle = ClassBuilder::<Circle>::reference_type("Circle")
            .extends(&shape)
            .build()
            .unwrap();

        let class = circle.class();
        assert!(class.derives_from(TypeId::of::<Circle>()));
        assert!(class.derives_from(TypeId::of::<Shape>()));
        assert!(!shape.class().derives_from(TypeId::of::<Circle>()));

        let names: Vec<_> = class.ancestors().map(ClassInfo::name).collect();
        assert_eq!(names, ["Circle", "Shape"]);
        assert_eq!(class.type_hash(), TypeHash::from_name("Circle"));
    }

    #[test]
    fn flags() {
        let shape = ClassBuilder::<Shape>::reference_type("Shape")
            .abstract_class()
            .build()
            .unwrap();
        assert!(shape.class().is_abstract());
        assert!(!shape.class().is_sealed());
        assert!(shape.class().kind().is_reference());
    }
}
