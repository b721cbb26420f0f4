//! Stable type identifiers with an explicit base-type chain.
//!
//! Rust has no runtime type hierarchy, so entity and context "inheritance" is
//! declared once, at the type's definition, by pointing a [`TypeKey`] at its
//! base. Hook resolution then answers "is this hook's target assignable from
//! the entry's type?" by walking that chain instead of reflecting at runtime.

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// Upper bound on base-chain walks, guarding against a cyclic declaration.
const MAX_DEPTH: usize = 64;

/// Identifier for an entity, context or hook type.
///
/// Equality and hashing use the [`TypeId`] only; the name and base chain are
/// descriptive.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    base: Option<fn() -> TypeKey>,
}

impl TypeKey {
    /// Key for `T` with no declared base type.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            base: None,
        }
    }

    /// Key for `T` deriving from the type returned by `base`.
    pub fn with_base<T: ?Sized + 'static>(base: fn() -> TypeKey) -> Self {
        Self {
            base: Some(base),
            ..Self::of::<T>()
        }
    }

    /// Root of every entity hierarchy. A hook targeting it sees all entities.
    pub fn any_entity() -> Self {
        Self::of::<dyn crate::Entity>()
    }

    /// Root of every context hierarchy. A hook targeting it sees all contexts.
    pub fn any_context() -> Self {
        Self::of::<dyn crate::DataContext>()
    }

    /// The underlying [`TypeId`].
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(pos) => &self.name[pos + 2..],
            None => self.name,
        }
    }

    /// The declared base type, if any.
    pub fn base(&self) -> Option<TypeKey> {
        self.base.map(|base| base())
    }

    /// Iterates `self` followed by each base type up the chain.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(*self),
            depth: 0,
        }
    }

    /// Returns `true` if `self` is one of the two hierarchy roots.
    pub fn is_root(&self) -> bool {
        self.id == TypeId::of::<dyn crate::Entity>()
            || self.id == TypeId::of::<dyn crate::DataContext>()
    }

    /// Returns `true` if a value of type `other` may be treated as `self`,
    /// i.e. `self` is `other` or one of its bases. The roots accept every
    /// type, declared base chain or not.
    pub fn is_assignable_from(&self, other: TypeKey) -> bool {
        self.is_root() || other.ancestors().any(|ancestor| ancestor.id == self.id)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeKey").field(&self.name).finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Iterator returned by [`TypeKey::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors {
    next: Option<TypeKey>,
    depth: usize,
}

impl Iterator for Ancestors {
    type Item = TypeKey;

    fn next(&mut self) -> Option<TypeKey> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        let current = self.next.take()?;
        self.next = current.base();
        self.depth += 1;
        Some(current)
    }
}
