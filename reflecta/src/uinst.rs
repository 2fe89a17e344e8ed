//! Instance adapters.
//!
//! The receiver of a method or member access. Instances may be supplied
//! directly, through references, through raw pointers, or inside a
//! [`UValue`]. Pointers and references are followed to the object; the
//! object must be the owner type or derive from it.
//!
//! Constness comes from the source: `&T` and `&UValue` are const, `&mut T`,
//! `&mut UValue` and owned values are mutable, and pointers and references
//! carry their own mutability whatever the source.

use crate::cast::plan_instance_cast;
use crate::uarg::Source;
use crate::{AnyType, RefKind, Reflect, Result, TypeRegistry, UValue};

/// Type-only description of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UInstBase {
    ty: Option<AnyType>,
    kind: RefKind,
}

impl UInstBase {
    /// An instance of type `ty` supplied as `kind`.
    pub fn new(ty: AnyType, kind: RefKind) -> Self {
        UInstBase { ty: Some(ty), kind }
    }

    /// Describes an empty [`UValue`].
    pub fn empty() -> Self {
        UInstBase {
            ty: None,
            kind: RefKind::Owned,
        }
    }

    /// The instance's type, `None` for an empty value.
    pub fn get_type(&self) -> Option<AnyType> {
        self.ty
    }

    /// How the instance was supplied.
    pub fn kind(&self) -> RefKind {
        self.kind
    }

    /// Returns `true` if the instance was supplied through a shared path.
    ///
    /// A `*const T` or `&'static T` instance is const even when owned.
    pub fn is_inst_const(&self) -> bool {
        if let Some(ty) = self.ty {
            if let Some(pointer) = ty.as_pointer() {
                return pointer.is_readonly();
            }
            if let Some(reference) = ty.as_reference() {
                return reference.is_readonly();
            }
        }
        self.kind.is_const()
    }

    /// Returns `true` if an object of type `T` can be reached for shared
    /// access.
    pub fn can_cast_to<T: Reflect>(&self, registry: &TypeRegistry) -> bool {
        self.check(registry.resolve::<T>(), false).is_ok()
    }

    /// Returns `true` if an object of type `T` can be reached for mutable
    /// access.
    pub fn can_cast_to_mut<T: Reflect>(&self, registry: &TypeRegistry) -> bool {
        self.check(registry.resolve::<T>(), true).is_ok()
    }

    /// Classifies access to an `owner` object through this instance:
    /// [`crate::Error::InstanceTypeMismatch`] when unrelated,
    /// [`crate::Error::BadConstAccess`] when `exclusive` access is requested
    /// through a const path.
    pub fn check(&self, owner: AnyType, exclusive: bool) -> Result<()> {
        let from = self.ty.ok_or(crate::Error::InstanceTypeMismatch)?;
        plan_instance_cast(from, self.kind.is_const(), owner, exclusive).map(|_| ())
    }
}

/// A live instance.
pub struct UInst<'a> {
    source: Source<'a>,
}

impl<'a> UInst<'a> {
    /// Type-only description.
    pub fn base(&self, registry: &TypeRegistry) -> UInstBase {
        match self.source.get_type(registry) {
            Some(ty) => UInstBase::new(ty, self.source.kind()),
            None => UInstBase::empty(),
        }
    }

    /// Address of the `owner` object this instance leads to.
    ///
    /// The pointer is only valid for writes when `exclusive` is set.
    pub(crate) fn object_ptr(
        &mut self,
        registry: &TypeRegistry,
        owner: AnyType,
        exclusive: bool,
    ) -> Result<*mut u8> {
        let from = self
            .source
            .get_type(registry)
            .ok_or(crate::Error::InstanceTypeMismatch)?;
        let plan = plan_instance_cast(from, self.source.kind().is_const(), owner, exclusive)?;
        let data = if self.source.kind().is_const() {
            self.source.data().cast_mut()
        } else {
            self.source.data_mut()
        };
        unsafe { plan.object_ptr(data) }
    }

    /// Borrows the `T` this instance leads to.
    pub fn cast<T: Reflect>(&mut self, registry: &TypeRegistry) -> Result<&T> {
        let ptr = self.object_ptr(registry, registry.resolve::<T>(), false)?;
        Ok(unsafe { &*ptr.cast::<T>() })
    }

    /// Mutably borrows the `T` this instance leads to.
    pub fn cast_mut<T: Reflect>(&mut self, registry: &TypeRegistry) -> Result<&mut T> {
        let ptr = self.object_ptr(registry, registry.resolve::<T>(), true)?;
        Ok(unsafe { &mut *ptr.cast::<T>() })
    }
}

/// Values that can be used as the receiver of a method or member access.
pub trait IntoUInst<'a> {
    /// Wraps `self`.
    fn into_uinst(self) -> UInst<'a>;
}

impl<'a, T: Reflect> IntoUInst<'a> for &'a T {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::borrowed(self, RefKind::Const),
        }
    }
}

impl<'a, T: Reflect> IntoUInst<'a> for &'a mut T {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::borrowed_mut(self),
        }
    }
}

impl<'a> IntoUInst<'a> for &'a UValue {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::Value(self),
        }
    }
}

impl<'a> IntoUInst<'a> for &'a mut UValue {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::ValueMut(self),
        }
    }
}

impl<'a> IntoUInst<'a> for UValue {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::Owned(self),
        }
    }
}

impl<'a, T: Reflect> IntoUInst<'a> for *const T {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::Owned(UValue::new(self)),
        }
    }
}

impl<'a, T: Reflect> IntoUInst<'a> for *mut T {
    fn into_uinst(self) -> UInst<'a> {
        UInst {
            source: Source::Owned(UValue::new(self)),
        }
    }
}

impl<'a> IntoUInst<'a> for UInst<'a> {
    fn into_uinst(self) -> UInst<'a> {
        self
    }
}

/// Type-only instance descriptions: `&C`, `&mut C`, `*const C`, `*mut C`.
pub trait InstanceType {
    /// The instance as seen by the checks.
    fn base(registry: &TypeRegistry) -> UInstBase;
}

impl<C: Reflect> InstanceType for &C {
    fn base(registry: &TypeRegistry) -> UInstBase {
        UInstBase::new(registry.resolve::<C>(), RefKind::Const)
    }
}

impl<C: Reflect> InstanceType for &mut C {
    fn base(registry: &TypeRegistry) -> UInstBase {
        UInstBase::new(registry.resolve::<C>(), RefKind::Mut)
    }
}

impl<C: Reflect> InstanceType for *const C {
    fn base(registry: &TypeRegistry) -> UInstBase {
        UInstBase::new(registry.resolve::<*const C>(), RefKind::Owned)
    }
}

impl<C: Reflect> InstanceType for *mut C {
    fn base(registry: &TypeRegistry) -> UInstBase {
        UInstBase::new(registry.resolve::<*mut C>(), RefKind::Owned)
    }
}
