//! Cast plans.
//!
//! Whether a value or an instance of one type can be used as another is
//! decided once, from descriptors alone, and recorded as a plan. The
//! type-only compatibility checks and the live casts both go through the
//! same planning functions, so a check that passes always leads to a cast
//! that succeeds.

use core::mem::MaybeUninit;

use crate::{AnyType, ClassType, Error, NumberType, Reflect, Result, UpcastPath};

/// How to turn a value of one type into a value of another.
pub(crate) enum CastPlan {
    /// Same type: copy.
    Exact,
    /// Number to a wider number.
    Widen { from: NumberType, to: NumberType },
    /// Reference to its referent (or a base of it): copy out the target.
    Deref(UpcastPath),
    /// Pointer to a pointer with the same or fewer permissions, possibly to a
    /// base class.
    Pointer { path: UpcastPath, exclusive: bool },
    /// Derived class to base class: copy the base part.
    Upcast(UpcastPath),
    /// Value (or a class deriving from it) to a shared reference parameter:
    /// the reference borrows the argument for the duration of the call.
    Bind(UpcastPath),
}

/// Upcast path between two descriptors when both are classes related by
/// inheritance (or equal).
fn class_path(from: AnyType, to: AnyType) -> Option<UpcastPath> {
    if from == to {
        return Some(UpcastPath::new());
    }
    let (from, to): (ClassType, ClassType) = (from.as_class()?, to.as_class()?);
    from.upcast_path(to)
}

/// The thin-pointer target of a pointer or reference descriptor, with its
/// readonly flag. Detached references are not followed.
fn pointee(ty: AnyType) -> Option<(AnyType, bool)> {
    if let Some(pointer) = ty.as_pointer() {
        return Some((pointer.data_type(), pointer.is_readonly()));
    }
    if let Some(reference) = ty.as_reference() {
        if reference.is_detached() {
            return None;
        }
        return Some((reference.data_type(), reference.is_readonly()));
    }
    None
}

/// Plans the conversion of a value of type `from` into a value of type `to`.
pub(crate) fn plan_value_cast(from: AnyType, to: AnyType) -> Option<CastPlan> {
    if from == to {
        return Some(CastPlan::Exact);
    }

    if let (Some(from), Some(to)) = (from.as_number(), to.as_number()) {
        return from.can_widen_to(to).then_some(CastPlan::Widen { from, to });
    }

    if let (Some(from_ptr), Some(to_ptr)) = (from.as_pointer(), to.as_pointer()) {
        if from_ptr.is_readonly() && !to_ptr.is_readonly() {
            return None;
        }
        let path = class_path(from_ptr.data_type(), to_ptr.data_type())?;
        return Some(CastPlan::Pointer {
            path,
            exclusive: !to_ptr.is_readonly(),
        });
    }

    if let Some(to_ref) = to.as_reference() {
        if to_ref.is_detached() || !to_ref.is_readonly() || from.is_pointer() {
            return None;
        }
        return match from.as_reference() {
            Some(from_ref) if from_ref.is_detached() => None,
            Some(from_ref) => Some(CastPlan::Pointer {
                path: class_path(from_ref.data_type(), to_ref.data_type())?,
                exclusive: false,
            }),
            None => class_path(from, to_ref.data_type()).map(CastPlan::Bind),
        };
    }

    if let Some(reference) = from.as_reference() {
        if reference.is_detached() {
            return None;
        }
        return class_path(reference.data_type(), to).map(CastPlan::Deref);
    }

    class_path(from, to).map(CastPlan::Upcast)
}

/// Returns `true` if arguments of the `given` types can be passed to
/// parameters of the `params` types.
pub(crate) fn arguments_compatible(given: &[AnyType], params: &[AnyType]) -> bool {
    given.len() == params.len()
        && given
            .iter()
            .zip(params)
            .all(|(&given, &param)| plan_value_cast(given, param).is_some())
}

unsafe fn apply_shared(path: &UpcastPath, mut ptr: *const u8) -> *const u8 {
    for step in path {
        ptr = unsafe { (step.shared)(ptr) };
    }
    ptr
}

unsafe fn apply_exclusive(path: &UpcastPath, mut ptr: *mut u8) -> *mut u8 {
    for step in path {
        ptr = unsafe { (step.exclusive)(ptr) };
    }
    ptr
}

impl CastPlan {
    /// Produces a `T` from the value at `data`.
    ///
    /// # Safety
    ///
    /// `data` must point to a live value of the type the plan was made from,
    /// and `T` must be the type the plan was made for. A [`CastPlan::Bind`]
    /// result borrows `data`: it must not be used once that value is gone.
    pub(crate) unsafe fn execute<T: Reflect + Clone>(&self, data: *const u8) -> T {
        match self {
            CastPlan::Exact => unsafe { (*data.cast::<T>()).clone() },
            CastPlan::Widen { from, to } => {
                let mut slot = MaybeUninit::<T>::uninit();
                unsafe {
                    to.write(from.read(data), slot.as_mut_ptr().cast());
                    slot.assume_init()
                }
            }
            CastPlan::Deref(path) => unsafe {
                let target = data.cast::<*const u8>().read();
                (*apply_shared(path, target).cast::<T>()).clone()
            },
            CastPlan::Pointer { path, exclusive } => {
                let source = unsafe { data.cast::<*mut u8>().read() };
                let target = if source.is_null() || path.is_empty() {
                    source
                } else if *exclusive {
                    unsafe { apply_exclusive(path, source) }
                } else {
                    unsafe { apply_shared(path, source) }.cast_mut()
                };
                let mut slot = MaybeUninit::<T>::uninit();
                unsafe {
                    slot.as_mut_ptr().cast::<*mut u8>().write(target);
                    slot.assume_init()
                }
            }
            CastPlan::Upcast(path) => unsafe { (*apply_shared(path, data).cast::<T>()).clone() },
            CastPlan::Bind(path) => {
                let target = unsafe { apply_shared(path, data) };
                let mut slot = MaybeUninit::<T>::uninit();
                unsafe {
                    slot.as_mut_ptr().cast::<*const u8>().write(target);
                    slot.assume_init()
                }
            }
        }
    }
}

/// How to reach the receiver of a method or member from an instance.
pub(crate) struct InstancePlan {
    /// The instance is a pointer or reference to the object.
    indirect: bool,
    path: UpcastPath,
    exclusive: bool,
}

/// Plans access to an object of type `owner` through an instance of type
/// `from`.
///
/// `const_source` tells whether the instance itself was supplied through a
/// shared path; for pointers and references their own mutability counts
/// instead. `exclusive` requests mutable access.
pub(crate) fn plan_instance_cast(
    from: AnyType,
    const_source: bool,
    owner: AnyType,
    exclusive: bool,
) -> Result<InstancePlan> {
    let (object, readonly, indirect) = match class_path(from, owner) {
        Some(path) => {
            return finish_instance_plan(path, const_source, false, exclusive);
        }
        None => match pointee(from) {
            Some((target, readonly)) => (target, readonly, true),
            None => return Err(Error::InstanceTypeMismatch),
        },
    };

    let path = class_path(object, owner).ok_or(Error::InstanceTypeMismatch)?;
    finish_instance_plan(path, readonly, indirect, exclusive)
}

fn finish_instance_plan(
    path: UpcastPath,
    readonly: bool,
    indirect: bool,
    exclusive: bool,
) -> Result<InstancePlan> {
    if exclusive && readonly {
        return Err(Error::BadConstAccess);
    }
    Ok(InstancePlan {
        indirect,
        path,
        exclusive,
    })
}

impl InstancePlan {
    /// Address of the owner object reached from the instance at `data`.
    ///
    /// Fails with [`Error::BadInstanceCast`] when the instance is a null
    /// pointer.
    ///
    /// # Safety
    ///
    /// `data` must point to a live value of the type the plan was made from.
    /// When the plan grants exclusive access, the caller must hold it.
    pub(crate) unsafe fn object_ptr(&self, data: *mut u8) -> Result<*mut u8> {
        let object = if self.indirect {
            unsafe { data.cast::<*mut u8>().read() }
        } else {
            data
        };
        if object.is_null() {
            return Err(Error::BadInstanceCast);
        }
        Ok(if self.path.is_empty() {
            object
        } else if self.exclusive {
            unsafe { apply_exclusive(&self.path, object) }
        } else {
            unsafe { apply_shared(&self.path, object) }.cast_mut()
        })
    }
}
