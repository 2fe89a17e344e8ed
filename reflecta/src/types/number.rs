use core::mem::size_of;

use crate::{NumberFlags, Reflect};

/// A number widened to one of three representations, used when converting
/// between number descriptors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Signed integers.
    Signed(i64),
    /// Unsigned integers and `bool`.
    Unsigned(u64),
    /// `f32` and `f64`.
    Float(f64),
}

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;

/// Primitive numbers: integers, floats and `bool`.
///
/// Sealed; every implementor describes itself as [`crate::TypeKind::Number`].
pub trait Numeric: Reflect + Copy + Send + Sync + Sealed {
    /// Classification flags.
    const FLAGS: NumberFlags;

    /// Widens `self`.
    fn to_number(self) -> Number;

    /// Converts back, with `as` semantics.
    fn from_number(number: Number) -> Self;
}

/// Number descriptor payload.
pub struct NumberDef {
    flags: NumberFlags,
    size: usize,
    read: unsafe fn(*const u8) -> Number,
    write: unsafe fn(Number, *mut u8),
}

unsafe fn read_number<N: Numeric>(ptr: *const u8) -> Number {
    unsafe { ptr.cast::<N>().read() }.to_number()
}

unsafe fn write_number<N: Numeric>(number: Number, ptr: *mut u8) {
    unsafe { ptr.cast::<N>().write(N::from_number(number)) }
}

impl NumberDef {
    pub(crate) fn of<N: Numeric>() -> Self {
        NumberDef {
            flags: N::FLAGS,
            size: size_of::<N>(),
            read: read_number::<N>,
            write: write_number::<N>,
        }
    }
}

super::type_view! {
    /// Descriptor of an integer, float or `bool`.
    NumberType, Number, NumberDef, as_number, is_number
}

impl NumberType {
    /// Classification flags.
    pub fn flags(self) -> NumberFlags {
        self.def.flags
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        self.def.size
    }

    /// Signed integers and floats.
    pub fn is_signed(self) -> bool {
        self.def.flags.contains(NumberFlags::IS_SIGNED)
    }

    /// Unsigned integers and `bool`.
    pub fn is_unsigned(self) -> bool {
        self.def.flags.contains(NumberFlags::IS_UNSIGNED)
    }

    /// Integers and `bool`.
    pub fn is_integral(self) -> bool {
        self.def.flags.contains(NumberFlags::IS_INTEGRAL)
    }

    /// `f32` and `f64`.
    pub fn is_floating_point(self) -> bool {
        self.def.flags.contains(NumberFlags::IS_FLOATING_POINT)
    }

    /// `bool`.
    pub fn is_boolean(self) -> bool {
        self.def.flags.contains(NumberFlags::IS_BOOLEAN)
    }

    /// Returns `true` if every value of `self` converts to `to` without
    /// changing its value or precision class.
    ///
    /// `bool` only converts to itself. Signed never converts to unsigned,
    /// floats never convert to integers, and integers convert to floats
    /// only when the float's mantissa holds all of their bits.
    pub fn can_widen_to(self, to: NumberType) -> bool {
        if self == to {
            return true;
        }
        if self.is_boolean() || to.is_boolean() {
            return false;
        }

        let (from_size, to_size) = (self.size(), to.size());
        match (self.is_floating_point(), to.is_floating_point()) {
            (true, true) => to_size > from_size,
            (true, false) => false,
            (false, true) => {
                let mantissa_bits = if to_size == 4 { 24 } else { 53 };
                let value_bits = if self.is_signed() {
                    from_size * 8 - 1
                } else {
                    from_size * 8
                };
                value_bits <= mantissa_bits
            }
            (false, false) => match (self.is_signed(), to.is_signed()) {
                (true, true) | (false, false) => to_size >= from_size,
                (false, true) => to_size > from_size,
                (true, false) => false,
            },
        }
    }

    /// Reads the number stored at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized value of the described type.
    pub(crate) unsafe fn read(self, ptr: *const u8) -> Number {
        unsafe { (self.def.read)(ptr) }
    }

    /// Writes `number` to `ptr`, converting it to the described type.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for writes of the described type.
    pub(crate) unsafe fn write(self, number: Number, ptr: *mut u8) {
        unsafe { (self.def.write)(number, ptr) }
    }
}
