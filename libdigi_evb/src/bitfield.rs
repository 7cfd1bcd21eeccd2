//! Bit field tools for digitizer register words
//!
//! Registers are fixed-width unsigned integers. A field is an inclusive range of bits
//! `[start_bit, end_bit]`, counted from 0 at the least significant bit.
//!
//! None of these functions check their bit ranges at runtime. Callers must guarantee
//! `start_bit <= end_bit < T::BITS`; violating that is a bug in the caller and is only
//! caught by debug assertions.
use num_traits::{PrimInt, Unsigned};

/// Number of bits in the register type
#[inline]
fn bit_width<T: PrimInt + Unsigned>() -> u32 {
    T::zero().count_zeros()
}

/// Mask with every bit in `[start_bit, end_bit]` set
#[inline]
pub fn field_mask<T: PrimInt + Unsigned>(start_bit: u32, end_bit: u32) -> T {
    debug_assert!(start_bit <= end_bit, "bit field start after end");
    debug_assert!(end_bit < bit_width::<T>(), "bit field outside register");
    let width = end_bit - start_bit + 1;
    let ones = if width == bit_width::<T>() {
        !T::zero()
    } else {
        (T::one() << width as usize) - T::one()
    };
    ones << start_bit as usize
}

/// Replace the field `[start_bit, end_bit]` of `register` with the low bits of `value`.
///
/// Bits of `value` that do not fit the field are dropped; bits of `register` outside the
/// field are kept.
#[inline]
pub fn set_bits<T: PrimInt + Unsigned>(register: T, start_bit: u32, end_bit: u32, value: T) -> T {
    let mask = field_mask::<T>(start_bit, end_bit);
    (register & !mask) | ((value << start_bit as usize) & mask)
}

/// Read the field `[start_bit, end_bit]` of `register`, shifted down to bit 0
#[inline]
pub fn get_bits<T: PrimInt + Unsigned>(register: T, start_bit: u32, end_bit: u32) -> T {
    (register & field_mask::<T>(start_bit, end_bit)) >> start_bit as usize
}

/// A named location of a field inside a register word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterField {
    pub start_bit: u32,
    pub end_bit: u32,
}

impl RegisterField {
    pub const fn new(start_bit: u32, end_bit: u32) -> Self {
        RegisterField { start_bit, end_bit }
    }

    /// Single-bit field
    pub const fn bit(bit: u32) -> Self {
        RegisterField {
            start_bit: bit,
            end_bit: bit,
        }
    }

    pub fn width(&self) -> u32 {
        self.end_bit - self.start_bit + 1
    }

    pub fn read<T: PrimInt + Unsigned>(&self, register: T) -> T {
        get_bits(register, self.start_bit, self.end_bit)
    }

    pub fn write<T: PrimInt + Unsigned>(&self, register: T, value: T) -> T {
        set_bits(register, self.start_bit, self.end_bit, value)
    }
}
