//! This module contains internal macros used to describe registers.

/// Defines the shift, in-place mask, and a value helper for a multi-bit register field.
///
/// Example: `reg_field!(u16, RWS, 8, 4);` produces `RWS_SHIFT`, `RWS_MASK`, and
/// `const fn rws(value: u16) -> u16`, which shifts and masks `value` into place.
macro_rules! reg_field {
    ($t:ty, $name:ident, $shift:expr, $width:expr) => {
        paste::paste! {
            pub const [<$name _SHIFT>]: u32 = $shift;
            pub const [<$name _MASK>]: $t = (((1u32 << $width) - 1) << $shift) as $t;

            #[inline(always)]
            pub const fn [<$name:lower>](value: $t) -> $t {
                (value << $shift) & [<$name _MASK>]
            }
        }
    };
}

/// Defines single-bit flags of a register, by bit position.
///
/// Example: `reg_bits!(u32, ENABLE = 1, XTALEN = 2);`
macro_rules! reg_bits {
    ($t:ty, $($name:ident = $bit:expr),+ $(,)?) => {
        $(
            pub const $name: $t = 1 << $bit;
        )+
    };
}
