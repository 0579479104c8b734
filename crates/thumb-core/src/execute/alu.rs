//! 32-bit ALU primitives shared by the micro-op implementations.

use crate::api::ShiftByZeroPolicy;

/// `a + b` with unsigned carry-out and signed overflow.
#[must_use]
pub const fn add_with_flags(a: u32, b: u32) -> (u32, bool, bool) {
    let (result, carry) = a.overflowing_add(b);
    let overflow = ((a ^ result) & (b ^ result) & 0x8000_0000) != 0;
    (result, carry, overflow)
}

/// `a - b` with "no borrow" carry and signed overflow.
#[must_use]
pub const fn sub_with_flags(a: u32, b: u32) -> (u32, bool, bool) {
    let (result, borrow) = a.overflowing_sub(b);
    let overflow = ((a ^ b) & (a ^ result) & 0x8000_0000) != 0;
    (result, !borrow, overflow)
}

/// Logical shift left by `amount` (`0..=31`).
///
/// Returns the result and the carry-out, or `None` when the shift leaves the
/// carry untouched.
#[must_use]
pub const fn shift_left(value: u32, amount: u8) -> (u32, Option<bool>) {
    match amount {
        0 => (value, None),
        1..=31 => {
            let carry = (value >> (32 - amount as u32)) & 1 != 0;
            (value << amount, Some(carry))
        }
        _ => (0, Some(amount == 32 && value & 1 != 0)),
    }
}

/// Logical shift right by `amount` (`0..=31`), with amount 0 resolved by
/// `policy`.
#[must_use]
pub const fn shift_right(value: u32, amount: u8, policy: ShiftByZeroPolicy) -> (u32, Option<bool>) {
    match amount {
        0 => match policy {
            ShiftByZeroPolicy::Legacy => (value, None),
            ShiftByZeroPolicy::Strict32 => (0, Some(value & 0x8000_0000 != 0)),
        },
        1..=31 => {
            let carry = (value >> (amount as u32 - 1)) & 1 != 0;
            (value >> amount, Some(carry))
        }
        _ => (0, Some(amount == 32 && value & 0x8000_0000 != 0)),
    }
}

/// Sign-extends the low `bits` bits of `value` to 32 bits.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub const fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

#[cfg(test)]
mod tests {
    use super::{add_with_flags, shift_left, shift_right, sign_extend, sub_with_flags};
    use crate::api::ShiftByZeroPolicy;

    #[test]
    fn add_reports_unsigned_carry_and_signed_overflow() {
        assert_eq!(add_with_flags(1, 2), (3, false, false));
        assert_eq!(add_with_flags(u32::MAX, 1), (0, true, false));
        assert_eq!(add_with_flags(0x7FFF_FFFF, 1), (0x8000_0000, false, true));
        assert_eq!(add_with_flags(0x8000_0000, 0x8000_0000), (0, true, true));
    }

    #[test]
    fn sub_reports_no_borrow_and_signed_overflow() {
        assert_eq!(sub_with_flags(5, 5), (0, true, false));
        assert_eq!(sub_with_flags(0, 1), (u32::MAX, false, false));
        assert_eq!(sub_with_flags(0x8000_0000, 1), (0x7FFF_FFFF, true, true));
        assert_eq!(sub_with_flags(0x7FFF_FFFF, u32::MAX), (0x8000_0000, false, true));
    }

    #[test]
    fn shift_left_carries_out_last_bit() {
        assert_eq!(shift_left(0x8000_0001, 0), (0x8000_0001, None));
        assert_eq!(shift_left(0x8000_0001, 1), (0x0000_0002, Some(true)));
        assert_eq!(shift_left(0x4000_0000, 2), (0, Some(true)));
        assert_eq!(shift_left(0x0000_0001, 31), (0x8000_0000, Some(false)));
    }

    #[test]
    fn shift_right_carries_out_last_bit() {
        let legacy = ShiftByZeroPolicy::Legacy;
        assert_eq!(shift_right(0x0000_0003, 1, legacy), (1, Some(true)));
        assert_eq!(shift_right(0x8000_0000, 31, legacy), (1, Some(false)));
        assert_eq!(shift_right(0x4000_0000, 31, legacy), (0, Some(true)));
    }

    #[test]
    fn shift_right_by_zero_follows_policy() {
        assert_eq!(
            shift_right(0x8000_0001, 0, ShiftByZeroPolicy::Legacy),
            (0x8000_0001, None)
        );
        assert_eq!(
            shift_right(0x8000_0001, 0, ShiftByZeroPolicy::Strict32),
            (0, Some(true))
        );
        assert_eq!(
            shift_right(0x7FFF_FFFF, 0, ShiftByZeroPolicy::Strict32),
            (0, Some(false))
        );
    }

    #[test]
    fn sign_extension_replicates_top_bit() {
        assert_eq!(sign_extend(0x1FE, 9), 0xFFFF_FFFE);
        assert_eq!(sign_extend(0x0FE, 9), 0x0000_00FE);
        assert_eq!(sign_extend(0xFFE, 12), 0xFFFF_FFFE);
        assert_eq!(sign_extend(0x7FE, 12), 0x0000_07FE);
    }
}
