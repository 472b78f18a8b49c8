//! Checked `uint256` arithmetic reverting the way Solidity 0.8 does, with a
//! `Panic(uint256)` error.
use alloy_primitives::U256;
use alloy_sol_types::{Panic, SolError};

/// Panic code for arithmetic overflow or underflow.
pub const ARITHMETIC_OVERFLOW: u64 = 0x11;
/// Panic code for division or modulo by zero.
pub const DIVISION_BY_ZERO: u64 = 0x12;
/// Panic code for `.pop()` on an empty array.
pub const EMPTY_ARRAY_POP: u64 = 0x31;
/// Panic code for an out-of-bounds array access.
pub const ARRAY_OUT_OF_BOUNDS: u64 = 0x32;

/// ABI-encoded `Panic(code)` revert data.
#[must_use]
pub fn panic(code: u64) -> Vec<u8> {
    Panic { code: U256::from(code) }.abi_encode()
}

/// Checked operations returning panic revert data on failure.
pub trait CheckedArith: Sized {
    /// `self + rhs`, panicking with [`ARITHMETIC_OVERFLOW`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x11)` revert data on overflow.
    fn add_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>>;

    /// `self - rhs`, panicking with [`ARITHMETIC_OVERFLOW`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x11)` revert data on underflow.
    fn sub_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>>;

    /// `self * rhs`, panicking with [`ARITHMETIC_OVERFLOW`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x11)` revert data on overflow.
    fn mul_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>>;

    /// `self / rhs`, panicking with [`DIVISION_BY_ZERO`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x12)` revert data when `rhs` is zero.
    fn div_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>>;

    /// `self % rhs`, panicking with [`DIVISION_BY_ZERO`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x12)` revert data when `rhs` is zero.
    fn rem_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>>;

    /// `self ** exp`, panicking with [`ARITHMETIC_OVERFLOW`].
    ///
    /// # Errors
    ///
    /// * `Panic(0x11)` revert data on overflow.
    fn pow_or_panic(self, exp: Self) -> Result<Self, Vec<u8>>;
}

impl CheckedArith for U256 {
    fn add_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>> {
        self.checked_add(rhs).ok_or_else(|| panic(ARITHMETIC_OVERFLOW))
    }

    fn sub_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>> {
        self.checked_sub(rhs).ok_or_else(|| panic(ARITHMETIC_OVERFLOW))
    }

    fn mul_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>> {
        self.checked_mul(rhs).ok_or_else(|| panic(ARITHMETIC_OVERFLOW))
    }

    fn div_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>> {
        self.checked_div(rhs).ok_or_else(|| panic(DIVISION_BY_ZERO))
    }

    fn rem_or_panic(self, rhs: Self) -> Result<Self, Vec<u8>> {
        self.checked_rem(rhs).ok_or_else(|| panic(DIVISION_BY_ZERO))
    }

    fn pow_or_panic(self, exp: Self) -> Result<Self, Vec<u8>> {
        self.checked_pow(exp).ok_or_else(|| panic(ARITHMETIC_OVERFLOW))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::uint;

    use super::*;

    fn code(data: &[u8]) -> U256 {
        Panic::abi_decode(data).expect("should be a panic").code
    }

    #[test]
    fn add_overflows_with_panic() {
        let err = U256::MAX.add_or_panic(uint!(1_U256)).unwrap_err();
        assert_eq!(code(&err), U256::from(ARITHMETIC_OVERFLOW));
    }

    #[test]
    fn sub_underflows_with_panic() {
        let err = U256::ZERO.sub_or_panic(uint!(1_U256)).unwrap_err();
        assert_eq!(code(&err), U256::from(ARITHMETIC_OVERFLOW));
    }

    #[test]
    fn division_by_zero_panics() {
        let err = uint!(7_U256).div_or_panic(U256::ZERO).unwrap_err();
        assert_eq!(code(&err), U256::from(DIVISION_BY_ZERO));

        let err = uint!(7_U256).rem_or_panic(U256::ZERO).unwrap_err();
        assert_eq!(code(&err), U256::from(DIVISION_BY_ZERO));
    }

    #[test]
    fn exponentiates() {
        assert_eq!(uint!(2_U256).pow_or_panic(uint!(8_U256)), Ok(uint!(256_U256)));
        assert!(uint!(2_U256).pow_or_panic(uint!(256_U256)).is_err());
    }
}
