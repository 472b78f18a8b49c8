//! Elliptic Curve Digital Signature Algorithm (ECDSA) operations.
//!
//! These functions can be used to verify that a message was signed
//! by the holder of the private keys of a given address.
use alloy_primitives::{uint, Address, Signature, B256, U256};
use alloy_sol_types::SolError;
pub use sol::*;

/// Upper range for `s` value from the signature.
pub const SIGNATURE_S_UPPER_BOUND: U256 = uint!(
    0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256
);

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// The signature derives the [`Address::ZERO`].
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ECDSAInvalidSignature();

        /// The signature has an `S` value that is in the upper half order.
        ///
        /// * `s` - Invalid `S` value.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ECDSAInvalidSignatureS(bytes32 s);
    }
}

/// An error that occurred while recovering a signer.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The signature derives the [`Address::ZERO`].
    InvalidSignature(ECDSAInvalidSignature),
    /// The signature has an `S` value that is in the upper half order.
    InvalidSignatureS(ECDSAInvalidSignatureS),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::InvalidSignature(e) => e.abi_encode(),
            Error::InvalidSignatureS(e) => e.abi_encode(),
        }
    }
}

/// Returns the address that signed a hashed message (`hash`).
///
/// # Arguments
///
/// * `hash` - Hash of the message.
/// * `v` - `v` value from the signature, 27 or 28.
/// * `r` - `r` value from the signature.
/// * `s` - `s` value from the signature.
///
/// # Errors
///
/// * [`Error::InvalidSignatureS`] - If the `s` value is greater than
///   [`SIGNATURE_S_UPPER_BOUND`].
/// * [`Error::InvalidSignature`] - If `v` is neither 27 nor 28, or if no
///   address can be recovered.
pub fn recover(hash: B256, v: u8, r: B256, s: B256) -> Result<Address, Error> {
    check_if_malleable(&s)?;

    let y_parity = match v {
        27 => false,
        28 => true,
        _ => return Err(Error::InvalidSignature(ECDSAInvalidSignature {})),
    };
    let signature =
        Signature::new(U256::from_be_bytes(r.0), U256::from_be_bytes(s.0), y_parity);
    match signature.recover_address_from_prehash(&hash) {
        Ok(signer) if !signer.is_zero() => Ok(signer),
        _ => Err(Error::InvalidSignature(ECDSAInvalidSignature {})),
    }
}

/// Rejects signatures whose `s` value is in the upper half order, so that
/// every signature is unique.
///
/// # Errors
///
/// * [`Error::InvalidSignatureS`] - If the `s` value is greater than
///   [`SIGNATURE_S_UPPER_BOUND`].
fn check_if_malleable(s: &B256) -> Result<(), Error> {
    if U256::from_be_bytes(s.0) > SIGNATURE_S_UPPER_BOUND {
        return Err(Error::InvalidSignatureS(ECDSAInvalidSignatureS { s: *s }));
    }
    Ok(())
}
