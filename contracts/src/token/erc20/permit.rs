//! Permit extension of [`super::Erc20`].
//!
//! Allows approvals to be made via signatures, as defined in EIP-2612:
//! `permit` changes an account's allowance when presented a message signed
//! by the account, so the token holder does not need to send a transaction.
use alloy_primitives::{b256, keccak256, Address, FixedBytes, B256, U256};
use alloy_sol_types::{Panic, SolError, SolValue};
pub use sol::*;

use super::Erc20;
use crate::{
    utils::{
        cryptography::{ecdsa, eip712::IEip712},
        Nonces,
    },
    vm::{decode_call, CallResult, Context},
};

/// `keccak256("Permit(address owner,address spender,uint256 value,uint256
/// nonce,uint256 deadline)")`
pub const PERMIT_TYPEHASH: B256 =
    b256!("0x6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9");

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Indicates an error related to the fact that
        /// permit deadline has expired.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC2612ExpiredSignature(uint256 deadline);

        /// Indicates an error related to the issue about mismatched signature.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC2612InvalidSigner(address signer, address owner);
    }

    sol! {
        /// Interface of an ERC-20 token accepting signed approvals.
        #[allow(missing_docs)]
        interface IErc20Permit {
            function permit(
                address owner,
                address spender,
                uint256 value,
                uint256 deadline,
                uint8 v,
                bytes32 r,
                bytes32 s
            ) external;
            function nonces(address owner) external view returns (uint256);
            function DOMAIN_SEPARATOR() external view returns (bytes32);
            function eip712Domain() external view returns (
                bytes1 fields,
                string name,
                string version,
                uint256 chainId,
                address verifyingContract,
                bytes32 salt,
                uint256[] extensions
            );
        }
    }
}

/// A [`Permit`] error.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The permit deadline has expired.
    ExpiredSignature(ERC2612ExpiredSignature),
    /// The signer is not the owner.
    InvalidSigner(ERC2612InvalidSigner),
    /// The signature is malformed.
    Ecdsa(ecdsa::Error),
    /// The approval itself failed.
    Erc20(super::Error),
    /// The owner's nonce would exceed `U256::MAX`.
    Overflow(Panic),
}

impl From<ecdsa::Error> for Error {
    fn from(value: ecdsa::Error) -> Self {
        Error::Ecdsa(value)
    }
}

impl From<super::Error> for Error {
    fn from(value: super::Error) -> Self {
        Error::Erc20(value)
    }
}

impl From<Panic> for Error {
    fn from(value: Panic) -> Self {
        Error::Overflow(value)
    }
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::ExpiredSignature(e) => e.abi_encode(),
            Error::InvalidSigner(e) => e.abi_encode(),
            Error::Ecdsa(e) => e.into(),
            Error::Erc20(e) => e.into(),
            Error::Overflow(e) => e.abi_encode(),
        }
    }
}

/// Signed approvals over an [`Erc20`], with the nonces they consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permit {
    nonces: Nonces,
}

impl Permit {
    /// Creates a view of a permit extension whose nonces live at `slot`.
    #[must_use]
    pub const fn at(nonces: U256) -> Self {
        Self { nonces: Nonces::at(nonces) }
    }

    /// Returns the current nonce of `owner`.
    #[must_use]
    pub fn nonces(&self, ctx: &Context<'_>, owner: Address) -> U256 {
        self.nonces.nonces(ctx, owner)
    }

    /// Sets `call.value` as the allowance of `call.spender` over
    /// `call.owner`'s tokens, given `call.owner`'s signed approval.
    ///
    /// The signature must be an EIP-712 signature over the call arguments
    /// and `owner`'s current nonce, which is consumed.
    ///
    /// # Errors
    ///
    /// * [`Error::ExpiredSignature`] - If `deadline` is in the past.
    /// * [`Error::Ecdsa`] - If the signature is malformed.
    /// * [`Error::InvalidSigner`] - If the signer is not `owner`.
    /// * [`Error::Erc20`] - If `spender` is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`super::Approval`].
    pub fn permit(
        &self,
        ctx: &mut Context<'_>,
        domain: &impl IEip712,
        erc20: &Erc20,
        call: &IErc20Permit::permitCall,
    ) -> Result<(), Error> {
        if U256::from(ctx.block().timestamp) > call.deadline {
            return Err(Error::ExpiredSignature(ERC2612ExpiredSignature {
                deadline: call.deadline,
            }));
        }

        let nonce = self.nonces.use_nonce(ctx, call.owner)?;
        let struct_hash = keccak256(
            (PERMIT_TYPEHASH, call.owner, call.spender, call.value, nonce, call.deadline)
                .abi_encode(),
        );
        let hash = domain.hash_typed_data_v4(ctx, struct_hash);

        let signer = ecdsa::recover(hash, call.v, call.r, call.s)?;
        if signer != call.owner {
            return Err(Error::InvalidSigner(ERC2612InvalidSigner {
                signer,
                owner: call.owner,
            }));
        }

        erc20._approve(ctx, call.owner, call.spender, call.value, true)?;
        Ok(())
    }

    /// Dispatches the calls of [`IErc20Permit`].
    pub fn route(
        &self,
        ctx: &mut Context<'_>,
        domain: &impl IEip712,
        erc20: &Erc20,
        calldata: &[u8],
    ) -> Option<CallResult> {
        use IErc20Permit::IErc20PermitCalls as Calls;

        decode_call::<Calls>(calldata).map(|call| match call? {
            Calls::permit(c) => {
                self.permit(ctx, domain, erc20, &c)?;
                Ok(Vec::new())
            }
            Calls::nonces(c) => Ok(self.nonces(ctx, c.owner).abi_encode()),
            Calls::DOMAIN_SEPARATOR(_) => {
                Ok(domain.domain_separator_v4(ctx).abi_encode())
            }
            Calls::eip712Domain(_) => {
                let (fields, name, version, chain_id, verifying_contract, salt, extensions) =
                    domain.eip712_domain(ctx);
                Ok((
                    FixedBytes(fields),
                    name,
                    version,
                    chain_id,
                    verifying_contract,
                    salt,
                    extensions,
                )
                    .abi_encode_params())
            }
        })
    }
}
