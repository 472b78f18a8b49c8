//! [EIP-712](https://eips.ethereum.org/EIPS/eip-712) is a standard for hashing
//! and signing typed structured data.
//!
//! The domain separator is computed from the block being executed, so a
//! signature made for one chain is not valid on another one.
use alloy_primitives::{b256, keccak256, Address, B256, U256};
use alloy_sol_types::{sol_data, SolType};

use crate::vm::Context;

/// `keccak256("EIP712Domain(string name,string version,uint256 chainId,address
/// verifyingContract)")`
pub const TYPE_HASH: B256 =
    b256!("0x8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f");

/// Field for the domain separator: name, version, chain id and verifying
/// contract are set.
pub const FIELDS: [u8; 1] = [0x0f];

/// Salt for the domain separator.
pub const SALT: B256 = B256::ZERO;

/// Prefix of a typed-data hash.
pub const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Tuple for the domain separator.
pub type DomainSeparatorTuple = (
    sol_data::FixedBytes<32>,
    sol_data::FixedBytes<32>,
    sol_data::FixedBytes<32>,
    sol_data::Uint<256>,
    sol_data::Address,
);

/// EIP-712 domain of a contract.
pub trait IEip712 {
    /// Name of the signing domain.
    const NAME: &'static str;
    /// Version of the signing domain.
    const VERSION: &'static str;

    /// Returns the fields and values that describe the domain separator used
    /// by this contract, as defined by ERC-5267.
    #[allow(clippy::type_complexity)]
    fn eip712_domain(
        &self,
        ctx: &Context<'_>,
    ) -> ([u8; 1], String, String, U256, Address, B256, Vec<U256>) {
        (
            FIELDS,
            Self::NAME.to_owned(),
            Self::VERSION.to_owned(),
            U256::from(ctx.block().chain_id),
            ctx.address(),
            SALT,
            Vec::new(),
        )
    }

    /// Returns the domain separator for the current chain.
    fn domain_separator_v4(&self, ctx: &Context<'_>) -> B256 {
        let encoded = DomainSeparatorTuple::abi_encode(&(
            TYPE_HASH,
            keccak256(Self::NAME),
            keccak256(Self::VERSION),
            U256::from(ctx.block().chain_id),
            ctx.address(),
        ));
        keccak256(encoded)
    }

    /// Given an already [hashed struct], returns the hash of the fully
    /// encoded EIP-712 message for this domain.
    ///
    /// [hashed struct]: https://eips.ethereum.org/EIPS/eip-712#definition-of-hashstruct
    fn hash_typed_data_v4(&self, ctx: &Context<'_>, struct_hash: B256) -> B256 {
        to_typed_data_hash(&self.domain_separator_v4(ctx), &struct_hash)
    }
}

/// Returns the hash of typed data, `keccak256("\x19\x01" ‖ domainSeparator ‖
/// structHash)`.
#[must_use]
pub fn to_typed_data_hash(domain_separator: &B256, struct_hash: &B256) -> B256 {
    let mut preimage = [0u8; 66];
    preimage[..2].copy_from_slice(&TYPED_DATA_PREFIX);
    preimage[2..34].copy_from_slice(domain_separator.as_slice());
    preimage[34..].copy_from_slice(struct_hash.as_slice());
    keccak256(preimage)
}
