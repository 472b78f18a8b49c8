//! `BasicNFT` (`BNFT`): an ownable [`super::Erc721`] with per-token URI
//! storage, minted by the owner with incrementing token ids.
use alloy_primitives::{uint, Address, FixedBytes, U256};
use alloy_sol_types::SolValue;
pub use sol::*;

use super::{Erc721, INTERFACE_ID as ERC721_INTERFACE_ID};
use crate::{
    access::ownable::Ownable,
    vm::{
        decode_call,
        storage::{StorageMap, StorageString, StorageU256},
        CallResult, Context, Contract,
    },
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// This event emits when the metadata of a token is changed, as
        /// defined in ERC-4906.
        ///
        /// * `token_id` - Token id as a number.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event MetadataUpdate(uint256 token_id);
    }

    sol! {
        /// Metadata and minting functions of a [`super::BasicNft`].
        #[allow(missing_docs)]
        interface IBasicNft {
            function name() external view returns (string);
            function symbol() external view returns (string);
            function tokenURI(uint256 token_id) external view returns (string);
            function safeMint(address to, string uri) external;
            function _nextTokenId() external view returns (uint256);
            function supportsInterface(bytes4 interface_id) external view returns (bool);
        }
    }
}

/// Token name.
pub const NAME: &str = "BasicNFT";
/// Token symbol.
pub const SYMBOL: &str = "BNFT";

const ERC165_INTERFACE_ID: FixedBytes<4> = FixedBytes([0x01, 0xff, 0xc9, 0xa7]);
const METADATA_INTERFACE_ID: FixedBytes<4> = FixedBytes([0x5b, 0x5e, 0x13, 0x9f]);
const ERC4906_INTERFACE_ID: FixedBytes<4> = FixedBytes([0x49, 0x06, 0x49, 0x06]);

// Slots 0 and 1 hold the name and symbol in the Solidity layout.
const ERC721: Erc721 =
    Erc721::at(uint!(2_U256), uint!(3_U256), uint!(4_U256), uint!(5_U256));
const TOKEN_URIS: StorageMap = StorageMap::at(uint!(6_U256));
const OWNABLE: Ownable = Ownable::at(uint!(7_U256));
const NEXT_TOKEN_ID: StorageU256 = StorageU256::at(uint!(8_U256));

/// `BasicNFT`. Constructor parameter: `address initialOwner`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicNft;

impl BasicNft {
    /// Mints the next token id to `to` and sets its URI.
    fn safe_mint(ctx: &mut Context<'_>, to: Address, uri: &str) -> CallResult {
        OWNABLE.only_owner(ctx)?;

        let token_id = NEXT_TOKEN_ID.get(ctx);
        NEXT_TOKEN_ID.set(ctx, token_id + U256::from(1));
        ERC721._safe_mint(ctx, to, token_id, &[])?;

        TOKEN_URIS.getter::<StorageString>(&token_id).set(ctx, uri);
        ctx.emit(&MetadataUpdate { token_id });
        Ok(Vec::new())
    }

    fn token_uri(ctx: &Context<'_>, token_id: U256) -> Result<String, Vec<u8>> {
        ERC721._require_owned(ctx, token_id)?;
        Ok(TOKEN_URIS.getter::<StorageString>(&token_id).get(ctx))
    }

    fn supports_interface(interface_id: FixedBytes<4>) -> bool {
        [ERC165_INTERFACE_ID, ERC721_INTERFACE_ID, METADATA_INTERFACE_ID, ERC4906_INTERFACE_ID]
            .contains(&interface_id)
    }
}

impl Contract for BasicNft {
    fn name(&self) -> &'static str {
        NAME
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let initial_owner = Address::abi_decode(args).map_err(|_| Vec::new())?;
        Ok(OWNABLE.constructor(ctx, initial_owner)?)
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IBasicNft::IBasicNftCalls as Calls;

        if let Some(call) = decode_call::<Calls>(calldata) {
            return match call? {
                Calls::name(_) => Ok(NAME.to_owned().abi_encode()),
                Calls::symbol(_) => Ok(SYMBOL.to_owned().abi_encode()),
                Calls::tokenURI(c) => Ok(Self::token_uri(ctx, c.token_id)?.abi_encode()),
                Calls::safeMint(c) => Self::safe_mint(ctx, c.to, &c.uri),
                Calls::_nextTokenId(_) => Ok(NEXT_TOKEN_ID.get(ctx).abi_encode()),
                Calls::supportsInterface(c) => {
                    Ok(Self::supports_interface(c.interface_id).abi_encode())
                }
            };
        }

        ERC721
            .route(ctx, calldata)
            .or_else(|| OWNABLE.route(ctx, calldata))
            .unwrap_or_else(|| Err(Vec::new()))
    }
}
