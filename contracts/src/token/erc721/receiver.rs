//! Module with an interface required for smart contract in order to receive
//! ERC-721 token transfers.
#![allow(missing_docs)]
use alloy_primitives::FixedBytes;
use alloy_sol_types::SolCall;
pub use sol::*;

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// [`super::super::Erc721`] token receiver Solidity interface.
        ///
        /// It must return its Solidity selector to confirm the token transfer.
        /// If any other value is returned or the interface is not implemented
        /// by the recipient, the transfer will be reverted.
        interface IErc721Receiver {
            function onERC721Received(
                address operator,
                address from,
                uint256 token_id,
                bytes calldata data
            ) external returns (bytes4);
        }
    }
}

/// The expected value returned from `onERC721Received`.
pub const RECEIVER_FN_SELECTOR: FixedBytes<4> =
    FixedBytes(IErc721Receiver::onERC721ReceivedCall::SELECTOR);
