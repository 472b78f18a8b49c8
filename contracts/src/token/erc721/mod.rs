//! Implementation of the [`Erc721`] token standard.
use alloy_primitives::{Address, FixedBytes, U256};
use alloy_sol_types::{SolCall, SolError, SolValue};
pub use sol::*;

use crate::vm::{
    decode_call,
    storage::{StorageAddress, StorageBool, StorageMap, StorageU256},
    CallResult, Context,
};

pub mod basic_nft;
mod receiver;
pub use basic_nft::{BasicNft, IBasicNft};
pub use receiver::{IErc721Receiver, RECEIVER_FN_SELECTOR};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Emitted when the `token_id` token is transferred from `from` to `to`.
        ///
        /// * `from` - Address from which the token will be transferred.
        /// * `to` - Address where the token will be transferred to.
        /// * `token_id` - Token id as a number.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Transfer(
            address indexed from,
            address indexed to,
            uint256 indexed token_id
        );

        /// Emitted when `owner` enables `approved` to manage the `token_id` token.
        ///
        /// * `owner` - Address of the owner of the token.
        /// * `approved` - Address of the approver.
        /// * `token_id` - Token id as a number.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Approval(
            address indexed owner,
            address indexed approved,
            uint256 indexed token_id
        );

        /// Emitted when `owner` enables or disables (`approved`) `operator`
        /// to manage all of its assets.
        ///
        /// * `owner` - Address of the owner of the token.
        /// * `operator` - Address of an operator that
        ///   will manage operations on the token.
        /// * `approved` - Whether or not permission has been granted. If true,
        ///   this means `operator` will be allowed to manage `owner`'s assets.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event ApprovalForAll(address indexed owner, address indexed operator, bool approved);
    }

    sol! {
        /// Indicates that an address can't be an owner.
        /// For example, `Address::ZERO` is a forbidden owner in [`super::Erc721`].
        /// Used in balance queries.
        ///
        /// * `owner` - The address deemed to be an invalid owner.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InvalidOwner(address owner);

        /// Indicates a `token_id` whose `owner` is the zero address.
        ///
        /// * `token_id` - Token id as a number.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721NonexistentToken(uint256 token_id);

        /// Indicates an error related to the ownership over a particular token.
        /// Used in transfers.
        ///
        /// * `sender` - Address whose tokens are being transferred.
        /// * `token_id` - Token id as a number.
        /// * `owner` - Address of the owner of the token.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721IncorrectOwner(address sender, uint256 token_id, address owner);

        /// Indicates a failure with the token `sender`. Used in transfers.
        ///
        /// * `sender` - An address whose token is being transferred.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InvalidSender(address sender);

        /// Indicates a failure with the token `receiver`. Used in transfers.
        ///
        /// * `receiver` - Address that receives the token.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InvalidReceiver(address receiver);

        /// Indicates a failure with the `operator`’s approval. Used in transfers.
        ///
        /// * `operator` - Address that may be allowed to operate on tokens
        ///   without being their owner.
        /// * `token_id` - Token id as a number.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InsufficientApproval(address operator, uint256 token_id);

        /// Indicates a failure with the `approver` of a token to be approved.
        /// Used in approvals.
        ///
        /// * `approver` - Address initiating an approval operation.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InvalidApprover(address approver);

        /// Indicates a failure with the `operator` to be approved.
        /// Used in approvals.
        ///
        /// * `operator` - Address that may be allowed to operate on tokens
        ///   without being their owner.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC721InvalidOperator(address operator);
    }

    sol! {
        /// Required interface of an [`super::Erc721`] compliant contract.
        #[allow(missing_docs)]
        interface IErc721 {
            function balanceOf(address owner) external view returns (uint256);
            function ownerOf(uint256 token_id) external view returns (address);
            function safeTransferFrom(address from, address to, uint256 token_id, bytes calldata data) external;
            function safeTransferFrom(address from, address to, uint256 token_id) external;
            function transferFrom(address from, address to, uint256 token_id) external;
            function approve(address to, uint256 token_id) external;
            function setApprovalForAll(address operator, bool approved) external;
            function getApproved(uint256 token_id) external view returns (address);
            function isApprovedForAll(address owner, address operator) external view returns (bool);
        }
    }
}

/// An [`Erc721`] error defined as described in [ERC-6093].
///
/// [ERC-6093]: https://eips.ethereum.org/EIPS/eip-6093
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates that an address can't be an owner.
    InvalidOwner(ERC721InvalidOwner),
    /// Indicates a `token_id` whose `owner` is the zero address.
    NonexistentToken(ERC721NonexistentToken),
    /// Indicates an error related to the ownership over a particular token.
    IncorrectOwner(ERC721IncorrectOwner),
    /// Indicates a failure with the token `sender`.
    InvalidSender(ERC721InvalidSender),
    /// Indicates a failure with the token `receiver`.
    InvalidReceiver(ERC721InvalidReceiver),
    /// Indicates a failure with the `operator`’s approval.
    InsufficientApproval(ERC721InsufficientApproval),
    /// Indicates a failure with the `approver` of a token to be approved.
    InvalidApprover(ERC721InvalidApprover),
    /// Indicates a failure with the `operator` to be approved.
    InvalidOperator(ERC721InvalidOperator),
    /// The receiver of a safe transfer reverted with this data.
    Receiver(Vec<u8>),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::InvalidOwner(e) => e.abi_encode(),
            Error::NonexistentToken(e) => e.abi_encode(),
            Error::IncorrectOwner(e) => e.abi_encode(),
            Error::InvalidSender(e) => e.abi_encode(),
            Error::InvalidReceiver(e) => e.abi_encode(),
            Error::InsufficientApproval(e) => e.abi_encode(),
            Error::InvalidApprover(e) => e.abi_encode(),
            Error::InvalidOperator(e) => e.abi_encode(),
            Error::Receiver(data) => data,
        }
    }
}

/// Interface id of ERC-721.
pub const INTERFACE_ID: FixedBytes<4> = FixedBytes([0x80, 0xac, 0x58, 0xcd]);

/// State of an [`Erc721`] token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Erc721 {
    /// Maps tokens to owners.
    owners: StorageMap,
    /// Maps users to balances.
    balances: StorageMap,
    /// Maps tokens to approvals.
    token_approvals: StorageMap,
    /// Maps owners to a mapping of operator approvals.
    operator_approvals: StorageMap,
}

impl Erc721 {
    /// Lays out an [`Erc721`] the way Solidity lays out consecutive
    /// `_owners`, `_balances`, `_tokenApprovals` and `_operatorApprovals`
    /// state variables.
    #[must_use]
    pub const fn at(
        owners: U256,
        balances: U256,
        token_approvals: U256,
        operator_approvals: U256,
    ) -> Self {
        Self {
            owners: StorageMap::at(owners),
            balances: StorageMap::at(balances),
            token_approvals: StorageMap::at(token_approvals),
            operator_approvals: StorageMap::at(operator_approvals),
        }
    }

    /// Returns the number of tokens in `owner`'s account.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidOwner`] - If `owner` is [`Address::ZERO`].
    pub fn balance_of(&self, ctx: &Context<'_>, owner: Address) -> Result<U256, Error> {
        if owner.is_zero() {
            return Err(Error::InvalidOwner(ERC721InvalidOwner {
                owner: Address::ZERO,
            }));
        }
        Ok(self.balances.getter::<StorageU256>(&owner).get(ctx))
    }

    /// Returns the owner of the `token_id` token.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    pub fn owner_of(&self, ctx: &Context<'_>, token_id: U256) -> Result<Address, Error> {
        self._require_owned(ctx, token_id)
    }

    /// Safely transfers `token_id` token from `from` to `to`, checking first
    /// that contract recipients are aware of the [`Erc721`] protocol to
    /// prevent tokens from being forever locked.
    ///
    /// # Errors
    ///
    /// * Every error of [`Erc721::transfer_from`].
    /// * [`Error::InvalidReceiver`] - If `to` is a contract that does not
    ///   accept the token.
    /// * [`Error::Receiver`] - If `to` reverted with a reason.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn safe_transfer_from(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        token_id: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        self.transfer_from(ctx, from, to, token_id)?;
        self._check_on_erc721_received(ctx, from, to, token_id, data)
    }

    /// Transfers `token_id` token from `from` to `to`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If `to` is [`Address::ZERO`].
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    /// * [`Error::InsufficientApproval`] - If the caller is neither the owner
    ///   nor approved to move the token.
    /// * [`Error::IncorrectOwner`] - If `from` does not own the token.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn transfer_from(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Error> {
        if to.is_zero() {
            return Err(Error::InvalidReceiver(ERC721InvalidReceiver {
                receiver: Address::ZERO,
            }));
        }

        // Setting an "auth" argument enables the `_is_authorized` check which
        // verifies that the token exists (`from != 0`).
        let auth = ctx.msg_sender();
        let previous_owner = self._update(ctx, to, token_id, auth)?;
        if previous_owner != from {
            return Err(Error::IncorrectOwner(ERC721IncorrectOwner {
                sender: from,
                token_id,
                owner: previous_owner,
            }));
        }
        Ok(())
    }

    /// Gives permission to `to` to transfer `token_id` token to another
    /// account. The approval is cleared when the token is transferred.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    /// * [`Error::InvalidApprover`] - If the caller is neither the owner nor
    ///   an operator of the owner.
    ///
    /// # Events
    ///
    /// * [`Approval`].
    pub fn approve(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        token_id: U256,
    ) -> Result<(), Error> {
        let auth = ctx.msg_sender();
        self._approve(ctx, to, token_id, auth, true)
    }

    /// Approves or removes `operator` as an operator for the caller.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidOperator`] - If `operator` is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`ApprovalForAll`].
    pub fn set_approval_for_all(
        &self,
        ctx: &mut Context<'_>,
        operator: Address,
        approved: bool,
    ) -> Result<(), Error> {
        if operator.is_zero() {
            return Err(Error::InvalidOperator(ERC721InvalidOperator { operator }));
        }

        let owner = ctx.msg_sender();
        self.operator_approvals
            .getter::<StorageMap>(&owner)
            .getter::<StorageBool>(&operator)
            .set(ctx, approved);
        ctx.emit(&ApprovalForAll { owner, operator, approved });
        Ok(())
    }

    /// Returns the account approved for `token_id` token.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    pub fn get_approved(&self, ctx: &Context<'_>, token_id: U256) -> Result<Address, Error> {
        self._require_owned(ctx, token_id)?;
        Ok(self._get_approved(ctx, token_id))
    }

    /// Returns whether `operator` is allowed to manage all of the assets of
    /// `owner`.
    #[must_use]
    pub fn is_approved_for_all(
        &self,
        ctx: &Context<'_>,
        owner: Address,
        operator: Address,
    ) -> bool {
        self.operator_approvals
            .getter::<StorageMap>(&owner)
            .getter::<StorageBool>(&operator)
            .get(ctx)
    }

    /// Returns the owner of `token_id`, [`Address::ZERO`] if it does not
    /// exist.
    #[must_use]
    pub fn _owner_of(&self, ctx: &Context<'_>, token_id: U256) -> Address {
        self.owners.getter::<StorageAddress>(&token_id).get(ctx)
    }

    /// Mints `token_id` and transfers it to `to`, then checks that contract
    /// recipients accept it.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If `to` is [`Address::ZERO`] or a
    ///   contract that does not accept the token.
    /// * [`Error::InvalidSender`] - If `token_id` already exists.
    /// * [`Error::Receiver`] - If `to` reverted with a reason.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _safe_mint(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        token_id: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        self._mint(ctx, to, token_id)?;
        self._check_on_erc721_received(ctx, Address::ZERO, to, token_id, data)
    }

    /// Mints `token_id` and transfers it to `to`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If `to` is [`Address::ZERO`].
    /// * [`Error::InvalidSender`] - If `token_id` already exists.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _mint(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        token_id: U256,
    ) -> Result<(), Error> {
        if to.is_zero() {
            return Err(Error::InvalidReceiver(ERC721InvalidReceiver {
                receiver: Address::ZERO,
            }));
        }

        let previous_owner = self._update(ctx, to, token_id, Address::ZERO)?;
        if !previous_owner.is_zero() {
            return Err(Error::InvalidSender(ERC721InvalidSender {
                sender: Address::ZERO,
            }));
        }
        Ok(())
    }

    /// Transfers `token_id` from its current owner to `to`, or alternatively
    /// mints (or burns) if the current owner (or `to`) is the zero address.
    /// Returns the owner of the `token_id` before the update.
    ///
    /// The `auth` argument is optional. If the value passed is non-zero, then
    /// this function will check that `auth` is either the owner of the token,
    /// or approved to operate on the token (by the owner).
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If `auth` is set and the token does
    ///   not exist.
    /// * [`Error::InsufficientApproval`] - If `auth` is set and is not
    ///   authorized.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _update(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        token_id: U256,
        auth: Address,
    ) -> Result<Address, Error> {
        let from = self._owner_of(ctx, token_id);

        if !auth.is_zero() {
            self._check_authorized(ctx, from, auth, token_id)?;
        }

        if !from.is_zero() {
            // Clear approval. No need to re-authorize or emit the `Approval`
            // event.
            self._approve(ctx, Address::ZERO, token_id, Address::ZERO, false)?;
            let balance = self.balances.getter::<StorageU256>(&from);
            let value = balance.get(ctx);
            balance.set(ctx, value - U256::from(1));
        }

        if !to.is_zero() {
            let balance = self.balances.getter::<StorageU256>(&to);
            let value = balance.get(ctx);
            balance.set(ctx, value + U256::from(1));
        }

        self.owners.getter::<StorageAddress>(&token_id).set(ctx, to);
        ctx.emit(&Transfer { from, to, token_id });

        Ok(from)
    }

    /// Approves `to` to operate on `token_id`.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    /// * [`Error::InvalidApprover`] - If `auth` is set and is neither the
    ///   owner nor an operator of the owner.
    ///
    /// # Events
    ///
    /// * [`Approval`], when `emit_event` is set.
    pub fn _approve(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        token_id: U256,
        auth: Address,
        emit_event: bool,
    ) -> Result<(), Error> {
        if emit_event || !auth.is_zero() {
            let owner = self._require_owned(ctx, token_id)?;

            if !auth.is_zero()
                && owner != auth
                && !self.is_approved_for_all(ctx, owner, auth)
            {
                return Err(Error::InvalidApprover(ERC721InvalidApprover {
                    approver: auth,
                }));
            }

            if emit_event {
                ctx.emit(&Approval { owner, approved: to, token_id });
            }
        }

        self.token_approvals.getter::<StorageAddress>(&token_id).set(ctx, to);
        Ok(())
    }

    /// Returns the owner of `token_id`.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentToken`] - If the token does not exist.
    pub fn _require_owned(
        &self,
        ctx: &Context<'_>,
        token_id: U256,
    ) -> Result<Address, Error> {
        let owner = self._owner_of(ctx, token_id);
        if owner.is_zero() {
            return Err(Error::NonexistentToken(ERC721NonexistentToken {
                token_id,
            }));
        }
        Ok(owner)
    }

    fn _get_approved(&self, ctx: &Context<'_>, token_id: U256) -> Address {
        self.token_approvals.getter::<StorageAddress>(&token_id).get(ctx)
    }

    fn _is_authorized(
        &self,
        ctx: &Context<'_>,
        owner: Address,
        spender: Address,
        token_id: U256,
    ) -> bool {
        !spender.is_zero()
            && (owner == spender
                || self.is_approved_for_all(ctx, owner, spender)
                || self._get_approved(ctx, token_id) == spender)
    }

    fn _check_authorized(
        &self,
        ctx: &Context<'_>,
        owner: Address,
        spender: Address,
        token_id: U256,
    ) -> Result<(), Error> {
        if self._is_authorized(ctx, owner, spender, token_id) {
            return Ok(());
        }

        if owner.is_zero() {
            Err(Error::NonexistentToken(ERC721NonexistentToken { token_id }))
        } else {
            Err(Error::InsufficientApproval(ERC721InsufficientApproval {
                operator: spender,
                token_id,
            }))
        }
    }

    /// Calls `onERC721Received` on `to` when it holds code. Accounts without
    /// code always accept tokens.
    fn _check_on_erc721_received(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        token_id: U256,
        data: &[u8],
    ) -> Result<(), Error> {
        if !ctx.has_code(to) {
            return Ok(());
        }

        let call = IErc721Receiver::onERC721ReceivedCall {
            operator: ctx.msg_sender(),
            from,
            token_id,
            data: data.to_vec().into(),
        };
        match ctx.call(to, &call.abi_encode()) {
            Ok(output) => {
                let accepted = FixedBytes::<4>::abi_decode(&output)
                    .is_ok_and(|retval| retval == RECEIVER_FN_SELECTOR);
                if accepted {
                    Ok(())
                } else {
                    Err(Error::InvalidReceiver(ERC721InvalidReceiver {
                        receiver: to,
                    }))
                }
            }
            Err(reason) if reason.is_empty() => {
                Err(Error::InvalidReceiver(ERC721InvalidReceiver { receiver: to }))
            }
            Err(reason) => Err(Error::Receiver(reason)),
        }
    }

    /// Handles a call to one of the [`IErc721`] functions.
    ///
    /// Returns `None` when `calldata` targets some other function.
    pub fn route(
        &self,
        ctx: &mut Context<'_>,
        calldata: &[u8],
    ) -> Option<CallResult> {
        use IErc721::IErc721Calls as Calls;

        decode_call::<Calls>(calldata).map(|call| match call? {
            Calls::balanceOf(c) => Ok(self.balance_of(ctx, c.owner)?.abi_encode()),
            Calls::ownerOf(c) => Ok(self.owner_of(ctx, c.token_id)?.abi_encode()),
            Calls::safeTransferFrom_0(c) => {
                self.safe_transfer_from(ctx, c.from, c.to, c.token_id, &c.data)?;
                Ok(Vec::new())
            }
            Calls::safeTransferFrom_1(c) => {
                self.safe_transfer_from(ctx, c.from, c.to, c.token_id, &[])?;
                Ok(Vec::new())
            }
            Calls::transferFrom(c) => {
                self.transfer_from(ctx, c.from, c.to, c.token_id)?;
                Ok(Vec::new())
            }
            Calls::approve(c) => {
                self.approve(ctx, c.to, c.token_id)?;
                Ok(Vec::new())
            }
            Calls::setApprovalForAll(c) => {
                self.set_approval_for_all(ctx, c.operator, c.approved)?;
                Ok(Vec::new())
            }
            Calls::getApproved(c) => {
                Ok(self.get_approved(ctx, c.token_id)?.abi_encode())
            }
            Calls::isApprovedForAll(c) => {
                Ok(self.is_approved_for_all(ctx, c.owner, c.operator).abi_encode())
            }
        })
    }
}
