//! Implementation of the ERC-20 token standard.
//!
//! We have followed general `OpenZeppelin` Contracts guidelines: functions
//! revert instead of returning `false` on failure. This behavior is
//! nonetheless conventional and does not conflict with the expectations of
//! [`Erc20`] applications.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{Panic, SolError, SolValue};
pub use sol::*;

use crate::{
    arithmetic::ARITHMETIC_OVERFLOW,
    vm::{
        decode_call,
        storage::{StorageMap, StorageU256},
        CallResult, Context,
    },
};

pub mod basic_test_token;
pub mod permit;
pub use basic_test_token::{BasicTestToken, IBasicTestToken};
pub use permit::{IErc20Permit, Permit};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Emitted when `value` tokens are moved from one account (`from`) to
        /// another (`to`).
        ///
        /// Note that `value` may be zero.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Transfer(address indexed from, address indexed to, uint256 value);
        /// Emitted when the allowance of a `spender` for an `owner` is set by a
        /// call to `approve`. `value` is the new allowance.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }

    sol! {
        /// Indicates an error related to the current `balance` of `sender`. Used
        /// in transfers.
        ///
        /// * `sender` - Address whose tokens are being transferred.
        /// * `balance` - Current balance for the interacting account.
        /// * `needed` - Minimum amount required to perform a transfer.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        /// Indicates a failure with the token `sender`. Used in transfers.
        ///
        /// * `sender` - Address whose tokens are being transferred.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InvalidSender(address sender);
        /// Indicates a failure with the token `receiver`. Used in transfers.
        ///
        /// * `receiver` - Address to which the tokens are being transferred.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InvalidReceiver(address receiver);
        /// Indicates a failure with the `spender`’s `allowance`. Used in
        /// transfers.
        ///
        /// * `spender` - Address that may be allowed to operate on tokens without
        ///   being their owner.
        /// * `allowance` - Amount of tokens a `spender` is allowed to operate
        ///   with.
        /// * `needed` - Minimum amount required to perform a transfer.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        /// Indicates a failure with the `spender` to be approved. Used in
        /// approvals.
        ///
        /// * `spender` - Address that may be allowed to operate on tokens without
        ///   being their owner.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InvalidSpender(address spender);
        /// Indicates a failure with the `approver` of a token to be approved.
        /// Used in approvals.
        ///
        /// * `approver` - Address initiating an approval operation.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC20InvalidApprover(address approver);
    }

    sol! {
        /// Required interface of an [`super::Erc20`] compliant contract.
        #[allow(missing_docs)]
        interface IErc20 {
            function totalSupply() external view returns (uint256);
            function balanceOf(address account) external view returns (uint256);
            function transfer(address to, uint256 value) external returns (bool);
            function allowance(address owner, address spender) external view returns (uint256);
            function approve(address spender, uint256 value) external returns (bool);
            function transferFrom(address from, address to, uint256 value) external returns (bool);
        }
    }
}

/// An [`Erc20`] error defined as described in [ERC-6093].
///
/// [ERC-6093]: https://eips.ethereum.org/EIPS/eip-6093
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates an error related to the current balance of `sender`. Used in
    /// transfers.
    InsufficientBalance(ERC20InsufficientBalance),
    /// Indicates a failure with the token `sender`. Used in transfers.
    InvalidSender(ERC20InvalidSender),
    /// Indicates a failure with the token `receiver`. Used in transfers.
    InvalidReceiver(ERC20InvalidReceiver),
    /// Indicates a failure with the `spender`’s `allowance`. Used in
    /// transfers.
    InsufficientAllowance(ERC20InsufficientAllowance),
    /// Indicates a failure with the `spender` to be approved. Used in
    /// approvals.
    InvalidSpender(ERC20InvalidSpender),
    /// Indicates a failure with the `approver` of a token to be approved.
    /// Used in approvals.
    InvalidApprover(ERC20InvalidApprover),
    /// The total supply would exceed `U256::MAX`.
    Overflow(Panic),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::InsufficientBalance(e) => e.abi_encode(),
            Error::InvalidSender(e) => e.abi_encode(),
            Error::InvalidReceiver(e) => e.abi_encode(),
            Error::InsufficientAllowance(e) => e.abi_encode(),
            Error::InvalidSpender(e) => e.abi_encode(),
            Error::InvalidApprover(e) => e.abi_encode(),
            Error::Overflow(e) => e.abi_encode(),
        }
    }
}

/// State of an [`Erc20`] token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Erc20 {
    /// Maps users to balances.
    balances: StorageMap,
    /// Maps users to a mapping of each spender's allowance.
    allowances: StorageMap,
    /// The total supply of the token.
    total_supply: StorageU256,
}

impl Erc20 {
    /// Lays out an [`Erc20`] the way Solidity lays out consecutive
    /// `_balances`, `_allowances` and `_totalSupply` state variables.
    #[must_use]
    pub const fn at(balances: U256, allowances: U256, total_supply: U256) -> Self {
        Self {
            balances: StorageMap::at(balances),
            allowances: StorageMap::at(allowances),
            total_supply: StorageU256::at(total_supply),
        }
    }

    /// Returns the number of tokens in existence.
    #[must_use]
    pub fn total_supply(&self, ctx: &Context<'_>) -> U256 {
        self.total_supply.get(ctx)
    }

    /// Returns the number of tokens owned by `account`.
    #[must_use]
    pub fn balance_of(&self, ctx: &Context<'_>, account: Address) -> U256 {
        self.balances.getter::<StorageU256>(&account).get(ctx)
    }

    /// Returns the remaining number of tokens that `spender` will be allowed
    /// to spend on behalf of `owner` through `transfer_from`. This is zero by
    /// default.
    #[must_use]
    pub fn allowance(
        &self,
        ctx: &Context<'_>,
        owner: Address,
        spender: Address,
    ) -> U256 {
        self.allowances.getter::<StorageMap>(&owner).getter::<StorageU256>(&spender).get(ctx)
    }

    /// Moves a `value` amount of tokens from the caller's account to `to`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If the `to` address is
    ///   [`Address::ZERO`].
    /// * [`Error::InsufficientBalance`] - If the caller doesn't have a balance
    ///   of at least `value`.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn transfer(
        &self,
        ctx: &mut Context<'_>,
        to: Address,
        value: U256,
    ) -> Result<bool, Error> {
        let from = ctx.msg_sender();
        self._transfer(ctx, from, to, value)?;
        Ok(true)
    }

    /// Sets a `value` number of tokens as the allowance of `spender` over the
    /// caller's tokens.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidSpender`] - If the `spender` address is
    ///   [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`Approval`].
    pub fn approve(
        &self,
        ctx: &mut Context<'_>,
        spender: Address,
        value: U256,
    ) -> Result<bool, Error> {
        let owner = ctx.msg_sender();
        self._approve(ctx, owner, spender, value, true)?;
        Ok(true)
    }

    /// Moves a `value` number of tokens from `from` to `to` using the
    /// allowance mechanism. `value` is then deducted from the caller's
    /// allowance.
    ///
    /// NOTE: If the allowance is `U256::MAX`, it is not updated. This is
    /// semantically equivalent to an infinite approval.
    ///
    /// # Errors
    ///
    /// * [`Error::InsufficientAllowance`] - If not enough allowance is
    ///   available.
    /// * [`Error::InvalidSender`] - If the `from` address is
    ///   [`Address::ZERO`].
    /// * [`Error::InvalidReceiver`] - If the `to` address is
    ///   [`Address::ZERO`].
    /// * [`Error::InsufficientBalance`] - If `from` doesn't have enough
    ///   tokens.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn transfer_from(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<bool, Error> {
        let spender = ctx.msg_sender();
        self._spend_allowance(ctx, from, spender, value)?;
        self._transfer(ctx, from, to, value)?;
        Ok(true)
    }

    /// Creates a `value` amount of tokens and assigns them to `account`,
    /// by transferring it from [`Address::ZERO`].
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidReceiver`] - If `account` is [`Address::ZERO`].
    /// * [`Error::Overflow`] - If the total supply would exceed `U256::MAX`.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _mint(
        &self,
        ctx: &mut Context<'_>,
        account: Address,
        value: U256,
    ) -> Result<(), Error> {
        if account.is_zero() {
            return Err(Error::InvalidReceiver(ERC20InvalidReceiver {
                receiver: Address::ZERO,
            }));
        }
        self._update(ctx, Address::ZERO, account, value)
    }

    /// Destroys a `value` amount of tokens from `account`, lowering the total
    /// supply.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidSender`] - If `account` is [`Address::ZERO`].
    /// * [`Error::InsufficientBalance`] - If `account` doesn't have enough
    ///   tokens.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _burn(
        &self,
        ctx: &mut Context<'_>,
        account: Address,
        value: U256,
    ) -> Result<(), Error> {
        if account.is_zero() {
            return Err(Error::InvalidSender(ERC20InvalidSender {
                sender: Address::ZERO,
            }));
        }
        self._update(ctx, account, Address::ZERO, value)
    }

    /// Transfers a `value` amount of tokens from `from` to `to`, or
    /// alternatively mints (or burns) if `from` (or `to`) is the zero address.
    ///
    /// All customizations to transfers, mints, and burns should be done by
    /// using this function.
    ///
    /// # Errors
    ///
    /// * [`Error::InsufficientBalance`] - If `from` doesn't have enough
    ///   tokens.
    /// * [`Error::Overflow`] - If a mint makes the total supply exceed
    ///   `U256::MAX`.
    ///
    /// # Events
    ///
    /// * [`Transfer`].
    pub fn _update(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Error> {
        if from.is_zero() {
            // The rest of the code assumes that the total supply never
            // overflows.
            let total_supply =
                self.total_supply(ctx).checked_add(value).ok_or_else(|| {
                    Error::Overflow(Panic { code: U256::from(ARITHMETIC_OVERFLOW) })
                })?;
            self.total_supply.set(ctx, total_supply);
        } else {
            let from_balance = self.balance_of(ctx, from);
            if from_balance < value {
                return Err(Error::InsufficientBalance(
                    ERC20InsufficientBalance {
                        sender: from,
                        balance: from_balance,
                        needed: value,
                    },
                ));
            }
            // Overflow not possible: `value` <= `from_balance` <= total supply.
            self.balances.getter::<StorageU256>(&from).set(ctx, from_balance - value);
        }

        if to.is_zero() {
            // Overflow not possible: `value` <= `from_balance` <= total supply.
            let total_supply = self.total_supply(ctx);
            self.total_supply.set(ctx, total_supply - value);
        } else {
            // Overflow not possible: balance + `value` is at most the total
            // supply, which fits into a `U256`.
            let balance_to = self.balance_of(ctx, to);
            self.balances.getter::<StorageU256>(&to).set(ctx, balance_to + value);
        }

        ctx.emit(&Transfer { from, to, value });

        Ok(())
    }

    /// Updates `owner`'s allowance for `spender` based on spent `value`.
    ///
    /// Does not update the allowance value in case of infinite allowance.
    ///
    /// # Errors
    ///
    /// * [`Error::InsufficientAllowance`] - If not enough allowance is
    ///   available.
    pub fn _spend_allowance(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<(), Error> {
        let current_allowance = self.allowance(ctx, owner, spender);
        if current_allowance != U256::MAX {
            if current_allowance < value {
                return Err(Error::InsufficientAllowance(
                    ERC20InsufficientAllowance {
                        spender,
                        allowance: current_allowance,
                        needed: value,
                    },
                ));
            }

            self._approve(ctx, owner, spender, current_allowance - value, false)?;
        }

        Ok(())
    }

    /// Sets `value` as the allowance of `spender` over `owner`'s tokens.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidApprover`] - If `owner` is [`Address::ZERO`].
    /// * [`Error::InvalidSpender`] - If `spender` is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`Approval`], when `emit_event` is set.
    pub fn _approve(
        &self,
        ctx: &mut Context<'_>,
        owner: Address,
        spender: Address,
        value: U256,
        emit_event: bool,
    ) -> Result<(), Error> {
        if owner.is_zero() {
            return Err(Error::InvalidApprover(ERC20InvalidApprover {
                approver: Address::ZERO,
            }));
        }

        if spender.is_zero() {
            return Err(Error::InvalidSpender(ERC20InvalidSpender {
                spender: Address::ZERO,
            }));
        }

        self.allowances
            .getter::<StorageMap>(&owner)
            .getter::<StorageU256>(&spender)
            .set(ctx, value);
        if emit_event {
            ctx.emit(&Approval { owner, spender, value });
        }
        Ok(())
    }

    fn _transfer(
        &self,
        ctx: &mut Context<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Error> {
        if from.is_zero() {
            return Err(Error::InvalidSender(ERC20InvalidSender {
                sender: Address::ZERO,
            }));
        }
        if to.is_zero() {
            return Err(Error::InvalidReceiver(ERC20InvalidReceiver {
                receiver: Address::ZERO,
            }));
        }

        self._update(ctx, from, to, value)
    }

    /// Handles a call to one of the [`IErc20`] functions.
    ///
    /// Returns `None` when `calldata` targets some other function.
    pub fn route(
        &self,
        ctx: &mut Context<'_>,
        calldata: &[u8],
    ) -> Option<CallResult> {
        use IErc20::IErc20Calls as Calls;

        decode_call::<Calls>(calldata).map(|call| match call? {
            Calls::totalSupply(_) => Ok(self.total_supply(ctx).abi_encode()),
            Calls::balanceOf(c) => Ok(self.balance_of(ctx, c.account).abi_encode()),
            Calls::allowance(c) => {
                Ok(self.allowance(ctx, c.owner, c.spender).abi_encode())
            }
            Calls::transfer(c) => {
                Ok(self.transfer(ctx, c.to, c.value)?.abi_encode())
            }
            Calls::approve(c) => {
                Ok(self.approve(ctx, c.spender, c.value)?.abi_encode())
            }
            Calls::transferFrom(c) => {
                Ok(self.transfer_from(ctx, c.from, c.to, c.value)?.abi_encode())
            }
        })
    }
}
