//! `BasicTestToken` (`BTT`): an ownable, burnable [`super::Erc20`] whose
//! supply is minted by the owner, with EIP-2612 [`super::Permit`] approvals.
use alloy_primitives::{uint, Address, U256};
use alloy_sol_types::SolValue;
pub use sol::*;

use super::{Erc20, Permit};
use crate::{
    access::ownable::Ownable,
    utils::cryptography::eip712::IEip712,
    vm::{decode_call, CallResult, Context, Contract},
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Metadata, minting and burning functions of a
        /// [`super::BasicTestToken`].
        #[allow(missing_docs)]
        interface IBasicTestToken {
            function name() external view returns (string);
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
            function mint(address to, uint256 amount) external;
            function burn(uint256 value) external;
            function burnFrom(address account, uint256 value) external;
        }
    }
}

/// Token name.
pub const NAME: &str = "BasicTestToken";
/// Token symbol.
pub const SYMBOL: &str = "BTT";
/// Token decimals.
pub const DECIMALS: u8 = 18;

/// Version of the EIP-712 signing domain.
pub const VERSION: &str = "1";

// Slots 3 and 4 hold the name and symbol in the Solidity layout, slots 6 and
// 7 the EIP-712 name and version fallbacks.
const ERC20: Erc20 = Erc20::at(U256::ZERO, uint!(1_U256), uint!(2_U256));
const OWNABLE: Ownable = Ownable::at(uint!(5_U256));
const PERMIT: Permit = Permit::at(uint!(8_U256));

/// `BasicTestToken`. Constructor parameter: `address initialOwner`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicTestToken;

impl IEip712 for BasicTestToken {
    const NAME: &'static str = NAME;
    const VERSION: &'static str = VERSION;
}

impl Contract for BasicTestToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let initial_owner = Address::abi_decode(args).map_err(|_| Vec::new())?;
        Ok(OWNABLE.constructor(ctx, initial_owner)?)
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IBasicTestToken::IBasicTestTokenCalls as Calls;

        if let Some(call) = decode_call::<Calls>(calldata) {
            return match call? {
                Calls::name(_) => Ok(NAME.to_owned().abi_encode()),
                Calls::symbol(_) => Ok(SYMBOL.to_owned().abi_encode()),
                Calls::decimals(_) => Ok(<alloy_sol_types::sol_data::Uint<8> as alloy_sol_types::SolType>::abi_encode(&DECIMALS)),
                Calls::mint(c) => {
                    OWNABLE.only_owner(ctx)?;
                    ERC20._mint(ctx, c.to, c.amount)?;
                    Ok(Vec::new())
                }
                Calls::burn(c) => {
                    let account = ctx.msg_sender();
                    ERC20._burn(ctx, account, c.value)?;
                    Ok(Vec::new())
                }
                Calls::burnFrom(c) => {
                    let spender = ctx.msg_sender();
                    ERC20._spend_allowance(ctx, c.account, spender, c.value)?;
                    ERC20._burn(ctx, c.account, c.value)?;
                    Ok(Vec::new())
                }
            };
        }

        ERC20
            .route(ctx, calldata)
            .or_else(|| PERMIT.route(ctx, self, &ERC20, calldata))
            .or_else(|| OWNABLE.route(ctx, calldata))
            .unwrap_or_else(|| Err(Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, keccak256, uint, Address, B256, U256};
    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;
    use alloy_sol_types::{SolCall, SolValue};

    use super::*;
    use crate::{
        access::ownable::OwnableUnauthorizedAccount,
        arithmetic::ARITHMETIC_OVERFLOW,
        token::erc20::{
            permit::{ERC2612ExpiredSignature, ERC2612InvalidSigner, PERMIT_TYPEHASH},
            Approval, ERC20InsufficientAllowance, ERC20InsufficientBalance,
            ERC20InvalidReceiver, IErc20, IErc20Permit, Transfer,
        },
        utils::cryptography::eip712::{to_typed_data_hash, TYPE_HASH},
        vm::{Ledger, DEFAULT_CHAIN_ID, GENESIS_TIMESTAMP},
    };

    const OWNER: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
    const DAVE: Address = address!("0x0000000000000000000000000000000000000da0");

    fn setup() -> (Ledger, Address) {
        let mut ledger = Ledger::default();
        let token = ledger
            .deploy(OWNER, BasicTestToken, &OWNER.abi_encode())
            .expect("should deploy token")
            .contract_address
            .expect("should create an account");
        (ledger, token)
    }

    fn mint(ledger: &mut Ledger, token: Address, to: Address, amount: U256) {
        ledger
            .transact(OWNER, token, &IBasicTestToken::mintCall { to, amount }.abi_encode())
            .expect("owner should mint");
    }

    fn balance(ledger: &Ledger, token: Address, account: Address) -> U256 {
        let out = ledger
            .call(BOB, token, &IErc20::balanceOfCall { account }.abi_encode())
            .expect("should read balance");
        U256::abi_decode(&out).expect("should decode balance")
    }

    fn holder() -> PrivateKeySigner {
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            .parse()
            .expect("should parse key")
    }

    fn nonce(ledger: &Ledger, token: Address, owner: Address) -> U256 {
        let out = ledger
            .call(BOB, token, &IErc20Permit::noncesCall { owner }.abi_encode())
            .expect("should read nonce");
        U256::abi_decode(&out).expect("should decode nonce")
    }

    fn sign_permit(
        ledger: &Ledger,
        token: Address,
        signer: &PrivateKeySigner,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> IErc20Permit::permitCall {
        let owner = signer.address();
        let out = ledger
            .call(BOB, token, &IErc20Permit::DOMAIN_SEPARATORCall {}.abi_encode())
            .expect("should read domain separator");
        let domain_separator = B256::abi_decode(&out).expect("should decode domain separator");

        let nonce = nonce(ledger, token, owner);
        let struct_hash =
            keccak256((PERMIT_TYPEHASH, owner, spender, value, nonce, deadline).abi_encode());
        let hash = to_typed_data_hash(&domain_separator, &struct_hash);
        let signature = signer.sign_hash_sync(&hash).expect("should sign");

        IErc20Permit::permitCall {
            owner,
            spender,
            value,
            deadline,
            v: 27 + u8::from(signature.v()),
            r: B256::from(signature.r().to_be_bytes::<32>()),
            s: B256::from(signature.s().to_be_bytes::<32>()),
        }
    }

    fn total_supply(ledger: &Ledger, token: Address) -> U256 {
        let out = ledger
            .call(BOB, token, &IErc20::totalSupplyCall {}.abi_encode())
            .expect("should read total supply");
        U256::abi_decode(&out).expect("should decode total supply")
    }

    #[test]
    fn reports_metadata() {
        let (ledger, token) = setup();

        let name = ledger.call(BOB, token, &IBasicTestToken::nameCall {}.abi_encode()).unwrap();
        let symbol =
            ledger.call(BOB, token, &IBasicTestToken::symbolCall {}.abi_encode()).unwrap();
        let decimals =
            ledger.call(BOB, token, &IBasicTestToken::decimalsCall {}.abi_encode()).unwrap();

        assert_eq!(String::abi_decode(&name).unwrap(), "BasicTestToken");
        assert_eq!(String::abi_decode(&symbol).unwrap(), "BTT");
        assert_eq!(<alloy_sol_types::sol_data::Uint<8> as alloy_sol_types::SolType>::abi_decode(&decimals).unwrap(), 18);
        assert_eq!(total_supply(&ledger, token), U256::ZERO);
    }

    #[test]
    fn owner_mints() {
        let (mut ledger, token) = setup();
        let amount = uint!(1000_U256);

        let receipt = ledger
            .transact(OWNER, token, &IBasicTestToken::mintCall { to: BOB, amount }.abi_encode())
            .expect("owner should mint");

        assert!(receipt.emits(&Transfer { from: Address::ZERO, to: BOB, value: amount }));
        assert_eq!(balance(&ledger, token, BOB), amount);
        assert_eq!(total_supply(&ledger, token), amount);
    }

    #[test]
    fn only_owner_mints() {
        let (mut ledger, token) = setup();

        let err = ledger
            .transact(
                BOB,
                token,
                &IBasicTestToken::mintCall { to: BOB, amount: uint!(1_U256) }.abi_encode(),
            )
            .unwrap_err();

        assert_eq!(
            err.decode::<OwnableUnauthorizedAccount>(),
            Some(OwnableUnauthorizedAccount { account: BOB })
        );
        assert_eq!(total_supply(&ledger, token), U256::ZERO);
    }

    #[test]
    fn mint_rejects_zero_receiver() {
        let (mut ledger, token) = setup();

        let err = ledger
            .transact(
                OWNER,
                token,
                &IBasicTestToken::mintCall { to: Address::ZERO, amount: uint!(1_U256) }
                    .abi_encode(),
            )
            .unwrap_err();

        assert_eq!(
            err.decode::<ERC20InvalidReceiver>(),
            Some(ERC20InvalidReceiver { receiver: Address::ZERO })
        );
    }

    #[test]
    fn minting_past_max_supply_panics() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, U256::MAX);

        let err = ledger
            .transact(
                OWNER,
                token,
                &IBasicTestToken::mintCall { to: DAVE, amount: uint!(1_U256) }.abi_encode(),
            )
            .unwrap_err();

        assert_eq!(err.panic_code(), Some(U256::from(ARITHMETIC_OVERFLOW)));
        assert_eq!(total_supply(&ledger, token), U256::MAX);
    }

    #[test]
    fn transfers_between_accounts() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(100_U256));

        let receipt = ledger
            .transact(
                BOB,
                token,
                &IErc20::transferCall { to: DAVE, value: uint!(40_U256) }.abi_encode(),
            )
            .expect("should transfer");

        assert!(bool::abi_decode(&receipt.output).unwrap());
        assert!(receipt.emits(&Transfer { from: BOB, to: DAVE, value: uint!(40_U256) }));
        assert_eq!(balance(&ledger, token, BOB), uint!(60_U256));
        assert_eq!(balance(&ledger, token, DAVE), uint!(40_U256));
        assert_eq!(total_supply(&ledger, token), uint!(100_U256));
    }

    #[test]
    fn transfer_reverts_on_insufficient_balance() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(10_U256));

        let err = ledger
            .transact(
                BOB,
                token,
                &IErc20::transferCall { to: DAVE, value: uint!(11_U256) }.abi_encode(),
            )
            .unwrap_err();

        assert_eq!(
            err.decode::<ERC20InsufficientBalance>(),
            Some(ERC20InsufficientBalance {
                sender: BOB,
                balance: uint!(10_U256),
                needed: uint!(11_U256),
            })
        );
        assert_eq!(balance(&ledger, token, BOB), uint!(10_U256));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(100_U256));

        let receipt = ledger
            .transact(
                BOB,
                token,
                &IErc20::approveCall { spender: DAVE, value: uint!(30_U256) }.abi_encode(),
            )
            .expect("should approve");
        assert!(receipt.emits(&Approval { owner: BOB, spender: DAVE, value: uint!(30_U256) }));

        ledger
            .transact(
                DAVE,
                token,
                &IErc20::transferFromCall { from: BOB, to: DAVE, value: uint!(20_U256) }
                    .abi_encode(),
            )
            .expect("should transfer from");

        let allowance = ledger
            .call(BOB, token, &IErc20::allowanceCall { owner: BOB, spender: DAVE }.abi_encode())
            .unwrap();
        assert_eq!(U256::abi_decode(&allowance).unwrap(), uint!(10_U256));
        assert_eq!(balance(&ledger, token, DAVE), uint!(20_U256));

        let err = ledger
            .transact(
                DAVE,
                token,
                &IErc20::transferFromCall { from: BOB, to: DAVE, value: uint!(11_U256) }
                    .abi_encode(),
            )
            .unwrap_err();
        assert_eq!(
            err.decode::<ERC20InsufficientAllowance>(),
            Some(ERC20InsufficientAllowance {
                spender: DAVE,
                allowance: uint!(10_U256),
                needed: uint!(11_U256),
            })
        );
    }

    #[test]
    fn infinite_allowance_is_not_spent() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(100_U256));
        ledger
            .transact(BOB, token, &IErc20::approveCall { spender: DAVE, value: U256::MAX }.abi_encode())
            .unwrap();

        ledger
            .transact(
                DAVE,
                token,
                &IErc20::transferFromCall { from: BOB, to: DAVE, value: uint!(100_U256) }
                    .abi_encode(),
            )
            .expect("should transfer from");

        let allowance = ledger
            .call(BOB, token, &IErc20::allowanceCall { owner: BOB, spender: DAVE }.abi_encode())
            .unwrap();
        assert_eq!(U256::abi_decode(&allowance).unwrap(), U256::MAX);
    }

    #[test]
    fn burn_lowers_supply() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(100_U256));

        let receipt = ledger
            .transact(BOB, token, &IBasicTestToken::burnCall { value: uint!(25_U256) }.abi_encode())
            .expect("holder should burn");

        assert!(receipt.emits(&Transfer { from: BOB, to: Address::ZERO, value: uint!(25_U256) }));
        assert_eq!(balance(&ledger, token, BOB), uint!(75_U256));
        assert_eq!(total_supply(&ledger, token), uint!(75_U256));
    }

    #[test]
    fn burn_from_requires_allowance() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(100_U256));
        let burn_from =
            IBasicTestToken::burnFromCall { account: BOB, value: uint!(50_U256) }.abi_encode();

        let err = ledger.transact(DAVE, token, &burn_from).unwrap_err();
        assert!(err.decode::<ERC20InsufficientAllowance>().is_some());

        ledger
            .transact(BOB, token, &IErc20::approveCall { spender: DAVE, value: uint!(50_U256) }.abi_encode())
            .unwrap();
        ledger.transact(DAVE, token, &burn_from).expect("spender should burn");

        assert_eq!(balance(&ledger, token, BOB), uint!(50_U256));
        assert_eq!(total_supply(&ledger, token), uint!(50_U256));
    }

    #[test]
    fn balances_follow_solidity_layout() {
        let (mut ledger, token) = setup();
        mint(&mut ledger, token, BOB, uint!(7_U256));

        let slot = crate::vm::storage::mapping_slot(&BOB, U256::ZERO);
        assert_eq!(ledger.storage_at(token, slot), uint!(7_U256));
        assert_eq!(ledger.storage_at(token, uint!(2_U256)), uint!(7_U256));
        assert_eq!(
            ledger.storage_at(token, uint!(5_U256)),
            crate::vm::storage::address_to_word(OWNER)
        );
    }

    #[test]
    fn domain_separator_binds_chain_and_token() {
        let (ledger, token) = setup();

        let out = ledger
            .call(BOB, token, &IErc20Permit::DOMAIN_SEPARATORCall {}.abi_encode())
            .unwrap();
        let expected = keccak256(
            (
                TYPE_HASH,
                keccak256("BasicTestToken"),
                keccak256("1"),
                U256::from(DEFAULT_CHAIN_ID),
                token,
            )
                .abi_encode(),
        );
        assert_eq!(B256::abi_decode(&out).unwrap(), expected);
    }

    #[test]
    fn permit_approves_signed_allowance() {
        let (mut ledger, token) = setup();
        let holder = holder();
        mint(&mut ledger, token, holder.address(), uint!(100_U256));

        let permit = sign_permit(&ledger, token, &holder, BOB, U256::MAX, U256::MAX);
        let receipt =
            ledger.transact(BOB, token, &permit.abi_encode()).expect("permit should succeed");

        assert!(receipt.emits(&Approval {
            owner: holder.address(),
            spender: BOB,
            value: U256::MAX,
        }));
        assert_eq!(nonce(&ledger, token, holder.address()), uint!(1_U256));

        ledger
            .transact(
                BOB,
                token,
                &IErc20::transferFromCall {
                    from: holder.address(),
                    to: BOB,
                    value: uint!(100_U256),
                }
                .abi_encode(),
            )
            .expect("spender should transfer");
        assert_eq!(balance(&ledger, token, BOB), uint!(100_U256));
    }

    #[test]
    fn permit_rejects_expired_deadline() {
        let (mut ledger, token) = setup();
        let holder = holder();
        let deadline = U256::from(GENESIS_TIMESTAMP);

        let permit = sign_permit(&ledger, token, &holder, BOB, uint!(1_U256), deadline);
        let err = ledger.transact(BOB, token, &permit.abi_encode()).unwrap_err();

        assert_eq!(
            err.decode::<ERC2612ExpiredSignature>(),
            Some(ERC2612ExpiredSignature { deadline })
        );
        assert_eq!(nonce(&ledger, token, holder.address()), U256::ZERO);
    }

    #[test]
    fn permit_cannot_be_replayed() {
        let (mut ledger, token) = setup();
        let holder = holder();

        let permit = sign_permit(&ledger, token, &holder, BOB, uint!(5_U256), U256::MAX);
        ledger.transact(BOB, token, &permit.abi_encode()).expect("first use should succeed");

        let err = ledger.transact(BOB, token, &permit.abi_encode()).unwrap_err();
        let invalid = err.decode::<ERC2612InvalidSigner>().expect("should be an invalid signer");
        assert_eq!(invalid.owner, holder.address());
        assert_ne!(invalid.signer, holder.address());
        assert_eq!(nonce(&ledger, token, holder.address()), uint!(1_U256));
    }

    #[test]
    fn permit_rejects_other_signers() {
        let (mut ledger, token) = setup();
        let holder = holder();

        let mut permit = sign_permit(&ledger, token, &holder, BOB, uint!(5_U256), U256::MAX);
        permit.owner = DAVE;
        let err = ledger.transact(BOB, token, &permit.abi_encode()).unwrap_err();

        assert_eq!(
            err.decode::<ERC2612InvalidSigner>().map(|e| e.owner),
            Some(DAVE)
        );
    }
}
