//! Typed views over raw storage slots.
//!
//! Slot derivation follows the Solidity layout rules, so a contract written
//! against these types lays out its state the way the equivalent Solidity
//! contract would: a mapping value lives at `keccak256(key . slot)`, dynamic
//! array elements start at `keccak256(slot)`.
use alloy_primitives::{keccak256, Address, B256, U256};

use super::Context;

/// A storage type located at a fixed slot.
pub trait StorageType: Sized {
    /// Creates a view of the value at `slot`.
    fn new(slot: U256) -> Self;
}

/// Values that can key a [`StorageMap`].
pub trait StorageKey {
    /// The 32-byte word hashed together with the mapping slot.
    fn to_word(&self) -> B256;
}

impl StorageKey for Address {
    fn to_word(&self) -> B256 {
        self.into_word()
    }
}

impl StorageKey for U256 {
    fn to_word(&self) -> B256 {
        B256::from(*self)
    }
}

impl StorageKey for B256 {
    fn to_word(&self) -> B256 {
        *self
    }
}

/// Slot of `key` in a mapping declared at `slot`.
#[must_use]
pub fn mapping_slot(key: &impl StorageKey, slot: U256) -> U256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(key.to_word().as_slice());
    preimage[32..].copy_from_slice(&slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(preimage).0)
}

/// First data slot of a dynamic value (array or long string) declared at
/// `slot`.
#[must_use]
pub fn data_slot(slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(slot.to_be_bytes::<32>()).0)
}

/// A `uint256` at a fixed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageU256 {
    slot: U256,
}

impl StorageType for StorageU256 {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageU256 {
    /// Creates a view of the value at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { slot }
    }

    /// Reads the value.
    #[must_use]
    pub fn get(&self, ctx: &Context<'_>) -> U256 {
        ctx.sload(self.slot)
    }

    /// Writes the value.
    pub fn set(&self, ctx: &mut Context<'_>, value: U256) {
        ctx.sstore(self.slot, value);
    }
}

/// An `address` at a fixed slot, right-aligned in the word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageAddress {
    slot: U256,
}

impl StorageType for StorageAddress {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageAddress {
    /// Creates a view of the value at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { slot }
    }

    /// Reads the value.
    #[must_use]
    pub fn get(&self, ctx: &Context<'_>) -> Address {
        word_to_address(ctx.sload(self.slot))
    }

    /// Writes the value.
    pub fn set(&self, ctx: &mut Context<'_>, value: Address) {
        ctx.sstore(self.slot, address_to_word(value));
    }
}

/// A `bool` at a fixed slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageBool {
    slot: U256,
}

impl StorageType for StorageBool {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageBool {
    /// Reads the value.
    #[must_use]
    pub fn get(&self, ctx: &Context<'_>) -> bool {
        !ctx.sload(self.slot).is_zero()
    }

    /// Writes the value.
    pub fn set(&self, ctx: &mut Context<'_>, value: bool) {
        ctx.sstore(self.slot, U256::from(u8::from(value)));
    }
}

/// A mapping declared at a fixed slot.
///
/// Values are views created with [`StorageMap::getter`]; nested mappings are
/// just a [`StorageMap`] getter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageMap {
    slot: U256,
}

impl StorageType for StorageMap {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageMap {
    /// Creates a view of the mapping declared at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { slot }
    }

    /// View of the value stored under `key`.
    #[must_use]
    pub fn getter<ST: StorageType>(&self, key: &impl StorageKey) -> ST {
        ST::new(mapping_slot(key, self.slot))
    }
}

/// A dynamic `uint256[]` declared at a fixed slot. The slot holds the
/// length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageVec {
    slot: U256,
}

impl StorageType for StorageVec {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageVec {
    /// Creates a view of the array declared at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { slot }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self, ctx: &Context<'_>) -> U256 {
        ctx.sload(self.slot)
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self, ctx: &Context<'_>) -> bool {
        self.len(ctx).is_zero()
    }

    /// Element at `index`, if in bounds.
    #[must_use]
    pub fn get(&self, ctx: &Context<'_>, index: U256) -> Option<U256> {
        (index < self.len(ctx)).then(|| ctx.sload(self.element_slot(index)))
    }

    /// Overwrites the element at `index`. Returns `false` when out of bounds.
    pub fn set(&self, ctx: &mut Context<'_>, index: U256, value: U256) -> bool {
        if index >= self.len(ctx) {
            return false;
        }
        ctx.sstore(self.element_slot(index), value);
        true
    }

    /// Appends `value`.
    pub fn push(&self, ctx: &mut Context<'_>, value: U256) {
        let len = self.len(ctx);
        ctx.sstore(self.element_slot(len), value);
        ctx.sstore(self.slot, len + U256::from(1));
    }

    /// Removes and returns the last element.
    pub fn pop(&self, ctx: &mut Context<'_>) -> Option<U256> {
        let len = self.len(ctx);
        if len.is_zero() {
            return None;
        }
        let last = len - U256::from(1);
        let value = ctx.sload(self.element_slot(last));
        ctx.sstore(self.element_slot(last), U256::ZERO);
        ctx.sstore(self.slot, last);
        Some(value)
    }

    fn element_slot(&self, index: U256) -> U256 {
        data_slot(self.slot).wrapping_add(index)
    }
}

/// A `string` declared at a fixed slot.
///
/// The slot holds the byte length and the bytes are packed into 32-byte
/// words starting at [`data_slot`]. Unlike Solidity, short strings are not
/// packed into the length slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageString {
    slot: U256,
}

impl StorageType for StorageString {
    fn new(slot: U256) -> Self {
        Self { slot }
    }
}

impl StorageString {
    /// Reads the string. Invalid UTF-8 is replaced lossily.
    #[must_use]
    pub fn get(&self, ctx: &Context<'_>) -> String {
        let len = usize::try_from(ctx.sload(self.slot)).unwrap_or_default();
        let start = data_slot(self.slot);
        let mut bytes = Vec::with_capacity(len);
        let mut word = 0u64;
        while bytes.len() < len {
            let chunk = ctx.sload(start + U256::from(word)).to_be_bytes::<32>();
            let take = (len - bytes.len()).min(32);
            bytes.extend_from_slice(&chunk[..take]);
            word += 1;
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Whether the string is empty.
    #[must_use]
    pub fn is_empty(&self, ctx: &Context<'_>) -> bool {
        ctx.sload(self.slot).is_zero()
    }

    /// Overwrites the string, clearing any leftover words of a longer value.
    pub fn set(&self, ctx: &mut Context<'_>, value: &str) {
        self.clear(ctx);
        let start = data_slot(self.slot);
        for (word, chunk) in value.as_bytes().chunks(32).enumerate() {
            let mut padded = [0u8; 32];
            padded[..chunk.len()].copy_from_slice(chunk);
            ctx.sstore(start + U256::from(word), U256::from_be_bytes(padded));
        }
        ctx.sstore(self.slot, U256::from(value.len()));
    }

    /// Deletes the string.
    pub fn clear(&self, ctx: &mut Context<'_>) {
        let len = usize::try_from(ctx.sload(self.slot)).unwrap_or_default();
        let start = data_slot(self.slot);
        for word in 0..len.div_ceil(32) {
            ctx.sstore(start + U256::from(word), U256::ZERO);
        }
        ctx.sstore(self.slot, U256::ZERO);
    }
}

/// Right-aligns `address` in a storage word.
#[must_use]
pub fn address_to_word(address: Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

/// Reads the low 20 bytes of a storage word as an address.
#[must_use]
pub fn word_to_address(word: U256) -> Address {
    Address::from_word(B256::from(word))
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, uint};

    use super::*;

    #[test]
    fn mapping_slot_matches_solidity_layout() {
        // keccak256(abi.encode(uint256(1), uint256(0)))
        let slot = mapping_slot(&uint!(1_U256), U256::ZERO);
        assert_eq!(
            B256::from(slot),
            b256!("0xada5013122d395ba3c54772283fb069b10426056ef8ca54750cb9bb552a59e7d")
        );
    }

    #[test]
    fn array_data_starts_at_hash_of_slot() {
        // keccak256(abi.encode(uint256(0)))
        assert_eq!(
            B256::from(data_slot(U256::ZERO)),
            b256!("0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563")
        );
    }

    #[test]
    fn address_words_round_trip() {
        let alice = address!("0x00000000000000000000000000000000000a11ce");
        assert_eq!(word_to_address(address_to_word(alice)), alice);
        assert_eq!(address_to_word(alice), uint!(0xa11ce_U256));
    }
}
