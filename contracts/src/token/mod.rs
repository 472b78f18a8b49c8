//! Token standards.
pub mod erc20;
pub mod erc721;
