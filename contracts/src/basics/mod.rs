//! Small contracts exercising plain EVM features: arithmetic, storage layout,
//! contract-to-contract calls and contract creation.
pub mod basic_storage;
pub mod chatterbox;
pub mod create_functions;
pub mod evm_compatibility;

pub use basic_storage::{BasicStorage, IBasicStorage};
pub use chatterbox::{Chatterbox, IChatterbox};
pub use create_functions::{ITestCreateFunctions, TestCreateFunctions};
pub use evm_compatibility::{EvmCompatibilityTest, IEVMCompatibilityTest};
