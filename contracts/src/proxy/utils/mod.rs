//! Helpers for contracts meant to run behind a proxy.
pub mod initializable;

pub use initializable::Initializable;
