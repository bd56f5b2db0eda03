//! EVM implementations of the `allowance-common` collaborators.
//!
//! [`rpc::EthereumRpcClient`] reads allowances, approvals, gas estimates and fee data over
//! JSON-RPC; [`builder::EvmApprovalBuilder`] encodes the ERC20, ERC721 and ERC1155 approval
//! calls.
#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod abi;
pub mod builder;
pub mod rpc;

#[cfg(test)]
pub mod test_fixtures;

use alloy::primitives::U256;
use num_bigint::BigUint;

pub use abi::AbiError;
pub use builder::EvmApprovalBuilder;
pub use rpc::{config::RPCRetryConfig, errors::RPCError, EthereumRpcClient};

/// Conversion between the arbitrary precision integers of the engine models and fixed size
/// EVM words.
///
/// # Examples
/// ```
/// use alloy::primitives::U256;
/// use allowance_ethereum::BigUintCodec;
/// use num_bigint::BigUint;
///
/// let word = U256::from(1_000u64);
/// assert_eq!(word.to_biguint(), BigUint::from(1_000u64));
/// assert_eq!(U256::from_biguint(&BigUint::from(1_000u64)), Some(word));
/// ```
pub trait BigUintCodec: Sized {
    fn to_biguint(&self) -> BigUint;

    /// Returns `None` if `value` does not fit.
    fn from_biguint(value: &BigUint) -> Option<Self>;
}

impl BigUintCodec for U256 {
    fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.to_be_bytes::<32>())
    }

    fn from_biguint(value: &BigUint) -> Option<Self> {
        U256::try_from_be_slice(&value.to_bytes_be())
    }
}
