use std::fmt::Display;

use async_trait::async_trait;
use num_bigint::BigUint;

use crate::models::{Address, GasPrice, PopulatedTransaction};

/// Trait for reading authorization state and gas costs from a chain.
///
/// Implementations are shared freely between concurrent reads and must not cache between
/// calls: every call is expected to reflect the current chain state.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock(type Error = String;))]
#[async_trait]
pub trait ChainReader: Send + Sync {
    type Error: Display + Send + Sync;

    /// Reads how much of the fungible token at `contract_address` the `owner` allows `spender`
    /// to move.
    async fn allowance(
        &self,
        contract_address: &str,
        owner: &str,
        spender: &str,
    ) -> Result<BigUint, Self::Error>;

    /// Reads the collection wide approval flag of `operator` for all of `owner`'s tokens.
    async fn is_approved_for_all(
        &self,
        contract_address: &str,
        owner: &str,
        operator: &str,
    ) -> Result<bool, Self::Error>;

    /// Reads the single address approved to move the token `token_id`.
    async fn approved_address(
        &self,
        contract_address: &str,
        token_id: &BigUint,
    ) -> Result<Address, Self::Error>;

    /// Estimates the gas units `transaction` would consume.
    async fn estimate_gas(&self, transaction: &PopulatedTransaction)
        -> Result<BigUint, Self::Error>;

    /// Fetches the current fee data.
    async fn fee_data(&self) -> Result<GasPrice, Self::Error>;
}

/// Trait for encoding the transactions that grant missing authorizations.
///
/// Returned transactions have `to` and `data` set; the caller fills in `from`.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock(type Error = String;))]
#[async_trait]
pub trait ApprovalTransactionBuilder: Send + Sync {
    type Error: Display + Send + Sync;

    /// Fungible `approve(spender, amount)`.
    async fn approve_amount(
        &self,
        contract_address: &str,
        spender: &str,
        amount: &BigUint,
    ) -> Result<PopulatedTransaction, Self::Error>;

    /// Non-fungible `approve(spender, tokenId)`.
    async fn approve_token(
        &self,
        contract_address: &str,
        spender: &str,
        token_id: &BigUint,
    ) -> Result<PopulatedTransaction, Self::Error>;

    /// Collection wide `setApprovalForAll(operator, approved)`.
    async fn set_approval_for_all(
        &self,
        contract_address: &str,
        operator: &str,
        approved: bool,
    ) -> Result<PopulatedTransaction, Self::Error>;
}
