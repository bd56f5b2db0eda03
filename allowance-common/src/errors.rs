use thiserror::Error;

use crate::models::{Address, AssetKind};

/// Errors raised by the allowance resolvers.
///
/// Every variant identifies the offending asset and actors. A single error fails the whole
/// resolver call; no partial results are returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllowanceError {
    #[error(
        "Failed to read {kind} allowance of contract {contract_address} \
         (owner: {owner_address:?}, spender: {spender_address:?}, id: {id:?}): {cause}"
    )]
    AllowanceRead {
        kind: AssetKind,
        contract_address: Address,
        spender_address: Option<Address>,
        owner_address: Option<Address>,
        id: Option<String>,
        cause: String,
    },
    #[error(
        "Failed to build {kind} approval transaction for contract {contract_address} \
         (owner: {owner_address}, spender: {spender_address}, id: {id:?}): {cause}"
    )]
    ApprovalTransactionBuild {
        kind: AssetKind,
        contract_address: Address,
        spender_address: Address,
        owner_address: Address,
        id: Option<String>,
        cause: String,
    },
    #[error("Invalid token id {id:?} for contract {contract_address}")]
    InvalidIdentifier { id: Option<String>, contract_address: Address },
}

/// Errors raised while budgeting fees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeBudgetError {
    #[error("Gas estimation failed: {cause}")]
    GasEstimation { cause: String },
    #[error("Failed to fetch fee data: {cause}")]
    FeeData { cause: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error(transparent)]
    Allowance(#[from] AllowanceError),
    #[error(transparent)]
    FeeBudget(#[from] FeeBudgetError),
}
