use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{
    FungibleRequirement, ItemRequirement, NonFungibleRequirement, PopulatedTransaction,
    SemiFungibleRequirement,
};

/// Authorization state of a single item with respect to its spender.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Allowance {
    /// The spender is already allowed to move the item.
    Sufficient { item_requirement: ItemRequirement },
    InsufficientFungible {
        /// Additional allowance the approval grants to reach the required amount.
        #[serde_as(as = "DisplayFromStr")]
        delta: BigUint,
        item_requirement: FungibleRequirement,
        approval_transaction: Option<PopulatedTransaction>,
    },
    InsufficientNonFungible {
        item_requirement: NonFungibleRequirement,
        approval_transaction: Option<PopulatedTransaction>,
    },
    InsufficientSemiFungible {
        item_requirement: SemiFungibleRequirement,
        approval_transaction: Option<PopulatedTransaction>,
    },
}

impl Allowance {
    pub fn is_sufficient(&self) -> bool {
        matches!(self, Allowance::Sufficient { .. })
    }

    /// The transaction granting the missing authorization, `None` for sufficient items.
    pub fn approval_transaction(&self) -> Option<&PopulatedTransaction> {
        match self {
            Allowance::Sufficient { .. } => None,
            Allowance::InsufficientFungible { approval_transaction, .. } |
            Allowance::InsufficientNonFungible { approval_transaction, .. } |
            Allowance::InsufficientSemiFungible { approval_transaction, .. } => {
                approval_transaction.as_ref()
            }
        }
    }

    pub fn item_requirement(&self) -> ItemRequirement {
        match self {
            Allowance::Sufficient { item_requirement } => item_requirement.clone(),
            Allowance::InsufficientFungible { item_requirement, .. } => {
                ItemRequirement::Fungible(item_requirement.clone())
            }
            Allowance::InsufficientNonFungible { item_requirement, .. } => {
                ItemRequirement::NonFungible(item_requirement.clone())
            }
            Allowance::InsufficientSemiFungible { item_requirement, .. } => {
                ItemRequirement::SemiFungible(item_requirement.clone())
            }
        }
    }
}

/// Result of one resolver call.
///
/// How `sufficient` is derived from `allowances` differs between resolvers, see the
/// individual resolver functions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemAllowance {
    pub sufficient: bool,
    pub allowances: Vec<Allowance>,
}
