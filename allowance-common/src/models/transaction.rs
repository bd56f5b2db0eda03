use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::Address;
use crate::serde_primitives::hex_bytes;

/// A fully encoded transaction. The signer only needs to sign and submit it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PopulatedTransaction {
    pub from: Option<Address>,
    pub to: Address,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub value: Option<BigUint>,
}

impl PopulatedTransaction {
    pub fn new(to: &str, data: Vec<u8>) -> Self {
        Self { from: None, to: to.to_string(), data, value: None }
    }

    pub fn with_from(mut self, from: &str) -> Self {
        self.from = Some(from.to_string());
        self
    }
}

/// The currency, and gas limit, the main operation's fee is budgeted in.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GasToken {
    Native {
        #[serde_as(as = "DisplayFromStr")]
        limit: BigUint,
    },
    Fungible {
        #[serde_as(as = "DisplayFromStr")]
        limit: BigUint,
        contract_address: Address,
    },
}

/// Describes the main operation whose fee has to be budgeted next to the approvals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FulfillmentDescriptor {
    /// A concrete transaction whose gas is estimated on chain.
    Transaction { transaction: PopulatedTransaction },
    /// A fixed gas limit priced at the current gas price instead of an estimate.
    GasBudget { gas_token: GasToken },
}
