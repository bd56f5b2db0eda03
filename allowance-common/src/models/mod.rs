pub mod allowance;
pub mod gas;
pub mod item;
pub mod transaction;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub use allowance::{Allowance, ItemAllowance};
pub use gas::GasPrice;
pub use item::{
    FungibleRequirement, ItemRequirement, NativeRequirement, NonFungibleRequirement,
    SemiFungibleRequirement,
};
pub use transaction::{FulfillmentDescriptor, GasToken, PopulatedTransaction};

/// Hex encoded account or contract address, e.g. `0x6b17...1d0f`.
///
/// Addresses are kept as received from the caller; the chain specific collaborators are
/// responsible for parsing them.
pub type Address = String;

/// The authorization model an item falls under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssetKind {
    Native,
    Fungible,
    NonFungible,
    SemiFungible,
}

/// Compares two hex addresses ignoring the checksum casing.
pub(crate) fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
