use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::{Address, AssetKind};
use crate::errors::AllowanceError;

/// An asset the owner must hold, and for token standards also authorize, for an operation to
/// go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemRequirement {
    Native(NativeRequirement),
    Fungible(FungibleRequirement),
    NonFungible(NonFungibleRequirement),
    SemiFungible(SemiFungibleRequirement),
}

impl ItemRequirement {
    pub fn kind(&self) -> AssetKind {
        match self {
            ItemRequirement::Native(_) => AssetKind::Native,
            ItemRequirement::Fungible(_) => AssetKind::Fungible,
            ItemRequirement::NonFungible(_) => AssetKind::NonFungible,
            ItemRequirement::SemiFungible(_) => AssetKind::SemiFungible,
        }
    }

    pub fn as_fungible(&self) -> Option<&FungibleRequirement> {
        match self {
            ItemRequirement::Fungible(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_non_fungible(&self) -> Option<&NonFungibleRequirement> {
        match self {
            ItemRequirement::NonFungible(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_semi_fungible(&self) -> Option<&SemiFungibleRequirement> {
        match self {
            ItemRequirement::SemiFungible(item) => Some(item),
            _ => None,
        }
    }
}

/// An amount of the chain's native currency.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeRequirement {
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigUint,
    /// Whether the amount is meant to pay for fees rather than being moved by the operation.
    pub is_fee: bool,
}

impl NativeRequirement {
    pub fn new(amount: BigUint, is_fee: bool) -> Self {
        Self { amount, is_fee }
    }
}

/// An ERC20 style token amount that `spender_address` must be allowed to move.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleRequirement {
    pub contract_address: Address,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigUint,
    pub spender_address: Address,
    pub is_fee: bool,
}

impl FungibleRequirement {
    pub fn new(contract_address: &str, amount: BigUint, spender_address: &str) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            amount,
            spender_address: spender_address.to_string(),
            is_fee: false,
        }
    }
}

/// A single ERC721 style token that `spender_address` must be allowed to move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFungibleRequirement {
    pub contract_address: Address,
    /// Decimal (or `0x` prefixed hex) token id. Kept as received so malformed ids can be
    /// reported back verbatim.
    pub id: Option<String>,
    pub spender_address: Address,
}

impl NonFungibleRequirement {
    pub fn new(contract_address: &str, id: Option<&str>, spender_address: &str) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            id: id.map(str::to_string),
            spender_address: spender_address.to_string(),
        }
    }

    /// Parses the token id.
    ///
    /// Returns [`AllowanceError::InvalidIdentifier`] for a missing, empty or non numeric id.
    pub fn token_id(&self) -> Result<BigUint, AllowanceError> {
        parse_token_id(self.id.as_deref()).ok_or_else(|| AllowanceError::InvalidIdentifier {
            id: self.id.clone(),
            contract_address: self.contract_address.clone(),
        })
    }
}

/// An ERC1155 style token balance that `spender_address` must be allowed to move.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemiFungibleRequirement {
    pub contract_address: Address,
    pub id: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: BigUint,
    pub spender_address: Address,
}

impl SemiFungibleRequirement {
    pub fn new(
        contract_address: &str,
        id: Option<&str>,
        amount: BigUint,
        spender_address: &str,
    ) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            id: id.map(str::to_string),
            amount,
            spender_address: spender_address.to_string(),
        }
    }

    /// Parses the token id, see [`NonFungibleRequirement::token_id`].
    pub fn token_id(&self) -> Result<BigUint, AllowanceError> {
        parse_token_id(self.id.as_deref()).ok_or_else(|| AllowanceError::InvalidIdentifier {
            id: self.id.clone(),
            contract_address: self.contract_address.clone(),
        })
    }
}

/// Parses a non-negative integer written in decimal or as `0x` prefixed hex.
///
/// Signs, whitespace and digit separators are rejected.
fn parse_token_id(raw: Option<&str>) -> Option<BigUint> {
    let raw = raw?;
    let (digits, radix) = match raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (raw, 10),
    };
    let valid = !digits.is_empty() &&
        digits
            .bytes()
            .all(|b| if radix == 16 { b.is_ascii_hexdigit() } else { b.is_ascii_digit() });
    if !valid {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
}
