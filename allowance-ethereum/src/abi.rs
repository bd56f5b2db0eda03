use std::str::FromStr;

use alloy::{
    primitives::{Address, U256},
    sol,
    sol_types::SolCall,
};
use num_bigint::BigUint;
use thiserror::Error;

use crate::BigUintCodec;

// Subsets of EIP-20, EIP-721 and EIP-1155 needed to read and grant approvals.
sol! {
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    interface IERC721 {
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function approve(address to, uint256 tokenId) external;
    }

    interface IERC1155 {
        function isApprovedForAll(address account, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Invalid address {address}: {cause}")]
    InvalidAddress { address: String, cause: String },
    #[error("Value {0} does not fit into uint256")]
    Overflow(BigUint),
    #[error("Failed to decode {method} return data: {cause}")]
    Decode { method: &'static str, cause: String },
}

pub fn parse_address(address: &str) -> Result<Address, AbiError> {
    Address::from_str(address).map_err(|e| AbiError::InvalidAddress {
        address: address.to_string(),
        cause: e.to_string(),
    })
}

pub fn to_uint256(value: &BigUint) -> Result<U256, AbiError> {
    U256::from_biguint(value).ok_or_else(|| AbiError::Overflow(value.clone()))
}

pub fn encode_allowance(owner: Address, spender: Address) -> Vec<u8> {
    IERC20::allowanceCall { owner, spender }.abi_encode()
}

pub fn decode_allowance(data: &[u8]) -> Result<U256, AbiError> {
    IERC20::allowanceCall::abi_decode_returns(data).map_err(|e| AbiError::Decode {
        method: IERC20::allowanceCall::SIGNATURE,
        cause: e.to_string(),
    })
}

/// `isApprovedForAll` shares its signature between ERC721 and ERC1155.
pub fn encode_is_approved_for_all(owner: Address, operator: Address) -> Vec<u8> {
    IERC721::isApprovedForAllCall { owner, operator }.abi_encode()
}

pub fn decode_is_approved_for_all(data: &[u8]) -> Result<bool, AbiError> {
    IERC721::isApprovedForAllCall::abi_decode_returns(data).map_err(|e| AbiError::Decode {
        method: IERC721::isApprovedForAllCall::SIGNATURE,
        cause: e.to_string(),
    })
}

pub fn encode_get_approved(token_id: U256) -> Vec<u8> {
    IERC721::getApprovedCall { tokenId: token_id }.abi_encode()
}

pub fn decode_get_approved(data: &[u8]) -> Result<Address, AbiError> {
    IERC721::getApprovedCall::abi_decode_returns(data).map_err(|e| AbiError::Decode {
        method: IERC721::getApprovedCall::SIGNATURE,
        cause: e.to_string(),
    })
}

/// Encode ERC20 `approve(address,uint256)`
pub fn encode_erc20_approve(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

/// Encode ERC721 `approve(address,uint256)`
pub fn encode_erc721_approve(to: Address, token_id: U256) -> Vec<u8> {
    IERC721::approveCall { to, tokenId: token_id }.abi_encode()
}

/// Encode `setApprovalForAll(address,bool)`
pub fn encode_set_approval_for_all(operator: Address, approved: bool) -> Vec<u8> {
    IERC1155::setApprovalForAllCall { operator, approved }.abi_encode()
}
