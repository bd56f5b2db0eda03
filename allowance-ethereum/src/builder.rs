use allowance_common::{models::PopulatedTransaction, traits::ApprovalTransactionBuilder};
use async_trait::async_trait;
use num_bigint::BigUint;
use tracing::trace;

use crate::abi::{
    encode_erc20_approve, encode_erc721_approve, encode_set_approval_for_all, parse_address,
    to_uint256, AbiError,
};

/// Encodes approval transactions locally, without touching the chain.
///
/// The returned transactions keep `contract_address` verbatim as `to`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmApprovalBuilder;

impl EvmApprovalBuilder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ApprovalTransactionBuilder for EvmApprovalBuilder {
    type Error = AbiError;

    async fn approve_amount(
        &self,
        contract_address: &str,
        spender: &str,
        amount: &BigUint,
    ) -> Result<PopulatedTransaction, Self::Error> {
        parse_address(contract_address)?;
        let data = encode_erc20_approve(parse_address(spender)?, to_uint256(amount)?);
        trace!(contract_address, spender, %amount, "Encoded ERC20 approval");
        Ok(PopulatedTransaction::new(contract_address, data))
    }

    async fn approve_token(
        &self,
        contract_address: &str,
        spender: &str,
        token_id: &BigUint,
    ) -> Result<PopulatedTransaction, Self::Error> {
        parse_address(contract_address)?;
        let data = encode_erc721_approve(parse_address(spender)?, to_uint256(token_id)?);
        trace!(contract_address, spender, %token_id, "Encoded ERC721 approval");
        Ok(PopulatedTransaction::new(contract_address, data))
    }

    async fn set_approval_for_all(
        &self,
        contract_address: &str,
        operator: &str,
        approved: bool,
    ) -> Result<PopulatedTransaction, Self::Error> {
        parse_address(contract_address)?;
        let data = encode_set_approval_for_all(parse_address(operator)?, approved);
        trace!(contract_address, operator, approved, "Encoded approval for all");
        Ok(PopulatedTransaction::new(contract_address, data))
    }
}
