//! Budgets the fees of the approval transactions and the main operation.
use futures::future::try_join_all;
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, instrument};

use crate::{
    errors::FeeBudgetError,
    models::{
        Allowance, FulfillmentDescriptor, FungibleRequirement, GasToken, ItemRequirement,
        NativeRequirement,
    },
    traits::ChainReader,
};

/// Computes the additional funding needed to pay for `insufficient_items`' approval
/// transactions and the operation described by `fulfillment`.
///
/// Approval transactions are estimated concurrently with the fulfillment cost. A native
/// `GasBudget` is priced as `limit * price_per_gas` instead of being estimated; a fungible one
/// adds nothing on top of the approvals.
///
/// Returns `None` if the total is zero. Otherwise the total is returned as a fee item,
/// in the native currency or, if a fungible gas token is designated, in that token with an
/// empty spender.
#[instrument(level = "debug", skip_all, fields(items = insufficient_items.len()))]
pub async fn calculate_fee_budget<R: ChainReader>(
    reader: &R,
    insufficient_items: &[Allowance],
    fulfillment: &FulfillmentDescriptor,
) -> Result<Option<ItemRequirement>, FeeBudgetError> {
    let approvals = try_join_all(
        insufficient_items
            .iter()
            .filter_map(Allowance::approval_transaction)
            .map(|transaction| async move {
                reader
                    .estimate_gas(transaction)
                    .await
                    .map_err(|e| FeeBudgetError::GasEstimation { cause: e.to_string() })
            }),
    );
    let (approval_estimates, operation_cost) =
        futures::try_join!(approvals, fulfillment_cost(reader, fulfillment))?;

    let total = approval_estimates
        .into_iter()
        .fold(operation_cost, |total, estimate| total + estimate);
    debug!(%total, "Calculated fee budget");

    if total.is_zero() {
        return Ok(None);
    }

    let fee = match fulfillment {
        FulfillmentDescriptor::GasBudget {
            gas_token: GasToken::Fungible { contract_address, .. },
        } => ItemRequirement::Fungible(FungibleRequirement {
            contract_address: contract_address.clone(),
            amount: total,
            spender_address: String::new(),
            is_fee: true,
        }),
        _ => ItemRequirement::Native(NativeRequirement::new(total, true)),
    };
    Ok(Some(fee))
}

async fn fulfillment_cost<R: ChainReader>(
    reader: &R,
    fulfillment: &FulfillmentDescriptor,
) -> Result<BigUint, FeeBudgetError> {
    match fulfillment {
        FulfillmentDescriptor::Transaction { transaction } => reader
            .estimate_gas(transaction)
            .await
            .map_err(|e| FeeBudgetError::GasEstimation { cause: e.to_string() }),
        FulfillmentDescriptor::GasBudget { gas_token: GasToken::Native { limit } } => {
            let fee_data = reader
                .fee_data()
                .await
                .map_err(|e| FeeBudgetError::FeeData { cause: e.to_string() })?;
            Ok(fee_data.price_per_gas() * limit)
        }
        FulfillmentDescriptor::GasBudget { gas_token: GasToken::Fungible { .. } } => {
            Ok(BigUint::zero())
        }
    }
}
