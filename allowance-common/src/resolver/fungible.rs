use futures::future::try_join_all;
use tracing::{debug, instrument, trace};

use super::{fetch_by_key, first_by_key};
use crate::{
    errors::AllowanceError,
    models::{Allowance, AssetKind, FungibleRequirement, ItemAllowance, ItemRequirement},
    traits::{ApprovalTransactionBuilder, ChainReader},
};

/// Resolves the allowances of all fungible items in `items`.
///
/// One allowance read is issued per distinct `(contract, spender)` pair. Items whose on-chain
/// allowance does not cover the required amount get an approval for exactly the missing delta,
/// sent from `owner`.
///
/// The returned `sufficient` flag is true if at least one fungible item is sufficient.
#[instrument(level = "debug", skip(reader, builder, items))]
pub async fn resolve_fungible<R, B>(
    reader: &R,
    builder: &B,
    owner: &str,
    items: &[ItemRequirement],
) -> Result<ItemAllowance, AllowanceError>
where
    R: ChainReader,
    B: ApprovalTransactionBuilder,
{
    let fungibles: Vec<&FungibleRequirement> = items
        .iter()
        .filter_map(ItemRequirement::as_fungible)
        .collect();

    let reads = first_by_key(fungibles.iter().copied(), |&item| {
        (item.contract_address.as_str(), item.spender_address.as_str())
    });
    debug!(items = fungibles.len(), reads = reads.len(), "Reading fungible allowances");

    let on_chain = fetch_by_key(reads, |item| async move {
        reader
            .allowance(&item.contract_address, owner, &item.spender_address)
            .await
            .inspect(|allowance| {
                trace!(
                    contract = %item.contract_address,
                    spender = %item.spender_address,
                    %allowance,
                    "Read fungible allowance"
                )
            })
            .map_err(|e| AllowanceError::AllowanceRead {
                kind: AssetKind::Fungible,
                contract_address: item.contract_address.clone(),
                spender_address: Some(item.spender_address.clone()),
                owner_address: Some(owner.to_string()),
                id: None,
                cause: e.to_string(),
            })
    })
    .await?;
    let on_chain = &on_chain;

    let allowances = try_join_all(fungibles.iter().map(|&item| async move {
        let current = &on_chain[&(item.contract_address.as_str(), item.spender_address.as_str())];
        if *current >= item.amount {
            return Ok(Allowance::Sufficient {
                item_requirement: ItemRequirement::Fungible(item.clone()),
            });
        }

        let delta = &item.amount - current;
        let approval_transaction = builder
            .approve_amount(&item.contract_address, &item.spender_address, &delta)
            .await
            .map_err(|e| AllowanceError::ApprovalTransactionBuild {
                kind: AssetKind::Fungible,
                contract_address: item.contract_address.clone(),
                spender_address: item.spender_address.clone(),
                owner_address: owner.to_string(),
                id: None,
                cause: e.to_string(),
            })?
            .with_from(owner);

        Ok::<_, AllowanceError>(Allowance::InsufficientFungible {
            delta,
            item_requirement: item.clone(),
            approval_transaction: Some(approval_transaction),
        })
    }))
    .await?;

    let sufficient = allowances
        .iter()
        .any(Allowance::is_sufficient);
    Ok(ItemAllowance { sufficient, allowances })
}
