use futures::future::try_join_all;
use tracing::{debug, instrument, trace};

use super::{fetch_by_key, first_by_key};
use crate::{
    errors::AllowanceError,
    models::{Allowance, AssetKind, ItemAllowance, ItemRequirement, SemiFungibleRequirement},
    traits::{ApprovalTransactionBuilder, ChainReader},
};

/// Resolves the approvals of all semi-fungible items in `items`.
///
/// Only the collection wide approval is considered: an item is sufficient iff its spender is
/// approved for all of `owner`'s tokens. Otherwise a `setApprovalForAll(spender, true)`
/// transaction is built. The returned `sufficient` flag is true if at least one item is
/// sufficient.
#[instrument(level = "debug", skip(reader, builder, items))]
pub async fn resolve_semi_fungible<R, B>(
    reader: &R,
    builder: &B,
    owner: &str,
    items: &[ItemRequirement],
) -> Result<ItemAllowance, AllowanceError>
where
    R: ChainReader,
    B: ApprovalTransactionBuilder,
{
    let semi_fungibles: Vec<&SemiFungibleRequirement> = items
        .iter()
        .filter_map(ItemRequirement::as_semi_fungible)
        .collect();
    // Ids are not part of the read but must still be well formed.
    for item in &semi_fungibles {
        item.token_id()?;
    }

    let reads = first_by_key(semi_fungibles.iter().copied(), |&item| {
        (item.contract_address.as_str(), item.spender_address.as_str())
    });
    debug!(items = semi_fungibles.len(), reads = reads.len(), "Reading semi-fungible approvals");

    let approved_for_all = fetch_by_key(reads, |item| async move {
        reader
            .is_approved_for_all(&item.contract_address, owner, &item.spender_address)
            .await
            .inspect(|approved| {
                trace!(
                    contract = %item.contract_address,
                    spender = %item.spender_address,
                    approved,
                    "Read semi-fungible approval"
                )
            })
            .map_err(|e| AllowanceError::AllowanceRead {
                kind: AssetKind::SemiFungible,
                contract_address: item.contract_address.clone(),
                spender_address: Some(item.spender_address.clone()),
                owner_address: Some(owner.to_string()),
                id: None,
                cause: e.to_string(),
            })
    })
    .await?;
    let approved_for_all = &approved_for_all;

    let allowances = try_join_all(semi_fungibles.iter().map(|&item| async move {
        if approved_for_all[&(item.contract_address.as_str(), item.spender_address.as_str())] {
            return Ok(Allowance::Sufficient {
                item_requirement: ItemRequirement::SemiFungible(item.clone()),
            });
        }

        let approval_transaction = builder
            .set_approval_for_all(&item.contract_address, &item.spender_address, true)
            .await
            .map_err(|e| AllowanceError::ApprovalTransactionBuild {
                kind: AssetKind::SemiFungible,
                contract_address: item.contract_address.clone(),
                spender_address: item.spender_address.clone(),
                owner_address: owner.to_string(),
                id: item.id.clone(),
                cause: e.to_string(),
            })?
            .with_from(owner);

        Ok::<_, AllowanceError>(Allowance::InsufficientSemiFungible {
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
