use futures::future::try_join_all;
use num_bigint::BigUint;
use tracing::{debug, instrument, trace};

use super::{fetch_by_key, first_by_key};
use crate::{
    errors::AllowanceError,
    models::{
        same_address, Allowance, AssetKind, ItemAllowance, ItemRequirement,
        NonFungibleRequirement,
    },
    traits::{ApprovalTransactionBuilder, ChainReader},
};

/// Resolves the approvals of all non-fungible items in `items`.
///
/// Resolution runs in two phases:
/// 1. one `isApprovedForAll` read per distinct `(contract, spender)` pair. Items covered by a
///    collection wide approval are sufficient and are never read individually.
/// 2. one `getApproved` read per distinct `(contract, id)` among the remaining items. Items
///    whose approved address is not their spender get an `approve(spender, id)` transaction
///    sent from `owner`.
///
/// All ids are validated before the first read. The returned `sufficient` flag is true only if
/// no item is insufficient.
#[instrument(level = "debug", skip(reader, builder, items))]
pub async fn resolve_non_fungible<R, B>(
    reader: &R,
    builder: &B,
    owner: &str,
    items: &[ItemRequirement],
) -> Result<ItemAllowance, AllowanceError>
where
    R: ChainReader,
    B: ApprovalTransactionBuilder,
{
    let tokens = items
        .iter()
        .filter_map(ItemRequirement::as_non_fungible)
        .map(|item| item.token_id().map(|id| (item, id)))
        .collect::<Result<Vec<(&NonFungibleRequirement, BigUint)>, _>>()?;

    let collection_reads = first_by_key(tokens.iter().map(|(item, _)| *item), |&item| {
        (item.contract_address.as_str(), item.spender_address.as_str())
    });
    debug!(
        items = tokens.len(),
        reads = collection_reads.len(),
        "Reading non-fungible collection approvals"
    );

    let approved_for_all = fetch_by_key(collection_reads, |item| async move {
        reader
            .is_approved_for_all(&item.contract_address, owner, &item.spender_address)
            .await
            .inspect(|approved| {
                trace!(
                    contract = %item.contract_address,
                    spender = %item.spender_address,
                    approved,
                    "Read collection approval"
                )
            })
            .map_err(|e| AllowanceError::AllowanceRead {
                kind: AssetKind::NonFungible,
                contract_address: item.contract_address.clone(),
                spender_address: Some(item.spender_address.clone()),
                owner_address: Some(owner.to_string()),
                id: None,
                cause: e.to_string(),
            })
    })
    .await?;
    let approved_for_all = &approved_for_all;
    let collection_approved = move |item: &NonFungibleRequirement| -> bool {
        approved_for_all[&(item.contract_address.as_str(), item.spender_address.as_str())]
    };

    let token_reads = first_by_key(
        tokens
            .iter()
            .map(|(item, id)| (*item, id))
            .filter(|&(item, _)| !collection_approved(item)),
        |&(item, id)| (item.contract_address.as_str(), id),
    );
    debug!(reads = token_reads.len(), "Reading non-fungible token approvals");

    let approved_addresses = fetch_by_key(token_reads, |(item, id)| async move {
        reader
            .approved_address(&item.contract_address, id)
            .await
            .inspect(|approved| {
                trace!(contract = %item.contract_address, %id, %approved, "Read token approval")
            })
            .map_err(|e| AllowanceError::AllowanceRead {
                kind: AssetKind::NonFungible,
                contract_address: item.contract_address.clone(),
                spender_address: Some(item.spender_address.clone()),
                owner_address: Some(owner.to_string()),
                id: Some(id.to_string()),
                cause: e.to_string(),
            })
    })
    .await?;
    let approved_addresses = &approved_addresses;

    let allowances = try_join_all(tokens.iter().map(|(item, id)| {
        let item: &NonFungibleRequirement = item;
        async move {
            let sufficient = collection_approved(item) ||
                same_address(
                    &approved_addresses[&(item.contract_address.as_str(), id)],
                    &item.spender_address,
                );
            if sufficient {
                return Ok(Allowance::Sufficient {
                    item_requirement: ItemRequirement::NonFungible(item.clone()),
                });
            }

            let approval_transaction = builder
                .approve_token(&item.contract_address, &item.spender_address, id)
                .await
                .map_err(|e| AllowanceError::ApprovalTransactionBuild {
                    kind: AssetKind::NonFungible,
                    contract_address: item.contract_address.clone(),
                    spender_address: item.spender_address.clone(),
                    owner_address: owner.to_string(),
                    id: Some(id.to_string()),
                    cause: e.to_string(),
                })?
                .with_from(owner);

            Ok::<_, AllowanceError>(Allowance::InsufficientNonFungible {
                item_requirement: item.clone(),
                approval_transaction: Some(approval_transaction),
            })
        }
    }))
    .await?;

    let sufficient = allowances
        .iter()
        .all(Allowance::is_sufficient);
    Ok(ItemAllowance { sufficient, allowances })
}
