//! Per token standard allowance resolvers.
//!
//! Every resolver filters the mixed item list down to its own standard, issues one read per
//! distinct key concurrently, joins them, and then maps each item back to its outcome in input
//! order by looking up the key in the per-call result map.
pub mod fungible;
pub mod non_fungible;
pub mod semi_fungible;

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    hash::Hash,
};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub use fungible::resolve_fungible;
pub use non_fungible::resolve_non_fungible;
pub use semi_fungible::resolve_semi_fungible;

use crate::{
    aggregator::insufficient_entries,
    errors::{AllowanceError, ResolutionError},
    fee_budget::calculate_fee_budget,
    models::{Allowance, FulfillmentDescriptor, ItemAllowance, ItemRequirement},
    traits::{ApprovalTransactionBuilder, ChainReader},
};

/// Everything the owner still has to sign and fund before the operation can go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPlan {
    /// Insufficient allowances, each carrying the transaction that grants it.
    pub allowances: Vec<Allowance>,
    /// Additional funds needed for the approvals and the operation itself, if any.
    pub fee: Option<ItemRequirement>,
}

/// Runs the resolvers and the fee budget against a shared reader and transaction builder.
#[derive(Debug, Clone)]
pub struct ApprovalResolver<R, B> {
    reader: R,
    builder: B,
}

impl<R, B> ApprovalResolver<R, B>
where
    R: ChainReader,
    B: ApprovalTransactionBuilder,
{
    pub fn new(reader: R, builder: B) -> Self {
        Self { reader, builder }
    }

    pub async fn resolve_fungible(
        &self,
        owner: &str,
        items: &[ItemRequirement],
    ) -> Result<ItemAllowance, AllowanceError> {
        resolve_fungible(&self.reader, &self.builder, owner, items).await
    }

    pub async fn resolve_non_fungible(
        &self,
        owner: &str,
        items: &[ItemRequirement],
    ) -> Result<ItemAllowance, AllowanceError> {
        resolve_non_fungible(&self.reader, &self.builder, owner, items).await
    }

    pub async fn resolve_semi_fungible(
        &self,
        owner: &str,
        items: &[ItemRequirement],
    ) -> Result<ItemAllowance, AllowanceError> {
        resolve_semi_fungible(&self.reader, &self.builder, owner, items).await
    }

    /// Resolves all three standards concurrently, collects every insufficient allowance
    /// (fungible, then non-fungible, then semi-fungible) and budgets their fees together with
    /// the main operation.
    ///
    /// Unlike [`crate::aggregate`], the per standard `sufficient` flags are not consulted.
    #[instrument(level = "info", skip(self, items, fulfillment), fields(items = items.len()))]
    pub async fn resolve(
        &self,
        owner: &str,
        items: &[ItemRequirement],
        fulfillment: &FulfillmentDescriptor,
    ) -> Result<ApprovalPlan, ResolutionError> {
        let (fungible, non_fungible, semi_fungible) = futures::try_join!(
            self.resolve_fungible(owner, items),
            self.resolve_non_fungible(owner, items),
            self.resolve_semi_fungible(owner, items),
        )?;

        let allowances = insufficient_entries([&fungible, &non_fungible, &semi_fungible]);
        let fee = calculate_fee_budget(&self.reader, &allowances, fulfillment).await?;

        info!(insufficient = allowances.len(), fee = ?fee, "Resolved approval plan");
        Ok(ApprovalPlan { allowances, fee })
    }
}

/// Keeps the first item seen for every distinct key, in first-encounter order.
pub(crate) fn first_by_key<T, K, F>(items: impl IntoIterator<Item = T>, key_fn: F) -> Vec<(K, T)>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter_map(|item| {
            let key = key_fn(&item);
            seen.insert(key.clone())
                .then_some((key, item))
        })
        .collect()
}

/// Runs `fetch` once per entry, all concurrently, and maps the results back to their keys.
///
/// Fails as soon as one fetch fails; the remaining in-flight fetches are dropped.
pub(crate) async fn fetch_by_key<K, T, V, F, Fut>(
    entries: Vec<(K, T)>,
    fetch: F,
) -> Result<HashMap<K, V>, AllowanceError>
where
    K: Eq + Hash,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<V, AllowanceError>>,
{
    let tasks = entries
        .into_iter()
        .map(|(key, first)| {
            let task = fetch(first);
            async move { task.await.map(|value| (key, value)) }
        });

    Ok(try_join_all(tasks)
        .await?
        .into_iter()
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use mockall::predicate::eq;
    use num_bigint::BigUint;

    use super::*;
    use crate::{
        models::{
            FungibleRequirement, GasToken, NativeRequirement, NonFungibleRequirement,
            PopulatedTransaction, SemiFungibleRequirement,
        },
        traits::{MockApprovalTransactionBuilder, MockChainReader},
    };

    pub(crate) const OWNER: &str = "0x00000000000000000000000000000000000000aa";
    pub(crate) const SPENDER: &str = "0x00000000000000adc04c56bf30ac9d3c0aaf14dc";
    pub(crate) const OTHER_SPENDER: &str = "0x1e0049783f008a0085193e00003d00cd54003c71";
    pub(crate) const TOKEN: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
    pub(crate) const OTHER_TOKEN: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
    pub(crate) const COLLECTION: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";
    pub(crate) const OTHER_COLLECTION: &str = "0x60e4d786628fea6478f785a6d7e704777c86a7c6";

    /// Builder mock returning a transaction to `contract` whose data is the method tag followed
    /// by the low byte of the argument, enough to tell transactions apart in assertions.
    pub(crate) fn echo_builder() -> MockApprovalTransactionBuilder {
        let mut builder = MockApprovalTransactionBuilder::new();
        builder
            .expect_approve_amount()
            .returning(|contract, _, amount| {
                Ok(PopulatedTransaction::new(contract, approval_data(0x20, amount)))
            });
        builder
            .expect_approve_token()
            .returning(|contract, _, id| {
                Ok(PopulatedTransaction::new(contract, approval_data(0x21, id)))
            });
        builder
            .expect_set_approval_for_all()
            .returning(|contract, _, approved| {
                Ok(PopulatedTransaction::new(contract, vec![0x11, approved as u8]))
            });
        builder
    }

    pub(crate) fn approval_data(tag: u8, value: &BigUint) -> Vec<u8> {
        let mut data = vec![tag];
        data.extend(value.to_bytes_be());
        data
    }

    #[test]
    fn test_first_by_key_keeps_first_encounter_order() {
        let items = vec![("b", 1), ("a", 2), ("b", 3), ("c", 4), ("a", 5)];

        let distinct = first_by_key(items, |(key, _)| *key);

        assert_eq!(distinct, vec![("b", ("b", 1)), ("a", ("a", 2)), ("c", ("c", 4))]);
    }

    #[tokio::test]
    async fn test_fetch_by_key_fails_fast() {
        let entries = vec![(1, 1), (2, 2), (3, 3)];

        let res = fetch_by_key(entries, |value| async move {
            if value == 2 {
                Err(AllowanceError::InvalidIdentifier {
                    id: Some(value.to_string()),
                    contract_address: COLLECTION.to_string(),
                })
            } else {
                Ok(value * 10)
            }
        })
        .await;

        assert!(matches!(res, Err(AllowanceError::InvalidIdentifier { .. })));
    }

    #[tokio::test]
    async fn test_resolve_plan_across_standards() {
        let items = vec![
            ItemRequirement::Native(NativeRequirement::new(BigUint::from(10u64), false)),
            ItemRequirement::Fungible(FungibleRequirement::new(
                TOKEN,
                BigUint::from(5u64),
                SPENDER,
            )),
            ItemRequirement::NonFungible(NonFungibleRequirement::new(
                COLLECTION,
                Some("1"),
                SPENDER,
            )),
            ItemRequirement::SemiFungible(SemiFungibleRequirement::new(
                OTHER_COLLECTION,
                Some("3"),
                BigUint::from(2u64),
                SPENDER,
            )),
        ];

        let mut reader = MockChainReader::new();
        reader
            .expect_allowance()
            .with(eq(TOKEN), eq(OWNER), eq(SPENDER))
            .times(1)
            .returning(|_, _, _| Ok(BigUint::from(3u64)));
        reader
            .expect_is_approved_for_all()
            .times(2)
            .returning(|_, _, _| Ok(false));
        reader
            .expect_approved_address()
            .times(1)
            .returning(|_, _| Ok("0x0000000000000000000000000000000000000000".to_string()));
        reader
            .expect_estimate_gas()
            .times(3)
            .returning(|_| Ok(BigUint::from(50_000u64)));
        reader
            .expect_fee_data()
            .times(1)
            .returning(|| {
                Ok(crate::models::GasPrice::Legacy { gas_price: BigUint::from(10u64) })
            });

        let resolver = ApprovalResolver::new(reader, echo_builder());
        let fulfillment = FulfillmentDescriptor::GasBudget {
            gas_token: GasToken::Native { limit: BigUint::from(1_000u64) },
        };

        let plan = resolver
            .resolve(OWNER, &items, &fulfillment)
            .await
            .unwrap();

        let kinds = plan
            .allowances
            .iter()
            .map(|allowance| allowance.item_requirement().kind())
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                crate::models::AssetKind::Fungible,
                crate::models::AssetKind::NonFungible,
                crate::models::AssetKind::SemiFungible,
            ]
        );
        assert_eq!(
            plan.fee,
            Some(ItemRequirement::Native(NativeRequirement::new(
                BigUint::from(3 * 50_000u64 + 10 * 1_000u64),
                true
            )))
        );
    }

    #[tokio::test]
    async fn test_resolve_plan_propagates_read_error() {
        let items = vec![ItemRequirement::Fungible(FungibleRequirement::new(
            TOKEN,
            BigUint::from(5u64),
            SPENDER,
        ))];
        let mut reader = MockChainReader::new();
        reader
            .expect_allowance()
            .returning(|_, _, _| Err("connection refused".to_string()));

        let resolver = ApprovalResolver::new(reader, MockApprovalTransactionBuilder::new());
        let fulfillment = FulfillmentDescriptor::Transaction {
            transaction: PopulatedTransaction::new(SPENDER, vec![]),
        };

        let res = resolver
            .resolve(OWNER, &items, &fulfillment)
            .await;

        assert!(matches!(
            res,
            Err(ResolutionError::Allowance(AllowanceError::AllowanceRead { .. }))
        ));
    }

    #[tokio::test]
    async fn test_resolve_plan_keeps_insufficient_item_next_to_sufficient_one() {
        let items = vec![
            ItemRequirement::Fungible(FungibleRequirement::new(
                TOKEN,
                BigUint::from(1u64),
                SPENDER,
            )),
            ItemRequirement::Fungible(FungibleRequirement::new(
                OTHER_TOKEN,
                BigUint::from(10u64),
                SPENDER,
            )),
        ];
        let mut reader = MockChainReader::new();
        reader
            .expect_allowance()
            .times(2)
            .returning(|_, _, _| Ok(BigUint::from(5u64)));
        reader
            .expect_estimate_gas()
            .times(1)
            .returning(|_| Ok(BigUint::from(46_000u64)));

        let resolver = ApprovalResolver::new(reader, echo_builder());
        let fulfillment = FulfillmentDescriptor::GasBudget {
            gas_token: GasToken::Fungible {
                limit: BigUint::from(300_000u64),
                contract_address: TOKEN.to_string(),
            },
        };

        let plan = resolver
            .resolve(OWNER, &items, &fulfillment)
            .await
            .unwrap();

        assert_eq!(
            plan.allowances,
            vec![Allowance::InsufficientFungible {
                delta: BigUint::from(5u64),
                item_requirement: FungibleRequirement::new(
                    OTHER_TOKEN,
                    BigUint::from(10u64),
                    SPENDER
                ),
                approval_transaction: Some(
                    PopulatedTransaction::new(
                        OTHER_TOKEN,
                        approval_data(0x20, &BigUint::from(5u64))
                    )
                    .with_from(OWNER)
                ),
            }]
        );
        assert_eq!(
            plan.fee,
            Some(ItemRequirement::Fungible(FungibleRequirement {
                contract_address: TOKEN.to_string(),
                amount: BigUint::from(46_000u64),
                spender_address: String::new(),
                is_fee: true,
            }))
        );
    }
}
