//! Merges resolver results into the flat list of allowances that still need a transaction.
use crate::models::{Allowance, ItemAllowance};

/// Collects the insufficient fungible and non-fungible allowances, fungible first.
///
/// A result flagged `sufficient` is skipped as a whole, even if some of its entries are
/// insufficient. For fungible results the flag is set as soon as one item is sufficient.
pub fn aggregate(fungible: &ItemAllowance, non_fungible: &ItemAllowance) -> Vec<Allowance> {
    collect_insufficient([fungible, non_fungible])
}

/// Same as [`aggregate`] over any number of resolver results, kept in the given order.
pub fn collect_insufficient<'a>(
    results: impl IntoIterator<Item = &'a ItemAllowance>,
) -> Vec<Allowance> {
    results
        .into_iter()
        .filter(|result| !result.sufficient)
        .flat_map(|result| result.allowances.iter())
        .filter(|allowance| !allowance.is_sufficient())
        .cloned()
        .collect()
}

/// Every insufficient entry of `results`, in the given order, whatever their `sufficient` flag.
pub fn insufficient_entries<'a>(
    results: impl IntoIterator<Item = &'a ItemAllowance>,
) -> Vec<Allowance> {
    results
        .into_iter()
        .flat_map(|result| result.allowances.iter())
        .filter(|allowance| !allowance.is_sufficient())
        .cloned()
        .collect()
}
