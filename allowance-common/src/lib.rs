//! Resolves whether an owner has authorized a spender to move the assets a pending operation
//! needs, and budgets the fees for the authorizations that are still missing.
//!
//! The engine is chain agnostic: on-chain reads and transaction encoding are delegated to the
//! [`traits::ChainReader`] and [`traits::ApprovalTransactionBuilder`] collaborators.
#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod aggregator;
pub mod errors;
pub mod fee_budget;
pub mod models;
pub mod resolver;
pub mod serde_primitives;
pub mod traits;

pub use aggregator::{aggregate, collect_insufficient, insufficient_entries};
pub use errors::{AllowanceError, FeeBudgetError, ResolutionError};
pub use fee_budget::calculate_fee_budget;
pub use resolver::{ApprovalPlan, ApprovalResolver};
