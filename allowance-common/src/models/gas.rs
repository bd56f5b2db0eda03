use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

/// Per gas price a fee budget is computed with, in wei.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GasPrice {
    /// Chains without a base fee.
    Legacy {
        #[serde_as(as = "DisplayFromStr")]
        gas_price: BigUint,
    },
    Eip1559 {
        /// Cap on base fee plus tip.
        #[serde_as(as = "DisplayFromStr")]
        max_fee_per_gas: BigUint,
        #[serde_as(as = "DisplayFromStr")]
        max_priority_fee_per_gas: BigUint,
    },
}

impl GasPrice {
    /// The worst case price per gas unit: `gas_price`, or `max_fee_per_gas` on EIP-1559 chains.
    pub fn price_per_gas(&self) -> &BigUint {
        match self {
            GasPrice::Legacy { gas_price } => gas_price,
            GasPrice::Eip1559 { max_fee_per_gas, .. } => max_fee_per_gas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_price_per_gas() {
        let gas_price = BigUint::from(50_000_000_000u64); // 50 Gwei
        let legacy = GasPrice::Legacy { gas_price: gas_price.clone() };
        assert_eq!(legacy.price_per_gas(), &gas_price);
    }

    #[test]
    fn test_eip1559_price_per_gas() {
        let max_fee = BigUint::from(62_000_000_000u64); // 62 Gwei
        let priority_fee = BigUint::from(2_000_000_000u64); // 2 Gwei

        let eip1559 = GasPrice::Eip1559 {
            max_fee_per_gas: max_fee.clone(),
            max_priority_fee_per_gas: priority_fee,
        };

        assert_eq!(eip1559.price_per_gas(), &max_fee);
    }

    #[test]
    fn test_serialize_legacy_gas_price() {
        let gas_price = GasPrice::Legacy { gas_price: BigUint::from(50_000_000_000u64) };

        let json = serde_json::to_string(&gas_price).unwrap();
        assert_eq!(json, r#"{"type":"legacy","gas_price":"50000000000"}"#);
    }

    #[test]
    fn test_deserialize_eip1559_gas_price() {
        let json = r#"{"type":"eip1559","max_fee_per_gas":"62000000000","max_priority_fee_per_gas":"2000000000"}"#;
        let gas_price: GasPrice = serde_json::from_str(json).unwrap();

        assert_eq!(
            gas_price,
            GasPrice::Eip1559 {
                max_fee_per_gas: BigUint::from(62_000_000_000u64),
                max_priority_fee_per_gas: BigUint::from(2_000_000_000u64),
            }
        );
    }
}
