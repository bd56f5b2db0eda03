use std::time::Duration;

use allowance_common::{
    models::{Address as AddressString, GasPrice, PopulatedTransaction},
    traits::ChainReader,
};
use alloy::{
    primitives::{Address, Bytes, U256},
    rpc::{
        client::{ClientBuilder, ReqwestClient},
        types::{BlockNumberOrTag, TransactionInput, TransactionRequest},
    },
    transports::http::reqwest,
};
use async_trait::async_trait;
use num_bigint::BigUint;
use serde::Deserialize;
use tracing::{debug, instrument, trace};

pub mod config;
pub mod errors;
mod retry;

use crate::{
    abi::{
        decode_allowance, decode_get_approved, decode_is_approved_for_all, encode_allowance,
        encode_get_approved, encode_is_approved_for_all, parse_address, to_uint256,
    },
    rpc::{
        config::RPCRetryConfig,
        errors::{RPCError, RpcResultExt},
        retry::RetryPolicy,
    },
    BigUintCodec,
};

/// This struct wraps the ReqwestClient and provides the Ethereum RPC methods needed to read
/// approvals and budget fees, with retry logic.
/// It is cheap to clone, as the `inner` internally uses an Arc for the ReqwestClient.
#[derive(Clone, Debug)]
pub struct EthereumRpcClient {
    inner: ReqwestClient,
    retry_policy: RetryPolicy,
    /// Block the approval reads are made against.
    block: BlockNumberOrTag,
    url: String,
}

impl EthereumRpcClient {
    /// Creates a new EthereumRpcClient with the given RPC URL.
    ///
    /// Reads target the latest block. Retry: max retries 3, initial backoff 100ms, max backoff
    /// 5000ms.
    pub fn new(rpc_url: &str) -> Result<Self, RPCError> {
        let url = rpc_url
            .parse()
            .map_err(|e| RPCError::SetupError(format!("Invalid RPC URL: {e}")))?;

        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| RPCError::SetupError(format!("Failed to create HTTP client: {e}")))?;

        let rpc = ClientBuilder::default().http_with_client(http_client, url);

        Ok(Self {
            inner: rpc,
            retry_policy: RetryPolicy::default(),
            block: BlockNumberOrTag::Latest,
            url: rpc_url.to_string(),
        })
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_retry_config(&self) -> RPCRetryConfig {
        (&self.retry_policy).into()
    }

    pub fn get_block(&self) -> BlockNumberOrTag {
        self.block
    }

    pub fn with_retry(mut self, retry_config: RPCRetryConfig) -> Self {
        self.retry_policy = retry_config.into();
        self
    }

    pub fn with_block(mut self, block: BlockNumberOrTag) -> Self {
        self.block = block;
        self
    }

    /// Executes a new message call immediately without creating a transaction on the blockchain.
    /// See https://ethereum.org/en/developers/docs/apis/json-rpc/#eth_call
    ///
    /// Returns the output data from the call or an error if the call failed.
    #[instrument(level = "debug", skip(self, data))]
    pub async fn eth_call(&self, to: Address, data: Vec<u8>) -> Result<Bytes, RPCError> {
        let request = TransactionRequest::default()
            .to(to)
            .input(TransactionInput::new(data.into()));
        let block = self.block;

        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_call", (&request, block))
                    .await
            })
            .await
            .with_rpc_context(|| format!("Failed to send an eth_call request to {to} for block {block}"))
    }

    /// Estimates the gas units `request` would consume if it was mined now.
    #[instrument(level = "debug", skip_all)]
    pub async fn eth_estimate_gas(&self, request: &TransactionRequest) -> Result<U256, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_estimateGas", (request,))
                    .await
            })
            .await
            .rpc_context("Failed to estimate gas")
    }

    /// Gets the gas price from the node using eth_gasPrice RPC method.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_gas_price(&self) -> Result<U256, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_gasPrice")
                    .await
            })
            .await
            .rpc_context("Failed to get gas price")
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn get_max_priority_fee_per_gas(&self) -> Result<U256, RPCError> {
        self.retry_policy
            .retry_request(|| async {
                self.inner
                    .request_noparams("eth_maxPriorityFeePerGas")
                    .await
            })
            .await
            .rpc_context("Failed to get max priority fee per gas")
    }

    /// Base fee of the latest block, `None` on chains without EIP-1559.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_latest_base_fee(&self) -> Result<Option<U256>, RPCError> {
        // Only the header field is needed, full blocks don't deserialize on every chain.
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct BlockHeader {
            base_fee_per_gas: Option<U256>,
        }

        let full_tx_objects = false;
        let header: Option<BlockHeader> = self
            .retry_policy
            .retry_request(|| async {
                self.inner
                    .request("eth_getBlockByNumber", (BlockNumberOrTag::Latest, full_tx_objects))
                    .await
            })
            .await
            .rpc_context("Failed to get latest block")?;

        header
            .map(|header| header.base_fee_per_gas)
            .ok_or_else(|| RPCError::InvalidResponse("Latest block not found".to_string()))
    }

    /// Current fee data.
    ///
    /// EIP-1559 chains get `max_fee_per_gas = 2 * base_fee + max_priority_fee`, which stays
    /// valid through six consecutive full blocks. Other chains fall back to `eth_gasPrice`.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_fee_data(&self) -> Result<GasPrice, RPCError> {
        let fee_data = match self.get_latest_base_fee().await? {
            Some(base_fee) => {
                let max_priority_fee_per_gas = self
                    .get_max_priority_fee_per_gas()
                    .await?
                    .to_biguint();
                GasPrice::Eip1559 {
                    max_fee_per_gas: base_fee.to_biguint() * 2u32 + &max_priority_fee_per_gas,
                    max_priority_fee_per_gas,
                }
            }
            None => GasPrice::Legacy {
                gas_price: self
                    .get_gas_price()
                    .await?
                    .to_biguint(),
            },
        };
        debug!(?fee_data, "Fetched fee data");
        Ok(fee_data)
    }
}

fn transaction_request(transaction: &PopulatedTransaction) -> Result<TransactionRequest, RPCError> {
    let mut request = TransactionRequest::default()
        .to(parse_address(&transaction.to)?)
        .input(TransactionInput::new(transaction.data.clone().into()));
    if let Some(from) = &transaction.from {
        request = request.from(parse_address(from)?);
    }
    if let Some(value) = &transaction.value {
        request = request.value(to_uint256(value)?);
    }
    Ok(request)
}

#[async_trait]
impl ChainReader for EthereumRpcClient {
    type Error = RPCError;

    async fn allowance(
        &self,
        contract_address: &str,
        owner: &str,
        spender: &str,
    ) -> Result<BigUint, Self::Error> {
        let data = encode_allowance(parse_address(owner)?, parse_address(spender)?);
        let output = self
            .eth_call(parse_address(contract_address)?, data)
            .await?;
        let allowance = decode_allowance(&output)?;
        trace!(contract_address, owner, spender, %allowance, "Read allowance");
        Ok(allowance.to_biguint())
    }

    async fn is_approved_for_all(
        &self,
        contract_address: &str,
        owner: &str,
        operator: &str,
    ) -> Result<bool, Self::Error> {
        let data = encode_is_approved_for_all(parse_address(owner)?, parse_address(operator)?);
        let output = self
            .eth_call(parse_address(contract_address)?, data)
            .await?;
        Ok(decode_is_approved_for_all(&output)?)
    }

    async fn approved_address(
        &self,
        contract_address: &str,
        token_id: &BigUint,
    ) -> Result<AddressString, Self::Error> {
        let data = encode_get_approved(to_uint256(token_id)?);
        let output = self
            .eth_call(parse_address(contract_address)?, data)
            .await?;
        Ok(decode_get_approved(&output)?.to_string())
    }

    async fn estimate_gas(
        &self,
        transaction: &PopulatedTransaction,
    ) -> Result<BigUint, Self::Error> {
        let gas = self
            .eth_estimate_gas(&transaction_request(transaction)?)
            .await?;
        Ok(gas.to_biguint())
    }

    async fn fee_data(&self) -> Result<GasPrice, Self::Error> {
        self.get_fee_data().await
    }
}
