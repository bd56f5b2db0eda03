use allowance_common::models::{FulfillmentDescriptor, ItemRequirement};
use allowance_ethereum::RPCRetryConfig;
use alloy::rpc::types::BlockNumberOrTag;
use clap::{Args, Parser, Subcommand};

/// Resolves the approvals and fee budget an owner needs before an on chain operation.
#[derive(Parser, PartialEq, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    global_args: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn args(&self) -> GlobalArgs {
        self.global_args.clone()
    }

    pub fn command(&self) -> Command {
        self.command.clone()
    }
}

#[derive(Subcommand, Clone, PartialEq, Debug)]
pub enum Command {
    /// Checks the allowances of a set of items and prints the approval plan as JSON.
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// The RPC URL to connect to the Ethereum node
    #[clap(env = "RPC_URL", long, hide_env_values = true)]
    pub rpc_url: String,

    /// Maximum number of retries of a transient RPC failure
    #[clap(long, default_value = "3")]
    pub max_retries: usize,

    /// Backoff before the first retry, in milliseconds
    #[clap(long, default_value = "100")]
    pub initial_backoff_ms: u64,

    /// Upper bound of the backoff between retries, in milliseconds
    #[clap(long, default_value = "5000")]
    pub max_backoff_ms: u64,
}

impl GlobalArgs {
    pub fn retry_config(&self) -> RPCRetryConfig {
        RPCRetryConfig::new(self.max_retries, self.initial_backoff_ms, self.max_backoff_ms)
    }
}

/// Parsed from a single JSON argument rather than one value per flag.
pub type Items = Vec<ItemRequirement>;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    /// Address of the account whose allowances are checked
    #[clap(long)]
    pub owner: String,

    /// JSON array of item requirements
    #[clap(long, value_parser = parse_items)]
    pub items: Items,

    /// JSON fulfillment descriptor. Defaults to a native gas budget with a zero limit.
    #[clap(long, value_parser = parse_fulfillment)]
    pub fulfillment: Option<FulfillmentDescriptor>,

    /// Block number to read approvals at. Defaults to the latest block.
    #[clap(long)]
    pub block: Option<u64>,
}

impl CheckArgs {
    pub fn block(&self) -> BlockNumberOrTag {
        self.block
            .map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number)
    }
}

fn parse_items(s: &str) -> Result<Vec<ItemRequirement>, String> {
    serde_json::from_str(s).map_err(|e| format!("Invalid items JSON: {e}"))
}

fn parse_fulfillment(s: &str) -> Result<FulfillmentDescriptor, String> {
    serde_json::from_str(s).map_err(|e| format!("Invalid fulfillment JSON: {e}"))
}
