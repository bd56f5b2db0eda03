use allowance_common::{
    models::{FulfillmentDescriptor, GasToken},
    ApprovalResolver,
};
use allowance_ethereum::{EthereumRpcClient, EvmApprovalBuilder};
use anyhow::{anyhow, Context};
use clap::Parser;
use num_bigint::BigUint;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{CheckArgs, Cli, Command, GlobalArgs};

fn main() -> Result<(), anyhow::Error> {
    let cli: Cli = Cli::parse();
    let global_args = cli.args();

    match cli.command() {
        Command::Check(check_args) => run_check(global_args, check_args)?,
    };
    Ok(())
}

fn create_tracing_subscriber() {
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .with_target(false)
        .compact();
    tracing_subscriber::fmt()
        .event_format(format)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn run_check(global_args: GlobalArgs, check_args: CheckArgs) -> Result<(), anyhow::Error> {
    create_tracing_subscriber();

    let client = EthereumRpcClient::new(&global_args.rpc_url)
        .map_err(|e| anyhow!("Failed to create RPC client: {e}"))?
        .with_retry(global_args.retry_config())
        .with_block(check_args.block());
    info!(url = client.get_url(), block = %client.get_block(), "Checking allowances");

    let fulfillment = check_args
        .fulfillment
        .unwrap_or(FulfillmentDescriptor::GasBudget {
            gas_token: GasToken::Native { limit: BigUint::from(0u64) },
        });

    let plan = ApprovalResolver::new(client, EvmApprovalBuilder::new())
        .resolve(&check_args.owner, &check_args.items, &fulfillment)
        .await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&plan).context("Failed to serialize approval plan")?
    );
    Ok(())
}
