//! Shared test constants for allowance-ethereum tests.

// Ethereum mainnet contracts
pub const DAI_STR: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
pub const USDC_STR: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const BAYC_STR: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";
pub const OPENSEA_CONDUIT_STR: &str = "0x1e0049783f008a0085193e00003d00cd54003c71";

pub const OWNER_STR: &str = "0x00000000000000000000000000000000000000aa";

/// Wraps `result` into a JSON-RPC success response.
pub fn rpc_result(result: &str) -> String {
    format!(r#"{{"jsonrpc":"2.0","id":0,"result":"{result}"}}"#)
}

/// Left pads `hex` (without `0x`) to a 32 byte ABI word.
pub fn abi_word(hex: &str) -> String {
    format!("0x{hex:0>64}")
}
