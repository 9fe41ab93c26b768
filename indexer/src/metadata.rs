use crate::decimal::DEFAULT_DECIMALS;
use async_trait::async_trait;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use serde::Deserialize;
use std::time::Duration;
use swapledger_core::{Error, Result};
use tracing::warn;

pub const DEFAULT_SYMBOL: &str = "UNKNOWN";
pub const DEFAULT_NAME: &str = "Unknown Token";

const SELECTOR_SYMBOL: &str = "0x95d89b41";
const SELECTOR_NAME: &str = "0x06fdde03";
const SELECTOR_DECIMALS: &str = "0x313ce567";

/// Token metadata with per-field defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: i32,
}

/// Raw metadata calls against a token contract. Each call fails
/// independently; the fallback policy lives in [`fetch_token_metadata`].
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    async fn symbol(&self, address: &str) -> Result<String>;
    async fn name(&self, address: &str) -> Result<String>;
    async fn decimals(&self, address: &str) -> Result<i64>;
}

/// Fetch symbol, name and decimals for a token, substituting a default for
/// any field whose remote call fails. Decimals outside [0, 255] fall back to
/// 18. Always succeeds; every fallback is logged.
pub async fn fetch_token_metadata(
    source: &dyn TokenMetadataSource,
    address: &str,
) -> TokenMetadata {
    let (symbol, name, decimals) = futures::join!(
        source.symbol(address),
        source.name(address),
        source.decimals(address),
    );

    let symbol = match symbol {
        Ok(s) => s,
        Err(e) => {
            warn!(token = address, error = %e, "Failed to fetch symbol for token");
            DEFAULT_SYMBOL.to_string()
        }
    };

    let name = match name {
        Ok(n) => n,
        Err(e) => {
            warn!(token = address, error = %e, "Failed to fetch name for token");
            DEFAULT_NAME.to_string()
        }
    };

    let decimals = match decimals {
        Ok(d) if (0..=255).contains(&d) => d as i32,
        Ok(d) => {
            warn!(
                token = address,
                decimals = d,
                "Decimals value out of range, using default of 18"
            );
            DEFAULT_DECIMALS
        }
        Err(e) => {
            warn!(token = address, error = %e, "Failed to fetch decimals for token");
            DEFAULT_DECIMALS
        }
    };

    TokenMetadata {
        symbol,
        name,
        decimals,
    }
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<String>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Reads ERC-20 metadata over JSON-RPC `eth_call`.
pub struct RpcMetadataSource {
    client: reqwest::Client,
    endpoint: String,
}

impl RpcMetadataSource {
    pub fn new(endpoint: String, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    async fn eth_call(&self, to: &str, selector: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": to, "data": selector}, "latest"],
        });

        let response: JsonRpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(Error::Ingest {
                source_name: "rpc".to_string(),
                details: format!("eth_call failed for {}: {} ({})", to, err.message, err.code),
            });
        }

        let result = response.result.ok_or_else(|| Error::Ingest {
            source_name: "rpc".to_string(),
            details: format!("eth_call for {} returned neither result nor error", to),
        })?;

        let stripped = result.strip_prefix("0x").unwrap_or(&result);
        hex::decode(stripped)
            .map_err(|e| Error::Validation(format!("invalid hex in eth_call result: {}", e)))
    }
}

#[async_trait]
impl TokenMetadataSource for RpcMetadataSource {
    async fn symbol(&self, address: &str) -> Result<String> {
        let data = self.eth_call(address, SELECTOR_SYMBOL).await?;
        decode_abi_string(&data)
    }

    async fn name(&self, address: &str) -> Result<String> {
        let data = self.eth_call(address, SELECTOR_NAME).await?;
        decode_abi_string(&data)
    }

    async fn decimals(&self, address: &str) -> Result<i64> {
        let data = self.eth_call(address, SELECTOR_DECIMALS).await?;
        let value = decode_abi_uint(&data)?;
        // Anything beyond i64 is far outside [0, 255]; saturate and let the
        // range check reject it.
        Ok(value.to_i64().unwrap_or(i64::MAX))
    }
}

fn decode_abi_uint(data: &[u8]) -> Result<BigInt> {
    if data.is_empty() {
        return Err(Error::Validation("empty uint return data".to_string()));
    }
    Ok(BigInt::from_bytes_be(Sign::Plus, data))
}

/// Decode a solidity string return value. Standard encoding is
/// offset + length + bytes; some older tokens return a bare bytes32.
fn decode_abi_string(data: &[u8]) -> Result<String> {
    if data.len() == 32 {
        let end = data.iter().position(|&b| b == 0).unwrap_or(32);
        return String::from_utf8(data[..end].to_vec())
            .map_err(|e| Error::Validation(format!("invalid utf-8 in bytes32 string: {}", e)));
    }

    if data.len() < 64 {
        return Err(Error::Validation(format!(
            "string return data too short: {} bytes",
            data.len()
        )));
    }

    let offset = decode_abi_uint(&data[..32])?
        .to_usize()
        .ok_or_else(|| Error::Validation("string offset out of range".to_string()))?;

    let length_end = offset
        .checked_add(32)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::Validation("string offset past end of data".to_string()))?;

    let length = decode_abi_uint(&data[offset..length_end])?
        .to_usize()
        .ok_or_else(|| Error::Validation("string length out of range".to_string()))?;

    let string_end = length_end
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::Validation("string length past end of data".to_string()))?;

    String::from_utf8(data[length_end..string_end].to_vec())
        .map_err(|e| Error::Validation(format!("invalid utf-8 in string: {}", e)))
}
