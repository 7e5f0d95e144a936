use crate::error::Error;
use reqwest::Client;
use sensitive_url::SensitiveUrl;
use serde::Deserialize;
use serde_json::{json, Value};

/// JSON-RPC access to the execution-layer node pair, used only to compute
/// `ExecutionRewards` (the fee-recipient's balance delta across a block).
/// Spec §9 open question 3 flags the teacher's placeholder implementation
/// as a required pre-port deliverable; this is the completed version.
#[derive(Clone)]
pub struct ExecutionClient {
    http: Client,
    url: SensitiveUrl,
    backup_url: Option<SensitiveUrl>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    miner: String,
}

impl ExecutionClient {
    pub fn new(url: SensitiveUrl, backup_url: Option<SensitiveUrl>) -> Self {
        Self {
            http: Client::new(),
            url,
            backup_url,
        }
    }

    async fn rpc<T: for<'de> Deserialize<'de>>(&self, method: &str, params: Value) -> Result<T, Error> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let urls = std::iter::once(self.url.full()).chain(self.backup_url.as_ref().map(|u| u.full()));
        let mut last_err = Error::RequestFailed("execution RPC: no endpoints configured".to_string());
        for endpoint in urls {
            match self.try_rpc::<T>(endpoint, &body).await {
                Ok(value) => return Ok(value),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    async fn try_rpc<T: for<'de> Deserialize<'de>>(&self, endpoint: url::Url, body: &Value) -> Result<T, Error> {
        let resp = self.http.post(endpoint).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(Error::UnexpectedStatus(resp.status()));
        }
        let parsed: RpcResponse<T> = resp.json().await?;
        if let Some(err) = parsed.error {
            return Err(Error::RequestFailed(err.message));
        }
        parsed
            .result
            .ok_or_else(|| Error::RequestFailed("execution RPC: missing result".to_string()))
    }

    /// Fee recipient (`address`) of block `block_number`.
    pub async fn fee_recipient(&self, block_number: u64) -> Result<String, Error> {
        let params = json!([format!("0x{block_number:x}"), false]);
        let header: BlockHeader = self.rpc("eth_getBlockByNumber", params).await?;
        Ok(header.miner)
    }

    /// Balance of `address` at `block_number`, in wei.
    pub async fn balance_at(&self, address: &str, block_number: u64) -> Result<u128, Error> {
        let params = json!([address, format!("0x{block_number:x}")]);
        let hex: String = self.rpc("eth_getBalance", params).await?;
        u128::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|e| Error::RequestFailed(format!("invalid balance hex: {e}")))
    }

    /// The fee-recipient's execution reward for a block: its balance delta
    /// across the block (balance after minus balance before), per spec
    /// §4.5.5 "executionRewards".
    pub async fn block_execution_reward(&self, block_number: u64) -> Result<(String, u128), Error> {
        let address = self.fee_recipient(block_number).await?;
        let before = self.balance_at(&address, block_number.saturating_sub(1)).await?;
        let after = self.balance_at(&address, block_number).await?;
        Ok((address, after.saturating_sub(before)))
    }
}
