//! JSON-RPC client over HTTP.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    AccountInfo, Commitment, LatestBlockhash, RpcClient, SignatureStatus, TokenAmount,
    DEVNET_RPC_URL,
};
use crate::error::{FaucetError, Result};
use crate::pubkey::{Pubkey, Signature};
use crate::transaction::Transaction;

/// Cluster client speaking JSON-RPC 2.0 over `reqwest`.
pub struct HttpRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    commitment: Commitment,
}

impl HttpRpcClient {
    pub fn new(rpc_url: &str, commitment: Commitment) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            rpc_url: rpc_url.to_string(),
            commitment,
        }
    }

    /// Client for Devnet at `confirmed` commitment.
    pub fn devnet() -> Self {
        Self::new(DEVNET_RPC_URL, Commitment::Confirmed)
    }

    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    /// Issue one JSON-RPC call and return its `result` field.
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!(method, url = %self.rpc_url, "rpc request");

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FaucetError::Network {
                reason: format!("{} request failed: {}", method, e),
            })?;

        let mut body: Value = response.json().await.map_err(|e| FaucetError::Network {
            reason: format!("Failed to parse {} response: {}", method, e),
        })?;

        if let Some(error) = body.get_mut("error").map(Value::take) {
            return Err(rpc_error(error));
        }

        body.get_mut("result")
            .map(Value::take)
            .ok_or_else(|| FaucetError::Network {
                reason: format!("Invalid {} response: missing result", method),
            })
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.commitment.as_str() })
    }
}

/// Convert a JSON-RPC error object, appending program logs to the message so
/// program error text stays visible to callers.
fn rpc_error(error: Value) -> FaucetError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
    let mut message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown RPC error")
        .to_string();

    let data = error.get("data").cloned().filter(|d| !d.is_null());
    if let Some(logs) = data.as_ref().and_then(|d| d.get("logs")).and_then(Value::as_array) {
        for line in logs.iter().filter_map(Value::as_str) {
            message.push('\n');
            message.push_str(line);
        }
    }

    FaucetError::Rpc { code, message, data }
}

fn parse_pubkey(value: Option<&Value>, field: &str) -> Result<Pubkey> {
    value
        .and_then(Value::as_str)
        .ok_or_else(|| FaucetError::Network {
            reason: format!("Invalid response: missing {}", field),
        })?
        .parse()
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    async fn get_account_info(&self, address: &Pubkey) -> Result<Option<AccountInfo>> {
        let result = self
            .call(
                "getAccountInfo",
                json!([
                    address.to_string(),
                    {
                        "commitment": self.commitment.as_str(),
                        "encoding": "base64",
                        "dataSlice": { "offset": 0, "length": 0 },
                    }
                ]),
            )
            .await?;

        let value = match result.get("value") {
            Some(v) if !v.is_null() => v,
            _ => return Ok(None),
        };

        Ok(Some(AccountInfo {
            lamports: value.get("lamports").and_then(Value::as_u64).unwrap_or_default(),
            owner: parse_pubkey(value.get("owner"), "owner")?,
            executable: value.get("executable").and_then(Value::as_bool).unwrap_or_default(),
        }))
    }

    async fn get_token_account_balance(&self, address: &Pubkey) -> Result<TokenAmount> {
        let result = self
            .call(
                "getTokenAccountBalance",
                json!([address.to_string(), self.commitment_config()]),
            )
            .await?;

        let value = result.get("value").cloned().ok_or_else(|| FaucetError::Network {
            reason: "Invalid token balance response".to_string(),
        })?;
        serde_json::from_value(value).map_err(|e| FaucetError::Network {
            reason: format!("Failed to parse token balance: {}", e),
        })
    }

    async fn get_latest_blockhash(&self) -> Result<LatestBlockhash> {
        let result = self
            .call("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;

        let value = result.get("value").ok_or_else(|| FaucetError::Network {
            reason: "Invalid blockhash response".to_string(),
        })?;
        let blockhash = value
            .get("blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| FaucetError::Network {
                reason: "Invalid blockhash response: missing blockhash".to_string(),
            })?
            .parse()?;
        let last_valid_block_height = value
            .get("lastValidBlockHeight")
            .and_then(Value::as_u64)
            .ok_or_else(|| FaucetError::Network {
                reason: "Invalid blockhash response: missing lastValidBlockHeight".to_string(),
            })?;

        Ok(LatestBlockhash { blockhash, last_valid_block_height })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature> {
        let encoded = tx.to_base58()?;
        let result = self
            .call(
                "sendTransaction",
                json!([
                    encoded,
                    {
                        "encoding": "base58",
                        "preflightCommitment": self.commitment.as_str(),
                    }
                ]),
            )
            .await?;

        result
            .as_str()
            .ok_or_else(|| FaucetError::Network {
                reason: "Invalid sendTransaction response".to_string(),
            })?
            .parse()
    }

    async fn get_signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>> {
        let result = self
            .call("getSignatureStatuses", json!([[signature.to_string()]]))
            .await?;

        let status = match result
            .get("value")
            .and_then(Value::as_array)
            .and_then(|statuses| statuses.first())
        {
            Some(s) if !s.is_null() => s,
            _ => return Ok(None),
        };

        let confirmation_status = status
            .get("confirmationStatus")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());

        Ok(Some(SignatureStatus {
            slot: status.get("slot").and_then(Value::as_u64).unwrap_or_default(),
            confirmation_status,
            err: status.get("err").cloned().filter(|e| !e.is_null()),
        }))
    }

    async fn get_block_height(&self) -> Result<u64> {
        self.call("getBlockHeight", json!([self.commitment_config()]))
            .await?
            .as_u64()
            .ok_or_else(|| FaucetError::Network {
                reason: "Invalid block height response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpRpcClient::new("http://localhost:8899", Commitment::Finalized);
        assert_eq!(client.url(), "http://localhost:8899");
        assert_eq!(HttpRpcClient::devnet().url(), DEVNET_RPC_URL);
    }

    #[test]
    fn test_rpc_error_keeps_program_logs() {
        let error = json!({
            "code": -32002,
            "message": "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1770",
            "data": {
                "err": { "InstructionError": [0, { "Custom": 6000 }] },
                "logs": [
                    "Program ZBRsgBJ3YzdRUi8UFquwxUhxd8VqpicaHKFa4hBHHGf invoke [1]",
                    "Program log: AnchorError occurred. Error Code: CooldownNotElapsed."
                ]
            }
        });

        match rpc_error(error) {
            FaucetError::Rpc { code, message, data } => {
                assert_eq!(code, -32002);
                assert!(message.starts_with("Transaction simulation failed"));
                assert!(message.contains("CooldownNotElapsed"));
                assert!(data.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
