//! HTTP client for the ledger service.
//!
//! Builds call bodies for the `/tx/*` endpoints, submits them, and maps
//! ledger error codes back to readable messages.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use wakaf_protocol::types::amount_serde;
use wakaf_protocol::{Address, Amount, MoneyOutRecord, DECIMALS};

use crate::config::Config;
use crate::errors::{CliError, Result};

/// A state-changing ledger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mint {
        to: Address,
        amount: Amount,
    },
    Burn {
        from: Address,
        amount: Amount,
    },
    Transfer {
        to: Address,
        amount: Amount,
    },
    Approve {
        spender: Address,
        amount: Amount,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: Amount,
    },
    TransferOwnership {
        /// `token` or `wakaf`
        target: &'static str,
        new_owner: Address,
    },
    AddNazir {
        nazir: Address,
    },
    RemoveNazir {
        nazir: Address,
    },
    MoneyOut {
        amount: Amount,
        send_to: Address,
        token: Option<Address>,
        reason: String,
    },
}

impl Call {
    /// Endpoint path under the service root.
    pub fn path(&self) -> &'static str {
        match self {
            Call::Mint { .. } => "/tx/mint",
            Call::Burn { .. } => "/tx/burn",
            Call::Transfer { .. } => "/tx/transfer",
            Call::Approve { .. } => "/tx/approve",
            Call::TransferFrom { .. } => "/tx/transfer-from",
            Call::TransferOwnership { .. } => "/tx/transfer-ownership",
            Call::AddNazir { .. } => "/tx/add-nazir",
            Call::RemoveNazir { .. } => "/tx/remove-nazir",
            Call::MoneyOut { .. } => "/tx/money-out",
        }
    }
}

/// Build the JSON body for `call` submitted by `caller`.
///
/// Amounts are sent as decimal strings since they do not fit in a JSON
/// number.
pub fn build_call_body(call: &Call, caller: Address) -> Value {
    let caller = caller.to_string();
    match call {
        Call::Mint { to, amount } | Call::Transfer { to, amount } => json!({
            "caller": caller,
            "to": to.to_string(),
            "amount": amount.to_string(),
        }),
        Call::Burn { from, amount } => json!({
            "caller": caller,
            "from": from.to_string(),
            "amount": amount.to_string(),
        }),
        Call::Approve { spender, amount } => json!({
            "caller": caller,
            "spender": spender.to_string(),
            "amount": amount.to_string(),
        }),
        Call::TransferFrom { from, to, amount } => json!({
            "caller": caller,
            "from": from.to_string(),
            "to": to.to_string(),
            "amount": amount.to_string(),
        }),
        Call::TransferOwnership { target, new_owner } => json!({
            "caller": caller,
            "target": target,
            "new_owner": new_owner.to_string(),
        }),
        Call::AddNazir { nazir } | Call::RemoveNazir { nazir } => json!({
            "caller": caller,
            "nazir": nazir.to_string(),
        }),
        Call::MoneyOut {
            amount,
            send_to,
            token,
            reason,
        } => {
            let mut body = json!({
                "caller": caller,
                "amount": amount.to_string(),
                "send_to": send_to.to_string(),
                "reason": reason,
            });
            if let Some(token) = token {
                body["token"] = json!(token.to_string());
            }
            body
        }
    }
}

/// Readable message for a ledger error code.
pub fn parse_error_code(code: u64) -> &'static str {
    match code {
        1 => "Not authorized for this call",
        2 => "Insufficient token balance",
        3 => "Insufficient allowance",
        4 => "Escrow holds too few tokens for this payout",
        5 => "Record index out of range",
        6 => "Invalid (zero) address",
        7 => "Amount overflow",
        8 => "Contract not found",
        _ => "Unknown ledger error",
    }
}

/// Render a base-unit amount with the token's decimals, e.g. `1.500000`.
pub fn format_units(amount: Amount) -> String {
    let scale = 10u128.pow(u32::from(DECIMALS));
    format!(
        "{}.{:0width$}",
        amount / scale,
        amount % scale,
        width = usize::from(DECIMALS)
    )
}

#[derive(Deserialize)]
struct BalanceBody {
    #[serde(with = "amount_serde")]
    balance: Amount,
}

#[derive(Deserialize)]
struct NazirBody {
    is_nazir: bool,
}

pub struct NodeClient {
    http: Client,
    base_url: String,
}

impl NodeClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CliError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.node_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST `call` and return the block number it was sealed in.
    pub async fn submit_call(&self, call: &Call, caller: Address) -> Result<u64> {
        let url = format!("{}{}", self.base_url, call.path());
        let body = build_call_body(call, caller);
        info!("Submitting {} as {}", call.path(), caller);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CliError::Network(format!("Call submission failed: {e}")))?;

        let json = read_json(response).await?;
        debug!("Submission response: {json}");

        // money-out wraps the receipt next to the new record
        let receipt = json.get("receipt").unwrap_or(&json);
        receipt
            .get("block_number")
            .and_then(Value::as_u64)
            .ok_or_else(|| CliError::Response("No block number in response".to_string()))
    }

    pub async fn balance(&self, address: Address) -> Result<Amount> {
        let body: BalanceBody = self.get(&format!("/balances/{address}")).await?;
        Ok(body.balance)
    }

    pub async fn is_nazir(&self, address: Address) -> Result<bool> {
        let body: NazirBody = self.get(&format!("/nazirs/{address}")).await?;
        Ok(body.is_nazir)
    }

    pub async fn money_out_record(&self, nazir: Address, index: u64) -> Result<MoneyOutRecord> {
        self.get(&format!("/nazirs/{nazir}/money-out/{index}")).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CliError::Network(format!("Query failed: {e}")))?;

        let json = read_json(response).await?;
        serde_json::from_value(json)
            .map_err(|e| CliError::Response(format!("Malformed response from {path}: {e}")))
    }
}

async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let json: Value = response
        .json()
        .await
        .map_err(|e| CliError::Network(format!("Failed to parse response: {e}")))?;

    if status.is_success() {
        return Ok(json);
    }

    let detail = json
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("no detail")
        .to_string();
    match json.get("code").and_then(Value::as_u64) {
        Some(code) if code != 0 => Err(CliError::ContractError(format!(
            "{} (code: {code}): {detail}",
            parse_error_code(code)
        ))),
        _ => Err(CliError::Response(format!("{status}: {detail}"))),
    }
}
