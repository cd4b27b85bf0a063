//! "Tip the bot": Lightning address → LNURL-pay metadata → BOLT11 invoice.
//!
//! Entirely outside the retrieval pipeline; a thin client over two HTTP GETs.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

const SERVICE: &str = "lightning";

/// A `user@host` Lightning address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightningAddress {
    pub user: String,
    pub host: String,
}

impl LightningAddress {
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        match address.split_once('@') {
            Some((user, host)) if !user.is_empty() && !host.is_empty() && !host.contains('@') => {
                Ok(Self {
                    user: user.to_string(),
                    host: host.to_string(),
                })
            }
            _ => Err(Error::invalid(format!(
                "not a lightning address (expected user@host): {address}"
            ))),
        }
    }

    /// LNURL-pay discovery URL for this address.
    pub fn well_known_url(&self) -> String {
        format!("https://{}/.well-known/lnurlp/{}", self.host, self.user)
    }
}

impl std::fmt::Display for LightningAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user, self.host)
    }
}

/// LNURL-pay parameters served at the well-known URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LnurlPayData {
    pub tag: String,
    pub callback: String,
    /// Millisatoshis.
    pub min_sendable: u64,
    /// Millisatoshis.
    pub max_sendable: u64,
    pub metadata: String,
    #[serde(default)]
    pub comment_allowed: Option<u32>,
    #[serde(default)]
    pub allows_nostr: Option<bool>,
    #[serde(default)]
    pub nostr_pubkey: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessAction {
    pub tag: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Invoice returned by the LNURL-pay callback.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightningInvoice {
    /// BOLT11 payment request.
    pub pr: String,
    #[serde(default)]
    pub verify: Option<String>,
    #[serde(default)]
    pub success_action: Option<SuccessAction>,
    #[serde(default)]
    pub routes: Vec<serde_json::Value>,
}

/// LNURL error envelope: `{"status": "ERROR", "reason": "..."}`.
#[derive(Debug, Deserialize)]
struct LnurlError {
    status: String,
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LnurlReply<T> {
    Failure(LnurlError),
    Success(T),
}

pub struct LightningClient {
    client: reqwest::Client,
}

impl LightningClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::upstream(SERVICE, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub async fn fetch_pay_data(&self, address: &LightningAddress) -> Result<LnurlPayData> {
        let data: LnurlPayData = self.get_json(&address.well_known_url()).await?;
        if data.tag != "payRequest" {
            return Err(Error::upstream(
                SERVICE,
                format!("unexpected LNURL tag {:?}, expected payRequest", data.tag),
            ));
        }
        Ok(data)
    }

    pub async fn request_invoice(&self, pay_data: &LnurlPayData, amount_msat: u64) -> Result<LightningInvoice> {
        let url = invoice_url(pay_data, amount_msat)?;
        let invoice: LightningInvoice = self.get_json(&url).await?;
        tracing::info!(amount_msat, "lightning invoice issued");
        Ok(invoice)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("error reading response: {e}")))?;
        if !status.is_success() {
            return Err(Error::upstream(SERVICE, format!("HTTP {status}: {}", body.trim())));
        }
        parse_reply(&body)
    }
}

fn parse_reply<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    let reply: LnurlReply<T> = serde_json::from_str(body)
        .map_err(|e| Error::upstream(SERVICE, format!("malformed LNURL response: {e}")))?;
    match reply {
        LnurlReply::Success(value) => Ok(value),
        LnurlReply::Failure(err) => Err(Error::upstream(
            SERVICE,
            format!("{}: {}", err.status, err.reason),
        )),
    }
}

/// Callback URL for an invoice of `amount_msat`, validated against the
/// sendable range.
pub fn invoice_url(pay_data: &LnurlPayData, amount_msat: u64) -> Result<String> {
    if amount_msat < pay_data.min_sendable || amount_msat > pay_data.max_sendable {
        return Err(Error::invalid(format!(
            "amount {amount_msat} msat outside sendable range {}..={}",
            pay_data.min_sendable, pay_data.max_sendable
        )));
    }
    let separator = if pay_data.callback.contains('?') { '&' } else { '?' };
    Ok(format!("{}{separator}amount={amount_msat}", pay_data.callback))
}
