//! Hyperliquid exchange client for TWAP placement and cancellation.
//!
//! Exchange actions are authenticated with an L1 signature:
//! - the action is msgpack-encoded, followed by the nonce and a vault flag,
//!   and hashed with keccak256 into a `connectionId`
//! - a phantom `Agent { source, connectionId }` struct is signed as EIP-712
//!   typed data under the fixed `Exchange` domain (chain id 1337)

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::debug;

use crate::mirror::{TradingClient, TwapOrderRequest};

use super::types::{
    ActionStatus, ExchangeAction, ExchangeOk, ExchangePayload, ExchangeResponse, TwapWire,
    WireSignature,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain id of the L1 signing domain; independent of mainnet/testnet.
const L1_SIGNING_CHAIN_ID: u64 = 1337;

/// Maximum decimals the exchange accepts in a size string.
const MAX_WIRE_DECIMALS: u32 = 8;

/// Client that signs and submits TWAP actions for the follower wallet.
pub struct ExchangeClient {
    http: Client,
    signer: PrivateKeySigner,
    base_url: String,
    is_mainnet: bool,
}

impl ExchangeClient {
    /// Create a new exchange client.
    ///
    /// # Arguments
    /// * `private_key` - Follower private key (hex string, with or without 0x prefix)
    /// * `base_url` - API root, e.g. `https://api.hyperliquid.xyz`
    /// * `is_mainnet` - Selects the phantom agent source (`a` mainnet, `b` testnet)
    pub fn new(private_key: &str, base_url: &str, is_mainnet: bool) -> Result<Self> {
        let pk = private_key.strip_prefix("0x").unwrap_or(private_key);
        let signer = PrivateKeySigner::from_str(pk).context("Invalid private key")?;

        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            signer,
            base_url: base_url.trim_end_matches('/').to_string(),
            is_mainnet,
        })
    }

    /// Follower wallet address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Sign and post an action, returning the successful response body.
    async fn post_action(&self, action: ExchangeAction) -> Result<ExchangeOk> {
        let nonce = Utc::now().timestamp_millis() as u64;
        let signature = self.sign_action(&action, nonce).await?;

        let payload = ExchangePayload {
            action: serde_json::to_value(&action).context("Failed to encode action")?,
            nonce,
            signature,
            vault_address: None,
        };

        let url = format!("{}/exchange", self.base_url);
        debug!(url = %url, nonce = nonce, "Posting exchange action");

        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send exchange action")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Exchange request failed: {} - {}", status, text));
        }

        match resp
            .json::<ExchangeResponse>()
            .await
            .context("Failed to parse exchange response")?
        {
            ExchangeResponse::Ok(ok) => Ok(ok),
            ExchangeResponse::Err(msg) => Err(anyhow!("{}", msg)),
        }
    }

    /// Produce the L1 signature for an action.
    async fn sign_action(&self, action: &ExchangeAction, nonce: u64) -> Result<WireSignature> {
        let connection_id = Self::action_hash(action, nonce)?;
        let source = if self.is_mainnet { "a" } else { "b" };

        let struct_hash = Self::agent_struct_hash(source, &connection_id);
        let domain_hash = Self::domain_separator();

        // keccak256("\x19\x01" + domainSeparator + structHash)
        let mut message = vec![0x19, 0x01];
        message.extend_from_slice(&domain_hash);
        message.extend_from_slice(&struct_hash);
        let digest = keccak256(&message);

        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .context("Failed to sign action")?;

        let bytes = signature.as_bytes();
        let v = if bytes[64] < 27 { bytes[64] + 27 } else { bytes[64] };

        Ok(WireSignature {
            r: format!("0x{}", hex::encode(&bytes[..32])),
            s: format!("0x{}", hex::encode(&bytes[32..64])),
            v,
        })
    }

    /// keccak256(msgpack(action) ++ nonce_be ++ 0x00). No vault is used.
    fn action_hash(action: &ExchangeAction, nonce: u64) -> Result<B256> {
        let mut bytes = rmp_serde::to_vec_named(action).context("Failed to msgpack action")?;
        bytes.extend_from_slice(&nonce.to_be_bytes());
        bytes.push(0);
        Ok(keccak256(bytes))
    }

    fn agent_struct_hash(source: &str, connection_id: &B256) -> [u8; 32] {
        let type_hash = keccak256(b"Agent(string source,bytes32 connectionId)");

        let mut encoded = Vec::with_capacity(96);
        encoded.extend_from_slice(type_hash.as_slice());
        encoded.extend_from_slice(keccak256(source.as_bytes()).as_slice());
        encoded.extend_from_slice(connection_id.as_slice());

        keccak256(&encoded).0
    }

    fn domain_separator() -> [u8; 32] {
        let type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );

        let mut encoded = Vec::with_capacity(160);
        encoded.extend_from_slice(type_hash.as_slice());
        encoded.extend_from_slice(keccak256(b"Exchange").as_slice());
        encoded.extend_from_slice(keccak256(b"1").as_slice());
        encoded.extend_from_slice(&U256::from(L1_SIGNING_CHAIN_ID).to_be_bytes::<32>());
        encoded.extend_from_slice(&[0u8; 32]);

        keccak256(&encoded).0
    }

    /// Render a size the way the exchange hashes it: at most 8 decimals, no trailing zeros.
    fn size_to_wire(size: Decimal) -> String {
        let normalized = size.round_dp(MAX_WIRE_DECIMALS).normalize();
        if normalized.is_zero() {
            "0".to_string()
        } else {
            normalized.to_string()
        }
    }
}

#[async_trait]
impl TradingClient for ExchangeClient {
    async fn place_twap(&self, order: &TwapOrderRequest) -> Result<u64> {
        let action = ExchangeAction::TwapOrder {
            twap: TwapWire {
                a: order.asset,
                b: order.is_buy,
                s: Self::size_to_wire(order.size),
                r: order.reduce_only,
                m: order.minutes,
                t: order.randomize,
            },
        };

        let ok = self.post_action(action).await?;
        match ok.data.map(|d| d.status) {
            Some(ActionStatus::Running { running }) => Ok(running.twap_id),
            Some(ActionStatus::Error { error }) => Err(anyhow!("{}", error)),
            other => Err(anyhow!("Unexpected {} status: {:?}", ok.kind, other)),
        }
    }

    async fn cancel_twap(&self, asset: u32, twap_id: u64) -> Result<()> {
        let ok = self
            .post_action(ExchangeAction::TwapCancel { a: asset, t: twap_id })
            .await?;

        match ok.data.map(|d| d.status) {
            Some(ActionStatus::Text(s)) if s == "success" => Ok(()),
            Some(ActionStatus::Error { error }) => Err(anyhow!("{}", error)),
            other => Err(anyhow!("Unexpected {} status: {:?}", ok.kind, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TEST_KEY: &str = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";

    fn cancel_action() -> ExchangeAction {
        ExchangeAction::TwapCancel { a: 10005, t: 77 }
    }

    #[test]
    fn test_size_to_wire() {
        assert_eq!(ExchangeClient::size_to_wire(dec!(5.00)), "5");
        assert_eq!(ExchangeClient::size_to_wire(dec!(0.1230)), "0.123");
        assert_eq!(ExchangeClient::size_to_wire(dec!(1.123456789)), "1.12345679");
        assert_eq!(ExchangeClient::size_to_wire(dec!(0.000)), "0");
    }

    #[test]
    fn test_action_hash_depends_on_nonce() {
        let a = ExchangeClient::action_hash(&cancel_action(), 1).unwrap();
        let b = ExchangeClient::action_hash(&cancel_action(), 1).unwrap();
        let c = ExchangeClient::action_hash(&cancel_action(), 2).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_signature_differs_between_networks() {
        let mainnet = ExchangeClient::new(TEST_KEY, "https://example.invalid", true).unwrap();
        let testnet = ExchangeClient::new(TEST_KEY, "https://example.invalid", false).unwrap();

        let sig_main = mainnet.sign_action(&cancel_action(), 1_700_000_000_000).await.unwrap();
        let sig_test = testnet.sign_action(&cancel_action(), 1_700_000_000_000).await.unwrap();

        assert!(sig_main.v == 27 || sig_main.v == 28);
        assert_eq!(sig_main.r.len(), 66);
        assert!(sig_main.r.starts_with("0x"));
        assert_ne!(sig_main.r, sig_test.r);
    }

    #[test]
    fn test_new_accepts_prefixed_key() {
        let plain = ExchangeClient::new(TEST_KEY, "https://example.invalid/", true).unwrap();
        let prefixed =
            ExchangeClient::new(&format!("0x{}", TEST_KEY), "https://example.invalid", true).unwrap();

        assert_eq!(plain.address(), prefixed.address());
        assert_eq!(plain.base_url, "https://example.invalid");
    }
}
