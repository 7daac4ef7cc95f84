//! Module for interacting with Tezos node RPC.

use crate::encoding::Address;
use crate::micheline::Micheline;
use crate::tez::Tez;
use num::BigUint;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Generic result of all asynchronous calls in this module.
pub type AResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Node replied with a non-success status.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum RpcError {
    /// HTTP status other than 2xx (and other than 404 where absence is expected).
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, usually a JSON list of node errors
        body: String,
    },
    /// Response payload has unexpected shape.
    Unexpected(String),
}

impl RpcError {
    pub const fn status(&self) -> Option<u16> {
        //! HTTP status code, if this error carries one.
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unexpected(_) => None,
        }
    }
}

impl std::error::Error for RpcError {}
impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status { status, body } => {
                write!(f, "Node responded with status {status}: ")?;
                f.write_str(body.strip_suffix('\n').unwrap_or(body))
            }
            Self::Unexpected(text) => {
                f.write_str("Unexpected response: ")?;
                f.write_str(text.strip_suffix('\n').unwrap_or(text))
            }
        }
    }
}

/// A simple HTTP RPC client for a Tezos node.
#[derive(Clone, Debug)]
pub struct TezosNode {
    /// RPC base url
    pub base_url: Url,
    /// Chain to query (`main` or a chain id).
    pub chain: String,
    /// Block to query (`head`, a level or a block hash).
    pub block: String,
    client: Client,
}

/// Contract script: code and current storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Contract code: `parameter`, `storage` and `code` sections, possibly views.
    pub code: Micheline,
    /// Current storage value
    pub storage: Micheline,
}

/// On-chain view execution request (`run_script_view`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunScriptViewRequest {
    /// Contract holding the view
    pub contract: Address,
    /// View name
    pub view: String,
    /// View argument
    pub input: Micheline,
    /// Chain identifier (`Net...`)
    pub chain_id: String,
    /// Execution source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Address>,
    /// Execution payer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// Whether to run without gas limit
    pub unlimited_gas: bool,
    /// How the node should print the result
    pub unparsing_mode: String,
}

/// TZIP-4 getter execution request (`run_view`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunViewRequest {
    /// Contract holding the getter
    pub contract: Address,
    /// Getter entrypoint
    pub entrypoint: String,
    /// Getter argument (without the callback)
    pub input: Micheline,
    /// Chain identifier (`Net...`)
    pub chain_id: String,
    /// Execution source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Address>,
    /// Execution payer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<Address>,
    /// How the node should print the result
    pub unparsing_mode: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ViewResponse {
    data: Micheline,
}

impl TezosNode {
    /// RPC URL for mainnet (one possible)
    pub const MAINNET_BASE_URL: &'static str = "https://mainnet.smartpy.io/";
    /// RPC URL for ghostnet (one possible)
    pub const GHOSTNET_BASE_URL: &'static str = "https://ghostnet.smartpy.io/";
    /// Default chain alias
    pub const DEFAULT_CHAIN: &'static str = "main";
    /// Default block alias
    pub const DEFAULT_BLOCK: &'static str = "head";

    pub fn new(base_url: Url) -> Self {
        //! Node at the given URL, querying `main` chain at `head`.
        Self {
            base_url,
            chain: Self::DEFAULT_CHAIN.to_string(),
            block: Self::DEFAULT_BLOCK.to_string(),
            client: Client::new(),
        }
    }

    pub fn mainnet() -> Self {
        //! Mainnet parameters
        Self::new(Self::MAINNET_BASE_URL.parse().expect("Preset URL"))
    }

    pub fn ghostnet() -> Self {
        //! Ghostnet parameters
        Self::new(Self::GHOSTNET_BASE_URL.parse().expect("Preset URL"))
    }

    #[must_use]
    pub fn with_chain<S: Into<String>>(mut self, chain: S) -> Self {
        //! Query another chain.
        self.chain = chain.into();
        self
    }

    #[must_use]
    pub fn with_block<S: Into<String>>(mut self, block: S) -> Self {
        //! Query at another block.
        self.block = block.into();
        self
    }

    fn block_path(&self, suffix: &str) -> String {
        format!("/chains/{}/blocks/{}/{suffix}", self.chain, self.block)
    }

    async fn send_get(&self, path: &str) -> AResult<Response> {
        let response = self.client.get(self.base_url.join(path)?).send().await?;
        tracing::debug!(method = "GET", path, status = %response.status(), "RPC request");
        Ok(response)
    }

    async fn send_post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> AResult<Response> {
        let response = self
            .client
            .post(self.base_url.join(path)?)
            .json(body)
            .send()
            .await?;
        tracing::debug!(method = "POST", path, status = %response.status(), "RPC request");
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> AResult<T> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Box::new(RpcError::Status {
                status: status.as_u16(),
                body: text,
            }));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AResult<T> {
        Self::parse(self.send_get(path).await?).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> AResult<T> {
        Self::parse(self.send_post(path, body).await?).await
    }

    pub async fn fetch_chain_id(&self) -> AResult<String> {
        //! Retrieve the chain identifier (`Net...`).
        self.get_json(&format!("/chains/{}/chain_id", self.chain))
            .await
    }

    pub async fn fetch_balance(&self, address: &Address) -> AResult<Tez> {
        //! Retrieve spendable balance of an account or a contract.
        let path = self.block_path(&format!("context/contracts/{address}/balance"));
        let raw: String = self.get_json(&path).await?;
        Ok(raw
            .parse()
            .map_err(|_| RpcError::Unexpected(format!("balance {raw}")))?)
    }

    pub async fn fetch_storage(&self, address: &Address) -> AResult<Micheline> {
        //! Retrieve raw storage of a contract.
        let path = self.block_path(&format!("context/contracts/{address}/storage"));
        self.get_json(&path).await
    }

    pub async fn fetch_script(&self, address: &Address) -> AResult<Script> {
        //! Retrieve code and storage of a contract.
        let path = self.block_path(&format!("context/contracts/{address}/script"));
        self.get_json(&path).await
    }

    pub async fn fetch_big_map_value(
        &self,
        big_map_id: &BigUint,
        expr: &str,
    ) -> AResult<Option<Micheline>> {
        //! Retrieve a big-map value by its key expression hash (`expr...`).
        //!
        //! Returns [`None`] for missing keys.
        let path = self.block_path(&format!("context/big_maps/{big_map_id}/{expr}"));
        let response = self.send_get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else {
            Ok(Some(Self::parse(response).await?))
        }
    }

    pub async fn run_script_view(&self, request: &RunScriptViewRequest) -> AResult<Micheline> {
        //! Execute an on-chain view and return its result.
        let path = self.block_path("helpers/scripts/run_script_view");
        let response: ViewResponse = self.post_json(&path, request).await?;
        Ok(response.data)
    }

    pub async fn run_view(&self, request: &RunViewRequest) -> AResult<Micheline> {
        //! Execute a TZIP-4 getter and return its result.
        let path = self.block_path("helpers/scripts/run_view");
        let response: ViewResponse = self.post_json(&path, request).await?;
        Ok(response.data)
    }
}
