//! High-level dapp helpers: contract calls, origination, storage and big-map
//! reads, views.
//!
//! Everything goes through a [`Dapp`] context, which holds the node to query
//! and, optionally, the [`Wallet`] to send operations with. Read-only helpers
//! work without a wallet.

use crate::big_map::{self, BigMapValue};
use crate::encoding::Address;
use crate::micheline::Micheline;
use crate::network::{AResult, RunScriptViewRequest, RunViewRequest, TezosNode};
use crate::schema::{Schema, Value};
use crate::tez::Tez;
use crate::wallet::{OperationReceipt, OriginateParams, TransferParams, Wallet};
use num::BigUint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unparsing mode requested for view results.
const UNPARSING_MODE: &str = "Readable";

/// Dapp-level failures (not related to HTTP failures)
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DappError {
    /// Operation requires a wallet, and none was configured.
    MissingWallet,
    /// Required field is missing from a response.
    MissingField(&'static str),
    /// Batch has no operations.
    EmptyBatch,
    /// Origination receipt lists no new contract.
    AddressNotFound,
    /// Contract code is not a sequence of sections.
    InvalidCode(String),
    /// Operation exists for API compatibility only and always fails.
    NotImplemented(&'static str),
}

impl std::error::Error for DappError {}
impl std::fmt::Display for DappError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingWallet => f.write_str("No wallet configured"),
            Self::MissingField(field) => write!(f, "Cannot fetch {field}"),
            Self::EmptyBatch => f.write_str("Cannot send an empty batch"),
            Self::AddressNotFound => f.write_str("Originated contract address not found"),
            Self::InvalidCode(got) => write!(f, "Contract code must be a sequence, got {got}"),
            Self::NotImplemented(name) => write!(f, "'{name}' not implemented."),
        }
    }
}

/// Operations a [`Dapp`] may or may not be able to perform.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// Node queries: balance, storage, big maps, views
    Read,
    /// Contract calls and transfers
    Call,
    /// Batched calls
    Batch,
    /// Contract origination
    Originate,
    /// Deployment from a contract file
    Deploy,
    /// Deployment from compiled JSON
    DeployFromJson,
    /// Callback contract deployment
    DeployCallback,
    /// Reading a callback contract value
    CallbackValue,
}

/// Optional parameters of calls, views and originations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Parameters {
    /// Amount to send (zero by default)
    pub amount: Option<Tez>,
    /// Fee (estimated by the wallet by default)
    pub fee: Option<Tez>,
    /// Source and payer of views
    pub sender: Option<Address>,
}

/// Fully specified contract call, ready to be sent or batched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallParameter {
    /// Called contract
    pub destination: Address,
    /// Amount to send
    pub amount: Tez,
    /// Fee, if fixed
    pub fee: Option<Tez>,
    /// Entrypoint name
    pub entrypoint: String,
    /// Entrypoint argument
    pub arg: Micheline,
}

impl From<CallParameter> for TransferParams {
    fn from(value: CallParameter) -> Self {
        Self {
            to: value.destination,
            amount: value.amount,
            fee: value.fee.filter(|fee| !fee.is_zero()),
            entrypoint: value.entrypoint,
            value: value.arg,
        }
    }
}

/// Result of a contract call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Operation hash
    pub operation_hash: String,
    /// Storage size after the call (not reported by wallets, always 0)
    pub storage_size: u64,
    /// Gas consumed (not reported by wallets, always 0)
    pub consumed_gas: u64,
    /// Storage growth (not reported by wallets, always 0)
    pub paid_storage_size_diff: u64,
    /// Emitted events (not reported by wallets, always empty)
    pub events: Vec<Micheline>,
}

/// Result of a batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// Operation group hash
    pub operation_hash: String,
    /// Emitted events (not reported by wallets, always empty)
    pub events: Vec<Micheline>,
}

/// Result of a contract origination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    /// Operation hash
    pub operation_hash: String,
    /// Address of the new contract
    pub address: Address,
}

/// Result of a view or getter execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewResult {
    /// Returned value, as printed by the node
    pub value: Micheline,
}

pub fn get_call_param(
    address: &Address,
    entrypoint: &str,
    arg: Micheline,
    params: &Parameters,
) -> CallParameter {
    //! Build a call description to send later, e.g. in a batch.
    CallParameter {
        destination: address.clone(),
        amount: params.amount.unwrap_or_default(),
        fee: params.fee,
        entrypoint: entrypoint.to_string(),
        arg,
    }
}

/// Dapp context: node connection and optional wallet.
#[derive(Clone)]
pub struct Dapp {
    node: TezosNode,
    wallet: Option<Arc<dyn Wallet>>,
}

impl std::fmt::Debug for Dapp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dapp")
            .field("node", &self.node)
            .field("wallet", &self.wallet.is_some())
            .finish()
    }
}

impl Dapp {
    pub fn new(node: TezosNode) -> Self {
        //! Read-only context.
        Self { node, wallet: None }
    }

    #[must_use]
    pub fn with_wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        //! Attach a wallet to send operations with.
        self.wallet = Some(wallet);
        self
    }

    pub const fn node(&self) -> &TezosNode {
        //! Node this context queries.
        &self.node
    }

    fn wallet(&self) -> Result<&dyn Wallet, DappError> {
        self.wallet.as_deref().ok_or(DappError::MissingWallet)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        //! Check whether an operation can be performed, instead of invoking
        //! it and inspecting the error.
        match capability {
            Capability::Read => true,
            Capability::Call | Capability::Batch | Capability::Originate => self.wallet.is_some(),
            Capability::Deploy
            | Capability::DeployFromJson
            | Capability::DeployCallback
            | Capability::CallbackValue => false,
        }
    }

    pub async fn call(
        &self,
        address: &Address,
        entrypoint: &str,
        arg: Micheline,
        params: &Parameters,
    ) -> AResult<CallResult> {
        //! Call a contract entrypoint and wait for confirmation.
        let wallet = self.wallet()?;
        let transfer = TransferParams::from(get_call_param(address, entrypoint, arg, params));
        tracing::debug!(to = %address, entrypoint, amount = %transfer.amount, "Calling contract");
        let OperationReceipt { hash, .. } = wallet.transfer(transfer).await?;
        Ok(CallResult {
            operation_hash: hash,
            ..CallResult::default()
        })
    }

    pub async fn exec_batch(&self, calls: &[CallParameter]) -> AResult<BatchResult> {
        //! Send several calls as one operation group and wait for confirmation.
        let wallet = self.wallet()?;
        if calls.is_empty() {
            return Err(Box::new(DappError::EmptyBatch));
        }
        let transfers = calls.iter().cloned().map(TransferParams::from).collect();
        tracing::debug!(size = calls.len(), "Sending batch");
        let OperationReceipt { hash, .. } = wallet.batch(transfers).await?;
        Ok(BatchResult {
            operation_hash: hash,
            events: vec![],
        })
    }

    pub async fn originate(
        &self,
        code: Micheline,
        storage: Micheline,
        params: &Parameters,
    ) -> AResult<DeployResult> {
        //! Originate a contract and wait for confirmation.
        //!
        //! `params.amount` becomes the initial balance.
        let wallet = self.wallet()?;
        if !matches!(code, Micheline::Seq(_)) {
            return Err(Box::new(DappError::InvalidCode(code.kind())));
        }
        let originate = OriginateParams {
            code,
            storage,
            balance: params.amount.unwrap_or_default(),
            fee: params.fee.filter(|fee| !fee.is_zero()),
        };
        tracing::debug!(balance = %originate.balance, "Originating contract");
        let receipt = wallet.originate(originate).await?;
        let address = receipt
            .originated_contracts
            .into_iter()
            .next()
            .ok_or(DappError::AddressNotFound)?;
        Ok(DeployResult {
            operation_hash: receipt.hash,
            address,
        })
    }

    pub async fn get_balance(&self, address: &Address) -> AResult<Tez> {
        //! Spendable balance of an account or a contract.
        self.node.fetch_balance(address).await
    }

    pub async fn get_raw_storage(&self, address: &Address) -> AResult<Micheline> {
        //! Contract storage as returned by the node.
        self.node.fetch_storage(address).await
    }

    pub async fn get_storage(&self, address: &Address) -> AResult<Value> {
        //! Contract storage decoded against the storage type of the contract.
        let script = self.node.fetch_script(address).await?;
        let schema = Schema::from_script_code(&script.code)?;
        Ok(schema.execute(&script.storage)?)
    }

    pub async fn get_big_map_value(
        &self,
        big_map_id: &BigUint,
        key: &Micheline,
        key_type: &Micheline,
        value_type: Option<&Micheline>,
    ) -> AResult<BigMapValue> {
        //! Look up a big-map key.
        //!
        //! With `value_type` the value is decoded, without it the raw tree is
        //! returned. Missing keys yield [`BigMapValue::Absent`] in both modes.
        big_map::lookup(&self.node, big_map_id, key, key_type, value_type).await
    }

    async fn chain_id(&self) -> AResult<String> {
        let chain_id = self.node.fetch_chain_id().await?;
        if chain_id.is_empty() {
            return Err(Box::new(DappError::MissingField("chain_id")));
        }
        Ok(chain_id)
    }

    pub async fn exec_view(
        &self,
        address: &Address,
        view: &str,
        arg: Micheline,
        params: &Parameters,
    ) -> AResult<ViewResult> {
        //! Run an on-chain view. `params.sender` is used as source and payer.
        let request = RunScriptViewRequest {
            contract: address.clone(),
            view: view.to_string(),
            input: arg,
            chain_id: self.chain_id().await?,
            source: params.sender.clone(),
            payer: params.sender.clone(),
            unlimited_gas: false,
            unparsing_mode: UNPARSING_MODE.to_string(),
        };
        let value = self.node.run_script_view(&request).await?;
        Ok(ViewResult { value })
    }

    pub async fn exec_getter(
        &self,
        address: &Address,
        entrypoint: &str,
        arg: Micheline,
        params: &Parameters,
    ) -> AResult<ViewResult> {
        //! Run a TZIP-4 getter (an entrypoint taking a callback contract).
        //! `params.sender` is used as source and payer.
        let request = RunViewRequest {
            contract: address.clone(),
            entrypoint: entrypoint.to_string(),
            input: arg,
            chain_id: self.chain_id().await?,
            source: params.sender.clone(),
            payer: params.sender.clone(),
            unparsing_mode: UNPARSING_MODE.to_string(),
        };
        let value = self.node.run_view(&request).await?;
        Ok(ViewResult { value })
    }

    pub async fn deploy(
        &self,
        _path: &str,
        _parameters: &serde_json::Value,
        _params: &Parameters,
    ) -> AResult<DeployResult> {
        //! Not implemented: always fails.
        Err(Box::new(DappError::NotImplemented("deploy")))
    }

    pub async fn deploy_from_json(
        &self,
        _name: &str,
        _code: &serde_json::Value,
        _storage: Micheline,
        _params: &Parameters,
    ) -> AResult<DeployResult> {
        //! Not implemented: always fails.
        Err(Box::new(DappError::NotImplemented("deploy_from_json")))
    }

    pub async fn deploy_callback(
        &self,
        _name: &str,
        _ty: &Micheline,
        _params: &Parameters,
    ) -> AResult<DeployResult> {
        //! Not implemented: always fails.
        Err(Box::new(DappError::NotImplemented("deploy_callback")))
    }

    pub async fn get_callback_value(&self, _callback: &Address, _schema: &Schema) -> AResult<Value> {
        //! Not implemented: always fails.
        Err(Box::new(DappError::NotImplemented("get_callback_value")))
    }
}
