//! Wallet interface: signing and broadcasting of operations.
//!
//! This crate never signs anything. State-changing operations are handed to a
//! [`Wallet`] implementation, which is expected to sign, inject and wait for
//! the operation to be included before returning its receipt.

use crate::encoding::Address;
use crate::micheline::Micheline;
use crate::network::AResult;
use crate::tez::Tez;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Contract call or plain transfer handed to the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    /// Recipient
    pub to: Address,
    /// Amount to send
    pub amount: Tez,
    /// Fee; [`None`] lets the wallet estimate it.
    pub fee: Option<Tez>,
    /// Entrypoint to call
    pub entrypoint: String,
    /// Entrypoint argument
    pub value: Micheline,
}

/// Contract origination handed to the wallet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginateParams {
    /// Contract code (a sequence of `parameter`, `storage` and `code` sections)
    pub code: Micheline,
    /// Initial storage
    pub storage: Micheline,
    /// Initial balance
    pub balance: Tez,
    /// Fee; [`None`] lets the wallet estimate it.
    pub fee: Option<Tez>,
}

/// Confirmed operation, as reported by the wallet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationReceipt {
    /// Operation hash (`o...`)
    pub hash: String,
    /// Contracts originated by this operation, in order.
    pub originated_contracts: Vec<Address>,
}

/// Signing and broadcasting backend.
///
/// Every method returns once the operation has one confirmation.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Send a single transaction.
    async fn transfer(&self, params: TransferParams) -> AResult<OperationReceipt>;

    /// Send several transactions as one operation group.
    async fn batch(&self, params: Vec<TransferParams>) -> AResult<OperationReceipt>;

    /// Originate a contract.
    async fn originate(&self, params: OriginateParams) -> AResult<OperationReceipt>;
}
