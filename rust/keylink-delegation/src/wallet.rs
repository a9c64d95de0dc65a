//! The primary wallet capability.

use async_trait::async_trait;
use keylink_credentials::{PrimaryAddress, PrimarySignature, PrimarySigner};

/// A signature returned by a wallet, with the account that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSignature {
    /// Signature bytes in the wallet's native scheme.
    pub signature: PrimarySignature,
    /// The account that signed.
    pub address: PrimaryAddress,
}

/// Why a wallet did not produce a signature.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user rejected the request.
    #[error("user declined to sign")]
    Declined,
    /// The wallet or its transport failed.
    #[error("wallet failed: {0}")]
    Failed(String),
}

/// A connected primary wallet.
///
/// Implementations wrap browser extensions, hardware devices or in-process
/// keys. The two queries are read-only snapshots of the connection; `sign`
/// may suspend for as long as the user takes to respond.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The connected account, if any.
    fn active_address(&self) -> Option<PrimaryAddress>;

    /// The connected chain, if the wallet reports one.
    fn active_chain_id(&self) -> Option<u64>;

    /// Sign `message` with the connected account.
    async fn sign(&self, message: &[u8]) -> Result<WalletSignature, WalletError>;
}

/// A wallet backed by a primary key held in this process.
#[derive(Debug)]
pub struct LocalWallet {
    signer: PrimarySigner,
    chain_id: Option<u64>,
}

impl LocalWallet {
    /// Wrap a primary signer that reports no chain.
    pub fn new(signer: impl Into<PrimarySigner>) -> Self {
        Self {
            signer: signer.into(),
            chain_id: None,
        }
    }

    /// Report `chain_id` as the connected chain.
    #[must_use]
    pub fn on_chain(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn active_address(&self) -> Option<PrimaryAddress> {
        Some(self.signer.address())
    }

    fn active_chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    async fn sign(&self, message: &[u8]) -> Result<WalletSignature, WalletError> {
        let signature = self
            .signer
            .sign(message)
            .map_err(|error| WalletError::Failed(error.to_string()))?;
        Ok(WalletSignature {
            signature,
            address: self.signer.address(),
        })
    }
}
