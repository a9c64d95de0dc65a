//! Issuing delegations through a primary wallet.

use crate::{
    ChainContext, DelegationRecord, DelegationStatement, IssuanceState, IssueError, WalletSigner,
    time::unix_now,
};
use keylink_credentials::DelegateKeyPair;
use std::{fmt, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Source of the current time in Unix seconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// The outcome of a successful [`DelegationIssuer::issue`].
#[derive(Debug)]
pub struct IssuedDelegation {
    /// The signed, not yet registered, record.
    pub record: DelegationRecord,
    /// The delegate keypair the record authorizes.
    pub key: DelegateKeyPair,
}

/// Drives one delegation attempt at a time and publishes its progress.
///
/// Progress is observable through [`subscribe`](Self::subscribe). Running
/// several attempts concurrently on one issuer is allowed, but they share a
/// single published state.
pub struct DelegationIssuer {
    ttl: Option<Duration>,
    clock: Clock,
    state: watch::Sender<IssuanceState>,
}

impl DelegationIssuer {
    /// An issuer with no expiry and the system clock.
    pub fn new() -> Self {
        let (state, _) = watch::channel(IssuanceState::Idle);
        Self {
            ttl: None,
            clock: Arc::new(unix_now),
            state,
        }
    }

    /// Issue delegations that expire `ttl` after issuance.
    ///
    /// A zero `ttl` means no expiry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Read the issue time from `clock` instead of the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Follow the progress of attempts.
    pub fn subscribe(&self) -> watch::Receiver<IssuanceState> {
        self.state.subscribe()
    }

    /// The current progress.
    pub fn state(&self) -> IssuanceState {
        self.state.borrow().clone()
    }

    /// Authorize a delegate key for `(broker_id, account_id, chain)` with the
    /// wallet's active account.
    ///
    /// When `key` is `None` a fresh keypair is generated. The returned record
    /// is not yet registered, so its `valid_signer` is `false`.
    ///
    /// On error no record exists and the keypair is dropped. Dropping the
    /// returned future has the same effect and resets the state to
    /// [`IssuanceState::Idle`].
    ///
    /// # Errors
    ///
    /// * [`IssueError::Key`] if no key is supplied and entropy is unavailable
    /// * [`IssueError::Statement`] if an identifier is empty or the expiry overflows
    /// * [`IssueError::NoActiveAccount`] if the wallet is disconnected
    /// * [`IssueError::ChainMismatch`] if the wallet reports another chain
    /// * [`IssueError::SigningDeclined`] if the user rejects the request
    /// * [`IssueError::SigningFailed`] if the wallet fails or returns a
    ///   signature that does not verify
    #[tracing::instrument(
        name = "issue_delegation",
        skip_all,
        fields(broker_id = %broker_id, account_id = %account_id, chain_id = chain.chain_id)
    )]
    pub async fn issue<W>(
        &self,
        wallet: &W,
        chain: &ChainContext,
        broker_id: &str,
        account_id: &str,
        key: Option<DelegateKeyPair>,
    ) -> Result<IssuedDelegation, IssueError>
    where
        W: WalletSigner + ?Sized,
    {
        let mut attempt = Attempt::begin(&self.state);
        let result = self
            .attempt(&mut attempt, wallet, chain, broker_id, account_id, key)
            .await;

        match &result {
            Ok(issued) => {
                let delegate_public_key = issued.key.encoded_public_key();
                info!(delegate = %delegate_public_key, primary = %issued.record.primary_address(), "delegation issued");
                attempt.settle(IssuanceState::Issued { delegate_public_key });
            }
            Err(IssueError::SigningDeclined) => {
                info!("signing declined");
                attempt.settle(IssuanceState::Declined);
            }
            Err(error) => {
                warn!(%error, retryable = error.is_retryable(), "delegation failed");
                attempt.settle(IssuanceState::Failed { kind: error.kind() });
            }
        }

        result
    }

    async fn attempt<W>(
        &self,
        progress: &mut Attempt<'_>,
        wallet: &W,
        chain: &ChainContext,
        broker_id: &str,
        account_id: &str,
        key: Option<DelegateKeyPair>,
    ) -> Result<IssuedDelegation, IssueError>
    where
        W: WalletSigner + ?Sized,
    {
        let key = match key {
            Some(key) => key,
            None => {
                progress.advance(IssuanceState::Generating);
                DelegateKeyPair::generate()?
            }
        };

        let statement = DelegationStatement::build(
            broker_id,
            account_id,
            chain.clone(),
            key.public_key(),
            (self.clock)(),
            self.ttl,
        )?;

        let address = wallet.active_address().ok_or(IssueError::NoActiveAccount)?;
        match wallet.active_chain_id() {
            Some(actual) if actual != chain.chain_id => {
                return Err(IssueError::ChainMismatch {
                    expected: chain.chain_id,
                    actual,
                });
            }
            _ => {}
        }

        progress.advance(IssuanceState::AwaitingSignature);
        let message = statement.canonical_bytes();
        debug!(primary = %address, delegate = %key.public_key(), bytes = message.len(), "requesting signature");
        let signed = wallet.sign(&message).await?;

        if signed.address != address {
            return Err(IssueError::SigningFailed(format!(
                "wallet signed with {} instead of the active account {address}",
                signed.address
            )));
        }
        signed.address.verify(&message, &signed.signature)?;

        Ok(IssuedDelegation {
            record: DelegationRecord::new(statement, signed.signature, signed.address),
            key,
        })
    }
}

impl Default for DelegationIssuer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DelegationIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegationIssuer")
            .field("ttl", &self.ttl)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Publishes the progress of one attempt; resets to idle if dropped early.
///
/// The reset only happens while the channel still shows the last state this
/// attempt published, so an abandoned attempt never erases the outcome of a
/// later one.
struct Attempt<'a> {
    state: &'a watch::Sender<IssuanceState>,
    published: IssuanceState,
    settled: bool,
}

impl<'a> Attempt<'a> {
    fn begin(state: &'a watch::Sender<IssuanceState>) -> Self {
        state.send_replace(IssuanceState::Idle);
        Self {
            state,
            published: IssuanceState::Idle,
            settled: false,
        }
    }

    fn advance(&mut self, next: IssuanceState) {
        self.published = next.clone();
        self.state.send_replace(next);
    }

    fn settle(&mut self, outcome: IssuanceState) {
        self.settled = true;
        self.advance(outcome);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        debug!("delegation attempt abandoned");
        let published = &self.published;
        self.state.send_if_modified(|current| {
            if current == published && *current != IssuanceState::Idle {
                *current = IssuanceState::Idle;
                true
            } else {
                false
            }
        });
    }
}
