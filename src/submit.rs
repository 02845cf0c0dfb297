//! Sign, send and poll a contract transaction until the network settles it
use std::time::Duration;

use async_trait::async_trait;
use stellar_xdr::curr::{ScVal, Transaction, TransactionEnvelope, TransactionResult};
use tokio::time::{sleep, Instant};

use crate::error::Error;
use crate::keypair::Keypair;
use crate::server::Server;
use crate::soroban_rpc::{GetTransactionResponse, SendTransactionStatus, TransactionStatus};
use crate::transaction::sign_transaction;

/// Polling schedule for [wait_for_transaction]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Constant delay between two status lookups
    pub poll_interval: Duration,
    /// Overall budget, measured from the first lookup
    pub timeout: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
            timeout: Duration::from_millis(30_000),
        }
    }
}

/// Status of a submitted transaction, across send and poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    NotFound,
    Success,
    Failed,
    Error,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TxStatus::Success | TxStatus::Failed | TxStatus::Error)
    }
}

impl From<TransactionStatus> for TxStatus {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Success => TxStatus::Success,
            TransactionStatus::NotFound => TxStatus::NotFound,
            TransactionStatus::Failed => TxStatus::Failed,
            TransactionStatus::Pending => TxStatus::Pending,
            TransactionStatus::Error => TxStatus::Error,
        }
    }
}

impl From<SendTransactionStatus> for TxStatus {
    fn from(status: SendTransactionStatus) -> Self {
        match status {
            SendTransactionStatus::Pending | SendTransactionStatus::Duplicate => TxStatus::Pending,
            SendTransactionStatus::TryAgainLater | SendTransactionStatus::Error => TxStatus::Error,
        }
    }
}

/// Last known state of a submitted transaction
#[derive(Debug, Clone)]
pub struct TransactionOutcome {
    pub hash: String,
    pub status: TxStatus,
    /// Last `getTransaction` payload
    pub response: GetTransactionResponse,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }

    pub fn result(&self) -> Option<TransactionResult> {
        self.response.to_result()
    }

    /// Value returned by the invoked contract function
    pub fn return_value(&self) -> Option<ScVal> {
        self.response
            .to_result_meta()
            .and_then(|(_, return_value)| return_value)
    }
}

/// Source of transaction statuses for the poll loop
#[async_trait]
pub trait TransactionLookup {
    async fn lookup(&self, hash: &str) -> Result<GetTransactionResponse, Error>;
}

#[async_trait]
impl TransactionLookup for Server {
    async fn lookup(&self, hash: &str) -> Result<GetTransactionResponse, Error> {
        self.get_transaction(hash).await
    }
}

/// Poll `hash` at a constant interval until a terminal status or the timeout.
///
/// `NOT_FOUND` is treated like pending. Running out of time is not an
/// error: the outcome then carries the last non-terminal status.
pub async fn wait_for_transaction<L>(
    lookup: &L,
    hash: &str,
    opts: &SubmitOptions,
) -> Result<TransactionOutcome, Error>
where
    L: TransactionLookup + ?Sized,
{
    let start = Instant::now();
    loop {
        let response = lookup.lookup(hash).await?;
        let status = TxStatus::from(response.status);
        let elapsed = start.elapsed();
        tracing::debug!(hash, ?status, elapsed_ms = elapsed.as_millis() as u64, "transaction status");

        if status.is_terminal() {
            tracing::info!(hash, ?status, "transaction settled");
            return Ok(TransactionOutcome {
                hash: hash.to_string(),
                status,
                response,
            });
        }
        if elapsed >= opts.timeout {
            tracing::warn!(hash, ?status, timeout_ms = opts.timeout.as_millis() as u64, "gave up waiting for transaction");
            return Ok(TransactionOutcome {
                hash: hash.to_string(),
                status,
                response,
            });
        }
        sleep(opts.poll_interval.min(opts.timeout - elapsed)).await;
    }
}

/// Send a signed envelope, then poll for its outcome
pub async fn send_and_wait(
    server: &Server,
    envelope: &TransactionEnvelope,
    opts: &SubmitOptions,
) -> Result<TransactionOutcome, Error> {
    let sent = server.send_transaction(envelope).await?;
    tracing::info!(hash = %sent.hash, status = ?sent.status, "transaction sent");
    match sent.status {
        SendTransactionStatus::Pending | SendTransactionStatus::Duplicate => {
            wait_for_transaction(server, &sent.hash, opts).await
        }
        SendTransactionStatus::TryAgainLater | SendTransactionStatus::Error => {
            Err(Error::SubmissionFailed {
                status: sent.status,
                error_result_xdr: sent.error_result_xdr,
            })
        }
    }
}

/// Simulate, assemble, sign, send and poll
pub async fn submit_transaction(
    server: &Server,
    transaction: &Transaction,
    keypair: &Keypair,
    network_passphrase: &str,
    opts: &SubmitOptions,
) -> Result<TransactionOutcome, Error> {
    let prepared = server.prepare_transaction(transaction).await?;
    let envelope = sign_transaction(prepared, keypair, network_passphrase)?;
    send_and_wait(server, &envelope, opts).await
}
