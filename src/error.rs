/// Error Handling in `soroban_pxpump` crate
/// This module defines all possible error types used in the `soroban_pxpump` crate.
use stellar_xdr::curr::SorobanTransactionData;
use thiserror::Error;

use crate::soroban_rpc::SendTransactionStatus;

/// Possible error types
#[derive(Error, Debug)]
pub enum Error {
    /// Error for invalid RPC URL
    #[error(transparent)]
    InvalidRpc(#[from] InvalidRpcUrl),
    /// Error when XDR processing fails
    #[error("XdrError: {0}")]
    XdrError(#[from] stellar_xdr::curr::Error),
    /// Error when JSON parsing fails, with a descriptive message
    #[error("JsonError: could not parse {0}")]
    JsonError(String),
    /// Error for network-related failures
    #[error("NetworkError: {0}")]
    NetworkError(#[from] reqwest::Error),
    /// Error when an account is not found
    #[error("AccountError")]
    AccountNotFound,
    /// Error when contract data is missing
    #[error("ContractError")]
    ContractDataNotFound,
    /// Error for general transaction failures
    #[error("TransactionError: {0}")]
    TransactionError(String),
    /// The transaction is not a single-operation soroban transaction
    #[error("InvalidSorobanTransaction")]
    InvalidSorobanTransaction,
    /// The node reported that the simulated call would abort
    #[error("SimulationFailed: {0}")]
    SimulationFailed(String),
    /// Error when restoration is required with additional data
    #[error("RestorationRequired")]
    RestorationRequired(i64, Box<SorobanTransactionData>),
    /// The signing key cannot sign for the transaction
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// The node rejected the signed envelope
    #[error("SubmissionFailed: {status:?}")]
    SubmissionFailed {
        /// Status returned by `sendTransaction`
        status: SendTransactionStatus,
        /// Raw base64 `TransactionResult` returned with the rejection
        error_result_xdr: Option<String>,
    },
    /// Error for RPC failures, includes code and message
    #[error("RPCError {code}: {message}")]
    RPCError {
        /// The error code returned from the RPC
        code: i32,
        /// The error message returned from the RPC
        message: String,
    },
    /// Integer does not fit the fixed-width contract argument
    #[error("IntOverflow: value does not fit in {0}")]
    IntOverflow(&'static str),
    /// A contract argument could not be parsed or converted
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),
    /// A strkey (account, secret or contract) could not be decoded
    #[error("InvalidStrkey: {0}")]
    InvalidStrkey(#[from] stellar_strkey::DecodeError),
    /// Unexpected error, should be reported
    #[error("UnexpectedError")]
    UnexpectedError,
    /// Error when Friendbot is not available on the current network
    #[error("NoFriendbot")]
    NoFriendbot,
}

/// Possible  errors for invalid RPC URLs
#[derive(Error, Debug)]
pub enum InvalidRpcUrl {
    /// Error when the URL scheme is not HTTP or HTTPS
    #[error("The RPC Url scheme should be http or https")]
    NotHttpScheme,
    /// Error when insecure HTTP URLs are used without explicit permission
    #[error("Http scheme requires the option allow_http: true")]
    UnsecureHttpNotAllowed,
    /// Error when the provided URL is invalid
    #[error("InvalidUrl")]
    InvalidUri,
}

/// Signing failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SigningError {
    /// The key is not the source account of the transaction
    #[error("signer {signer} does not match transaction source {expected}")]
    SignerMismatch {
        /// Strkey of the key used to sign
        signer: String,
        /// Strkey of the transaction source account
        expected: String,
    },
    /// Muxed source accounts are not supported for signing
    #[error("muxed source accounts cannot be signed")]
    MuxedSource,
}
