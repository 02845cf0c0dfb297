//! A rust client library for submitting Soroban contract calls on the
//! stellar blockchain and pumping market quotes into a price oracle contract.
pub mod bindings;
pub mod contract;
pub mod error;
pub mod http_client;
pub mod int_codec;
pub mod jsonrpc;
pub mod keypair;
pub mod network;
pub mod pump;
pub mod quote;
pub mod scval;
pub mod server;
pub mod soroban_rpc;
pub mod submit;
pub mod transaction;

pub use http_client::VERSION;
pub use keypair::Keypair;
pub use network::Networks;
pub use server::{Options, Server};
pub use stellar_xdr::curr as xdr;
pub use submit::{SubmitOptions, TransactionOutcome, TxStatus};
