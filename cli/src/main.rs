use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use soroban_pxpump::bindings::{OracleContract, PriceUpdate};
use soroban_pxpump::contract::ContractClient;
use soroban_pxpump::keypair::{contract_id_from_strkey, contract_id_to_strkey, public_key_from_secret};
use soroban_pxpump::pump::{PricePump, PumpConfig};
use soroban_pxpump::quote::{HttpQuoteProvider, QuoteError};
use soroban_pxpump::scval::Arg;
use soroban_pxpump::{Keypair, Networks, Options, Server, SubmitOptions};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "pxpump", version, about = "Price pump tooling for a Soroban oracle contract")]
struct Root {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print the public key (G...) of a secret seed (S...)
    PublicKey {
        secret: String,
    },
    /// Convert a contract id between hex and its C... strkey
    ContractId {
        /// 64 hex characters or a C... strkey
        id: String,
    },
    /// Check the health of the RPC server
    Health(RpcArgs),
    /// Invoke a contract method, arguments are `type:value` pairs
    Invoke {
        #[command(flatten)]
        rpc: RpcArgs,
        #[command(flatten)]
        contract: ContractArgs,
        /// Method to call
        #[arg(long)]
        method: String,
        /// Arguments, e.g. `i128:44123` or `address:G...`
        args: Vec<Arg>,
    },
    /// Read the last update stored by the oracle
    Retrieve {
        #[command(flatten)]
        rpc: RpcArgs,
        #[command(flatten)]
        contract: ContractArgs,
    },
    /// Push quotes into the oracle until interrupted
    Pump {
        #[command(flatten)]
        rpc: RpcArgs,
        #[command(flatten)]
        contract: ContractArgs,
        /// Symbol to quote
        #[arg(long, env = "PXPUMP_SYMBOL", default_value = "SPY")]
        symbol: String,
        /// Token code stored with each update
        #[arg(long, env = "PXPUMP_TOKEN", default_value_t = 1)]
        token: i128,
        /// Seconds between two updates
        #[arg(long, env = "PXPUMP_INTERVAL", default_value_t = 60)]
        interval: u64,
        /// Base URL of the quote source
        #[arg(long, env = "PXPUMP_QUOTE_URL", default_value = HttpQuoteProvider::DEFAULT_URL)]
        quote_url: String,
    },
}

#[derive(Args, Debug, Clone)]
struct RpcArgs {
    /// RPC server endpoint
    #[arg(long, env = "PXPUMP_RPC_URL")]
    rpc_url: String,
    /// Network passphrase to sign transactions for
    #[arg(long, env = "PXPUMP_NETWORK_PASSPHRASE", default_value = Networks::testnet())]
    network_passphrase: String,
    /// Allow an http:// RPC URL
    #[arg(long)]
    allow_http: bool,
    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

impl RpcArgs {
    fn server(&self) -> Result<Server, CliError> {
        Ok(Server::new(
            &self.rpc_url,
            Options {
                allow_http: self.allow_http,
                timeout: self.timeout,
                ..Default::default()
            },
        )?)
    }
}

#[derive(Args, Debug, Clone)]
struct ContractArgs {
    /// Oracle contract, C... strkey or hex
    #[arg(long, env = "PXPUMP_CONTRACT_ID")]
    contract_id: String,
    /// Secret seed of the signing account
    #[arg(long, env = "PXPUMP_SECRET_KEY", hide_env_values = true)]
    secret_key: String,
    /// Seconds to wait for a transaction outcome
    #[arg(long, default_value_t = 30)]
    wait: u64,
}

impl ContractArgs {
    fn client(&self, rpc: &RpcArgs) -> Result<ContractClient, CliError> {
        let options = SubmitOptions {
            timeout: Duration::from_secs(self.wait),
            ..Default::default()
        };
        Ok(ContractClient::new(
            Arc::new(rpc.server()?),
            &self.contract_id,
            &rpc.network_passphrase,
        )?
        .with_options(options))
    }

    fn keypair(&self) -> Result<Keypair, CliError> {
        Ok(Keypair::from_secret(&self.secret_key)?)
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Client(#[from] soroban_pxpump::error::Error),
    #[error(transparent)]
    Quote(#[from] QuoteError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("transaction {hash} ended as {status}")]
    Transaction { hash: String, status: String },
}

/// `C...` strkey to hex, anything else is read as hex
fn contract_id(id: &str) -> Result<String, CliError> {
    match contract_id_from_strkey(id) {
        Ok(hex) => Ok(hex),
        Err(_) => Ok(contract_id_to_strkey(id)?),
    }
}

async fn run(root: Root) -> Result<(), CliError> {
    match root.cmd {
        Cmd::PublicKey { secret } => println!("{}", public_key_from_secret(&secret)?),
        Cmd::ContractId { id } => println!("{}", contract_id(&id)?),
        Cmd::Health(rpc) => {
            let health = rpc.server()?.get_health().await?;
            println!("{}", health.status);
        }
        Cmd::Invoke {
            rpc,
            contract,
            method,
            args,
        } => {
            let client = contract.client(&rpc)?;
            let outcome = client.invoke(&contract.keypair()?, &method, args).await?;
            if !outcome.is_success() {
                return Err(CliError::Transaction {
                    hash: outcome.hash,
                    status: format!("{:?}", outcome.status),
                });
            }
            match outcome.return_value() {
                Some(value) => println!("{}", serde_json::to_string(&value)?),
                None => println!("{}", outcome.hash),
            }
        }
        Cmd::Retrieve { rpc, contract } => {
            let oracle = OracleContract::new(contract.client(&rpc)?);
            let signer = contract.keypair()?;
            let values = oracle.retrieve(&signer.public_key()).await?;
            let update = PriceUpdate::from_retrieved(&values)?;
            println!("{update:?}");
        }
        Cmd::Pump {
            rpc,
            contract,
            symbol,
            token,
            interval,
            quote_url,
        } => {
            let provider = HttpQuoteProvider::new(&quote_url, Duration::from_secs(rpc.timeout))?;
            let config = PumpConfig {
                symbol,
                token,
                interval: Duration::from_secs(interval),
            };
            let pump = PricePump::new(
                config,
                Arc::new(provider),
                OracleContract::new(contract.client(&rpc)?),
                contract.keypair()?,
            );
            let ticks = pump
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "cannot listen for ctrl-c");
                    }
                })
                .await;
            tracing::info!(ticks, "done");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: {e}");
    }

    if let Err(e) = run(Root::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Root::command().debug_assert();
    }

    #[test]
    fn contract_id_converts_both_ways() {
        let hex = "9f7ae1b3b8c7c2b4c1b1a5d3f2e1c0b9a8f7e6d5c4b3a2918070605040302010";
        let strkey = contract_id(hex).unwrap();
        assert!(strkey.starts_with('C'));
        assert_eq!(strkey.len(), 56);
        assert_eq!(contract_id(&strkey).unwrap(), hex);

        assert!(contract_id("not hex").is_err());
        assert!(contract_id("CNOTAKEY").is_err());
    }

    #[test]
    fn uppercase_hex_starting_with_c_is_hex() {
        let hex = "C0FFEE00000000000000000000000000000000000000000000000000000000AB";
        assert_eq!(hex.len(), 64);
        let strkey = contract_id(hex).unwrap();
        assert!(strkey.starts_with('C'));
        assert_eq!(strkey.len(), 56);
        assert_eq!(contract_id(&strkey).unwrap(), hex.to_lowercase());
    }

    #[test]
    fn invoke_parses_typed_args() {
        let root = Root::try_parse_from([
            "pxpump",
            "invoke",
            "--rpc-url",
            "https://rpc",
            "--contract-id",
            "CCJZ5DGASBWQXR5MPFCJXMBI333XE5U3FSJTNQU7RIKE3P5GN2K2WYD5",
            "--secret-key",
            "SAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
            "--method",
            "update",
            "i128:44123",
            "u32:2",
        ])
        .unwrap();
        match root.cmd {
            Cmd::Invoke { method, args, rpc, .. } => {
                assert_eq!(method, "update");
                assert_eq!(args, vec![Arg::from(44123i128), Arg::U32(2)]);
                assert_eq!(rpc.network_passphrase, Networks::testnet());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
