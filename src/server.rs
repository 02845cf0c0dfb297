use crate::error::*;
use crate::http_client::create_client;
use crate::jsonrpc::{JsonRpc, Response};
use crate::keypair::{account_id_from_strkey, contract_id_bytes};
use crate::soroban_rpc::*;
use crate::transaction::{assemble_transaction, unsigned_envelope, Account};
use futures::TryFutureExt;
use serde_json::json;
use std::{collections::HashMap, str::FromStr, time::Duration};
use stellar_xdr::curr::{
    ContractDataDurability, Hash, LedgerEntryData, LedgerKey, LedgerKeyAccount,
    LedgerKeyContractData, Limits, ScAddress, ScVal, Transaction, TransactionEnvelope, WriteXdr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Temporary,
    Persistent,
}

impl Durability {
    fn to_xdr(self) -> ContractDataDurability {
        match self {
            Durability::Temporary => ContractDataDurability::Temporary,
            Durability::Persistent => ContractDataDurability::Persistent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Options {
    /// If true, using a non HTTPS RPC will not throw an error
    pub allow_http: bool,
    /// Timeout in seconds (default: 10)
    pub timeout: u64,
    /// Additionnal headers to use while requesting the RPC
    pub headers: HashMap<String, String>,
    /// Optional friendbot URL
    pub friendbot_url: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout: 10,
            headers: Default::default(),
            friendbot_url: None,
        }
    }
}

#[derive(Debug)]
pub struct Server {
    client: JsonRpc,
    friendbot_url: Option<String>,
    timeout: u64,
}

impl Server {
    /// # Instantiate a new [Server]
    ///
    /// ```rust
    /// use soroban_pxpump::server::{Options, Server};
    /// let rpc = Server::new("https://soroban-testnet.stellar.org", Options::default());
    /// assert!(rpc.is_ok());
    /// ```
    pub fn new(server_url: &str, opts: Options) -> Result<Self, Error> {
        let server_url = reqwest::Url::from_str(server_url)
            .map_err(|_e| Error::InvalidRpc(InvalidRpcUrl::InvalidUri))?;
        match server_url.scheme() {
            "https" => {}
            "http" if opts.allow_http => {}
            "http" => {
                return Err(Error::InvalidRpc(InvalidRpcUrl::UnsecureHttpNotAllowed));
            }
            _ => {
                return Err(Error::InvalidRpc(InvalidRpcUrl::NotHttpScheme));
            }
        };

        Ok(Server {
            client: JsonRpc::new(server_url, opts.timeout, opts.headers)?,
            friendbot_url: opts.friendbot_url,
            timeout: opts.timeout,
        })
    }

    // RPC method implementations -------------------------------

    /// # Call to RPC method [getEvents]
    ///
    /// Filtered list of events emitted in a ledger range, or after a cursor
    /// returned by a previous call.
    ///
    /// ```rust
    /// # use soroban_pxpump::soroban_rpc::*;
    /// # use soroban_pxpump::server::{Server, Options};
    /// # use soroban_pxpump::error::Error;
    /// # async fn events() -> Result<(), Error> {
    /// # let server = Server::new("https://rpc.server", Options::default())?;
    /// let events = server.get_events(
    ///     EventLedger::From(67000),
    ///     vec![
    ///         EventFilter::new(EventType::Contract).contract("CAA...")
    ///     ],
    ///     Some(12)
    /// ).await?;
    /// # return Ok(()); }
    /// ```
    ///
    /// [getEvents]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getEvents
    pub async fn get_events(
        &self,
        ledger: EventLedger,
        filters: Vec<EventFilter>,
        limit: Option<u32>,
    ) -> Result<GetEventsResponse, Error> {
        let (start_ledger, end_ledger, cursor) = match ledger {
            EventLedger::From(s) => (Some(s), None, None),
            EventLedger::FromTo(s, e) => (Some(s), Some(e), None),
            EventLedger::Cursor(c) => (None, None, Some(c)),
        };
        let filters = filters
            .into_iter()
            .map(|v| {
                json!({
                    "type": v.event_type(),
                    "contractIds": v.contracts(),
                    "topics": v.topics(),
                })
            })
            .collect::<Vec<serde_json::Value>>();

        let params = json!({
            "startLedger": start_ledger,
            "endLedger": end_ledger,
            "filters": filters,
            "pagination": {
                "cursor": cursor,
                "limit": limit
            }
        });

        let response = self.client.post("getEvents", params).await?;
        handle_response(response)
    }

    /// # Call to RPC method [getHealth]
    ///
    /// General node health check.
    ///
    /// [getHealth]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getHealth
    pub async fn get_health(&self) -> Result<GetHealthResponse, Error> {
        let response = self
            .client
            .post("getHealth", serde_json::Value::Null)
            .await?;
        handle_response(response)
    }

    /// # Call to RPC method [getLatestLedger]
    ///
    /// [getLatestLedger]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getLatestLedger
    pub async fn get_latest_ledger(&self) -> Result<GetLatestLedgerResponse, Error> {
        let response = self
            .client
            .post("getLatestLedger", serde_json::Value::Null)
            .await?;
        handle_response(response)
    }

    /// # Call to RPC method [getLedgerEntries]
    ///
    /// Reads ledger entries directly, this is how accounts and contract
    /// storage are fetched without a simulation.
    ///
    /// [getLedgerEntries]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getLedgerEntries
    pub async fn get_ledger_entries(
        &self,
        keys: Vec<LedgerKey>,
    ) -> Result<GetLedgerEntriesResponse, Error> {
        let keys = keys
            .into_iter()
            .map(|k| k.to_xdr_base64(Limits::none()).map_err(Error::from))
            .collect::<Result<Vec<String>, Error>>()?;

        let params = json!({"keys": keys});
        let response: Response<GetLedgerEntriesResponse> =
            self.client.post("getLedgerEntries", params).await?;
        handle_response(response)
    }

    /// # Call to RPC method [getNetwork]
    ///
    /// Passphrase, protocol version and friendbot of the network this node
    /// serves.
    ///
    /// [getNetwork]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getNetwork
    pub async fn get_network(&self) -> Result<GetNetworkResponse, Error> {
        let response = self
            .client
            .post("getNetwork", serde_json::Value::Null)
            .await?;
        handle_response(response)
    }

    /// # Call to RPC method [getTransaction]
    ///
    /// Status of a submitted transaction. `NOT_FOUND` is returned until the
    /// transaction is in a closed ledger, and again once it falls out of the
    /// retention window.
    ///
    /// [getTransaction]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/getTransaction
    pub async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, Error> {
        let params = json!({ "hash": hash });
        let response = self.client.post("getTransaction", params).await?;
        handle_response(response)
    }

    /// # Call to RPC method [sendTransaction]
    ///
    /// Validates and enqueues a signed envelope, it does not wait for the
    /// transaction to be applied. See [crate::submit] for polling.
    ///
    /// [sendTransaction]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/sendTransaction
    pub async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, Error> {
        let transaction_xdr = envelope.to_xdr_base64(Limits::none())?;
        let params = json!({ "transaction": transaction_xdr });
        let response = self.client.post("sendTransaction", params).await?;
        handle_response(response)
    }

    /// # Call to RPC method [simulateTransaction]
    ///
    /// Trial run of the contract call: footprint, auth entries, minimum
    /// resource fee and return value.
    ///
    /// [simulateTransaction]: https://developers.stellar.org/docs/data/rpc/api-reference/methods/simulateTransaction
    pub async fn simulate_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<SimulateTransactionResponse, Error> {
        let transaction_xdr = unsigned_envelope(transaction).to_xdr_base64(Limits::none())?;
        let params = json!({ "transaction": transaction_xdr });
        let response = self.client.post("simulateTransaction", params).await?;
        handle_response(response)
    }

    // Non-RPC method implementations -------------------------------

    /// # Fetch an [Account] to be used to build a transaction
    ///
    /// It uses [Server::get_ledger_entries] to fetch the [LedgerKey::Account]
    pub async fn get_account(&self, address: &str) -> Result<Account, Error> {
        let account_id = account_id_from_strkey(address)?;
        let ledger_key = LedgerKey::Account(LedgerKeyAccount { account_id });

        let resp = self.get_ledger_entries(vec![ledger_key]).await?;
        let entries = resp.entries.unwrap_or_default();
        let entry = entries.first().ok_or(Error::AccountNotFound)?;

        match entry.to_data()? {
            LedgerEntryData::Account(account_entry) => {
                tracing::debug!(address, sequence = account_entry.seq_num.0, "loaded account");
                Ok(Account::new(address, account_entry.seq_num.0))
            }
            _ => Err(Error::AccountNotFound),
        }
    }

    /// # Fetch the ledger entry specified by the key of the contract
    ///
    /// `contract` is a `C...` strkey or the hex contract id.
    pub async fn get_contract_data(
        &self,
        contract: &str,
        key: ScVal,
        durability: Durability,
    ) -> Result<LedgerEntryResult, Error> {
        let contract_key = LedgerKey::ContractData(LedgerKeyContractData {
            contract: ScAddress::Contract(Hash(contract_id_bytes(contract)?)),
            key,
            durability: durability.to_xdr(),
        });

        let response = self.get_ledger_entries(vec![contract_key]).await?;
        response
            .entries
            .and_then(|entries| entries.into_iter().next())
            .ok_or(Error::ContractDataNotFound)
    }

    /// # Prepare a transaction to be submited to the network.
    ///
    /// Simulates the transaction and assembles the simulation into it: the
    /// footprint, the authorizations and the resource fee on top of the
    /// initial fee.
    ///
    /// If the simulation returns a restore preamble, this method will return a
    /// [Error::RestorationRequired].
    pub async fn prepare_transaction(&self, transaction: &Transaction) -> Result<Transaction, Error> {
        let sim_response = self.simulate_transaction(transaction).await?;
        tracing::trace!(?sim_response, "simulation");
        assemble_transaction(transaction, &sim_response)
    }

    /// # Fund the account using the network's [friendbot] faucet (testnet)
    ///
    /// The friendbot URL is retrieved first from the [Options::friendbot_url] if provided
    /// or from the [Server::get_network] method. There is no friendbot faucet on mainnet.
    ///
    /// [friendbot]: https://developers.stellar.org/docs/learn/fundamentals/networks#friendbot
    pub async fn request_airdrop(&self, account_id: &str) -> Result<Account, Error> {
        let friendbot_url = match self.friendbot_url.clone() {
            Some(url) => url,
            None => self
                .get_network()
                .await?
                .friendbot_url
                .ok_or(Error::NoFriendbot)?,
        };
        let url = reqwest::Url::parse_with_params(&friendbot_url, &[("addr", account_id)])
            .map_err(|_| Error::InvalidRpc(InvalidRpcUrl::InvalidUri))?;

        let response = create_client(Duration::from_secs(self.timeout))
            .map_err(Error::NetworkError)?
            .get(url)
            .send()
            .map_err(Error::NetworkError)
            .await?;
        let data: FriendbotResponse = response.json().map_err(Error::NetworkError).await?;

        match data.successful {
            Some(false) => {
                tracing::warn!(account_id, detail = ?data.detail, "friendbot refused");
                Err(Error::AccountNotFound)
            }
            // No flag usually means the account was funded before
            _ => self.get_account(account_id).await,
        }
    }
}

fn handle_response<T>(response: Response<T>) -> Result<T, Error> {
    if let Some(result) = response.result {
        Ok(result)
    } else if let Some(error) = response.error {
        Err(Error::RPCError {
            code: error.code,
            message: error.message.unwrap_or_default(),
        })
    } else {
        Err(Error::UnexpectedError)
    }
}
