//! Generic client for calling one deployed contract
use std::sync::Arc;

use stellar_strkey::Contract;
use stellar_xdr::curr::ScVal;

use crate::error::Error;
use crate::keypair::{contract_id_bytes, Keypair};
use crate::scval::Arg;
use crate::server::Server;
use crate::submit::{submit_transaction, SubmitOptions, TransactionOutcome};
use crate::transaction::{TransactionIntent, BASE_FEE};

#[derive(Debug, Clone)]
pub struct ContractClient {
    server: Arc<Server>,
    contract_id: String,
    network_passphrase: String,
    options: SubmitOptions,
    fee: u32,
    timeout: u64,
}

impl ContractClient {
    /// `contract_id` may be a `C...` strkey or a hex contract id
    pub fn new(
        server: Arc<Server>,
        contract_id: &str,
        network_passphrase: &str,
    ) -> Result<Self, Error> {
        let contract_id = Contract(contract_id_bytes(contract_id)?).to_string();
        Ok(Self {
            server,
            contract_id,
            network_passphrase: network_passphrase.to_string(),
            options: SubmitOptions::default(),
            fee: BASE_FEE,
            timeout: 0,
        })
    }

    pub fn with_options(mut self, options: SubmitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    /// Transaction validity in seconds, 0 for none
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// `C...` strkey of the contract
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    async fn intent(&self, source: &str, method: &str, args: Vec<Arg>) -> Result<TransactionIntent, Error> {
        let account = self.server.get_account(source).await?;
        Ok(TransactionIntent::new(account, &self.contract_id, method)
            .args(args)
            .fee(self.fee)
            .timeout(self.timeout))
    }

    /// Read-only call: simulate with `source` and return the result value
    pub async fn simulate(
        &self,
        source: &str,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<Option<ScVal>, Error> {
        let tx = self.intent(source, method, args).await?.build()?;
        let sim = self.server.simulate_transaction(&tx).await?;
        if let Some(e) = sim.error {
            return Err(Error::SimulationFailed(e));
        }
        sim.return_value()
    }

    /// State changing call signed and paid for by `signer`
    pub async fn invoke(
        &self,
        signer: &Keypair,
        method: &str,
        args: Vec<Arg>,
    ) -> Result<TransactionOutcome, Error> {
        let tx = self
            .intent(&signer.public_key(), method, args)
            .await?
            .build()?;
        tracing::info!(contract = %self.contract_id, method, "invoking contract");
        submit_transaction(
            &self.server,
            &tx,
            signer,
            &self.network_passphrase,
            &self.options,
        )
        .await
    }
}
