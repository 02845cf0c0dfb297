//! Binding for the price oracle contract
use crate::contract::ContractClient;
use crate::error::Error;
use crate::keypair::Keypair;
use crate::scval::{i128_vec_from_sc_val, Arg};
use crate::submit::TransactionOutcome;

/// Arguments of the oracle `update` function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceUpdate {
    /// Symbol code of the quoted instrument
    pub token: i128,
    /// Price scaled by `10^decimals`
    pub price: i128,
    /// Milliseconds since the epoch
    pub timestamp: i128,
    /// Market state bit field
    pub flags: i128,
    pub decimals: u32,
}

impl PriceUpdate {
    fn to_args(self) -> Vec<Arg> {
        vec![
            Arg::from(self.token),
            Arg::from(self.price),
            Arg::from(self.timestamp),
            Arg::from(self.flags),
            Arg::from(self.decimals),
        ]
    }

    /// Reads the `[token, price, timestamp, flags, decimals]` vector `retrieve` returns
    pub fn from_retrieved(values: &[i128]) -> Result<Self, Error> {
        match values {
            [token, price, timestamp, flags, decimals] => Ok(Self {
                token: *token,
                price: *price,
                timestamp: *timestamp,
                flags: *flags,
                decimals: u32::try_from(*decimals)
                    .map_err(|_| Error::InvalidArgument(format!("decimals {decimals}")))?,
            }),
            _ => Err(Error::InvalidArgument(format!(
                "expected 5 values, got {}",
                values.len()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleContract {
    client: ContractClient,
}

impl OracleContract {
    pub fn new(client: ContractClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    pub async fn init(&self, signer: &Keypair) -> Result<TransactionOutcome, Error> {
        self.client.invoke(signer, "init", Vec::new()).await
    }

    /// Account allowed to push updates
    pub async fn set_pxpump_user(
        &self,
        signer: &Keypair,
        user: &str,
    ) -> Result<TransactionOutcome, Error> {
        self.client
            .invoke(signer, "set_pxpump_user", vec![Arg::Address(user.to_string())])
            .await
    }

    /// SHA-256 of the pump build that is expected to push updates
    pub async fn set_pxpump_hash(
        &self,
        signer: &Keypair,
        hash: [u8; 32],
    ) -> Result<TransactionOutcome, Error> {
        self.client
            .invoke(signer, "set_pxpump_hash", vec![Arg::Bytes(hash.to_vec())])
            .await
    }

    pub async fn update(
        &self,
        signer: &Keypair,
        update: &PriceUpdate,
    ) -> Result<TransactionOutcome, Error> {
        self.client.invoke(signer, "update", update.to_args()).await
    }

    /// Latest stored update, simulated from `source`
    pub async fn retrieve(&self, source: &str) -> Result<Vec<i128>, Error> {
        let value = self
            .client
            .simulate(source, "retrieve", Vec::new())
            .await?
            .ok_or_else(|| Error::SimulationFailed("retrieve returned nothing".into()))?;
        i128_vec_from_sc_val(&value)
    }
}
