//! Request and response types of the Soroban RPC methods
use serde::{Deserialize, Serialize};
use stellar_xdr::curr::{
    DiagnosticEvent, LedgerEntryData, Limits, ReadXdr, ScVal, SorobanAuthorizationEntry,
    SorobanTransactionData, TransactionEnvelope, TransactionMeta, TransactionMetaV3,
    TransactionResult,
};

use crate::error::Error;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResponse {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: Option<u32>,
    #[serde(default)]
    pub oldest_ledger: Option<u32>,
    #[serde(default)]
    pub ledger_retention_window: Option<u32>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestLedgerResponse {
    pub id: String,
    pub sequence: u32,
    pub protocol_version: u32,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GetNetworkResponse {
    #[serde(default)]
    pub friendbot_url: Option<String>,
    pub passphrase: String,
    pub protocol_version: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: String,
    pub xdr: String,
    #[serde(default)]
    pub last_modified_ledger_seq: Option<u32>,
    #[serde(default)]
    pub live_until_ledger_seq: Option<u32>,
}

impl LedgerEntryResult {
    /// Decode the base64 `xdr` field
    pub fn to_data(&self) -> Result<LedgerEntryData, Error> {
        Ok(LedgerEntryData::from_xdr_base64(&self.xdr, Limits::none())?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResponse {
    pub entries: Option<Vec<LedgerEntryResult>>,
    pub latest_ledger: u32,
}

/// Status reported by `getTransaction`
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    #[default]
    NotFound,
    Failed,
    Pending,
    Error,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub latest_ledger_close_time: Option<String>,
    #[serde(default)]
    pub oldest_ledger: u32,
    #[serde(default)]
    pub oldest_ledger_close_time: Option<String>,
    #[serde(default)]
    pub application_order: Option<u32>,
    #[serde(default)]
    pub fee_bump: Option<bool>,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
    #[serde(default)]
    pub ledger: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl GetTransactionResponse {
    pub fn to_envelope(&self) -> Option<TransactionEnvelope> {
        self.envelope_xdr
            .as_ref()
            .and_then(|x| TransactionEnvelope::from_xdr_base64(x, Limits::none()).ok())
    }

    pub fn to_result(&self) -> Option<TransactionResult> {
        self.result_xdr
            .as_ref()
            .and_then(|x| TransactionResult::from_xdr_base64(x, Limits::none()).ok())
    }

    /// Decoded result meta with the contract return value, if any
    pub fn to_result_meta(&self) -> Option<(TransactionMeta, Option<ScVal>)> {
        let meta = self
            .result_meta_xdr
            .as_ref()
            .and_then(|x| TransactionMeta::from_xdr_base64(x, Limits::none()).ok())?;
        let return_value = match &meta {
            TransactionMeta::V3(TransactionMetaV3 {
                soroban_meta: Some(soroban_meta),
                ..
            }) => Some(soroban_meta.return_value.clone()),
            _ => None,
        };
        Some((meta, return_value))
    }
}

/// Status reported by `sendTransaction`
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendTransactionStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub status: SendTransactionStatus,
    pub hash: String,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
    #[serde(default)]
    pub diagnostic_events_xdr: Option<Vec<String>>,
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub latest_ledger_close_time: Option<String>,
}

impl SendTransactionResponse {
    pub fn to_error_result(&self) -> Option<TransactionResult> {
        self.error_result_xdr
            .as_ref()
            .and_then(|x| TransactionResult::from_xdr_base64(x, Limits::none()).ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub cpu_insns: String,
    pub mem_bytes: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSimulateHostFunctionResult {
    #[serde(default)]
    pub auth: Vec<String>,
    pub xdr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    pub min_resource_fee: String,
    pub transaction_data: String,
}

/// Raw `simulateTransaction` response, XDR fields are still base64
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    #[serde(default)]
    pub latest_ledger: u32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub transaction_data: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub min_resource_fee: Option<String>,
    #[serde(default)]
    pub results: Vec<RawSimulateHostFunctionResult>,
    #[serde(default)]
    pub cost: Option<Cost>,
    #[serde(default)]
    pub restore_preamble: Option<RestorePreamble>,
}

impl SimulateTransactionResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_restore(&self) -> bool {
        self.error.is_none() && self.restore_preamble.is_some()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.restore_preamble.is_none()
    }

    pub fn min_resource_fee(&self) -> Result<u32, Error> {
        let fee = self.min_resource_fee.as_deref().unwrap_or("0");
        fee.parse()
            .map_err(|_| Error::JsonError(format!("minResourceFee {fee}")))
    }

    pub fn transaction_data(&self) -> Result<SorobanTransactionData, Error> {
        let data = self
            .transaction_data
            .as_ref()
            .ok_or_else(|| Error::SimulationFailed("missing transactionData".into()))?;
        Ok(SorobanTransactionData::from_xdr_base64(
            data,
            Limits::none(),
        )?)
    }

    pub fn events(&self) -> Result<Vec<DiagnosticEvent>, Error> {
        self.events
            .iter()
            .map(|e| DiagnosticEvent::from_xdr_base64(e, Limits::none()).map_err(Error::from))
            .collect()
    }

    /// Authorization entries of the first (and only) host function result
    pub fn auth(&self) -> Result<Vec<SorobanAuthorizationEntry>, Error> {
        match self.results.first() {
            Some(result) => result
                .auth
                .iter()
                .map(|a| {
                    SorobanAuthorizationEntry::from_xdr_base64(a, Limits::none())
                        .map_err(Error::from)
                })
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Value the simulated call returned
    pub fn return_value(&self) -> Result<Option<ScVal>, Error> {
        match self.results.first() {
            Some(result) => Ok(Some(ScVal::from_xdr_base64(&result.xdr, Limits::none())?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EventType {
    All,
    Contract,
    System,
    Diagnostic,
}

/// Ledger range or cursor to start reading events from
#[derive(Debug, Clone)]
pub enum EventLedger {
    From(u32),
    FromTo(u32, u32),
    Cursor(String),
}

#[derive(Debug, Clone)]
pub struct EventFilter {
    event_type: EventType,
    contract_ids: Vec<String>,
    topics: Vec<Vec<String>>,
}

impl EventFilter {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            contract_ids: Vec::new(),
            topics: Vec::new(),
        }
    }

    pub fn contract(mut self, contract_id: &str) -> Self {
        self.contract_ids.push(contract_id.to_string());
        self
    }

    /// Topic segments are base64 `ScVal`s, `*` matches any segment
    pub fn topic(mut self, segments: Vec<String>) -> Self {
        self.topics.push(segments);
        self
    }

    pub fn event_type(&self) -> Option<EventType> {
        match self.event_type {
            EventType::All => None,
            t => Some(t),
        }
    }

    pub fn contracts(&self) -> &[String] {
        &self.contract_ids
    }

    pub fn topics(&self) -> &[Vec<String>] {
        &self.topics
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub ledger: u32,
    pub ledger_closed_at: String,
    #[serde(default)]
    pub contract_id: String,
    pub id: String,
    #[serde(default)]
    pub paging_token: Option<String>,
    pub in_successful_contract_call: bool,
    pub topic: Vec<String>,
    pub value: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
}

impl EventResponse {
    pub fn topic_values(&self) -> Result<Vec<ScVal>, Error> {
        self.topic
            .iter()
            .map(|t| ScVal::from_xdr_base64(t, Limits::none()).map_err(Error::from))
            .collect()
    }

    pub fn value(&self) -> Result<ScVal, Error> {
        Ok(ScVal::from_xdr_base64(&self.value, Limits::none())?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEventsResponse {
    pub latest_ledger: u32,
    pub events: Vec<EventResponse>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FriendbotResponse {
    #[serde(default)]
    pub successful: Option<bool>,
    #[serde(default)]
    pub detail: Option<String>,
}
