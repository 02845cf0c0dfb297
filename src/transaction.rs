//! Building, assembling and signing contract invocation transactions
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use stellar_strkey::ed25519;
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    Operation, OperationBody, Preconditions, ReadXdr, ScAddress, ScSymbol, SequenceNumber,
    SorobanTransactionData, StringM, TimeBounds, TimePoint, Transaction, TransactionEnvelope, TransactionExt,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, Uint256, VecM, WriteXdr,
};

use crate::error::{Error, SigningError};
use crate::keypair::{contract_id_bytes, muxed_account_from_strkey, Keypair};
use crate::network::network_id;
use crate::scval::{to_sc_vals, Arg};
use crate::soroban_rpc::SimulateTransactionResponse;

/// Inclusion fee in stroops when none is set
pub const BASE_FEE: u32 = 100;

/// Source account of a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    account_id: String,
    sequence: i64,
}

impl Account {
    pub fn new(account_id: &str, sequence: i64) -> Self {
        Self {
            account_id: account_id.to_string(),
            sequence,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Last sequence number used by the account
    pub fn sequence_number(&self) -> i64 {
        self.sequence
    }
}

/// A single contract call to be turned into a transaction
#[derive(Debug, Clone)]
pub struct TransactionIntent {
    source: Account,
    contract: String,
    method: String,
    args: Vec<Arg>,
    fee: u32,
    timeout: u64,
}

impl TransactionIntent {
    pub fn new(source: Account, contract: &str, method: &str) -> Self {
        Self {
            source,
            contract: contract.to_string(),
            method: method.to_string(),
            args: Vec::new(),
            fee: BASE_FEE,
            timeout: 0,
        }
    }

    pub fn arg(mut self, arg: Arg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn fee(mut self, fee: u32) -> Self {
        self.fee = fee;
        self
    }

    /// Seconds from now until the transaction expires, 0 means no upper bound
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Unsigned transaction using the next sequence number of the source
    pub fn build(&self) -> Result<Transaction, Error> {
        let contract_address = ScAddress::Contract(Hash(contract_id_bytes(&self.contract)?));
        let function_name = ScSymbol(StringM::try_from(self.method.as_str())?);
        let args = to_sc_vals(&self.args)?;

        let cond = if self.timeout > 0 {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| Error::TransactionError(e.to_string()))?
                .as_secs();
            Preconditions::Time(TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(now + self.timeout),
            })
        } else {
            Preconditions::None
        };

        let seq_num = self
            .source
            .sequence_number()
            .checked_add(1)
            .ok_or_else(|| Error::TransactionError("sequence number overflow".into()))?;

        Ok(Transaction {
            source_account: muxed_account_from_strkey(self.source.account_id())?,
            fee: self.fee,
            seq_num: SequenceNumber(seq_num),
            cond,
            memo: Memo::None,
            operations: vec![Operation {
                source_account: None,
                body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                    host_function: HostFunction::InvokeContract(InvokeContractArgs {
                        contract_address,
                        function_name,
                        args: args.try_into()?,
                    }),
                    auth: VecM::default(),
                }),
            }]
            .try_into()?,
            ext: TransactionExt::V0,
        })
    }
}

/// Envelope without signatures, used for simulation
pub fn unsigned_envelope(tx: &Transaction) -> TransactionEnvelope {
    TransactionEnvelope::Tx(TransactionV1Envelope {
        tx: tx.clone(),
        signatures: VecM::default(),
    })
}

/// Merge a simulation into the transaction.
///
/// The fee becomes the inclusion fee plus the minimum resource fee, the
/// soroban data is attached and, when the operation carries no auth entries,
/// the simulated ones are used.
pub fn assemble_transaction(
    raw: &Transaction,
    simulation: &SimulateTransactionResponse,
) -> Result<Transaction, Error> {
    if raw.operations.len() != 1 {
        return Err(Error::InvalidSorobanTransaction);
    }
    if !matches!(
        raw.operations[0].body,
        OperationBody::InvokeHostFunction(_)
            | OperationBody::ExtendFootprintTtl(_)
            | OperationBody::RestoreFootprint(_)
    ) {
        return Err(Error::InvalidSorobanTransaction);
    }

    if let Some(e) = &simulation.error {
        return Err(Error::SimulationFailed(e.clone()));
    }
    if let Some(preamble) = &simulation.restore_preamble {
        let fee = preamble
            .min_resource_fee
            .parse()
            .map_err(|_| Error::JsonError(format!("minResourceFee {}", preamble.min_resource_fee)))?;
        let data = SorobanTransactionData::from_xdr_base64(
            &preamble.transaction_data,
            Limits::none(),
        )?;
        return Err(Error::RestorationRequired(fee, Box::new(data)));
    }

    let mut tx = raw.clone();
    tx.fee = raw
        .fee
        .checked_add(simulation.min_resource_fee()?)
        .ok_or_else(|| Error::TransactionError("fee overflow".into()))?;
    tx.ext = TransactionExt::V1(simulation.transaction_data()?);

    let mut operations = tx.operations.to_vec();
    if let OperationBody::InvokeHostFunction(ref mut op) = operations[0].body {
        if op.auth.is_empty() {
            op.auth = simulation.auth()?.try_into()?;
        }
    }
    tx.operations = operations.try_into()?;

    tracing::debug!(fee = tx.fee, "assembled transaction");
    Ok(tx)
}

/// Network-bound hash that gets signed
pub fn transaction_hash(tx: &Transaction, network_passphrase: &str) -> Result<[u8; 32], Error> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(network_passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    Ok(Sha256::digest(payload.to_xdr(Limits::none())?).into())
}

/// Sign as the transaction source. The key must be the source account.
pub fn sign_transaction(
    tx: Transaction,
    keypair: &Keypair,
    network_passphrase: &str,
) -> Result<TransactionEnvelope, Error> {
    match &tx.source_account {
        MuxedAccount::Ed25519(Uint256(source)) if *source == keypair.raw_public_key() => {}
        MuxedAccount::Ed25519(Uint256(source)) => {
            return Err(SigningError::SignerMismatch {
                signer: keypair.public_key(),
                expected: ed25519::PublicKey(*source).to_string(),
            }
            .into())
        }
        MuxedAccount::MuxedEd25519(_) => return Err(SigningError::MuxedSource.into()),
    }

    let hash = transaction_hash(&tx, network_passphrase)?;
    let signature = keypair.sign_decorated(&hash)?;
    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: vec![signature].try_into()?,
    }))
}
