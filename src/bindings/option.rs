//! Binding for the option contract that settles against the oracle price
use stellar_xdr::curr::{ScMap, ScVal};

use crate::contract::ContractClient;
use crate::error::Error;
use crate::keypair::{sc_address_to_strkey, Keypair};
use crate::scval::{i128_from_sc_val, i128_vec_from_sc_val, Arg};
use crate::submit::TransactionOutcome;

/// Bits of the `opt_type` field
pub mod option_type {
    pub const AMERICAN: u32 = 1;
    pub const EUROPEAN: u32 = 2;
    pub const CALL: u32 = 4;
    pub const PUT: u32 = 8;
    pub const BINARY: u32 = 16;
    pub const CALL_SPREAD: u32 = 32;
    pub const PUT_SPREAD: u32 = 64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sell = 0,
    Buy = 1,
}

/// Arguments of `list`, which defines the option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// [option_type] bits
    pub opt_type: u32,
    pub strike: i128,
    pub decimals: u32,
    /// Expiration, seconds since the epoch
    pub exp: u64,
    /// Price oracle contract
    pub oracle: String,
    /// Collateral token contract
    pub token: String,
    pub admin: String,
}

impl Listing {
    fn to_args(&self) -> Vec<Arg> {
        vec![
            Arg::U32(self.opt_type),
            Arg::from(self.strike),
            Arg::U32(self.decimals),
            Arg::U64(self.exp),
            Arg::Address(self.oracle.clone()),
            Arg::Address(self.token.clone()),
            Arg::Address(self.admin.clone()),
        ]
    }
}

/// Arguments of `trade`, the signer takes `side` against `counter_party`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOrder {
    pub counter_party: String,
    pub token: String,
    pub side: Side,
    pub price: i128,
    pub decimals: u32,
    pub qty: i128,
    pub trade_id: u64,
}

impl TradeOrder {
    fn to_args(&self) -> Vec<Arg> {
        vec![
            Arg::Address(self.counter_party.clone()),
            Arg::Address(self.token.clone()),
            Arg::U32(self.side as u32),
            Arg::from(self.price),
            Arg::U32(self.decimals),
            Arg::from(self.qty),
            Arg::U64(self.trade_id),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBoundKind {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBound {
    pub kind: TimeBoundKind,
    pub timestamp: u64,
}

/// Option definition returned by `specs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDef {
    pub collateral_token: String,
    pub decimals: u32,
    pub exp: TimeBound,
    /// Last price pulled from the oracle by `upd_px`
    pub mkt_price: i128,
    pub opt_type: u32,
    pub strike: i128,
    pub symbol: String,
    pub underlying_symbol: String,
    pub underlying_token: String,
}

impl OptionDef {
    pub fn from_sc_val(val: &ScVal) -> Result<Self, Error> {
        let fields = sc_map(val)?;
        Ok(Self {
            collateral_token: address(field(fields, "collateral_token")?)?,
            decimals: u32_value(field(fields, "decimals")?)?,
            exp: time_bound(field(fields, "exp")?)?,
            mkt_price: i128_from_sc_val(field(fields, "mkt_price")?)?,
            opt_type: u32_value(field(fields, "opt_type")?)?,
            strike: i128_from_sc_val(field(fields, "strike")?)?,
            symbol: symbol(field(fields, "symbol")?)?,
            underlying_symbol: symbol(field(fields, "underlying_symbol")?)?,
            underlying_token: address(field(fields, "underlying_token")?)?,
        })
    }
}

/// Obligations and payouts returned by `mtm`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkToMarket {
    pub buyer_obligation: i128,
    pub seller_obligation: i128,
    pub buyer_payout: i128,
    pub seller_payout: i128,
}

impl MarkToMarket {
    pub fn from_values(values: &[i128]) -> Result<Self, Error> {
        match values {
            [buyer_obligation, seller_obligation, buyer_payout, seller_payout] => Ok(Self {
                buyer_obligation: *buyer_obligation,
                seller_obligation: *seller_obligation,
                buyer_payout: *buyer_payout,
                seller_payout: *seller_payout,
            }),
            _ => Err(Error::InvalidArgument(format!(
                "expected 4 values, got {}",
                values.len()
            ))),
        }
    }
}

fn unexpected(expected: &str, val: &ScVal) -> Error {
    Error::InvalidArgument(format!("expected {expected}, got {:?}", val.discriminant()))
}

fn sc_map(val: &ScVal) -> Result<&ScMap, Error> {
    match val {
        ScVal::Map(Some(map)) => Ok(map),
        other => Err(unexpected("map", other)),
    }
}

fn field<'a>(map: &'a ScMap, name: &str) -> Result<&'a ScVal, Error> {
    map.0
        .iter()
        .find(|entry| matches!(&entry.key, ScVal::Symbol(s) if s.0.to_utf8_string_lossy() == name))
        .map(|entry| &entry.val)
        .ok_or_else(|| Error::InvalidArgument(format!("missing field {name}")))
}

fn u32_value(val: &ScVal) -> Result<u32, Error> {
    match val {
        ScVal::U32(v) => Ok(*v),
        other => Err(unexpected("u32", other)),
    }
}

fn symbol(val: &ScVal) -> Result<String, Error> {
    match val {
        ScVal::Symbol(s) => Ok(s.0.to_utf8_string_lossy()),
        other => Err(unexpected("symbol", other)),
    }
}

fn address(val: &ScVal) -> Result<String, Error> {
    match val {
        ScVal::Address(a) => Ok(sc_address_to_strkey(a)),
        other => Err(unexpected("address", other)),
    }
}

// unit enum variants are encoded as a one element vec holding the variant name
fn time_bound(val: &ScVal) -> Result<TimeBound, Error> {
    let fields = sc_map(val)?;
    let kind = match field(fields, "kind")? {
        ScVal::Vec(Some(items)) => match items.0.first().map(symbol).transpose()?.as_deref() {
            Some("Before") => TimeBoundKind::Before,
            Some("After") => TimeBoundKind::After,
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown time bound kind {other:?}"
                )))
            }
        },
        other => return Err(unexpected("vec", other)),
    };
    let timestamp = match field(fields, "timestamp")? {
        ScVal::U64(v) => *v,
        other => return Err(unexpected("u64", other)),
    };
    Ok(TimeBound { kind, timestamp })
}

#[derive(Debug, Clone)]
pub struct OptionContract {
    client: ContractClient,
}

impl OptionContract {
    pub fn new(client: ContractClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ContractClient {
        &self.client
    }

    pub async fn init(&self, signer: &Keypair) -> Result<TransactionOutcome, Error> {
        self.client.invoke(signer, "init", Vec::new()).await
    }

    /// Sets or clears the kill switch, only `admin_user` may call it
    pub async fn killswitch(
        &self,
        signer: &Keypair,
        admin_user: &str,
        killswitch: u32,
    ) -> Result<TransactionOutcome, Error> {
        let args = vec![Arg::Address(admin_user.to_string()), Arg::U32(killswitch)];
        self.client.invoke(signer, "killswitch", args).await
    }

    pub async fn list(
        &self,
        signer: &Keypair,
        listing: &Listing,
    ) -> Result<TransactionOutcome, Error> {
        self.client.invoke(signer, "list", listing.to_args()).await
    }

    pub async fn specs(&self, source: &str) -> Result<OptionDef, Error> {
        let value = self
            .client
            .simulate(source, "specs", Vec::new())
            .await?
            .ok_or_else(|| Error::SimulationFailed("specs returned nothing".into()))?;
        OptionDef::from_sc_val(&value)
    }

    pub async fn trade(
        &self,
        signer: &Keypair,
        order: &TradeOrder,
    ) -> Result<TransactionOutcome, Error> {
        self.client.invoke(signer, "trade", order.to_args()).await
    }

    /// Pulls the latest oracle price into the option, returns the stored update
    pub async fn upd_px(&self, signer: &Keypair) -> Result<Vec<i128>, Error> {
        let outcome = self.client.invoke(signer, "upd_px", Vec::new()).await?;
        match outcome.return_value() {
            Some(value) => i128_vec_from_sc_val(&value),
            None => Ok(Vec::new()),
        }
    }

    /// Marks `user`'s position to the current market price, simulated from `source`
    pub async fn mtm(&self, source: &str, user: &str) -> Result<MarkToMarket, Error> {
        let value = self
            .client
            .simulate(source, "mtm", vec![Arg::Address(user.to_string())])
            .await?
            .ok_or_else(|| Error::SimulationFailed("mtm returned nothing".into()))?;
        MarkToMarket::from_values(&i128_vec_from_sc_val(&value)?)
    }

    pub async fn settle(
        &self,
        signer: &Keypair,
        counter_party: &str,
    ) -> Result<TransactionOutcome, Error> {
        self.client
            .invoke(signer, "settle", vec![Arg::Address(counter_party.to_string())])
            .await
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;
    use stellar_xdr::curr::{ScMapEntry, ScSymbol, ScVec};

    use super::*;
    use crate::keypair::sc_address_from_strkey;

    const CONTRACT: &str = "CCJZ5DGASBWQXR5MPFCJXMBI333XE5U3FSJTNQU7RIKE3P5GN2K2WYD5";
    const ACCOUNT: &str = "GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI";

    fn sym(s: &str) -> ScVal {
        ScVal::Symbol(ScSymbol(s.try_into().unwrap()))
    }

    fn map(entries: Vec<(&str, ScVal)>) -> ScVal {
        let entries: Vec<ScMapEntry> = entries
            .into_iter()
            .map(|(key, val)| ScMapEntry { key: sym(key), val })
            .collect();
        ScVal::Map(Some(ScMap(entries.try_into().unwrap())))
    }

    fn option_def_val() -> ScVal {
        let contract = ScVal::Address(sc_address_from_strkey(CONTRACT).unwrap());
        map(vec![
            ("collateral_token", contract.clone()),
            ("decimals", ScVal::U32(2)),
            (
                "exp",
                map(vec![
                    ("kind", ScVal::Vec(Some(ScVec(vec![sym("Before")].try_into().unwrap())))),
                    ("timestamp", ScVal::U64(1_700_100_000)),
                ]),
            ),
            ("mkt_price", Arg::from(44123i128).to_sc_val().unwrap()),
            ("opt_type", ScVal::U32(option_type::EUROPEAN | option_type::CALL)),
            ("strike", Arg::from(45000i128).to_sc_val().unwrap()),
            ("symbol", sym("SPYC450")),
            ("underlying_symbol", sym("SPY")),
            ("underlying_token", contract),
        ])
    }

    #[test]
    fn list_arguments_keep_contract_order() {
        let listing = Listing {
            opt_type: option_type::EUROPEAN | option_type::PUT,
            strike: 45000,
            decimals: 2,
            exp: 1_700_100_000,
            oracle: CONTRACT.into(),
            token: CONTRACT.into(),
            admin: ACCOUNT.into(),
        };
        assert_eq!(
            listing.to_args(),
            vec![
                Arg::U32(10),
                Arg::I128(BigInt::from(45000)),
                Arg::U32(2),
                Arg::U64(1_700_100_000),
                Arg::Address(CONTRACT.into()),
                Arg::Address(CONTRACT.into()),
                Arg::Address(ACCOUNT.into()),
            ]
        );
    }

    #[test]
    fn trade_side_is_encoded_as_u32() {
        let order = TradeOrder {
            counter_party: ACCOUNT.into(),
            token: CONTRACT.into(),
            side: Side::Buy,
            price: 125,
            decimals: 2,
            qty: 10,
            trade_id: 7,
        };
        let args = order.to_args();
        assert_eq!(args.len(), 7);
        assert_eq!(args[2], Arg::U32(1));
        assert_eq!(args[3], Arg::I128(BigInt::from(125)));
        assert_eq!(args[6], Arg::U64(7));
        assert_eq!(Side::Sell as u32, 0);
    }

    #[test]
    fn reads_option_definition() {
        let def = OptionDef::from_sc_val(&option_def_val()).unwrap();
        assert_eq!(def.collateral_token, CONTRACT);
        assert_eq!(def.underlying_symbol, "SPY");
        assert_eq!(def.strike, 45000);
        assert_eq!(def.mkt_price, 44123);
        assert_eq!(def.opt_type & option_type::CALL, option_type::CALL);
        assert_eq!(
            def.exp,
            TimeBound {
                kind: TimeBoundKind::Before,
                timestamp: 1_700_100_000
            }
        );

        assert!(OptionDef::from_sc_val(&ScVal::U32(1)).is_err());
        assert!(OptionDef::from_sc_val(&map(vec![("decimals", ScVal::U32(2))])).is_err());
    }

    #[test]
    fn reads_mark_to_market() {
        let mtm = MarkToMarket::from_values(&[0, 877, 877, 0]).unwrap();
        assert_eq!(mtm.seller_obligation, 877);
        assert_eq!(mtm.buyer_payout, 877);
        assert!(MarkToMarket::from_values(&[1, 2]).is_err());
    }
}
