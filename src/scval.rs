//! Tagged contract arguments and their `ScVal` encoding
use std::str::FromStr;

use num_bigint::BigInt;
use stellar_xdr::curr::{ScBytes, ScString, ScSymbol, ScVal, ScVec, StringM};

use crate::error::Error;
use crate::int_codec;
use crate::keypair::sc_address_from_strkey;

/// A single contract call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    U128(BigInt),
    I128(BigInt),
    U256(BigInt),
    I256(BigInt),
    /// `G...` account or `C...` contract strkey
    Address(String),
    Symbol(String),
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Vec(Vec<Arg>),
}

impl Arg {
    pub fn to_sc_val(&self) -> Result<ScVal, Error> {
        let val = match self {
            Arg::U32(v) => ScVal::U32(*v),
            Arg::I32(v) => ScVal::I32(*v),
            Arg::U64(v) => ScVal::U64(*v),
            Arg::I64(v) => ScVal::I64(*v),
            Arg::U128(v) => ScVal::U128(int_codec::u128_to_parts(v)?),
            Arg::I128(v) => ScVal::I128(int_codec::i128_to_parts(v)?),
            Arg::U256(v) => ScVal::U256(int_codec::u256_to_parts(v)?),
            Arg::I256(v) => ScVal::I256(int_codec::i256_to_parts(v)?),
            Arg::Address(a) => ScVal::Address(sc_address_from_strkey(a)?),
            Arg::Symbol(s) => ScVal::Symbol(ScSymbol(StringM::try_from(s.as_str())?)),
            Arg::String(s) => ScVal::String(ScString(StringM::try_from(s.as_str())?)),
            Arg::Bool(b) => ScVal::Bool(*b),
            Arg::Bytes(b) => ScVal::Bytes(ScBytes(b.clone().try_into()?)),
            Arg::Vec(items) => {
                let vals = items
                    .iter()
                    .map(Arg::to_sc_val)
                    .collect::<Result<Vec<_>, _>>()?;
                ScVal::Vec(Some(ScVec(vals.try_into()?)))
            }
        };
        Ok(val)
    }
}

impl From<i128> for Arg {
    fn from(v: i128) -> Self {
        Arg::I128(BigInt::from(v))
    }
}

impl From<u32> for Arg {
    fn from(v: u32) -> Self {
        Arg::U32(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

/// Parses `type:value`, e.g. `i128:-5`, `symbol:SPY`, `address:G...`, `bytes:00ff`
impl FromStr for Arg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ty, value) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidArgument(format!("expected type:value, got {s}")))?;
        let bad = || Error::InvalidArgument(format!("invalid {ty} value {value}"));
        let big = || BigInt::from_str(value).map_err(|_| bad());

        let arg = match ty {
            "u32" => Arg::U32(value.parse().map_err(|_| bad())?),
            "i32" => Arg::I32(value.parse().map_err(|_| bad())?),
            "u64" => Arg::U64(value.parse().map_err(|_| bad())?),
            "i64" => Arg::I64(value.parse().map_err(|_| bad())?),
            "u128" => Arg::U128(big()?),
            "i128" => Arg::I128(big()?),
            "u256" => Arg::U256(big()?),
            "i256" => Arg::I256(big()?),
            "address" => Arg::Address(value.to_string()),
            "symbol" => Arg::Symbol(value.to_string()),
            "string" => Arg::String(value.to_string()),
            "bool" => Arg::Bool(value.parse().map_err(|_| bad())?),
            "bytes" => Arg::Bytes(hex::decode(value).map_err(|_| bad())?),
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unknown argument type {other}"
                )))
            }
        };
        Ok(arg)
    }
}

pub fn to_sc_vals(args: &[Arg]) -> Result<Vec<ScVal>, Error> {
    args.iter().map(Arg::to_sc_val).collect()
}

pub fn i128_from_sc_val(val: &ScVal) -> Result<i128, Error> {
    match val {
        ScVal::I128(parts) => Ok((i128::from(parts.hi) << 64) | i128::from(parts.lo)),
        other => Err(Error::InvalidArgument(format!(
            "expected i128, got {:?}",
            other.discriminant()
        ))),
    }
}

/// Reads a `Vec<i128>` return value, `Void` is read as empty
pub fn i128_vec_from_sc_val(val: &ScVal) -> Result<Vec<i128>, Error> {
    match val {
        ScVal::Vec(Some(items)) => items.0.iter().map(i128_from_sc_val).collect(),
        ScVal::Vec(None) | ScVal::Void => Ok(Vec::new()),
        other => Err(Error::InvalidArgument(format!(
            "expected vec, got {:?}",
            other.discriminant()
        ))),
    }
}

#[cfg(test)]
mod test {
    use stellar_xdr::curr::{Int128Parts, ScAddress};

    use super::*;

    #[test]
    fn parses_typed_arguments() {
        assert_eq!("u32:2".parse::<Arg>().unwrap(), Arg::U32(2));
        assert_eq!(
            "i128:-44123".parse::<Arg>().unwrap(),
            Arg::I128(BigInt::from(-44123))
        );
        assert_eq!(
            "symbol:SPY".parse::<Arg>().unwrap(),
            Arg::Symbol("SPY".into())
        );
        assert_eq!("bool:true".parse::<Arg>().unwrap(), Arg::Bool(true));
        assert_eq!(
            "bytes:00ff".parse::<Arg>().unwrap(),
            Arg::Bytes(vec![0x00, 0xff])
        );
        // value may itself contain colons
        assert_eq!(
            "string:a:b".parse::<Arg>().unwrap(),
            Arg::String("a:b".into())
        );
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!("44123".parse::<Arg>().is_err());
        assert!("u32:-1".parse::<Arg>().is_err());
        assert!("i128:abc".parse::<Arg>().is_err());
        assert!("float:1.5".parse::<Arg>().is_err());
        assert!("bytes:zz".parse::<Arg>().is_err());
    }

    #[test]
    fn converts_to_sc_val() {
        assert_eq!(Arg::U32(7).to_sc_val().unwrap(), ScVal::U32(7));
        assert_eq!(
            Arg::from(-1i128).to_sc_val().unwrap(),
            ScVal::I128(Int128Parts {
                hi: -1,
                lo: u64::MAX
            })
        );
        let addr = Arg::Address("GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI".into());
        assert!(matches!(
            addr.to_sc_val().unwrap(),
            ScVal::Address(ScAddress::Account(_))
        ));

        let nested = Arg::Vec(vec![Arg::Symbol("SPY".into()), Arg::Bool(false)]);
        match nested.to_sc_val().unwrap() {
            ScVal::Vec(Some(v)) => assert_eq!(v.0.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn conversion_errors_surface() {
        let too_big = Arg::I128(BigInt::from(1) << 127);
        assert!(matches!(too_big.to_sc_val(), Err(Error::IntOverflow(_))));

        let long_symbol = Arg::Symbol("x".repeat(33));
        assert!(matches!(long_symbol.to_sc_val(), Err(Error::XdrError(_))));
    }

    #[test]
    fn reads_i128_vectors() {
        let vals = to_sc_vals(&[Arg::from(1i128), Arg::from(-2i128), Arg::from(44123i128)]).unwrap();
        let vec = ScVal::Vec(Some(ScVec(vals.try_into().unwrap())));
        assert_eq!(i128_vec_from_sc_val(&vec).unwrap(), vec![1, -2, 44123]);
        assert_eq!(i128_vec_from_sc_val(&ScVal::Void).unwrap(), Vec::<i128>::new());
        assert!(i128_vec_from_sc_val(&ScVal::U32(1)).is_err());
    }
}
