//! Fixed-width big integer codec for contract arguments
//!
//! 128 and 256 bit contract values travel as big-endian two's-complement
//! buffers split into 64 bit halves (`hi`, `lo`), each of which is read as
//! two big-endian 32 bit words. Arbitrary precision values are
//! [num_bigint::BigInt].
use num_bigint::{BigInt, Sign};
use stellar_xdr::curr::{Int128Parts, Int256Parts, UInt128Parts, UInt256Parts};

use crate::error::Error;

/// Encode a signed value into 16 bytes, rejecting |x| >= 2^127
pub fn encode_i128(value: &BigInt) -> Result<[u8; 16], Error> {
    if value.bits() > 127 {
        return Err(Error::IntOverflow("i128"));
    }
    Ok(sign_extend(value))
}

pub fn decode_i128(bytes: &[u8; 16]) -> BigInt {
    let (hi, lo) = halves(bytes);
    BigInt::from(combine_i128(hi as i64, lo))
}

pub fn encode_u128(value: &BigInt) -> Result<[u8; 16], Error> {
    if value.sign() == Sign::Minus || value.bits() > 128 {
        return Err(Error::IntOverflow("u128"));
    }
    Ok(zero_extend(value))
}

pub fn decode_u128(bytes: &[u8; 16]) -> BigInt {
    let (hi, lo) = halves(bytes);
    BigInt::from((u128::from(hi) << 64) | u128::from(lo))
}

/// Encode a signed value into 32 bytes, rejecting |x| >= 2^255
pub fn encode_i256(value: &BigInt) -> Result<[u8; 32], Error> {
    if value.bits() > 255 {
        return Err(Error::IntOverflow("i256"));
    }
    Ok(sign_extend(value))
}

pub fn decode_i256(bytes: &[u8; 32]) -> BigInt {
    BigInt::from_signed_bytes_be(bytes)
}

pub fn encode_u256(value: &BigInt) -> Result<[u8; 32], Error> {
    if value.sign() == Sign::Minus || value.bits() > 256 {
        return Err(Error::IntOverflow("u256"));
    }
    Ok(zero_extend(value))
}

pub fn decode_u256(bytes: &[u8; 32]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

pub fn i128_to_parts(value: &BigInt) -> Result<Int128Parts, Error> {
    let (hi, lo) = halves(&encode_i128(value)?);
    Ok(Int128Parts { hi: hi as i64, lo })
}

pub fn i128_from_parts(parts: &Int128Parts) -> BigInt {
    BigInt::from(combine_i128(parts.hi, parts.lo))
}

pub fn u128_to_parts(value: &BigInt) -> Result<UInt128Parts, Error> {
    let (hi, lo) = halves(&encode_u128(value)?);
    Ok(UInt128Parts { hi, lo })
}

pub fn u128_from_parts(parts: &UInt128Parts) -> BigInt {
    BigInt::from((u128::from(parts.hi) << 64) | u128::from(parts.lo))
}

pub fn i256_to_parts(value: &BigInt) -> Result<Int256Parts, Error> {
    let bytes = encode_i256(value)?;
    let [hi_hi, hi_lo, lo_hi, lo_lo] = quarters(&bytes);
    Ok(Int256Parts {
        hi_hi: hi_hi as i64,
        hi_lo,
        lo_hi,
        lo_lo,
    })
}

pub fn i256_from_parts(parts: &Int256Parts) -> BigInt {
    decode_i256(&join_quarters([
        parts.hi_hi as u64,
        parts.hi_lo,
        parts.lo_hi,
        parts.lo_lo,
    ]))
}

pub fn u256_to_parts(value: &BigInt) -> Result<UInt256Parts, Error> {
    let bytes = encode_u256(value)?;
    let [hi_hi, hi_lo, lo_hi, lo_lo] = quarters(&bytes);
    Ok(UInt256Parts {
        hi_hi,
        hi_lo,
        lo_hi,
        lo_lo,
    })
}

pub fn u256_from_parts(parts: &UInt256Parts) -> BigInt {
    decode_u256(&join_quarters([
        parts.hi_hi,
        parts.hi_lo,
        parts.lo_hi,
        parts.lo_lo,
    ]))
}

fn combine_i128(hi: i64, lo: u64) -> i128 {
    (i128::from(hi) << 64) | i128::from(lo)
}

// Minimal two's complement bytes, left padded with the sign byte.
// Callers have checked that the value fits N bytes.
fn sign_extend<const N: usize>(value: &BigInt) -> [u8; N] {
    let raw = value.to_signed_bytes_be();
    let fill = if value.sign() == Sign::Minus { 0xff } else { 0x00 };
    let mut out = [fill; N];
    out[N - raw.len()..].copy_from_slice(&raw);
    out
}

fn zero_extend<const N: usize>(value: &BigInt) -> [u8; N] {
    let (_, raw) = value.to_bytes_be();
    let mut out = [0u8; N];
    out[N - raw.len()..].copy_from_slice(&raw);
    out
}

fn word(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn half(bytes: &[u8], at: usize) -> u64 {
    (u64::from(word(bytes, at)) << 32) | u64::from(word(bytes, at + 4))
}

fn halves(bytes: &[u8; 16]) -> (u64, u64) {
    (half(bytes, 0), half(bytes, 8))
}

fn quarters(bytes: &[u8; 32]) -> [u64; 4] {
    [half(bytes, 0), half(bytes, 8), half(bytes, 16), half(bytes, 24)]
}

fn join_quarters(parts: [u64; 4]) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, part) in parts.iter().enumerate() {
        out[i * 8..(i + 1) * 8].copy_from_slice(&part.to_be_bytes());
    }
    out
}
