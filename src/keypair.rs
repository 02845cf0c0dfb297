//! Ed25519 signing keys and strkey conversions
use ed25519_dalek::{Signer, SigningKey};
use stellar_strkey::{ed25519, Contract};
use stellar_xdr::curr::{
    AccountId, DecoratedSignature, MuxedAccount, PublicKey, ScAddress, Signature, SignatureHint,
    Uint256,
};

use crate::error::Error;

/// A signing credential
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// Build from an `S...` secret seed
    pub fn from_secret(secret: &str) -> Result<Self, Error> {
        let seed = ed25519::PrivateKey::from_string(secret)?;
        Ok(Self::from_raw_secret(&seed.0))
    }

    pub fn from_raw_secret(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    pub fn raw_public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// `G...` strkey of the public key
    pub fn public_key(&self) -> String {
        ed25519::PublicKey(self.raw_public_key()).to_string()
    }

    /// `S...` strkey of the secret seed
    pub fn secret(&self) -> String {
        ed25519::PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    pub fn xdr_account_id(&self) -> AccountId {
        AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
            self.raw_public_key(),
        )))
    }

    pub fn xdr_muxed_account(&self) -> MuxedAccount {
        MuxedAccount::Ed25519(Uint256(self.raw_public_key()))
    }

    /// Last four bytes of the public key
    pub fn signature_hint(&self) -> SignatureHint {
        let public = self.raw_public_key();
        SignatureHint([public[28], public[29], public[30], public[31]])
    }

    pub fn sign(&self, data: &[u8]) -> [u8; 64] {
        self.signing_key.sign(data).to_bytes()
    }

    pub fn sign_decorated(&self, data: &[u8]) -> Result<DecoratedSignature, Error> {
        Ok(DecoratedSignature {
            hint: self.signature_hint(),
            signature: Signature(self.sign(data).to_vec().try_into()?),
        })
    }
}

/// Public key strkey for a secret seed strkey
pub fn public_key_from_secret(secret: &str) -> Result<String, Error> {
    Ok(Keypair::from_secret(secret)?.public_key())
}

pub fn account_id_from_strkey(address: &str) -> Result<AccountId, Error> {
    let key = ed25519::PublicKey::from_string(address)?;
    Ok(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(key.0))))
}

pub fn muxed_account_from_strkey(address: &str) -> Result<MuxedAccount, Error> {
    let key = ed25519::PublicKey::from_string(address)?;
    Ok(MuxedAccount::Ed25519(Uint256(key.0)))
}

/// `C...` strkey for a raw 32 byte contract id in hex
pub fn contract_id_to_strkey(hex_id: &str) -> Result<String, Error> {
    let mut raw = [0u8; 32];
    hex::decode_to_slice(hex_id, &mut raw)
        .map_err(|e| Error::InvalidArgument(format!("contract id {hex_id}: {e}")))?;
    Ok(Contract(raw).to_string())
}

/// Raw hex contract id for a `C...` strkey
pub fn contract_id_from_strkey(strkey: &str) -> Result<String, Error> {
    Ok(hex::encode(Contract::from_string(strkey)?.0))
}

/// Accepts either a `C...` strkey or a 64 character hex contract id
pub fn contract_id_bytes(contract: &str) -> Result<[u8; 32], Error> {
    if let Ok(c) = Contract::from_string(contract) {
        return Ok(c.0);
    }
    let mut raw = [0u8; 32];
    hex::decode_to_slice(contract, &mut raw)
        .map_err(|_| Error::InvalidArgument(format!("invalid contract id {contract}")))?;
    Ok(raw)
}

/// `G...` account or `C...` contract strkey to an [ScAddress]
pub fn sc_address_from_strkey(address: &str) -> Result<ScAddress, Error> {
    match address.chars().next() {
        Some('C') => Ok(ScAddress::Contract(stellar_xdr::curr::Hash(
            Contract::from_string(address)?.0,
        ))),
        _ => Ok(ScAddress::Account(account_id_from_strkey(address)?)),
    }
}

pub fn sc_address_to_strkey(address: &ScAddress) -> String {
    match address {
        ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(raw)))) => {
            ed25519::PublicKey(*raw).to_string()
        }
        ScAddress::Contract(stellar_xdr::curr::Hash(raw)) => Contract(*raw).to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CONTRACT: &str = "CCJZ5DGASBWQXR5MPFCJXMBI333XE5U3FSJTNQU7RIKE3P5GN2K2WYD5";
    const ACCOUNT: &str = "GBZXN7PIRZGNMHGA7MUUUF4GWPY5AYPV6LY4UV2GL6VJGIQRXFDNMADI";

    #[test]
    fn secret_round_trip_yields_same_public_key() {
        let kp = Keypair::from_raw_secret(&[7u8; 32]);
        let secret = kp.secret();
        assert!(secret.starts_with('S'));
        assert_eq!(secret.len(), 56);

        let public = public_key_from_secret(&secret).unwrap();
        assert!(public.starts_with('G'));
        assert_eq!(public, kp.public_key());
    }

    #[test]
    fn invalid_secret_is_rejected() {
        assert!(matches!(
            Keypair::from_secret("SNOTASECRET"),
            Err(Error::InvalidStrkey(_))
        ));
        // a public key is not a secret
        assert!(Keypair::from_secret(ACCOUNT).is_err());
    }

    #[test]
    fn contract_id_conversions() {
        let hex_id = "e1f77313773d8e429836c080e5470bdfb28f34f33847827601b0c540ace109bf";
        let strkey = contract_id_to_strkey(hex_id).unwrap();
        assert!(strkey.starts_with('C'));
        assert_eq!(strkey.len(), 56);
        assert_eq!(contract_id_from_strkey(&strkey).unwrap(), hex_id);

        let raw = contract_id_bytes(CONTRACT).unwrap();
        assert_eq!(contract_id_to_strkey(&hex::encode(raw)).unwrap(), CONTRACT);
        assert_eq!(contract_id_bytes(hex_id).unwrap().to_vec(), hex::decode(hex_id).unwrap());

        assert!(contract_id_to_strkey("abcd").is_err());
        assert!(contract_id_from_strkey(ACCOUNT).is_err());
    }

    #[test]
    fn signature_verifies_and_hint_matches() {
        use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};

        let kp = Keypair::from_raw_secret(&[3u8; 32]);
        let decorated = kp.sign_decorated(b"payload").unwrap();
        assert_eq!(decorated.hint.0, kp.raw_public_key()[28..]);

        let verifying = VerifyingKey::from_bytes(&kp.raw_public_key()).unwrap();
        let sig_bytes: [u8; 64] = decorated.signature.0.to_vec().try_into().unwrap();
        let sig = DalekSignature::from_bytes(&sig_bytes);
        assert!(verifying.verify(b"payload", &sig).is_ok());
    }

    #[test]
    fn sc_address_from_account_and_contract() {
        assert!(matches!(
            sc_address_from_strkey(ACCOUNT).unwrap(),
            ScAddress::Account(_)
        ));
        assert!(matches!(
            sc_address_from_strkey(CONTRACT).unwrap(),
            ScAddress::Contract(_)
        ));
        assert!(sc_address_from_strkey("nope").is_err());

        for address in [ACCOUNT, CONTRACT] {
            let sc = sc_address_from_strkey(address).unwrap();
            assert_eq!(sc_address_to_strkey(&sc), address);
        }
    }
}
