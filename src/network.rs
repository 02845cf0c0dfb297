//! Well known network passphrases
use sha2::{Digest, Sha256};

pub struct Networks;

impl Networks {
    pub fn public() -> &'static str {
        "Public Global Stellar Network ; September 2015"
    }

    pub fn testnet() -> &'static str {
        "Test SDF Network ; September 2015"
    }

    pub fn futurenet() -> &'static str {
        "Test SDF Future Network ; October 2022"
    }

    pub fn standalone() -> &'static str {
        "Standalone Network ; February 2017"
    }
}

/// Network id, the sha256 of the passphrase
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}
