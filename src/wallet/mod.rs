//! Wallet accounts backed by HD-derived ed25519 keys
//!
//! Keys are ephemeral: derived per run, held only in memory, discarded at
//! process exit.

pub mod derive;

use ed25519_dalek::{Signer, SigningKey};
use sha3::{Digest, Sha3_256};
use zeroize::Zeroize;

use crate::error::RegistrarResult;

/// Scheme byte appended to the public key when hashing the auth key
const SINGLE_KEY_SCHEME: u8 = 0x00;

/// In-memory signing account for one wallet
pub struct Account {
    signing_key: SigningKey,
    address: String,
}

impl Account {
    /// Build an account from a raw 32-byte private key
    pub fn from_private_key(private_key: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(private_key);
        let mut hasher = Sha3_256::new();
        hasher.update(signing_key.verifying_key().to_bytes());
        hasher.update([SINGLE_KEY_SCHEME]);
        let address = format!("0x{}", hex::encode(hasher.finalize()));

        Self {
            signing_key,
            address,
        }
    }

    /// Derive the account for a seed phrase along the fixed path
    pub fn from_mnemonic(mnemonic: &str) -> RegistrarResult<Self> {
        let mut key = derive::mnemonic_to_private_key(mnemonic, "")?;
        let account = Self::from_private_key(&key);
        key.zeroize();
        Ok(account)
    }

    /// Account address: `0x` + hex of SHA3-256(public key || scheme byte)
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Hex-encoded public key for the wire signature block
    pub fn public_key_hex(&self) -> String {
        format!(
            "0x{}",
            hex::encode(self.signing_key.verifying_key().to_bytes())
        )
    }

    /// Sign canonical signing bytes, hex-encoded for the wire
    pub fn sign_hex(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        format!("0x{}", hex::encode(signature.to_bytes()))
    }
}
