//! Hierarchical deterministic key derivation for ed25519 signing keys
//!
//! BIP-39 seed stretching followed by BIP-32-style child derivation adapted
//! for ed25519: the curve admits no public-key tweaking, so every hop on the
//! account path is hardened and mixes the parent private key into the HMAC
//! input. Derivation is a pure function of (mnemonic, passphrase); no state
//! is kept between calls and nothing is persisted.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::{RegistrarError, RegistrarResult};

type HmacSha512 = Hmac<Sha512>;

/// Fixed account derivation path used for every wallet in a run
pub const DERIVATION_PATH: &str = "m/44'/637'/0'/0'/0'";

/// Round count fixed by BIP-39
const BIP39_PBKDF2_ROUNDS: u32 = 2048;
/// BIP-39 salt is this prefix followed by the passphrase
const BIP39_SALT_PREFIX: &str = "mnemonic";
/// HMAC key for the master node, fixed by SLIP-0010 for ed25519
const ED25519_SEED_KEY: &[u8] = b"ed25519 seed";
/// High bit marking a hardened path index
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Private key and chain code pair produced at each derivation step
pub struct ChainNode {
    pub key: [u8; 32],
    pub chain_code: [u8; 32],
}

impl Drop for ChainNode {
    fn drop(&mut self) {
        self.key.zeroize();
        self.chain_code.zeroize();
    }
}

/// Stretch a mnemonic phrase into a 64-byte seed
///
/// PBKDF2-HMAC-SHA512 over the raw phrase bytes with salt
/// `"mnemonic" + passphrase`. The phrase is treated as an opaque UTF-8
/// string; any input maps deterministically to a seed.
pub fn mnemonic_to_seed(mnemonic: &str, passphrase: &str) -> [u8; 64] {
    let salt = format!("{}{}", BIP39_SALT_PREFIX, passphrase);
    let mut seed = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(
        mnemonic.as_bytes(),
        salt.as_bytes(),
        BIP39_PBKDF2_ROUNDS,
        &mut seed,
    );
    seed
}

/// Derive the master node from a seed
///
/// HMAC-SHA512 keyed by the fixed `"ed25519 seed"` literal; first half is
/// the private key, second half the chain code.
pub fn seed_to_root_node(seed: &[u8]) -> ChainNode {
    let mut mac =
        HmacSha512::new_from_slice(ED25519_SEED_KEY).expect("HMAC accepts any key length");
    mac.update(seed);
    split_digest(&mac.finalize().into_bytes())
}

/// Derive one child node from a parent node
///
/// Both parent values must be exactly 32 bytes. A hardened index mixes in
/// the parent private key; the non-hardened branch mixes in the serialized
/// parent public key instead. Nothing on the fixed path ever takes the
/// non-hardened branch, but it is defined for completeness.
pub fn derive_child(
    parent_key: &[u8],
    parent_chain_code: &[u8],
    index: u32,
) -> RegistrarResult<ChainNode> {
    let key: &[u8; 32] = parent_key
        .try_into()
        .map_err(|_| RegistrarError::InvalidKeyLength {
            what: "parent key",
            len: parent_key.len(),
        })?;
    let chain_code: &[u8; 32] =
        parent_chain_code
            .try_into()
            .map_err(|_| RegistrarError::InvalidKeyLength {
                what: "parent chain code",
                len: parent_chain_code.len(),
            })?;

    let mut mac = HmacSha512::new_from_slice(chain_code).expect("HMAC accepts any key length");
    if index & HARDENED_OFFSET != 0 {
        mac.update(&[0x00]);
        mac.update(key);
    } else {
        mac.update(&serialize_public_key(key));
    }
    mac.update(&index.to_be_bytes());

    Ok(split_digest(&mac.finalize().into_bytes()))
}

/// Serialize the ed25519 verifying key of a private key
///
/// A single zero byte followed by the 32-byte verifying key. Only an
/// intermediate value inside child derivation, never an account public key.
pub fn serialize_public_key(private_key: &[u8; 32]) -> [u8; 33] {
    let signing_key = ed25519_dalek::SigningKey::from_bytes(private_key);
    let mut out = [0u8; 33];
    out[1..].copy_from_slice(&signing_key.verifying_key().to_bytes());
    out
}

/// Parse a derivation path string into its 32-bit indices
///
/// A trailing apostrophe on a segment marks it hardened, encoded by adding
/// the high bit. Fails when the `m/` prefix is missing or a segment is not
/// a number.
pub fn parse_path(path: &str) -> RegistrarResult<Vec<u32>> {
    let rest = path
        .strip_prefix("m/")
        .ok_or_else(|| RegistrarError::MalformedPath(path.to_string()))?;

    rest.split('/')
        .map(|segment| {
            let (digits, hardened) = match segment.strip_suffix('\'') {
                Some(digits) => (digits, true),
                None => (segment, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| RegistrarError::MalformedPath(path.to_string()))?;
            Ok(if hardened { HARDENED_OFFSET + index } else { index })
        })
        .collect()
}

/// Derive the wallet signing key for a mnemonic
///
/// The only key-derivation entry point consumed by the rest of the crate:
/// seed, master node, then one hardened child per segment of
/// [`DERIVATION_PATH`].
pub fn mnemonic_to_private_key(mnemonic: &str, passphrase: &str) -> RegistrarResult<[u8; 32]> {
    let path = parse_path(DERIVATION_PATH)?;
    let mut seed = mnemonic_to_seed(mnemonic, passphrase);
    let mut node = seed_to_root_node(&seed);
    seed.zeroize();

    for index in path {
        node = derive_child(&node.key, &node.chain_code, index)?;
    }

    Ok(node.key)
}

fn split_digest(digest: &[u8]) -> ChainNode {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    chain_code.copy_from_slice(&digest[32..]);
    ChainNode { key, chain_code }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP-39 test vector: "abandon" x11 + "about"
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_seed_is_deterministic_and_64_bytes() {
        let seed1 = mnemonic_to_seed(TEST_MNEMONIC, "");
        let seed2 = mnemonic_to_seed(TEST_MNEMONIC, "");
        assert_eq!(seed1, seed2);
        assert_eq!(seed1.len(), 64);
    }

    #[test]
    fn test_bip39_seed_vector() {
        let seed = mnemonic_to_seed(TEST_MNEMONIC, "");
        assert_eq!(
            hex::encode(seed),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_passphrase_changes_seed() {
        let plain = mnemonic_to_seed(TEST_MNEMONIC, "");
        let salted = mnemonic_to_seed(TEST_MNEMONIC, "mypassphrase");
        assert_ne!(plain, salted);
    }

    #[test]
    fn test_derive_child_deterministic() {
        let node = seed_to_root_node(&mnemonic_to_seed(TEST_MNEMONIC, ""));
        let a = derive_child(&node.key, &node.chain_code, HARDENED_OFFSET + 44).unwrap();
        let b = derive_child(&node.key, &node.chain_code, HARDENED_OFFSET + 44).unwrap();
        assert_eq!(a.key, b.key);
        assert_eq!(a.chain_code, b.chain_code);
    }

    #[test]
    fn test_hardened_differs_from_non_hardened() {
        let node = seed_to_root_node(&mnemonic_to_seed(TEST_MNEMONIC, ""));
        let hardened = derive_child(&node.key, &node.chain_code, HARDENED_OFFSET + 44).unwrap();
        let soft = derive_child(&node.key, &node.chain_code, 44).unwrap();
        assert_ne!(hardened.key, soft.key);
    }

    #[test]
    fn test_derive_child_rejects_bad_lengths() {
        let node = seed_to_root_node(&mnemonic_to_seed(TEST_MNEMONIC, ""));

        let short_key = derive_child(&node.key[..31], &node.chain_code, HARDENED_OFFSET);
        assert!(matches!(
            short_key,
            Err(RegistrarError::InvalidKeyLength { what: "parent key", len: 31 })
        ));

        let long_code = derive_child(&node.key, &[0u8; 33], HARDENED_OFFSET);
        assert!(matches!(
            long_code,
            Err(RegistrarError::InvalidKeyLength { what: "parent chain code", len: 33 })
        ));
    }

    #[test]
    fn test_serialized_public_key_shape() {
        let node = seed_to_root_node(&mnemonic_to_seed(TEST_MNEMONIC, ""));
        let serialized = serialize_public_key(&node.key);
        assert_eq!(serialized.len(), 33);
        assert_eq!(serialized[0], 0x00);
    }

    #[test]
    fn test_parse_fixed_path() {
        let indices = parse_path(DERIVATION_PATH).unwrap();
        assert_eq!(
            indices,
            vec![0x8000_002C, 0x8000_027D, 0x8000_0000, 0x8000_0000, 0x8000_0000]
        );
    }

    #[test]
    fn test_parse_path_requires_prefix() {
        assert!(matches!(
            parse_path("44'/637'/0'/0'/0'"),
            Err(RegistrarError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_parse_path_rejects_junk_segment() {
        assert!(matches!(
            parse_path("m/44'/abc'/0'"),
            Err(RegistrarError::MalformedPath(_))
        ));
    }

    #[test]
    fn test_full_chain_golden_vector() {
        // Cross-SDK vector for the fixed path with an empty passphrase
        let mnemonic =
            "shoot island position soft burden budget tooth cruel issue economy destroy above";
        let key = mnemonic_to_private_key(mnemonic, "").unwrap();
        assert_eq!(
            hex::encode(key),
            "5d996aa76b3212142792d9130796cd2e11e3c445a93118c08414df4f66bc60ec"
        );
    }
}
