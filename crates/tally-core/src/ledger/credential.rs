//! Administrator credential check for ledger resets.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::TallyError;
use crate::models::config::CredentialConfig;

const ADMIN_SALT: &str = "tally-ledger-reset-v1";

/// SHA-256 of `ADMIN_SALT || passphrase` for the built-in administrator.
const ADMIN_DIGEST: [u8; 32] = [
    0x90, 0x20, 0x84, 0x04, 0x48, 0xb1, 0x7a, 0x1c, 0xe8, 0x22, 0x1a, 0xd0, 0x38, 0xc5, 0x6d, 0xee,
    0xb5, 0xcd, 0x37, 0xca, 0xb0, 0x40, 0x95, 0x30, 0x5e, 0x38, 0xf6, 0x65, 0x15, 0xec, 0x6c, 0x76,
];

/// Salted passphrase hash. Only answers authorized or denied.
pub struct CredentialGate {
    salt: String,
    digest: [u8; 32],
}

impl CredentialGate {
    /// The built-in administrator credential.
    pub fn administrator() -> Self {
        Self {
            salt: ADMIN_SALT.to_string(),
            digest: ADMIN_DIGEST,
        }
    }

    /// The configured credential, or the administrator one when none is set.
    pub fn from_config(config: &CredentialConfig) -> Result<Self, TallyError> {
        match (&config.salt, &config.digest) {
            (None, None) => Ok(Self::administrator()),
            (Some(salt), Some(digest)) => {
                let bytes = hex::decode(digest.trim())
                    .map_err(|e| TallyError::Config(format!("credential digest: {}", e)))?;
                let digest: [u8; 32] = bytes.try_into().map_err(|_| {
                    TallyError::Config("credential digest must be 32 bytes of hex".to_string())
                })?;
                Ok(Self {
                    salt: salt.clone(),
                    digest,
                })
            }
            _ => Err(TallyError::Config(
                "credential salt and digest must be set together".to_string(),
            )),
        }
    }

    /// Hex digest to store in configuration for `passphrase` under `salt`.
    pub fn digest_hex(salt: &str, passphrase: &str) -> String {
        hex::encode(hash(salt, passphrase))
    }

    /// Whether `passphrase` matches the stored digest, compared in constant time.
    pub fn verify(&self, passphrase: &str) -> bool {
        hash(&self.salt, passphrase).as_slice().ct_eq(self.digest.as_slice()).into()
    }
}

fn hash(salt: &str, passphrase: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(passphrase.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

impl std::fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialGate(..)")
    }
}
