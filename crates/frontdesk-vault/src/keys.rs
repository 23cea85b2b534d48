//! Vault key material

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Length of the vault master key in bytes
pub const MASTER_KEY_LEN: usize = 32;

/// Errors loading key material
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Environment variable not set
    #[error("vault key variable {0} is not set")]
    Missing(String),
    /// Key was not valid base64
    #[error("vault key is not valid base64")]
    Decode,
    /// Decoded key had the wrong length
    #[error("vault key must decode to {MASTER_KEY_LEN} bytes")]
    Length,
}

/// Supplies the vault's AES-256 master key
///
/// The key is provided by the external key-management facility. It is
/// never logged and no accessor exposes it outside this crate.
pub struct KeyProvider {
    key: [u8; MASTER_KEY_LEN],
}

impl KeyProvider {
    /// Key from explicit bytes
    pub fn from_bytes(key: [u8; MASTER_KEY_LEN]) -> Self {
        Self { key }
    }

    /// Key from a base64-encoded environment variable
    pub fn from_env(var: &str) -> Result<Self, KeyError> {
        let encoded = std::env::var(var).map_err(|_| KeyError::Missing(var.to_string()))?;
        let decoded = BASE64
            .decode(encoded.trim().as_bytes())
            .map_err(|_| KeyError::Decode)?;
        let key: [u8; MASTER_KEY_LEN] = decoded.try_into().map_err(|_| KeyError::Length)?;
        Ok(Self { key })
    }

    pub(crate) fn key(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyProvider").field("key", &"[redacted]").finish()
    }
}
