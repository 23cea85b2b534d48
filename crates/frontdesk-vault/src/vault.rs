//! Credential vault

use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;

use frontdesk_common::{AccessError, CoreResult, TenantId};

use crate::keys::KeyProvider;
use crate::secret::{IntegrationKind, SealedSecret};

const NONCE_LEN: usize = 12;

/// Encrypts and decrypts integration secrets, scoped per tenant
///
/// At most one live record exists per `(tenant, integration)` pair;
/// sealing a new secret for an existing pair atomically supersedes the
/// previous ciphertext.
pub struct CredentialVault {
    cipher: Aes256Gcm,
    records: DashMap<(TenantId, IntegrationKind), SealedSecret>,
}

impl CredentialVault {
    /// Vault over a master key from the key-management facility
    pub fn new(keys: KeyProvider) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(keys.key()));
        Self {
            cipher,
            records: DashMap::new(),
        }
    }

    /// Tenant id and integration tag, authenticated but not encrypted.
    fn associated_data(tenant: &TenantId, kind: IntegrationKind) -> Vec<u8> {
        let tag = kind.tag().as_bytes();
        let mut aad = Vec::with_capacity(16 + tag.len());
        aad.extend_from_slice(tenant.as_bytes());
        aad.extend_from_slice(tag);
        aad
    }

    /// Seal a plaintext credential for `(tenant, kind)`
    ///
    /// Uses a fresh random nonce per write and supersedes any previous
    /// record for the pair.
    pub fn seal(
        &self,
        tenant: TenantId,
        kind: IntegrationKind,
        plaintext: &[u8],
        expires_at: Option<DateTime<Utc>>,
    ) -> CoreResult<SealedSecret> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let aad = Self::associated_data(&tenant, kind);
        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext,
                    aad: &aad,
                },
            )
            .map_err(|_| AccessError::DecryptionError)?;

        let sealed = SealedSecret {
            nonce_b64: BASE64.encode(nonce),
            ciphertext_b64: BASE64.encode(ciphertext),
            sealed_at: Utc::now(),
            expires_at,
        };
        self.records.insert((tenant, kind), sealed.clone());
        tracing::debug!(tenant_id = %tenant, integration = kind.tag(), "secret sealed");
        Ok(sealed)
    }

    /// Decrypt a sealed record as belonging to `(tenant, kind)`
    ///
    /// Fails with [`AccessError::DecryptionError`] when the record was
    /// sealed for a different tenant or integration, or was tampered with.
    /// The failure is fatal for the record; there is no fallback to
    /// another key or tenant.
    pub fn unseal(
        &self,
        tenant: &TenantId,
        kind: IntegrationKind,
        sealed: &SealedSecret,
    ) -> CoreResult<Vec<u8>> {
        let nonce = BASE64
            .decode(sealed.nonce_b64.as_bytes())
            .map_err(|_| AccessError::DecryptionError)?;
        if nonce.len() != NONCE_LEN {
            return Err(AccessError::DecryptionError);
        }
        let ciphertext = BASE64
            .decode(sealed.ciphertext_b64.as_bytes())
            .map_err(|_| AccessError::DecryptionError)?;

        let aad = Self::associated_data(tenant, kind);
        self.cipher
            .decrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: &ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| AccessError::DecryptionError)
    }

    /// Current record for `(tenant, kind)`, if one exists
    pub fn fetch(&self, tenant: &TenantId, kind: IntegrationKind) -> Option<SealedSecret> {
        self.records.get(&(*tenant, kind)).map(|r| r.value().clone())
    }

    /// Fetch and decrypt the current record for `(tenant, kind)`
    pub fn open(&self, tenant: &TenantId, kind: IntegrationKind) -> CoreResult<Vec<u8>> {
        let sealed = self.fetch(tenant, kind).ok_or_else(|| {
            AccessError::NotFound(format!("{} secret for {tenant}", kind.tag()))
        })?;
        self.unseal(tenant, kind, &sealed)
    }

    /// Drop the record for `(tenant, kind)`; returns whether one existed
    pub fn revoke(&self, tenant: &TenantId, kind: IntegrationKind) -> bool {
        self.records.remove(&(*tenant, kind)).is_some()
    }
}
