//! Sealed secret records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Third-party integrations a tenant may connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationKind {
    /// Telephony provider credentials
    Telephony,
    /// Calendar booking credentials
    Calendar,
    /// CRM credentials
    Crm,
    /// Outbound email credentials
    Email,
    /// LLM provider API key
    LlmProvider,
}

impl IntegrationKind {
    /// Stable tag bound into the ciphertext's associated data
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Telephony => "telephony",
            Self::Calendar => "calendar",
            Self::Crm => "crm",
            Self::Email => "email",
            Self::LlmProvider => "llm_provider",
        }
    }
}

/// Encrypted credential blob plus expiry metadata
///
/// The record carries no tenant id on purpose: ownership is bound
/// cryptographically through the associated data, not through a column
/// that a storage-layer bug could misattribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    /// Fresh per-write nonce, base64
    pub nonce_b64: String,
    /// AES-256-GCM ciphertext with tag, base64
    pub ciphertext_b64: String,
    /// When the secret was sealed
    pub sealed_at: DateTime<Utc>,
    /// When the upstream credential expires, if known
    pub expires_at: Option<DateTime<Utc>>,
}

impl SealedSecret {
    /// Whether the upstream credential has expired
    ///
    /// Expiry is advisory metadata; an expired record still unseals so the
    /// caller can rotate it, it just must not be used against the
    /// integration.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}
