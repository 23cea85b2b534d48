//! Frontdesk Vault - integration secret encryption
//!
//! Seals third-party integration credentials per tenant with AES-256-GCM,
//! binding the owning tenant id and integration kind as authenticated
//! associated data. Ciphertext produced for one tenant can never be
//! decrypted as belonging to another, even if rows are swapped underneath
//! the policy layer at the storage level.
//!
//! The vault is a cryptographic boundary, not a policy boundary: callers
//! invoke it strictly after the authorization engine has allowed the
//! credential operation, and the vault does not re-check membership.

#![warn(missing_docs)]

pub mod keys;
pub mod secret;
pub mod vault;

pub use keys::{KeyError, KeyProvider};
pub use secret::{IntegrationKind, SealedSecret};
pub use vault::CredentialVault;
