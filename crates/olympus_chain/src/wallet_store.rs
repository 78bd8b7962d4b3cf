use std::collections::HashMap;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChainError;

const AES_NONCE_LEN: usize = 12;

/// A stored signing key, encrypted at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: String,
    pub name: String,
    pub address: Address,
    pub encrypted_key: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// Manages the signing keys the dashboard can log in with.
///
/// Wallets are indexed by their UUID. The store can be persisted to and
/// loaded from a JSON file on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletStore {
    wallets: HashMap<String, WalletEntry>,
}

impl WalletStore {
    /// Create an empty wallet store.
    pub fn new() -> Self {
        Self {
            wallets: HashMap::new(),
        }
    }

    /// Add a wallet to the store. Returns the generated wallet ID.
    pub fn add_wallet(&mut self, name: String, address: Address, encrypted_key: Vec<u8>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let entry = WalletEntry {
            id: id.clone(),
            name,
            address,
            encrypted_key,
            created_at: Utc::now(),
        };
        info!(wallet_id = %id, %address, "wallet added to store");
        self.wallets.insert(id.clone(), entry);
        id
    }

    /// Encrypt a hex private key under `password` and store it.
    pub fn import_key(&mut self, name: String, private_key: &str, password: &str) -> Result<String> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .context("invalid private key")?;
        let encrypted = encrypt_key(signer.to_bytes().as_slice(), password)?;
        Ok(self.add_wallet(name, signer.address(), encrypted))
    }

    /// Decrypt a stored key into a signer. Every failure is a
    /// [`ChainError::KeyStore`].
    pub fn unlock(&self, id_or_name: &str, password: &str) -> Result<PrivateKeySigner, ChainError> {
        let entry = self
            .find(id_or_name)
            .ok_or_else(|| ChainError::KeyStore(format!("no wallet named {id_or_name:?}")))?;
        let key = decrypt_key(&entry.encrypted_key, password)
            .map_err(|e| ChainError::KeyStore(format!("cannot unlock {:?}: {e}", entry.name)))?;
        let signer = PrivateKeySigner::from_slice(&key)
            .map_err(|e| ChainError::KeyStore(format!("stored key is not a valid secp256k1 key: {e}")))?;
        if signer.address() != entry.address {
            return Err(ChainError::KeyStore(format!(
                "decrypted key does not match stored address {}",
                entry.address
            )));
        }
        Ok(signer)
    }

    /// Remove a wallet by ID. Returns the removed entry if it existed.
    pub fn remove_wallet(&mut self, id: &str) -> Option<WalletEntry> {
        let removed = self.wallets.remove(id);
        if removed.is_some() {
            info!(wallet_id = %id, "wallet removed from store");
        }
        removed
    }

    /// List all wallets, oldest first.
    pub fn list_wallets(&self) -> Vec<&WalletEntry> {
        let mut wallets: Vec<_> = self.wallets.values().collect();
        wallets.sort_by_key(|w| w.created_at);
        wallets
    }

    /// Get a single wallet by ID.
    pub fn get_wallet(&self, id: &str) -> Option<&WalletEntry> {
        self.wallets.get(id)
    }

    /// Look a wallet up by ID first, then by name.
    pub fn find(&self, id_or_name: &str) -> Option<&WalletEntry> {
        self.wallets
            .get(id_or_name)
            .or_else(|| self.wallets.values().find(|w| w.name == id_or_name))
    }

    /// Number of wallets in the store.
    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    /// Persist the wallet store to a JSON file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("failed to serialize wallet store")?;
        std::fs::write(path, json).context("failed to write wallet store file")?;

        // Restrict file permissions to owner-only on Unix (0o600 = rw-------).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set wallet store file permissions")?;
        }

        info!(path = %path.display(), count = self.wallets.len(), "wallet store saved");
        Ok(())
    }

    /// Load a wallet store from a JSON file. Returns an empty store if the file
    /// does not exist.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "wallet store file not found, starting empty");
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path).context("failed to read wallet store file")?;
        let store: Self =
            serde_json::from_str(&json).context("failed to deserialize wallet store")?;
        info!(path = %path.display(), count = store.wallets.len(), "wallet store loaded");
        Ok(store)
    }
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Encryption helpers
// ---------------------------------------------------------------------------

/// Derive a 256-bit AES key from a password using Argon2id.
///
/// Uses a fixed salt for deterministic derivation (the same password always
/// produces the same key). Parameters: m=19456 KiB (~19 MB), t=2, p=1.
fn derive_key_from_password(password: &str) -> Result<[u8; 32]> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let salt = b"olympus-wallet-key-v1";
    let params = Params::new(19_456, 2, 1, Some(32))
        .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("argon2 key derivation failed: {e}"))?;
    Ok(key)
}

/// Encrypt `plaintext` using AES-256-GCM with a key derived from `password`.
///
/// The returned `Vec<u8>` contains `nonce || ciphertext` (12 bytes nonce followed
/// by the encrypted data including the authentication tag).
pub fn encrypt_key(plaintext: &[u8], password: &str) -> Result<Vec<u8>> {
    let key_bytes = derive_key_from_password(password)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
    let cipher = Aes256Gcm::new(key);

    let nonce_bytes: [u8; AES_NONCE_LEN] = rand::random();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt `ciphertext` (produced by [`encrypt_key`]) using AES-256-GCM with a
/// key derived from `password`.
pub fn decrypt_key(ciphertext: &[u8], password: &str) -> Result<Vec<u8>> {
    if ciphertext.len() < AES_NONCE_LEN {
        anyhow::bail!("ciphertext too short (expected at least {AES_NONCE_LEN} bytes for nonce)");
    }

    let (nonce_bytes, encrypted) = ciphertext.split_at(AES_NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let key_bytes = derive_key_from_password(password)?;
    let key = Key::<Aes256Gcm>::from_slice(&key_bytes);
    let cipher = Aes256Gcm::new(key);

    let plaintext = cipher
        .decrypt(nonce, encrypted)
        .map_err(|e| anyhow::anyhow!("decryption failed: {e}"))?;

    Ok(plaintext)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
