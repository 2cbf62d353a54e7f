//! Symmetric encryption of stored secrets, password masking and opaque token helpers.
//!
//! Secrets are encrypted with AES-256-GCM. The key is the SHA-256 digest of the configured
//! `secret_key`, and the stored form is `base64(nonce || ciphertext)` with a fresh 96-bit nonce
//! per value.
//!
//! Workspace values that hold secrets are tagged with the `password::` prefix:
//!
//! ```text
//! stored:   password::q3X0...==
//! rendered: password::********
//! ```

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose};
use rand::{Rng, thread_rng};
use serde_json::Value;
use sha2::{Digest, Sha256};
use ssh_key::{Algorithm, HashAlg, LineEnding, PrivateKey};

/// Prefix marking a string value as an encrypted secret.
pub const PASSWORD_PREFIX: &str = "password::";

/// What every secret is replaced with on read.
pub const MASKED_PASSWORD: &str = "password::********";

const NONCE_LEN: usize = 12;

/// AES-256-GCM cipher keyed from the application secret.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}

impl SecretCipher {
    pub fn new(secret_key: &str) -> Self {
        let key = Sha256::digest(secret_key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Encrypt `plaintext`, returning base64 of nonce followed by ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> anyhow::Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(general_purpose::STANDARD.encode(combined))
    }

    pub fn decrypt(&self, encoded: &str) -> anyhow::Result<String> {
        let combined = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| anyhow::anyhow!("Failed to decode ciphertext: {}", e))?;

        if combined.len() < NONCE_LEN {
            anyhow::bail!("Ciphertext too short");
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| anyhow::anyhow!("Decryption failed: {}", e))?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Encrypt and tag a value so it is recognized as a secret: `password::<enc>`.
    pub fn encrypt_password(&self, plaintext: &str) -> anyhow::Result<String> {
        Ok(format!("{PASSWORD_PREFIX}{}", self.encrypt(plaintext)?))
    }

    /// Reverse of [`Self::encrypt_password`]. Untagged strings are returned unchanged.
    pub fn decrypt_password(&self, value: &str) -> anyhow::Result<String> {
        match value.strip_prefix(PASSWORD_PREFIX) {
            Some(encrypted) => self.decrypt(encrypted),
            None => Ok(value.to_string()),
        }
    }
}

/// Replace every `password::` string anywhere inside `value` with the fixed mask.
pub fn mask_passwords(value: &Value) -> Value {
    match value {
        Value::String(s) if s.starts_with(PASSWORD_PREFIX) => Value::String(MASKED_PASSWORD.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(mask_passwords).collect()),
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), mask_passwords(v))).collect()),
        other => other.clone(),
    }
}

/// Generates an opaque session token with 256 bits of entropy, base64url encoded.
pub fn generate_token() -> String {
    let mut token_bytes = [0u8; 32];
    thread_rng().fill(&mut token_bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}

/// Hex SHA-256 of a token; only this digest is persisted.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes()).iter().map(|b| format!("{b:02x}")).collect()
}

/// A freshly generated ed25519 key pair in OpenSSH format.
#[derive(Debug, Clone)]
pub struct GeneratedKeyPair {
    pub public_key: String,
    pub private_key: String,
    /// `SHA256:<base64>` fingerprint of the public key
    pub fingerprint: String,
}

pub fn generate_ssh_key_pair(comment: &str) -> anyhow::Result<GeneratedKeyPair> {
    let mut private = PrivateKey::random(&mut rand::rngs::OsRng, Algorithm::Ed25519)?;
    private.set_comment(comment);
    let public = private.public_key();

    Ok(GeneratedKeyPair {
        public_key: public.to_openssh()?,
        private_key: private.to_openssh(LineEnding::LF)?.to_string(),
        fingerprint: public.fingerprint(HashAlg::Sha256).to_string(),
    })
}
