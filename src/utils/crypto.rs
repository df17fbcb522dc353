use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::AppError;

const NONCE_LEN: usize = 12;

/// Reversible AES-256-GCM encryption for sensitive account fields. Output is
/// base64(nonce || ciphertext); a fresh nonce per call means identical
/// plaintexts never produce identical outputs.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl FieldCipher {
    /// The 256-bit key is derived from the configured secret via SHA-256. A
    /// short secret is a startup error.
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.len() < 16 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ENCRYPTION_KEY must be at least 16 characters"
            )));
        }

        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Ok(Self { key })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, anyhow::Error> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("Failed to initialize cipher: {}", e))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failed: {}", e))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(out))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, anyhow::Error> {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| anyhow::anyhow!("Invalid encrypted payload: {}", e))?;

        if bytes.len() <= NONCE_LEN {
            return Err(anyhow::anyhow!("Encrypted payload too short"));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| anyhow::anyhow!("Failed to initialize cipher: {}", e))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| anyhow::anyhow!("Decryption failed"))?;

        String::from_utf8(plaintext).map_err(|e| anyhow::anyhow!("Invalid UTF-8 plaintext: {}", e))
    }
}
