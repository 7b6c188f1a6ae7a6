//! The encrypted field transform for sensitive resident data.
//!
//! [`encrypt`] seals a value under a fresh random AES-256-GCM key and hands
//! back both; [`decrypt`] reverses it. On its own the per-value key would have
//! nowhere to live, so [`FieldCipher`] wraps it under a long-lived master key
//! and stores the wrapped key next to the ciphertext in a [`SealedValue`].
//! Any process configured with the same master key can open the value again.

use std::fmt;

use aes_gcm::{
  Aes256Gcm, Nonce,
  aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use rand_core::{OsRng, RngCore};

use crate::{Error, Result};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

// ─── Keys ────────────────────────────────────────────────────────────────────

/// A 256-bit symmetric key.
#[derive(Clone, PartialEq, Eq)]
pub struct FieldKey([u8; KEY_LEN]);

impl FieldKey {
  pub fn generate() -> Self {
    let mut bytes = [0u8; KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    Self(bytes)
  }

  pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
    <[u8; KEY_LEN]>::try_from(bytes).map(Self).map_err(|_| {
      Error::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", bytes.len()))
    })
  }

  /// Parse a key from standard (padded) base64.
  pub fn from_base64(encoded: &str) -> Result<Self> {
    let bytes = B64
      .decode(encoded.trim())
      .map_err(|e| Error::InvalidKey(e.to_string()))?;
    Self::from_bytes(&bytes)
  }

  pub fn to_base64(&self) -> String { B64.encode(self.0) }

  fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(&self.0)
      .map_err(|e| Error::InvalidKey(e.to_string()))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
      .encrypt(Nonce::from_slice(&nonce), plaintext)
      .map_err(|_| Error::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
  }

  fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_LEN {
      return Err(Error::Decryption);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(&self.0)
      .map_err(|e| Error::InvalidKey(e.to_string()))?;
    cipher
      .decrypt(Nonce::from_slice(nonce), ciphertext)
      .map_err(|_| Error::Decryption)
  }
}

impl fmt::Debug for FieldKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("FieldKey(..)")
  }
}

// ─── Per-value transform ─────────────────────────────────────────────────────

/// Encrypt `plaintext` under a freshly generated key.
///
/// Returns `nonce || ciphertext` and the key needed to decrypt it.
pub fn encrypt(plaintext: &str) -> Result<(Vec<u8>, FieldKey)> {
  let key = FieldKey::generate();
  let ciphertext = key.seal(plaintext.as_bytes())?;
  Ok((ciphertext, key))
}

/// Decrypt output of [`encrypt`]. Fails with [`Error::Decryption`] when `key`
/// is not the key the value was sealed with.
pub fn decrypt(ciphertext: &[u8], key: &FieldKey) -> Result<String> {
  let plaintext = key.open(ciphertext)?;
  String::from_utf8(plaintext).map_err(|_| Error::Decryption)
}

// ─── Envelope ────────────────────────────────────────────────────────────────

/// A ciphertext together with its per-value key, wrapped under a master key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
  pub wrapped_key: Vec<u8>,
  pub ciphertext:  Vec<u8>,
}

impl SealedValue {
  /// Single-column text form: `base64(wrapped_key) "." base64(ciphertext)`.
  pub fn encode(&self) -> String {
    format!("{}.{}", B64.encode(&self.wrapped_key), B64.encode(&self.ciphertext))
  }

  pub fn decode(encoded: &str) -> Result<Self> {
    let (key, data) = encoded.split_once('.').ok_or(Error::MalformedSealedValue)?;
    Ok(Self {
      wrapped_key: B64.decode(key).map_err(|_| Error::MalformedSealedValue)?,
      ciphertext:  B64.decode(data).map_err(|_| Error::MalformedSealedValue)?,
    })
  }
}

/// Seals and opens field values under a master key.
#[derive(Clone, Debug)]
pub struct FieldCipher {
  master: FieldKey,
}

impl FieldCipher {
  pub fn new(master: FieldKey) -> Self { Self { master } }

  pub fn seal(&self, plaintext: &str) -> Result<SealedValue> {
    let (ciphertext, value_key) = encrypt(plaintext)?;
    let wrapped_key = self.master.seal(&value_key.0)?;
    Ok(SealedValue { wrapped_key, ciphertext })
  }

  pub fn open(&self, sealed: &SealedValue) -> Result<String> {
    let key_bytes = self.master.open(&sealed.wrapped_key)?;
    let value_key = FieldKey::from_bytes(&key_bytes).map_err(|_| Error::Decryption)?;
    decrypt(&sealed.ciphertext, &value_key)
  }
}
