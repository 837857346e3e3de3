//! Key derivation and secret-handling primitives shared by the KEF
//! envelope.
//!
//! `derive_key` is the genuine PBKDF2-HMAC-SHA256 construction the KEF
//! envelope format requires for key derivation.

mod password;

pub mod kef;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::secret::SecretBytes;

pub use password::Password;

/// Derives a 32-byte AES key: `PBKDF2-HMAC-SHA256(password, salt, iterations, 32)`.
///
/// `salt` is the envelope's `id` field.
pub fn derive_key(password: &Password, salt: &[u8], iterations: u32) -> SecretBytes {
    let mut key = vec![0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key);
    SecretBytes::new(key)
}
