//! Secret-buffer discipline: guaranteed zeroization and constant-time
//! comparison for any byte region holding key material, plaintext
//! mnemonics, or derived keys.
//!
//! Values here are wrapped in `Zeroizing<Vec<u8>>` so that release always
//! zeroes the backing memory in a way the optimizer cannot elide, and
//! compared in constant time regardless of content.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// An owned byte buffer that is guaranteed to be zeroized when dropped.
///
/// `Zeroizing<Vec<u8>>` already performs the non-elidable zero on drop;
/// this newtype adds a constant-time equality check for any comparison
/// that discriminates on secret content.
#[derive(Clone)]
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    /// Wraps `data` as a secret buffer. `data` is moved in, not copied.
    pub fn new(data: Vec<u8>) -> Self {
        Self(Zeroizing::new(data))
    }

    /// Returns the buffer's length.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the buffer's contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the wrapper and returns the plain `Vec<u8>`.
    ///
    /// The caller becomes responsible for the buffer's secrecy; this is the
    /// "owned by the caller, documented to be secret, no additional
    /// copies" boundary for outputs that cross the module boundary.
    pub fn into_inner(self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Constant-time equality over the full declared length of both sides.
    ///
    /// Buffers of different length are unequal; the length comparison
    /// itself is not secret (lengths are not treated as confidential by
    /// this crate, matching `secure_memcmp`'s own length-gated behavior).
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        if self.0.len() != other.len() {
            return false;
        }
        self.0.as_slice().ct_eq(other).into()
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretBytes").field("len", &self.0.len()).finish()
    }
}

impl From<Vec<u8>> for SecretBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

/// Constant-time comparison of two byte slices of equal declared length.
///
/// Used directly (without allocating a [`SecretBytes`]) for auth-tag and
/// hidden-auth comparisons inside the KEF decrypt pipeline.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ct_eq_matches_equal_buffers() {
        assert!(ct_eq(b"abandon", b"abandon"));
    }

    #[test]
    fn ct_eq_rejects_mismatched_content() {
        assert!(!ct_eq(b"abandon", b"abandoz"));
    }

    #[test]
    fn ct_eq_rejects_mismatched_length() {
        assert!(!ct_eq(b"short", b"longer input"));
    }

    #[test]
    fn secret_bytes_round_trips_contents() {
        let secret = SecretBytes::new(vec![1, 2, 3, 4]);
        assert_eq!(secret.as_slice(), &[1, 2, 3, 4]);
        assert!(secret.ct_eq(&[1, 2, 3, 4]));
        assert!(!secret.ct_eq(&[1, 2, 3, 5]));
        assert_eq!(secret.into_inner(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn secret_bytes_debug_hides_contents() {
        let secret = SecretBytes::new(b"correct horse battery staple".to_vec());
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("correct"));
        assert!(debug.contains("len"));
    }
}
