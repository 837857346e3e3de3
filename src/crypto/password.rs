//! Password handling for KEF key derivation.

use zeroize::Zeroizing;

/// A password used to derive a KEF encryption key.
///
/// PBKDF2-HMAC-SHA256 derivation consumes the password as raw UTF-8 bytes,
/// so this type exposes `as_bytes` for that purpose.
#[derive(Clone)]
pub struct Password {
    inner: Zeroizing<String>,
}

impl Password {
    /// Creates a new password from a string.
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self {
            inner: Zeroizing::new(password.into()),
        }
    }

    /// Returns the password as raw UTF-8 bytes for key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Returns the password as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Returns true if the password is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the length of the password in characters.
    pub fn len(&self) -> usize {
        self.inner.chars().count()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose the actual password in debug output.
        f.debug_struct("Password")
            .field("len", &self.inner.len())
            .finish()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_as_bytes_ascii() {
        let password = Password::new("test");
        assert_eq!(password.as_bytes(), b"test");
    }

    #[test]
    fn password_as_bytes_unicode() {
        let password = Password::new("пароль");
        assert_eq!(password.as_bytes().len(), 12);
    }

    #[test]
    fn password_debug_hides_contents() {
        let password = Password::new("secret");
        let debug = format!("{:?}", password);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("len"));
    }

    #[test]
    fn password_from_str_and_len() {
        let password: Password = "test".into();
        assert_eq!(password.as_str(), "test");
        assert_eq!(password.len(), 4);
        assert!(!password.is_empty());

        let empty = Password::new("");
        assert!(empty.is_empty());
    }
}
