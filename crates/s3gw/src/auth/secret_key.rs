use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// A secret that is wiped from memory on drop and never printed
#[derive(Clone)]
pub struct SecretKey(String);

impl SecretKey {
    /// Exposes the secret for signing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<String> for SecretKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecretKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl ConstantTimeEq for SecretKey {
    fn ct_eq(&self, other: &Self) -> subtle::Choice {
        self.0.as_bytes().ct_eq(other.0.as_bytes())
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretKey").field(&"[SENSITIVE-SECRET-KEY]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacted() {
        let key = SecretKey::from("wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY");
        let debug = format!("{key:?}");
        assert!(!debug.contains("wJalr"));
        assert_eq!(key.expose(), "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY");
    }

    #[test]
    fn equality() {
        assert_eq!(SecretKey::from("secret-a"), SecretKey::from("secret-a"));
        assert_ne!(SecretKey::from("secret-a"), SecretKey::from("secret-b"));
        assert_ne!(SecretKey::from("secret-a"), SecretKey::from("secret-ab"));
    }
}
