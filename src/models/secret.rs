use std::fmt;

use serde::Deserialize;
use zeroize::Zeroize;

/// A string holding secret material, zeroized on drop and redacted in
/// debug output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString(REDACTED)")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::new("super-secret-token");
        assert_eq!(format!("{:?}", secret), "SecretString(REDACTED)");
    }

    #[test]
    fn test_as_str_preserves_value() {
        let secret = SecretString::new("value");
        assert_eq!(secret.as_str(), "value");
        assert!(!secret.is_empty());
    }
}
