use crate::error::ConfigError;

/// Opaque authentication material handed to inserter factories.
///
/// The pipeline never interprets the key; it only refuses to construct a
/// worker group without one.
#[derive(Clone)]
pub struct Credentials {
    key: String,
}

impl Credentials {
    pub fn from_key(key: impl Into<String>) -> Self {
        Credentials { key: key.into() }
    }

    /// The raw key material, for inserter implementations.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }
}

// Keep key material out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_fails_validation() {
        assert_eq!(
            Credentials::from_key("").validate(),
            Err(ConfigError::MissingCredentials)
        );
        assert_eq!(
            Credentials::from_key("   ").validate(),
            Err(ConfigError::MissingCredentials)
        );
    }

    #[test]
    fn test_non_empty_key_passes() {
        assert!(Credentials::from_key("{\"type\":\"service_account\"}")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let creds = Credentials::from_key("super-secret");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
