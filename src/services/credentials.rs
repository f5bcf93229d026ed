// src/services/credentials.rs

//! Secret lookup for transport credentials.
//!
//! Providers resolve one logical name to one secret string. Any legacy key
//! names or wrapping formats belong inside a provider, not in callers.

use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Resolves credentials by name.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self, name: &str) -> Result<String>;
}

/// Reads credentials from environment variables.
///
/// `mail-api-token` is looked up as `MAIL_API_TOKEN`.
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// Environment variable holding credential `name`.
    pub fn var_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl CredentialProvider for EnvCredentials {
    fn credential(&self, name: &str) -> Result<String> {
        let var = Self::var_name(name);
        match std::env::var(&var) {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(AppError::credential(name, format!("{var} is empty"))),
            Err(e) => Err(AppError::credential(name, format!("{var}: {e}"))),
        }
    }
}

/// Fixed in-memory credentials.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self, name: &str) -> Result<String> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::credential(name, "not configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_name() {
        assert_eq!(EnvCredentials::var_name("mail-api-token"), "MAIL_API_TOKEN");
        assert_eq!(EnvCredentials::var_name("prod/smtp.key"), "PROD_SMTP_KEY");
    }

    #[test]
    fn test_env_missing() {
        let err = EnvCredentials
            .credential("calendar-watch-test-surely-unset")
            .unwrap_err();
        assert!(matches!(err, AppError::Credential { .. }));
    }

    #[test]
    fn test_static_lookup() {
        let creds = StaticCredentials::new([("token", "abc")]);
        assert_eq!(creds.credential("token").unwrap(), "abc");
        assert!(creds.credential("other").is_err());
    }
}
