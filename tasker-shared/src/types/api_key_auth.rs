//! # API Key Authentication
//!
//! Runtime API key validation with per-key permissions.

use std::collections::HashMap;

use super::security::{AuthMethod, SecurityContext};
use crate::config::tasker::ApiKeyConfig;
use crate::types::auth::AuthError;

/// Registry of valid API keys with their associated permissions.
#[derive(Debug, Clone)]
pub struct ApiKeyRegistry {
    keys: HashMap<String, ApiKeyEntry>,
}

#[derive(Debug, Clone)]
struct ApiKeyEntry {
    permissions: Vec<String>,
    description: String,
}

impl ApiKeyRegistry {
    /// Build the registry from configuration.
    pub fn from_config(configs: &[ApiKeyConfig]) -> Self {
        let keys = configs
            .iter()
            .map(|c| {
                let entry = ApiKeyEntry {
                    permissions: c.permissions.clone(),
                    description: c.description.clone(),
                };
                (c.key.clone(), entry)
            })
            .collect();
        Self { keys }
    }

    /// Validate an API key and return a `SecurityContext` on success.
    pub fn validate_key(&self, key: &str) -> Result<SecurityContext, AuthError> {
        match self.keys.get(key) {
            Some(entry) => Ok(SecurityContext {
                subject: entry.description.clone(),
                auth_method: AuthMethod::ApiKey {
                    description: entry.description.clone(),
                },
                permissions: entry.permissions.clone(),
                issuer: None,
                expires_at: None,
            }),
            None => Err(AuthError::InvalidToken("Invalid API key".to_string())),
        }
    }

    /// Check if the registry has any keys configured.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
