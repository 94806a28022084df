use std::env;
use std::fmt::{Debug, Formatter};

use crate::error::ConfigurationError;

const JWT_SECRET_VAR: &str = "SECRET";

/// Key material used to verify bearer tokens.
///
/// The secret is supplied out of process and is never written to the
/// configuration file.
#[derive(Clone)]
pub struct Security {
    pub jwt_secret: Vec<u8>,
}

impl Security {
    pub fn new(secret: impl AsRef<[u8]>) -> Security {
        Security {
            jwt_secret: secret.as_ref().to_vec(),
        }
    }

    pub fn load() -> Result<Security, ConfigurationError> {
        tracing::info!("Loading JWT secret...");
        match env::var(JWT_SECRET_VAR) {
            Ok(secret) if !secret.is_empty() => {
                tracing::info!("JWT secret loaded.");
                Ok(Security::new(secret))
            }
            _ => Err(ConfigurationError::MissingEnv(JWT_SECRET_VAR)),
        }
    }
}

impl Debug for Security {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Security")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}
