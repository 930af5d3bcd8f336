//! Token verification configuration.

use serde::{Deserialize, Serialize};

/// Configuration for verifying bearer tokens issued by the external
/// identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret shared with the token issuer.
    #[serde(default = "default_secret")]
    pub jwt_secret: String,
    /// Clock-skew leeway for `exp` validation, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_secret(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_secret() -> String {
    // Overridden in any real deployment via CINESYNC__AUTH__JWT_SECRET.
    "cinesync-dev-secret".to_string()
}

fn default_leeway() -> u64 {
    5
}
