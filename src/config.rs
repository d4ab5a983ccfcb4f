use secrecy::SecretString;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_PORT: u16 = 3001;

/// Settings for the chat relay. The credential never leaves this struct
/// except as an outbound request header.
#[derive(Debug)]
pub struct RelayConfig {
    pub api_key: Option<SecretString>,
    pub upstream_url: String,
    pub api_version: String,
}

impl RelayConfig {
    pub fn new(api_key: Option<String>, upstream_url: String, api_version: String) -> Self {
        Self {
            // An empty variable counts as unset.
            api_key: api_key
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::from),
            upstream_url,
            api_version,
        }
    }
}
