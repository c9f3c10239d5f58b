/// Chat API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify login tokens.
    pub token_secret: String,
    /// Login token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Allowed CORS origin for the chat client. Permissive when unset.
    pub chat_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            token_secret: required_var("SECRET"),
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(23),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3001),
            chat_origin: std::env::var("CHAT_ORIGIN").ok().filter(|s| !s.is_empty()),
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}
